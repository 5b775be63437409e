//! Ask command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::{Output, SourceArgs};
use crate::config::Settings;
use crate::extract::SourceKind;
use crate::pipeline::RagService;
use anyhow::{anyhow, Result};

/// Index a source, then answer one question about it.
pub async fn run_ask(
    question: &str,
    source: &SourceArgs,
    force_refresh: bool,
    settings: Settings,
) -> Result<()> {
    let source = source
        .descriptor()
        .ok_or_else(|| anyhow!("one of --pdf, --file, --text or --video is required"))?;

    let operation = match source.kind() {
        SourceKind::Video => Operation::AskVideo,
        _ => Operation::Ask,
    };
    if let Err(e) = preflight::check(operation, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'docqa doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let service = RagService::from_settings(&settings)?;

    let spinner = Output::spinner(&format!("Indexing {}...", source.label()));
    let handle = match service.ingest(&source, force_refresh).await {
        Ok(handle) => handle,
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Failed to index source: {}", e));
            return Err(e.into());
        }
    };

    spinner.set_message("Generating answer...");
    let record = match service.answer(question, Some(&handle)).await {
        Ok(record) => record,
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Failed to generate answer: {}", e));
            return Err(e.into());
        }
    };
    spinner.finish_and_clear();

    println!("\n{}\n", record.answer);

    if !record.passages.is_empty() {
        Output::header("Sources");
        for (i, (source, scored)) in record.sources.iter().zip(&record.passages).enumerate() {
            Output::source(i + 1, source, &scored.passage.text);
        }
    }

    Ok(())
}
