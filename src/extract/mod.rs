//! Source extraction.
//!
//! Turns a source descriptor (PDF path, text file path, inline text, video
//! URL) into raw text segments ready for chunking. Extractors are pluggable
//! and registered per source kind.

mod files;
mod pdf;
mod youtube;

pub use files::{resolve_path, PlainTextExtractor, TextFileExtractor};
pub use pdf::PdfExtractor;
pub use youtube::{parse_json3, parse_video_url, select_caption_track, YoutubeTranscriptExtractor};

use crate::chunking::SourceText;
use crate::config::Settings;
use crate::error::{DocqaError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

/// Kind of source being ingested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Pdf,
    TextFile,
    PlainText,
    Video,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceKind::Pdf => write!(f, "pdf"),
            SourceKind::TextFile => write!(f, "text_file"),
            SourceKind::PlainText => write!(f, "plain_text"),
            SourceKind::Video => write!(f, "video"),
        }
    }
}

/// What to ingest.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceDescriptor {
    Pdf { path: PathBuf },
    TextFile { path: PathBuf },
    /// Inline text; `source` defaults to "inline-text".
    PlainText { text: String, source: Option<String> },
    Video { url: String },
}

impl SourceDescriptor {
    pub fn kind(&self) -> SourceKind {
        match self {
            SourceDescriptor::Pdf { .. } => SourceKind::Pdf,
            SourceDescriptor::TextFile { .. } => SourceKind::TextFile,
            SourceDescriptor::PlainText { .. } => SourceKind::PlainText,
            SourceDescriptor::Video { .. } => SourceKind::Video,
        }
    }

    /// Short description for logs.
    pub fn label(&self) -> String {
        match self {
            SourceDescriptor::Pdf { path } | SourceDescriptor::TextFile { path } => {
                path.display().to_string()
            }
            SourceDescriptor::PlainText { text, .. } => format!("<{} chars of text>", text.len()),
            SourceDescriptor::Video { url } => url.clone(),
        }
    }
}

/// Produces raw text segments from a source.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Extract the source's text.
    ///
    /// Missing sources are `SourceNotFound`, sources without text are
    /// `EmptyInput`, and videos without captions are `TranscriptUnavailable`.
    async fn extract(&self, source: &SourceDescriptor) -> Result<Vec<SourceText>>;
}

/// Extractors keyed by source kind.
#[derive(Clone, Default)]
pub struct Extractors {
    by_kind: HashMap<SourceKind, Arc<dyn Extractor>>,
}

impl Extractors {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in extractor for every source kind.
    pub fn standard(settings: &Settings) -> Self {
        Self::new()
            .with(SourceKind::Pdf, Arc::new(PdfExtractor::new()))
            .with(SourceKind::TextFile, Arc::new(TextFileExtractor::new()))
            .with(SourceKind::PlainText, Arc::new(PlainTextExtractor::new()))
            .with(
                SourceKind::Video,
                Arc::new(YoutubeTranscriptExtractor::from_settings(&settings.youtube)),
            )
    }

    /// Register (or replace) the extractor for `kind`.
    pub fn with(mut self, kind: SourceKind, extractor: Arc<dyn Extractor>) -> Self {
        self.by_kind.insert(kind, extractor);
        self
    }

    pub fn get(&self, kind: SourceKind) -> Result<Arc<dyn Extractor>> {
        self.by_kind
            .get(&kind)
            .cloned()
            .ok_or_else(|| DocqaError::InvalidSource(format!("unsupported source kind: {}", kind)))
    }

    pub async fn extract(&self, source: &SourceDescriptor) -> Result<Vec<SourceText>> {
        self.get(source.kind())?.extract(source).await
    }
}

/// Error for an extractor handed a descriptor of another kind.
pub(crate) fn wrong_kind(expected: SourceKind, source: &SourceDescriptor) -> DocqaError {
    DocqaError::InvalidSource(format!(
        "{} extractor cannot read a {} source",
        expected,
        source.kind()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unregistered_kind_is_invalid_source() {
        let extractors = Extractors::new().with(SourceKind::PlainText, Arc::new(PlainTextExtractor::new()));

        let result = extractors
            .extract(&SourceDescriptor::Video {
                url: "https://youtu.be/dQw4w9WgXcQ".to_string(),
            })
            .await;
        assert!(matches!(result, Err(DocqaError::InvalidSource(_))));

        let segments = extractors
            .extract(&SourceDescriptor::PlainText {
                text: "hello".to_string(),
                source: None,
            })
            .await
            .unwrap();
        assert_eq!(segments[0].source.as_deref(), Some("inline-text"));
    }

    #[test]
    fn test_descriptor_kind_and_label() {
        let pdf = SourceDescriptor::Pdf {
            path: PathBuf::from("/tmp/report.pdf"),
        };
        assert_eq!(pdf.kind(), SourceKind::Pdf);
        assert_eq!(pdf.label(), "/tmp/report.pdf");

        let text = SourceDescriptor::PlainText {
            text: "abc".to_string(),
            source: None,
        };
        assert_eq!(text.kind(), SourceKind::PlainText);
        assert_eq!(text.label(), "<3 chars of text>");
    }
}
