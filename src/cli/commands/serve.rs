//! Serve command: run the HTTP API.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::pipeline::RagService;
use crate::server;
use std::sync::Arc;
use tracing::info;

/// Run the HTTP API server.
pub async fn run_serve(
    host: Option<String>,
    port: Option<u16>,
    allowed_origins: Option<String>,
    settings: Settings,
) -> anyhow::Result<()> {
    if let Err(e) = preflight::check(Operation::Serve, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'docqa doctor' for detailed diagnostics.");
        return Err(e.into());
    }
    if let Err(e) = preflight::check_tool(&settings.youtube.ytdlp_path) {
        Output::warning(&format!("{} (video endpoints will fail)", e));
    }

    let host = host.unwrap_or_else(|| settings.server.host.clone());
    let port = port.unwrap_or(settings.server.port);
    let allowed_origins = allowed_origins.unwrap_or_else(|| settings.server.allowed_origins.clone());

    let service = Arc::new(RagService::from_settings(&settings)?);
    let app = server::router(service, &allowed_origins);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    Output::header("docqa API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    Output::kv("Store policy", &settings.store.policy.to_string());
    Output::kv("Allowed origins", &allowed_origins);
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("Prepare video", "POST /prepare");
    Output::kv("Ask", "POST /ask");
    Output::kv("Index PDF", "POST /documents/pdf");
    Output::kv("Index text file", "POST /documents/text-file");
    Output::kv("Index text", "POST /documents/text");
    Output::kv("List indexes", "GET  /indexes");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}
