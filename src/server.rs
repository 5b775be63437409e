//! HTTP API over the RAG service.
//!
//! Every endpoint maps onto one [`RagService`] operation; request and
//! response bodies are JSON and errors are `{"error": "<message>"}`.

use crate::error::DocqaError;
use crate::index::{DocumentHandle, IndexInfo, StorePolicy};
use crate::pipeline::RagService;
use axum::{
    extract::State,
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, Any, CorsLayer};
use tracing::{error, warn};

/// Shared application state.
struct AppState {
    service: Arc<RagService>,
}

/// Build the API router.
pub fn router(service: Arc<RagService>, allowed_origins: &str) -> Router {
    let state = Arc::new(AppState { service });

    Router::new()
        .route("/health", get(health))
        .route("/prepare", post(prepare))
        .route("/ask", post(ask))
        .route("/documents/pdf", post(ingest_pdf))
        .route("/documents/text-file", post(ingest_text_file))
        .route("/documents/text", post(ingest_text))
        .route("/indexes", get(list_indexes))
        .layer(cors_layer(allowed_origins))
        .with_state(state)
}

/// CORS for `allowed_origins`: `"*"` allows any origin without credentials,
/// a comma-separated list allows exactly those origins with credentials.
pub fn cors_layer(allowed_origins: &str) -> CorsLayer {
    if allowed_origins.trim() == "*" {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty() && *origin != "*")
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct PrepareRequest {
    youtube_url: String,
    #[serde(default)]
    force_refresh: bool,
}

#[derive(Serialize)]
struct PrepareResponse {
    status: &'static str,
    document_id: DocumentHandle,
}

#[derive(Deserialize)]
struct AskRequest {
    question: String,
    #[serde(default)]
    youtube_url: Option<String>,
    #[serde(default)]
    document_id: Option<String>,
}

#[derive(Serialize)]
struct AskResponse {
    answer: String,
    sources: Vec<String>,
}

#[derive(Deserialize)]
struct PathRequest {
    path: PathBuf,
}

#[derive(Deserialize)]
struct TextRequest {
    text: String,
}

#[derive(Serialize)]
struct DocumentResponse {
    document_id: DocumentHandle,
}

#[derive(Serialize)]
struct IndexListResponse {
    policy: StorePolicy,
    indexes: Vec<IndexInfo>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// A pipeline error rendered as an HTTP response.
struct ApiError(DocqaError);

impl From<DocqaError> for ApiError {
    fn from(err: DocqaError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            error!("Request failed: {}", self.0);
        }
        (
            status,
            Json(ErrorResponse {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

/// HTTP status for a pipeline error.
pub fn status_for(err: &DocqaError) -> StatusCode {
    match err {
        DocqaError::UnknownHandle(_) | DocqaError::NoIndex | DocqaError::SourceNotFound(_) => {
            StatusCode::NOT_FOUND
        }
        DocqaError::EmptyInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
        DocqaError::InvalidSource(_) | DocqaError::Config(_) => StatusCode::BAD_REQUEST,
        DocqaError::Extraction(_)
        | DocqaError::TranscriptUnavailable(_)
        | DocqaError::Generation(_)
        | DocqaError::Embedding(_)
        | DocqaError::OpenAI(_)
        | DocqaError::Http(_) => StatusCode::BAD_GATEWAY,
        DocqaError::EmbeddingMismatch { .. }
        | DocqaError::Io(_)
        | DocqaError::Json(_)
        | DocqaError::TomlParse(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn prepare(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PrepareRequest>,
) -> Result<Json<PrepareResponse>, ApiError> {
    let document_id = state
        .service
        .ingest_from_video(&req.youtube_url, req.force_refresh)
        .await?;

    Ok(Json(PrepareResponse {
        status: "ready",
        document_id,
    }))
}

async fn ask(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AskRequest>,
) -> Result<Json<AskResponse>, ApiError> {
    let handle = match (req.youtube_url, req.document_id) {
        (Some(_), Some(_)) => {
            return Err(DocqaError::InvalidSource(
                "provide either youtube_url or document_id, not both".to_string(),
            )
            .into())
        }
        (Some(url), None) => Some(state.service.ingest_from_video(&url, false).await?),
        (None, Some(id)) => Some(DocumentHandle::from(id)),
        (None, None) => None,
    };

    let (answer, sources) = state
        .service
        .answer(&req.question, handle.as_ref())
        .await?
        .into_parts();

    Ok(Json(AskResponse { answer, sources }))
}

async fn ingest_pdf(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PathRequest>,
) -> Result<Json<DocumentResponse>, ApiError> {
    let document_id = state.service.ingest_from_pdf(&req.path).await?;
    Ok(Json(DocumentResponse { document_id }))
}

async fn ingest_text_file(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PathRequest>,
) -> Result<Json<DocumentResponse>, ApiError> {
    let document_id = state.service.ingest_from_text_file(&req.path).await?;
    Ok(Json(DocumentResponse { document_id }))
}

async fn ingest_text(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TextRequest>,
) -> Result<Json<DocumentResponse>, ApiError> {
    let document_id = state.service.ingest_from_plain_text(&req.text).await?;
    Ok(Json(DocumentResponse { document_id }))
}

async fn list_indexes(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let store = state.service.store();
    Json(IndexListResponse {
        policy: store.policy(),
        indexes: store.list().await,
    })
}
