//! Ingestion and answering pipelines.
//!
//! One parametrized pipeline serves every source kind; per-kind tuning
//! (chunk sizes, handle choice, caching) lives in [`SourceProfile`].
//! [`RagService`] wires both pipelines to a shared embedder and index store
//! and exposes the operations the HTTP layer and CLI call.

mod answer;
mod ingest;
mod profile;

pub use answer::{AnswerRecord, Answerer};
pub use ingest::Ingestor;
pub use profile::{HandleStrategy, SourceProfile, SourceProfiles};

use crate::config::{Prompts, Settings};
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::Result;
use crate::extract::{parse_video_url, Extractors, SourceDescriptor};
use crate::generation::{Generator, OpenAIGenerator};
use crate::index::{DocumentHandle, IndexStore};
use crate::retry::RetryPolicy;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Document question answering over an in-memory index store.
pub struct RagService {
    ingestor: Ingestor,
    answerer: Answerer,
    store: Arc<IndexStore>,
}

impl RagService {
    /// Assemble the service from explicit components.
    ///
    /// The embedder is shared by both pipelines so passages and questions
    /// are always embedded by the same model.
    pub fn new(
        settings: &Settings,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
        extractors: Extractors,
    ) -> Result<Self> {
        settings.validate()?;

        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;
        let store = Arc::new(IndexStore::from_settings(&settings.store));
        let retry = RetryPolicy::from(&settings.retry);

        let ingestor = Ingestor::new(
            extractors,
            embedder.clone(),
            store.clone(),
            SourceProfiles::from_settings(settings)?,
            retry,
        );
        let answerer = Answerer::new(
            embedder,
            generator,
            store.clone(),
            prompts,
            settings.rag.clone(),
            retry,
        );

        info!(
            policy = %store.policy(),
            top_k = settings.rag.top_k,
            "RAG service ready"
        );

        Ok(Self {
            ingestor,
            answerer,
            store,
        })
    }

    /// Build the service with the OpenAI embedder and generator and the
    /// built-in extractors.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let embedder: Arc<dyn Embedder> = Arc::new(OpenAIEmbedder::from_settings(settings)?);
        let generator: Arc<dyn Generator> = Arc::new(OpenAIGenerator::from_settings(settings)?);
        Self::new(settings, embedder, generator, Extractors::standard(settings))
    }

    pub fn store(&self) -> &Arc<IndexStore> {
        &self.store
    }

    /// Ingest any source descriptor.
    pub async fn ingest(&self, source: &SourceDescriptor, force_refresh: bool) -> Result<DocumentHandle> {
        self.ingestor.ingest(source, force_refresh).await
    }

    pub async fn ingest_from_pdf(&self, path: impl AsRef<Path>) -> Result<DocumentHandle> {
        let source = SourceDescriptor::Pdf {
            path: path.as_ref().to_path_buf(),
        };
        self.ingest(&source, false).await
    }

    pub async fn ingest_from_text_file(&self, path: impl AsRef<Path>) -> Result<DocumentHandle> {
        let source = SourceDescriptor::TextFile {
            path: path.as_ref().to_path_buf(),
        };
        self.ingest(&source, false).await
    }

    pub async fn ingest_from_plain_text(&self, text: &str) -> Result<DocumentHandle> {
        let source = SourceDescriptor::PlainText {
            text: text.to_string(),
            source: None,
        };
        self.ingest(&source, false).await
    }

    /// Index a video transcript, keyed by its URL.
    ///
    /// An already indexed URL is a cache hit unless `force_refresh` is set.
    pub async fn ingest_from_video(&self, url: &str, force_refresh: bool) -> Result<DocumentHandle> {
        parse_video_url(url)?;
        let source = SourceDescriptor::Video {
            url: url.trim().to_string(),
        };
        self.ingest(&source, force_refresh).await
    }

    /// Answer a question from `handle`'s index, or the most recent one.
    pub async fn answer(&self, question: &str, handle: Option<&DocumentHandle>) -> Result<AnswerRecord> {
        self.answerer.answer(question, handle).await
    }
}
