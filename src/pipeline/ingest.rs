//! Ingestion: source → passages → embeddings → stored index.

use super::profile::SourceProfiles;
use crate::chunking::TextSplitter;
use crate::embedding::Embedder;
use crate::error::{DocqaError, Result};
use crate::extract::{Extractors, SourceDescriptor};
use crate::index::{DocumentHandle, IndexStore, VectorIndex};
use crate::retry::RetryPolicy;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Builds vector indexes from sources and stores them.
///
/// Nothing is written to the store until an index is fully built, so a
/// failure at any stage leaves previous entries untouched.
pub struct Ingestor {
    extractors: Extractors,
    embedder: Arc<dyn Embedder>,
    store: Arc<IndexStore>,
    profiles: SourceProfiles,
    retry: RetryPolicy,
}

impl Ingestor {
    pub fn new(
        extractors: Extractors,
        embedder: Arc<dyn Embedder>,
        store: Arc<IndexStore>,
        profiles: SourceProfiles,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            extractors,
            embedder,
            store,
            profiles,
            retry,
        }
    }

    /// Ingest `source` and return the handle of its index.
    ///
    /// Cacheable sources already in the store are returned without any
    /// extraction or embedding unless `force_refresh` is set. Concurrent
    /// ingestions of the same cacheable source collapse into one build.
    #[instrument(skip(self, source), fields(kind = %source.kind(), source = %source.label()))]
    pub async fn ingest(&self, source: &SourceDescriptor, force_refresh: bool) -> Result<DocumentHandle> {
        let profile = self.profiles.for_kind(source.kind());
        let cache_key = profile.cache_key(source);
        let use_cache = profile.cacheable && !force_refresh;

        if use_cache {
            if let Some(handle) = self.cached(cache_key).await {
                info!("Source already indexed, reusing {}", handle);
                return Ok(handle);
            }
        }

        let _guard = self.store.lock_for_build(cache_key).await;

        // Another request may have finished the same build while we waited.
        if use_cache {
            if let Some(handle) = self.cached(cache_key).await {
                info!("Source indexed by a concurrent request, reusing {}", handle);
                return Ok(handle);
            }
        }

        let segments = self
            .retry
            .run("extraction", || self.extractors.extract(source))
            .await?;

        let passages = TextSplitter::new(profile.chunking).split_segments(&segments);
        if passages.is_empty() {
            return Err(DocqaError::EmptyInput(format!(
                "no text to index from {}",
                source.label()
            )));
        }
        info!("Created {} passages", passages.len());

        let texts: Vec<String> = passages.iter().map(|p| p.text.clone()).collect();
        let vectors = self.embedder.embed_batch(&texts).await?;
        if vectors.len() != passages.len() {
            return Err(DocqaError::Embedding(format!(
                "expected {} embeddings, got {}",
                passages.len(),
                vectors.len()
            )));
        }
        debug!("Embedded {} passages with {}", passages.len(), self.embedder.model_id());

        let index = VectorIndex::build(
            vectors.into_iter().zip(passages).collect(),
            self.embedder.model_id(),
        )?;

        let handle = profile.handle_for(source);
        Ok(self.store.insert(handle, index).await)
    }

    async fn cached(&self, cache_key: Option<&str>) -> Option<DocumentHandle> {
        let handle = DocumentHandle::from(cache_key?);
        self.store.contains(&handle).await.then_some(handle)
    }
}
