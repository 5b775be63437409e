//! In-memory vector indexes and the store that owns them.

mod store;

pub use store::{BuildGuard, DocumentHandle, EvictionPolicy, IndexInfo, IndexStore};
pub use crate::config::StorePolicy;

use crate::chunking::Passage;
use crate::error::{DocqaError, Result};

/// A passage returned by a similarity query.
#[derive(Debug, Clone)]
pub struct ScoredPassage {
    pub passage: Passage,
    /// Cosine similarity to the query (higher is nearer).
    pub score: f32,
}

/// Immutable collection of (embedding, passage) pairs built from one source.
#[derive(Debug)]
pub struct VectorIndex {
    vectors: Vec<Vec<f32>>,
    passages: Vec<Passage>,
    embedding_model: String,
    dimensions: usize,
}

impl VectorIndex {
    /// Build an index from embedded passages.
    ///
    /// Fails with `EmptyInput` when there is nothing to index and with
    /// `Embedding` when vectors disagree on dimension.
    pub fn build(
        entries: Vec<(Vec<f32>, Passage)>,
        embedding_model: impl Into<String>,
    ) -> Result<Self> {
        let dimensions = match entries.first() {
            Some((vector, _)) => vector.len(),
            None => {
                return Err(DocqaError::EmptyInput(
                    "an index cannot be built from zero passages".to_string(),
                ))
            }
        };

        if dimensions == 0 {
            return Err(DocqaError::Embedding("received zero-length embeddings".to_string()));
        }

        let (vectors, passages): (Vec<_>, Vec<_>) = entries.into_iter().unzip();

        if let Some(pos) = vectors.iter().position(|v| v.len() != dimensions) {
            return Err(DocqaError::Embedding(format!(
                "embedding {} has {} dimensions, expected {}",
                pos,
                vectors[pos].len(),
                dimensions
            )));
        }

        Ok(Self {
            vectors,
            passages,
            embedding_model: embedding_model.into(),
            dimensions,
        })
    }

    /// Return the `k` passages nearest to `query`, nearest first.
    ///
    /// Ties keep insertion order, so results are deterministic for fixed vectors.
    pub fn search(&self, query: &[f32], k: usize) -> Vec<ScoredPassage> {
        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(i, vector)| (i, cosine_similarity(query, vector)))
            .collect();

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);

        scored
            .into_iter()
            .map(|(i, score)| ScoredPassage {
                passage: self.passages[i].clone(),
                score,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.passages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }

    pub fn passages(&self) -> &[Passage] {
        &self.passages
    }

    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}
