//! Answering: question → retrieved passages → grounded answer.

use crate::config::{Prompts, RagSettings};
use crate::embedding::Embedder;
use crate::error::{DocqaError, Result};
use crate::generation::Generator;
use crate::index::{DocumentHandle, IndexStore, ScoredPassage, VectorIndex};
use crate::retry::RetryPolicy;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Everything produced while answering one question.
#[derive(Debug, Clone, Serialize)]
pub struct AnswerRecord {
    pub question: String,
    pub handle: DocumentHandle,
    /// Retrieved passages, nearest first.
    #[serde(skip)]
    pub passages: Vec<ScoredPassage>,
    pub context: String,
    pub answer: String,
    /// One provenance string per passage, in retrieval order.
    pub sources: Vec<String>,
}

impl AnswerRecord {
    /// The caller-facing `(answer, sources)` pair.
    pub fn into_parts(self) -> (String, Vec<String>) {
        (self.answer, self.sources)
    }
}

/// Answers questions against indexes in the store. Never mutates the store.
pub struct Answerer {
    embedder: Arc<dyn Embedder>,
    generator: Arc<dyn Generator>,
    store: Arc<IndexStore>,
    prompts: Prompts,
    settings: RagSettings,
    retry: RetryPolicy,
}

impl Answerer {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
        store: Arc<IndexStore>,
        prompts: Prompts,
        settings: RagSettings,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            embedder,
            generator,
            store,
            prompts,
            settings,
            retry,
        }
    }

    /// Answer `question` from the index named by `handle`, or the default index.
    #[instrument(skip(self), fields(question = %question))]
    pub async fn answer(&self, question: &str, handle: Option<&DocumentHandle>) -> Result<AnswerRecord> {
        let question = question.trim();
        if question.is_empty() {
            return Err(DocqaError::EmptyInput("question is empty".to_string()));
        }

        let (handle, index) = self.store.resolve(handle).await?;
        self.check_embedder(&index)?;

        let query = self.embedder.embed(question).await?;
        if query.len() != index.dimensions() {
            return Err(DocqaError::EmbeddingMismatch {
                indexed: format!("{} ({} dims)", index.embedding_model(), index.dimensions()),
                query: format!("{} ({} dims)", self.embedder.model_id(), query.len()),
            });
        }

        let passages = self.limit_context(index.search(&query, self.settings.top_k));
        info!("Retrieved {} passages from {}", passages.len(), handle);

        let context = passages
            .iter()
            .map(|scored| scored.passage.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        let prompt = self
            .prompts
            .render_answer(&context, question, &self.settings.unknown_answer);

        let answer = self
            .retry
            .run("generation", || self.generator.generate(&prompt))
            .await?;
        debug!("Generated answer with {}", self.generator.model_id());

        let sources = passages
            .iter()
            .map(|scored| scored.passage.source_or_empty())
            .collect();

        Ok(AnswerRecord {
            question: question.to_string(),
            handle,
            passages,
            context,
            answer,
            sources,
        })
    }

    fn check_embedder(&self, index: &VectorIndex) -> Result<()> {
        if index.embedding_model() != self.embedder.model_id() {
            return Err(DocqaError::EmbeddingMismatch {
                indexed: index.embedding_model().to_string(),
                query: self.embedder.model_id().to_string(),
            });
        }
        Ok(())
    }

    /// Drop trailing passages that would push the context past `max_context_chars`.
    ///
    /// The nearest passage is always kept.
    fn limit_context(&self, passages: Vec<ScoredPassage>) -> Vec<ScoredPassage> {
        let Some(limit) = self.settings.max_context_chars else {
            return passages;
        };

        let mut used = 0;
        let mut kept = Vec::with_capacity(passages.len());
        for scored in passages {
            let cost = scored.passage.text.chars().count() + usize::from(!kept.is_empty());
            if !kept.is_empty() && used + cost > limit {
                debug!("Context limit of {} characters reached", limit);
                break;
            }
            used += cost;
            kept.push(scored);
        }
        kept
    }
}
