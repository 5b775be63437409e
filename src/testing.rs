//! Deterministic test doubles for the pipelines.

use crate::chunking::SourceText;
use crate::config::Settings;
use crate::embedding::Embedder;
use crate::error::{DocqaError, Result};
use crate::extract::{Extractor, Extractors, SourceDescriptor, SourceKind};
use crate::generation::{Generator, GeneratorOutput};
use crate::pipeline::RagService;
use async_trait::async_trait;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashSet;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "does", "did", "do", "for", "how", "in", "is", "it", "of", "on",
    "the", "to", "was", "what", "when", "where", "which", "who", "why",
];

/// Lowercased alphanumeric words.
pub fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn content_words(text: &str) -> HashSet<String> {
    words(text)
        .into_iter()
        .filter(|w| !STOPWORDS.contains(&w.as_str()))
        .collect()
}

/// Bag-of-words embedder hashing each word into a fixed-size vector.
pub struct HashEmbedder {
    dimensions: usize,
    batch_calls: AtomicUsize,
    query_calls: AtomicUsize,
    failing: AtomicBool,
}

impl HashEmbedder {
    pub const MODEL: &'static str = "hash-embedder";

    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            batch_calls: AtomicUsize::new(0),
            query_calls: AtomicUsize::new(0),
            failing: AtomicBool::new(false),
        }
    }

    pub fn batch_calls(&self) -> usize {
        self.batch_calls.load(Ordering::SeqCst)
    }

    pub fn query_calls(&self) -> usize {
        self.query_calls.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn vector(&self, text: &str) -> Result<Vec<f32>> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(DocqaError::Embedding("embedding service unavailable".to_string()));
        }
        let mut vector = vec![0.0; self.dimensions];
        for word in words(text) {
            let mut hasher = DefaultHasher::new();
            word.hash(&mut hasher);
            vector[(hasher.finish() % self.dimensions as u64) as usize] += 1.0;
        }
        Ok(vector)
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.query_calls.fetch_add(1, Ordering::SeqCst);
        self.vector(text)
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        texts.iter().map(|text| self.vector(text)).collect()
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_id(&self) -> &str {
        Self::MODEL
    }
}

/// Answers with the context sentence sharing the most words with the
/// question, or the unknown sentinel when none overlaps.
///
/// Reads the context and question back out of the default answer prompt.
pub struct ExtractiveGenerator {
    unknown: String,
}

impl ExtractiveGenerator {
    pub fn new(unknown: impl Into<String>) -> Self {
        Self {
            unknown: unknown.into(),
        }
    }
}

fn section<'a>(prompt: &'a str, start: &str, end: &str) -> &'a str {
    prompt
        .split_once(start)
        .map(|(_, rest)| rest.split_once(end).map_or(rest, |(section, _)| section))
        .unwrap_or("")
}

#[async_trait]
impl Generator for ExtractiveGenerator {
    async fn complete(&self, prompt: &str) -> Result<GeneratorOutput> {
        let context = section(prompt, "Context: ", "\nQuestion: ");
        let question = content_words(section(prompt, "\nQuestion: ", "\n"));

        let best = context
            .split(|c: char| matches!(c, '.' | '?' | '!' | '\n'))
            .map(str::trim)
            .filter(|sentence| !sentence.is_empty())
            .map(|sentence| (content_words(sentence).intersection(&question).count(), sentence))
            .filter(|(overlap, _)| *overlap > 0)
            .fold(None::<(usize, &str)>, |best, candidate| match best {
                Some(b) if b.0 >= candidate.0 => Some(b),
                _ => Some(candidate),
            });

        Ok(GeneratorOutput::Text(match best {
            Some((_, sentence)) => format!("{}.", sentence),
            None => self.unknown.clone(),
        }))
    }

    fn model_id(&self) -> &str {
        "extractive"
    }
}

enum Script {
    Transcript(String),
    Unavailable,
}

/// Video extractor returning a scripted transcript and counting calls.
pub struct ScriptedVideoExtractor {
    script: Mutex<Script>,
    calls: AtomicUsize,
}

impl ScriptedVideoExtractor {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(Script::Transcript("Default transcript.".to_string())),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn set_transcript(&self, text: &str) {
        *self.script.lock().unwrap() = Script::Transcript(text.to_string());
    }

    pub fn fail_with_unavailable(&self) {
        *self.script.lock().unwrap() = Script::Unavailable;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Extractor for ScriptedVideoExtractor {
    async fn extract(&self, source: &SourceDescriptor) -> Result<Vec<SourceText>> {
        let SourceDescriptor::Video { url } = source else {
            return Err(DocqaError::InvalidSource("expected a video".to_string()));
        };
        self.calls.fetch_add(1, Ordering::SeqCst);

        // Yield so concurrent requests overlap with this build.
        tokio::time::sleep(Duration::from_millis(20)).await;

        let text = match &*self.script.lock().unwrap() {
            Script::Transcript(text) => text.clone(),
            Script::Unavailable => {
                return Err(DocqaError::TranscriptUnavailable(format!("no captions for {}", url)))
            }
        };
        Ok(vec![SourceText::new(text, Some(url.clone()))])
    }
}

/// A service wired to test doubles, with handles on the doubles.
pub struct TestService {
    pub service: RagService,
    pub embedder: Arc<HashEmbedder>,
    pub videos: Arc<ScriptedVideoExtractor>,
}

/// Build a [`RagService`] using the real document extractors and doubles
/// for embedding, generation and video transcripts.
pub fn service(settings: Settings) -> TestService {
    let embedder = Arc::new(HashEmbedder::new(256));
    let videos = Arc::new(ScriptedVideoExtractor::new());
    let generator = Arc::new(ExtractiveGenerator::new(settings.rag.unknown_answer.clone()));
    let extractors = Extractors::standard(&settings).with(SourceKind::Video, videos.clone());

    let service = RagService::new(&settings, embedder.clone(), generator, extractors)
        .expect("test settings are valid");

    TestService {
        service,
        embedder,
        videos,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_extractive_generator() {
        let generator = ExtractiveGenerator::new("I don't know");
        let prompt = crate::config::Prompts::default().render_answer(
            "The sky is blue. Grass is green.",
            "What color is the grass?",
            "I don't know",
        );
        assert_eq!(generator.generate(&prompt).await.unwrap(), "Grass is green.");

        let prompt = crate::config::Prompts::default().render_answer(
            "The sky is blue.",
            "Who painted the Mona Lisa?",
            "I don't know",
        );
        assert_eq!(generator.generate(&prompt).await.unwrap(), "I don't know");
    }

    #[tokio::test]
    async fn test_hash_embedder_counts_calls() {
        let embedder = HashEmbedder::new(32);
        let a = embedder.embed("Blue sky").await.unwrap();
        let b = embedder.embed("sky, blue!").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(embedder.query_calls(), 2);

        embedder
            .embed_batch(&["one".to_string(), "two".to_string()])
            .await
            .unwrap();
        assert_eq!(embedder.batch_calls(), 1);
    }
}
