//! Answer generation.
//!
//! Model back-ends return heterogeneous payloads: plain text, a speech
//! transcript, or an unrecognized structure. [`GeneratorOutput`] captures
//! those shapes and [`Generator::generate`] normalizes them to a string
//! before anything downstream sees them.

mod openai;

pub use openai::OpenAIGenerator;

use crate::error::{DocqaError, Result};
use async_trait::async_trait;

/// Raw output of a generation back-end.
#[derive(Debug, Clone, PartialEq)]
pub enum GeneratorOutput {
    /// Ordinary text completion.
    Text(String),
    /// Transcript of an audio response.
    Transcript(String),
    /// Anything else, as returned by the back-end.
    Raw(serde_json::Value),
}

impl GeneratorOutput {
    /// Normalize to answer text.
    ///
    /// Strings inside `Raw` are taken as-is; other raw values fall back to
    /// their JSON rendering. Blank output is a generation failure.
    pub fn into_text(self) -> Result<String> {
        let text = match self {
            GeneratorOutput::Text(text) | GeneratorOutput::Transcript(text) => text,
            GeneratorOutput::Raw(serde_json::Value::String(text)) => text,
            GeneratorOutput::Raw(serde_json::Value::Null) => String::new(),
            GeneratorOutput::Raw(value) => value.to_string(),
        };

        let text = text.trim();
        if text.is_empty() {
            return Err(DocqaError::Generation(
                "model returned an empty answer".to_string(),
            ));
        }
        Ok(text.to_string())
    }
}

/// A language model that turns a fully rendered prompt into an answer.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Run the prompt and return the back-end's output unchanged.
    async fn complete(&self, prompt: &str) -> Result<GeneratorOutput>;

    /// Run the prompt and return plain answer text.
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.complete(prompt).await?.into_text()
    }

    /// Identifier of the underlying model, for logs.
    fn model_id(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_into_text_variants() {
        assert_eq!(
            GeneratorOutput::Text(" Blue. \n".to_string()).into_text().unwrap(),
            "Blue."
        );
        assert_eq!(
            GeneratorOutput::Transcript("spoken answer".to_string())
                .into_text()
                .unwrap(),
            "spoken answer"
        );
        assert_eq!(
            GeneratorOutput::Raw(json!("raw string")).into_text().unwrap(),
            "raw string"
        );
        assert_eq!(
            GeneratorOutput::Raw(json!({"answer": 42})).into_text().unwrap(),
            r#"{"answer":42}"#
        );
    }

    #[test]
    fn test_blank_output_is_generation_failure() {
        for output in [
            GeneratorOutput::Text("   ".to_string()),
            GeneratorOutput::Transcript(String::new()),
            GeneratorOutput::Raw(serde_json::Value::Null),
        ] {
            assert!(matches!(output.into_text(), Err(DocqaError::Generation(_))));
        }
    }

    struct Fixed(GeneratorOutput);

    #[async_trait]
    impl Generator for Fixed {
        async fn complete(&self, _prompt: &str) -> Result<GeneratorOutput> {
            Ok(self.0.clone())
        }

        fn model_id(&self) -> &str {
            "fixed"
        }
    }

    #[tokio::test]
    async fn test_generate_normalizes() {
        let generator = Fixed(GeneratorOutput::Transcript("It is blue.".to_string()));
        assert_eq!(generator.generate("prompt").await.unwrap(), "It is blue.");
    }
}
