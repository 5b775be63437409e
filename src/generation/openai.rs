//! OpenAI chat completion back-end.

use super::{Generator, GeneratorOutput};
use crate::config::Settings;
use crate::error::{DocqaError, Result};
use crate::openai::create_client;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};

/// Answers prompts with an OpenAI-compatible chat model.
pub struct OpenAIGenerator {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    temperature: f32,
}

impl OpenAIGenerator {
    /// Create a generator from the `[generation]` settings.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let generation = &settings.generation;
        Ok(Self {
            client: create_client(
                generation.api_base.as_deref(),
                Duration::from_secs(generation.timeout_seconds),
            )?,
            model: generation.model.clone(),
            temperature: generation.temperature,
        })
    }
}

#[async_trait]
impl Generator for OpenAIGenerator {
    #[instrument(skip(self, prompt), fields(model = %self.model))]
    async fn complete(&self, prompt: &str) -> Result<GeneratorOutput> {
        let messages: Vec<ChatCompletionRequestMessage> =
            vec![ChatCompletionRequestUserMessageArgs::default()
                .content(prompt.to_string())
                .build()
                .map_err(|e| DocqaError::Generation(e.to_string()))?
                .into()];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(self.temperature)
            .build()
            .map_err(|e| DocqaError::Generation(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| DocqaError::OpenAI(format!("Failed to generate answer: {}", e)))?;

        let message = response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .ok_or_else(|| DocqaError::Generation("Empty response from LLM".to_string()))?;

        debug!("Received completion from {}", self.model);
        Ok(classify_message(serde_json::to_value(&message)?))
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

/// Map a chat response message onto the output variants.
fn classify_message(message: serde_json::Value) -> GeneratorOutput {
    if let Some(text) = message["content"].as_str().filter(|s| !s.trim().is_empty()) {
        return GeneratorOutput::Text(text.to_string());
    }
    if let Some(transcript) = message["audio"]["transcript"]
        .as_str()
        .filter(|s| !s.trim().is_empty())
    {
        return GeneratorOutput::Transcript(transcript.to_string());
    }
    GeneratorOutput::Raw(message)
}
