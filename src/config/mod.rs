//! Configuration module for docqa.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{Prompts, RagPrompts};
pub use settings::{
    ChunkSizing, ChunkingSettings, EmbeddingSettings, GeneralSettings, GenerationSettings,
    PromptSettings, RagSettings, RetrySettings, ServerSettings, Settings, StorePolicy,
    StoreSettings, YoutubeSettings,
};
