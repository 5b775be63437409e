//! Configuration settings for docqa.

use crate::error::{DocqaError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub server: ServerSettings,
    pub embedding: EmbeddingSettings,
    pub generation: GenerationSettings,
    pub chunking: ChunkingSettings,
    pub store: StoreSettings,
    pub rag: RagSettings,
    pub youtube: YoutubeSettings,
    pub retry: RetrySettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Log level without `-v` flags (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// "*" or a comma-separated list of origins.
    pub allowed_origins: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            allowed_origins: "*".to_string(),
        }
    }
}

/// Embedding generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Embedding model to use.
    pub model: String,
    /// Embedding dimensions.
    pub dimensions: u32,
    /// OpenAI-compatible API base URL (defaults to api.openai.com).
    pub api_base: Option<String>,
    /// Texts sent per embeddings request.
    pub batch_size: usize,
    /// Request timeout for embedding calls.
    pub timeout_seconds: u64,
}

impl EmbeddingSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            model: "text-embedding-3-small".to_string(),
            dimensions: 1536,
            api_base: None,
            batch_size: 100,
            timeout_seconds: 300,
        }
    }
}

/// Answer generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    /// Chat model used to answer questions.
    pub model: String,
    pub temperature: f32,
    /// OpenAI-compatible API base URL (defaults to api.openai.com).
    pub api_base: Option<String>,
    /// Request timeout for generation calls.
    pub timeout_seconds: u64,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            temperature: 0.5,
            api_base: None,
            timeout_seconds: 300,
        }
    }
}

/// Character-based chunk sizing for one kind of source.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChunkSizing {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

/// Content chunking settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    /// PDFs, text files and inline text.
    pub document: ChunkSizing,
    /// Video transcripts (denser, no page structure).
    pub transcript: ChunkSizing,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self {
            document: ChunkSizing {
                chunk_size: 1000,
                chunk_overlap: 200,
            },
            transcript: ChunkSizing {
                chunk_size: 500,
                chunk_overlap: 200,
            },
        }
    }
}

/// Lifecycle policy of the index store.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StorePolicy {
    /// Storing an index clears every other entry.
    SingleSlot,
    /// Storing an index replaces only the entry with the same handle.
    #[default]
    PerSource,
}

impl std::str::FromStr for StorePolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "single_slot" | "single" => Ok(StorePolicy::SingleSlot),
            "per_source" | "multi_slot" | "multi" => Ok(StorePolicy::PerSource),
            _ => Err(format!("Unknown store policy: {}", s)),
        }
    }
}

impl std::fmt::Display for StorePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorePolicy::SingleSlot => write!(f, "single_slot"),
            StorePolicy::PerSource => write!(f, "per_source"),
        }
    }
}

/// Index store settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StoreSettings {
    pub policy: StorePolicy,
    /// Maximum number of indexes kept; oldest-built are evicted first.
    pub max_entries: Option<usize>,
    /// Indexes older than this are treated as absent.
    pub ttl_seconds: Option<u64>,
}

/// RAG (Retrieval-Augmented Generation) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagSettings {
    /// Number of passages retrieved per question.
    pub top_k: usize,
    /// Sentinel the model must reply with when the context lacks the answer.
    pub unknown_answer: String,
    /// Upper bound on the assembled context. Unset means no truncation.
    pub max_context_chars: Option<usize>,
}

impl Default for RagSettings {
    fn default() -> Self {
        Self {
            top_k: 4,
            unknown_answer: "I don't know".to_string(),
            max_context_chars: None,
        }
    }
}

/// YouTube transcript settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct YoutubeSettings {
    /// yt-dlp executable.
    pub ytdlp_path: String,
    /// Caption languages in order of preference.
    pub languages: Vec<String>,
}

impl Default for YoutubeSettings {
    fn default() -> Self {
        Self {
            ytdlp_path: "yt-dlp".to_string(),
            languages: vec!["en".to_string()],
        }
    }
}

/// Retry settings for generator and extractor calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    /// Total attempts per call; 1 disables retrying.
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff_ms: 500,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        let settings = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Settings::default()
        };

        settings.validate()?;
        Ok(settings)
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| DocqaError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("docqa")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Reject settings the pipelines cannot run with.
    pub fn validate(&self) -> Result<()> {
        for (name, sizing) in [
            ("chunking.document", &self.chunking.document),
            ("chunking.transcript", &self.chunking.transcript),
        ] {
            if sizing.chunk_size == 0 {
                return Err(DocqaError::Config(format!("{}.chunk_size must be positive", name)));
            }
            if sizing.chunk_overlap >= sizing.chunk_size {
                return Err(DocqaError::Config(format!(
                    "{}.chunk_overlap ({}) must be smaller than chunk_size ({})",
                    name, sizing.chunk_overlap, sizing.chunk_size
                )));
            }
        }
        if self.rag.top_k == 0 {
            return Err(DocqaError::Config("rag.top_k must be positive".to_string()));
        }
        if self.retry.max_attempts == 0 {
            return Err(DocqaError::Config("retry.max_attempts must be at least 1".to_string()));
        }
        if self.store.max_entries == Some(0) {
            return Err(DocqaError::Config("store.max_entries must be at least 1".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.chunking.document.chunk_size, 1000);
        assert_eq!(settings.chunking.document.chunk_overlap, 200);
        assert_eq!(settings.chunking.transcript.chunk_size, 500);
        assert_eq!(settings.rag.top_k, 4);
        assert_eq!(settings.store.policy, StorePolicy::PerSource);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [store]
            policy = "single_slot"
            max_entries = 8

            [rag]
            top_k = 6
            "#,
        )
        .unwrap();

        assert_eq!(settings.store.policy, StorePolicy::SingleSlot);
        assert_eq!(settings.store.max_entries, Some(8));
        assert_eq!(settings.rag.top_k, 6);
        assert_eq!(settings.embedding.timeout(), Duration::from_secs(300));
        assert_eq!(settings.rag.unknown_answer, "I don't know");
        assert_eq!(settings.chunking.transcript.chunk_size, 500);
    }

    #[test]
    fn test_embedding_timeout_is_independent() {
        let settings: Settings = toml::from_str(
            r#"
            [embedding]
            timeout_seconds = 30

            [generation]
            timeout_seconds = 120
            "#,
        )
        .unwrap();

        assert_eq!(settings.embedding.timeout(), Duration::from_secs(30));
        assert_eq!(settings.generation.timeout_seconds, 120);
    }

    #[test]
    fn test_overlap_must_be_smaller_than_size() {
        let mut settings = Settings::default();
        settings.chunking.transcript.chunk_overlap = 500;
        assert!(matches!(settings.validate(), Err(DocqaError::Config(_))));
    }

    #[test]
    fn test_store_policy_parse() {
        assert_eq!("single-slot".parse::<StorePolicy>().unwrap(), StorePolicy::SingleSlot);
        assert_eq!("multi_slot".parse::<StorePolicy>().unwrap(), StorePolicy::PerSource);
        assert!("lru".parse::<StorePolicy>().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut settings = Settings::default();
        settings.rag.unknown_answer = "No idea".to_string();
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.rag.unknown_answer, "No idea");
    }
}
