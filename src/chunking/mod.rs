//! Passage chunking for retrieval.
//!
//! Splits extracted text into overlapping passages of bounded size, carrying
//! provenance metadata from the source.

mod recursive;

pub use recursive::TextSplitter;

use crate::config::ChunkSizing;
use crate::error::{DocqaError, Result};
use serde::{Deserialize, Serialize};

/// Provenance string attached to inline text when the caller supplies none.
pub const INLINE_TEXT_SOURCE: &str = "inline-text";

/// A unit of raw text produced by an extractor (a page, a file, a transcript).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceText {
    pub text: String,
    /// Origin of the text (path, URL or inline marker).
    pub source: Option<String>,
    /// Page number for paged sources.
    pub page: Option<u32>,
}

impl SourceText {
    pub fn new(text: impl Into<String>, source: Option<String>) -> Self {
        Self {
            text: text.into(),
            source,
            page: None,
        }
    }

    pub fn page(text: impl Into<String>, source: Option<String>, page: u32) -> Self {
        Self {
            text: text.into(),
            source,
            page: Some(page),
        }
    }
}

/// Provenance of a passage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassageMetadata {
    pub source: Option<String>,
    pub page: Option<u32>,
    /// Byte offset of the passage within its source text.
    pub start_index: usize,
}

/// A contiguous span of source text, the atomic retrieval unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    pub text: String,
    pub metadata: PassageMetadata,
}

impl Passage {
    pub fn new(text: impl Into<String>, metadata: PassageMetadata) -> Self {
        Self {
            text: text.into(),
            metadata,
        }
    }

    /// Provenance string, empty when the passage has none.
    pub fn source_or_empty(&self) -> String {
        self.metadata.source.clone().unwrap_or_default()
    }
}

/// Size and overlap of passages, measured in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkingConfig {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl ChunkingConfig {
    /// Create a config; `chunk_overlap` must be smaller than `chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(DocqaError::Config("chunk_size must be positive".to_string()));
        }
        if chunk_overlap >= chunk_size {
            return Err(DocqaError::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                chunk_overlap, chunk_size
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    /// Generic documents: PDFs, text files, inline text.
    pub fn document() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }

    /// Video transcripts.
    pub fn transcript() -> Self {
        Self {
            chunk_size: 500,
            chunk_overlap: 200,
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }
}

impl TryFrom<ChunkSizing> for ChunkingConfig {
    type Error = DocqaError;

    fn try_from(sizing: ChunkSizing) -> Result<Self> {
        Self::new(sizing.chunk_size, sizing.chunk_overlap)
    }
}
