//! Per-source-kind pipeline tuning.

use crate::chunking::ChunkingConfig;
use crate::config::Settings;
use crate::error::Result;
use crate::extract::{SourceDescriptor, SourceKind};
use crate::index::DocumentHandle;

/// How the handle of a freshly built index is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleStrategy {
    /// A newly generated unique token per build.
    Fresh,
    /// The literal source URL, so rebuilding a source replaces its entry.
    SourceUrl,
}

/// Chunking and caching behavior for one kind of source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceProfile {
    pub chunking: ChunkingConfig,
    pub handle: HandleStrategy,
    /// Whether an existing index for the same source is reused.
    pub cacheable: bool,
}

impl SourceProfile {
    pub fn document(chunking: ChunkingConfig) -> Self {
        Self {
            chunking,
            handle: HandleStrategy::Fresh,
            cacheable: false,
        }
    }

    pub fn transcript(chunking: ChunkingConfig) -> Self {
        Self {
            chunking,
            handle: HandleStrategy::SourceUrl,
            cacheable: true,
        }
    }

    /// Key identifying `source` across requests, if the profile derives one.
    pub fn cache_key<'a>(&self, source: &'a SourceDescriptor) -> Option<&'a str> {
        match (self.handle, source) {
            (HandleStrategy::SourceUrl, SourceDescriptor::Video { url }) => Some(url.trim()),
            _ => None,
        }
    }

    /// Handle under which a new index for `source` is stored.
    pub fn handle_for(&self, source: &SourceDescriptor) -> DocumentHandle {
        match self.cache_key(source) {
            Some(key) => DocumentHandle::from(key),
            None => DocumentHandle::generate(),
        }
    }
}

/// Profiles for every source kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceProfiles {
    document: SourceProfile,
    transcript: SourceProfile,
}

impl SourceProfiles {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Ok(Self {
            document: SourceProfile::document(settings.chunking.document.try_into()?),
            transcript: SourceProfile::transcript(settings.chunking.transcript.try_into()?),
        })
    }

    pub fn for_kind(&self, kind: SourceKind) -> &SourceProfile {
        match kind {
            SourceKind::Pdf | SourceKind::TextFile | SourceKind::PlainText => &self.document,
            SourceKind::Video => &self.transcript,
        }
    }
}

impl Default for SourceProfiles {
    fn default() -> Self {
        Self {
            document: SourceProfile::document(ChunkingConfig::document()),
            transcript: SourceProfile::transcript(ChunkingConfig::transcript()),
        }
    }
}
