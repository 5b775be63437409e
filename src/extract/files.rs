//! Text file and inline text extraction.

use super::{wrong_kind, Extractor, SourceDescriptor, SourceKind};
use crate::chunking::{SourceText, INLINE_TEXT_SOURCE};
use crate::config::Settings;
use crate::error::{DocqaError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Expand `~`, resolve to an absolute path, and require an existing file.
pub async fn resolve_path(path: &Path) -> Result<PathBuf> {
    let raw = path.to_str().ok_or_else(|| {
        DocqaError::InvalidSource(format!("path is not valid UTF-8: {}", path.display()))
    })?;
    if raw.trim().is_empty() {
        return Err(DocqaError::InvalidSource("empty file path".to_string()));
    }

    let expanded = Settings::expand_path(raw);
    let resolved = tokio::fs::canonicalize(&expanded).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            DocqaError::SourceNotFound(expanded.display().to_string())
        } else {
            DocqaError::Extraction(format!("cannot access {}: {}", expanded.display(), e))
        }
    })?;

    if !resolved.is_file() {
        return Err(DocqaError::InvalidSource(format!(
            "not a regular file: {}",
            resolved.display()
        )));
    }

    Ok(resolved)
}

/// Reads UTF-8 text files.
#[derive(Debug, Default)]
pub struct TextFileExtractor;

impl TextFileExtractor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Extractor for TextFileExtractor {
    async fn extract(&self, source: &SourceDescriptor) -> Result<Vec<SourceText>> {
        let SourceDescriptor::TextFile { path } = source else {
            return Err(wrong_kind(SourceKind::TextFile, source));
        };

        let path = resolve_path(path).await?;
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| DocqaError::Extraction(format!("failed to read {}: {}", path.display(), e)))?;

        // Undecodable bytes are dropped rather than failing the read.
        let text = match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).replace('\u{FFFD}', ""),
        };

        if text.trim().is_empty() {
            return Err(DocqaError::EmptyInput(format!(
                "text file is empty: {}",
                path.display()
            )));
        }

        debug!("Read {} bytes from {}", text.len(), path.display());
        Ok(vec![SourceText::new(text, Some(path.display().to_string()))])
    }
}

/// Accepts text supplied directly by the caller.
#[derive(Debug, Default)]
pub struct PlainTextExtractor;

impl PlainTextExtractor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Extractor for PlainTextExtractor {
    async fn extract(&self, source: &SourceDescriptor) -> Result<Vec<SourceText>> {
        let SourceDescriptor::PlainText { text, source: origin } = source else {
            return Err(wrong_kind(SourceKind::PlainText, source));
        };

        if text.trim().is_empty() {
            return Err(DocqaError::EmptyInput("plain text input is empty".to_string()));
        }

        let origin = origin
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| INLINE_TEXT_SOURCE.to_string());

        Ok(vec![SourceText::new(text.clone(), Some(origin))])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_text_file_extraction() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Rust is a systems programming language.").unwrap();

        let segments = TextFileExtractor::new()
            .extract(&SourceDescriptor::TextFile {
                path: file.path().to_path_buf(),
            })
            .await
            .unwrap();

        assert_eq!(segments.len(), 1);
        assert!(segments[0].text.contains("systems programming"));
        let expected = file.path().canonicalize().unwrap();
        assert_eq!(segments[0].source.as_deref(), expected.to_str());
    }

    #[tokio::test]
    async fn test_text_file_drops_invalid_bytes() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"caf\xff\xfe latte").unwrap();

        let segments = TextFileExtractor::new()
            .extract(&SourceDescriptor::TextFile {
                path: file.path().to_path_buf(),
            })
            .await
            .unwrap();

        assert_eq!(segments[0].text, "caf latte");
    }

    #[tokio::test]
    async fn test_empty_text_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "  \n\n ").unwrap();

        let result = TextFileExtractor::new()
            .extract(&SourceDescriptor::TextFile {
                path: file.path().to_path_buf(),
            })
            .await;
        assert!(matches!(result, Err(DocqaError::EmptyInput(_))));
    }

    #[tokio::test]
    async fn test_missing_file() {
        let result = TextFileExtractor::new()
            .extract(&SourceDescriptor::TextFile {
                path: PathBuf::from("/definitely/not/here.txt"),
            })
            .await;
        assert!(matches!(result, Err(DocqaError::SourceNotFound(_))));
    }

    #[tokio::test]
    async fn test_directory_is_invalid_source() {
        let dir = tempfile::tempdir().unwrap();
        let result = resolve_path(dir.path()).await;
        assert!(matches!(result, Err(DocqaError::InvalidSource(_))));
    }

    #[tokio::test]
    async fn test_plain_text_provenance() {
        let extractor = PlainTextExtractor::new();

        let default = extractor
            .extract(&SourceDescriptor::PlainText {
                text: "The sky is blue.".to_string(),
                source: None,
            })
            .await
            .unwrap();
        assert_eq!(default[0].source.as_deref(), Some("inline-text"));

        let custom = extractor
            .extract(&SourceDescriptor::PlainText {
                text: "The sky is blue.".to_string(),
                source: Some("notes".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(custom[0].source.as_deref(), Some("notes"));

        let empty = extractor
            .extract(&SourceDescriptor::PlainText {
                text: " \t".to_string(),
                source: None,
            })
            .await;
        assert!(matches!(empty, Err(DocqaError::EmptyInput(_))));
    }
}
