//! Recursive character splitting.
//!
//! Tries paragraph breaks first, then line breaks, then spaces, and only cuts
//! between arbitrary characters when a piece still exceeds the chunk size.
//! Separators stay attached to the start of the piece that follows them, so
//! every passage is a contiguous substring of its source text.

use super::{ChunkingConfig, Passage, PassageMetadata, SourceText};
use crate::error::{DocqaError, Result};
use std::collections::VecDeque;
use tracing::{debug, warn};

const DEFAULT_SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

/// Boundary-aware text splitter with overlap.
#[derive(Debug, Clone)]
pub struct TextSplitter {
    config: ChunkingConfig,
    separators: Vec<String>,
}

impl TextSplitter {
    pub fn new(config: ChunkingConfig) -> Self {
        Self {
            config,
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn config(&self) -> ChunkingConfig {
        self.config
    }

    /// Split a single text into passages that all carry `source`.
    ///
    /// Empty or whitespace-only input is an error rather than zero passages.
    pub fn split_text(&self, text: &str, source: Option<&str>) -> Result<Vec<Passage>> {
        if text.trim().is_empty() {
            return Err(DocqaError::EmptyInput(format!(
                "no text to index from {}",
                source.unwrap_or("input")
            )));
        }
        Ok(self.passages(text, source.map(str::to_string), None))
    }

    /// Split each segment independently, keeping each segment's provenance.
    ///
    /// Blank segments (e.g. image-only PDF pages) contribute no passages.
    pub fn split_segments(&self, segments: &[SourceText]) -> Vec<Passage> {
        let passages: Vec<Passage> = segments
            .iter()
            .filter(|segment| !segment.text.trim().is_empty())
            .flat_map(|segment| self.passages(&segment.text, segment.source.clone(), segment.page))
            .collect();

        debug!("Split {} segments into {} passages", segments.len(), passages.len());
        passages
    }

    fn passages(&self, text: &str, source: Option<String>, page: Option<u32>) -> Vec<Passage> {
        let chunks = self.split_recursive(text, &self.separators);

        let mut passages = Vec::with_capacity(chunks.len());
        let mut previous: Option<(usize, usize)> = None;

        for chunk in chunks {
            // A passage starts after the previous one and shares at most
            // `chunk_overlap` characters with it.
            let search_from = match previous {
                Some((start, len)) => next_char_boundary(text, start)
                    .max(chars_back(text, start + len, self.config.chunk_overlap())),
                None => 0,
            };
            let start_index = text[search_from..]
                .find(chunk.as_str())
                .map(|pos| search_from + pos)
                .or_else(|| text.find(chunk.as_str()))
                .unwrap_or(0);

            previous = Some((start_index, chunk.len()));
            passages.push(Passage::new(
                chunk,
                PassageMetadata {
                    source: source.clone(),
                    page,
                    start_index,
                },
            ));
        }

        passages
    }

    fn split_recursive(&self, text: &str, separators: &[String]) -> Vec<String> {
        let mut separator = separators.last().map(String::as_str).unwrap_or("");
        let mut remaining: &[String] = &[];

        for (i, candidate) in separators.iter().enumerate() {
            if candidate.is_empty() {
                separator = "";
                break;
            }
            if text.contains(candidate.as_str()) {
                separator = candidate;
                remaining = &separators[i + 1..];
                break;
            }
        }

        let mut chunks = Vec::new();
        let mut good_splits: Vec<&str> = Vec::new();

        for split in split_keeping_separator(text, separator) {
            if char_len(split) < self.config.chunk_size() {
                good_splits.push(split);
                continue;
            }

            if !good_splits.is_empty() {
                chunks.extend(self.merge_splits(&good_splits));
                good_splits.clear();
            }

            if remaining.is_empty() {
                chunks.push(split.to_string());
            } else {
                chunks.extend(self.split_recursive(split, remaining));
            }
        }

        if !good_splits.is_empty() {
            chunks.extend(self.merge_splits(&good_splits));
        }

        chunks
    }

    /// Greedily pack splits into chunks, carrying trailing splits over as overlap.
    fn merge_splits(&self, splits: &[&str]) -> Vec<String> {
        let size = self.config.chunk_size();
        let overlap = self.config.chunk_overlap();

        let mut docs = Vec::new();
        let mut current: VecDeque<&str> = VecDeque::new();
        let mut total = 0usize;

        for split in splits {
            let len = char_len(split);

            if total + len > size {
                if total > size {
                    warn!("Created a chunk of size {}, larger than {}", total, size);
                }
                if !current.is_empty() {
                    push_trimmed(&mut docs, &current);

                    while total > overlap || (total + len > size && total > 0) {
                        match current.pop_front() {
                            Some(first) => total -= char_len(first),
                            None => break,
                        }
                    }
                }
            }

            current.push_back(split);
            total += len;
        }

        push_trimmed(&mut docs, &current);
        docs
    }
}

fn push_trimmed(docs: &mut Vec<String>, current: &VecDeque<&str>) {
    let joined: String = current.iter().copied().collect();
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        docs.push(trimmed.to_string());
    }
}

/// Split `text` before every occurrence of `separator`; empty separator splits characters.
fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    if separator.is_empty() {
        return text
            .char_indices()
            .map(|(i, c)| &text[i..i + c.len_utf8()])
            .collect();
    }

    let mut splits = Vec::new();
    let mut last = 0;
    for (idx, _) in text.match_indices(separator) {
        splits.push(&text[last..idx]);
        last = idx;
    }
    splits.push(&text[last..]);
    splits.retain(|s| !s.is_empty());
    splits
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn next_char_boundary(text: &str, index: usize) -> usize {
    index + text[index..].chars().next().map_or(0, char::len_utf8)
}

/// Byte index `n` characters before `end`.
fn chars_back(text: &str, end: usize, n: usize) -> usize {
    if n == 0 {
        return end;
    }
    text[..end]
        .char_indices()
        .rev()
        .nth(n - 1)
        .map(|(i, _)| i)
        .unwrap_or(0)
}
