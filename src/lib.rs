//! docqa - grounded question answering over documents and videos
//!
//! Ingest a PDF, a text file, inline text or a YouTube transcript into an
//! in-memory vector index, then answer questions strictly from the retrieved
//! passages, with an explicit "I don't know" when the context lacks the answer.
//!
//! # Architecture
//!
//! - `config` - Settings and prompt templates
//! - `extract` - Source extractors (PDF, text file, inline text, YouTube)
//! - `chunking` - Overlapping, boundary-aware passage splitting
//! - `embedding` - Embedding generation
//! - `index` - Vector indexes and the index store
//! - `generation` - Answer generation back-ends
//! - `pipeline` - Ingestion and answering pipelines
//! - `server` - HTTP API
//!
//! # Example
//!
//! ```rust,no_run
//! use docqa::config::Settings;
//! use docqa::pipeline::RagService;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let service = RagService::from_settings(&settings)?;
//!
//!     let handle = service
//!         .ingest_from_plain_text("The sky is blue. Grass is green.")
//!         .await?;
//!     let (answer, sources) = service
//!         .answer("What color is the sky?", Some(&handle))
//!         .await?
//!         .into_parts();
//!     println!("{} ({:?})", answer, sources);
//!
//!     Ok(())
//! }
//! ```

pub mod chunking;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod extract;
pub mod generation;
pub mod index;
pub mod openai;
pub mod pipeline;
pub mod retry;
pub mod server;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{DocqaError, Result};
