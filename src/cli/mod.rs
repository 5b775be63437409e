//! CLI module for docqa.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use crate::config::StorePolicy;
use crate::extract::SourceDescriptor;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// docqa - grounded question answering over documents and videos
///
/// Index a PDF, a text file, inline text or a YouTube transcript, then ask
/// questions answered only from that content.
#[derive(Parser, Debug)]
#[command(name = "docqa")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Host to bind to (defaults to server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (defaults to server.port)
        #[arg(short, long)]
        port: Option<u16>,

        /// "*" or a comma-separated list of allowed CORS origins
        #[arg(long, env = "ALLOWED_ORIGINS")]
        allowed_origins: Option<String>,

        /// Index store policy: per_source or single_slot (defaults to store.policy)
        #[arg(long)]
        store_policy: Option<StorePolicy>,
    },

    /// Index a source and answer one question about it
    Ask {
        /// The question to ask
        question: String,

        #[command(flatten)]
        source: SourceArgs,

        /// Rebuild a video's index even if it is cached
        #[arg(long)]
        force_refresh: bool,
    },

    /// Check system requirements and configuration
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// The source a one-shot question is asked about.
#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct SourceArgs {
    /// PDF file
    #[arg(long)]
    pub pdf: Option<PathBuf>,

    /// UTF-8 text file
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Inline text
    #[arg(long)]
    pub text: Option<String>,

    /// YouTube video URL
    #[arg(long)]
    pub video: Option<String>,
}

impl SourceArgs {
    pub fn descriptor(&self) -> Option<SourceDescriptor> {
        if let Some(path) = &self.pdf {
            return Some(SourceDescriptor::Pdf { path: path.clone() });
        }
        if let Some(path) = &self.file {
            return Some(SourceDescriptor::TextFile { path: path.clone() });
        }
        if let Some(text) = &self.text {
            return Some(SourceDescriptor::PlainText {
                text: text.clone(),
                source: None,
            });
        }
        self.video
            .as_ref()
            .map(|url| SourceDescriptor::Video { url: url.clone() })
    }
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Write the default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ask_requires_exactly_one_source() {
        let cli = Cli::try_parse_from(["docqa", "ask", "What is it?", "--text", "It is a test."]).unwrap();
        let Commands::Ask { source, .. } = cli.command else {
            panic!("expected ask");
        };
        assert_eq!(
            source.descriptor(),
            Some(SourceDescriptor::PlainText {
                text: "It is a test.".to_string(),
                source: None
            })
        );

        assert!(Cli::try_parse_from(["docqa", "ask", "What is it?"]).is_err());
        assert!(Cli::try_parse_from([
            "docqa", "ask", "Q?", "--pdf", "a.pdf", "--video", "https://youtu.be/dQw4w9WgXcQ"
        ])
        .is_err());
    }

    #[test]
    fn test_serve_flags() {
        let cli = Cli::try_parse_from([
            "docqa", "-vv", "serve", "--port", "9000", "--store-policy", "single-slot",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Serve {
                host,
                port,
                store_policy,
                ..
            } => {
                assert_eq!(host, None);
                assert_eq!(port, Some(9000));
                assert_eq!(store_policy, Some(StorePolicy::SingleSlot));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
