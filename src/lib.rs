//! Audio Harvest - batch audio acquisition and transcript aggregation
//!
//! This library downloads audio tracks for a list of URLs through yt-dlp, recording one
//! outcome row per URL, and folds a directory of transcript text files into a merged
//! document and a single-column CSV ready for spreadsheet import.

pub mod acquire;
pub mod aggregate;
pub mod cli;
pub mod config;
pub mod extractors;
pub mod output;
pub mod utils;

pub use acquire::{AcquisitionOptions, AcquisitionPipeline, OutcomeRecord, OutcomeStatus};
pub use aggregate::{EntryOrder, Framing};
pub use cli::{Cli, Commands};
pub use config::Config;
pub use extractors::{AudioExtractor, AudioFormat, ExtractedMedia, ExtractionRequest};

/// Result type used throughout the library
pub type Result<T> = anyhow::Result<T>;

/// Error types specific to the harvester
#[derive(thiserror::Error, Debug)]
pub enum HarvestError {
    #[error("URLs file not found: {0}")]
    UrlListNotFound(std::path::PathBuf),

    #[error("Unsupported audio codec: {0}")]
    UnsupportedCodec(String),

    #[error("Audio extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("Malformed merged document at line {line}: {reason}")]
    MalformedDocument { line: usize, reason: String },

    #[error("Invalid frame for {name}: {reason}")]
    InvalidFrame { name: String, reason: String },
}
