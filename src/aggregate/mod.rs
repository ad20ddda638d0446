//! Transcript aggregation: merge a folder of text files into one delimited document,
//! split that document back into sections, and tabulate sections for spreadsheets.
//!
//! Each text file is bracketed by marker lines carrying its file name:
//!
//! ```text
//! ----- START clip_01.txt -----
//! ...file content...
//! ----- END clip_01.txt -----
//! ```
//!
//! With [`Framing::Sentinel`] the markers are the only framing and content is not escaped,
//! so a content line starting with a marker prefix ends the section early.
//! [`Framing::LengthPrefixed`] records the content's byte length on the start marker and
//! is immune to that.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub mod merge;
pub mod segment;
pub mod tabulate;

pub use merge::{merge_directory, merge_into, MergeSummary};
pub use segment::{segment, segment_file, Segmenter};
pub use tabulate::{collect_cells, tabulate_directory};

use crate::Result;

pub const START_PREFIX: &str = "----- START";
pub const END_PREFIX: &str = "----- END";

/// Appended to a start marker to record the content's byte length
pub const LENGTH_KEY: &str = " length=";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Framing {
    /// Plain marker lines, content copied verbatim
    #[default]
    Sentinel,
    /// Marker lines plus the content's byte length on the start marker
    LengthPrefixed,
}

/// Order in which directory entries are visited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum EntryOrder {
    /// Sorted by file name
    #[default]
    Name,
    /// Whatever order the filesystem lists them in
    Listing,
}

pub fn start_marker(name: &str) -> String {
    format!("{} {} -----", START_PREFIX, name)
}

pub fn end_marker(name: &str) -> String {
    format!("{} {} -----", END_PREFIX, name)
}

/// Decides which directory entries count as text artifacts
#[derive(Debug, Clone)]
pub struct TextFilter {
    suffix: String,
}

impl TextFilter {
    pub fn new(extension: &str) -> Self {
        Self {
            suffix: format!(".{}", extension.trim_start_matches('.').to_lowercase()),
        }
    }

    /// Case-insensitive suffix match on the file name
    pub fn matches(&self, file_name: &str) -> bool {
        file_name.to_lowercase().ends_with(&self.suffix)
    }
}

impl Default for TextFilter {
    fn default() -> Self {
        Self::new("txt")
    }
}

/// A text file found in the input directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextArtifact {
    pub name: String,
    pub path: PathBuf,
}

/// Result of scanning a directory for text artifacts
#[derive(Debug, Default)]
pub struct Listing {
    pub artifacts: Vec<TextArtifact>,
    /// Files that did not match the text filter, plus entries whose metadata could not be read
    pub skipped: Vec<String>,
}

/// List the regular files of `dir`, split into text artifacts and skipped names.
///
/// Subdirectories and other non-regular entries are ignored silently. Entries that cannot
/// be inspected, such as dangling symlinks, are logged and counted as skipped.
pub fn list_artifacts(dir: &Path, order: EntryOrder, filter: &TextFilter) -> Result<Listing> {
    let mut entries = Vec::new();
    for entry in fs_err::read_dir(dir).context("Failed to list input directory")? {
        let entry = entry.context("Failed to read directory entry")?;
        entries.push((entry.file_name(), entry.path()));
    }

    if order == EntryOrder::Name {
        entries.sort_by(|a, b| a.0.cmp(&b.0));
    }

    let mut listing = Listing::default();
    for (file_name, path) in entries {
        let name = file_name.to_string_lossy().into_owned();

        // Follows symlinks, like the files they point at would be read
        match fs_err::metadata(&path) {
            Ok(metadata) if metadata.is_file() => {}
            Ok(_) => continue,
            Err(e) => {
                tracing::info!("Skipping unreadable entry: {} ({})", name, e);
                listing.skipped.push(name);
                continue;
            }
        }

        if filter.matches(&name) {
            listing.artifacts.push(TextArtifact { name, path });
        } else {
            tracing::info!("Skipping non-text file: {}", name);
            listing.skipped.push(name);
        }
    }

    Ok(listing)
}

/// Line-ending normalization applied to every section
pub(crate) fn normalize_newlines(content: &str) -> String {
    content.replace("\r\n", "\n")
}
