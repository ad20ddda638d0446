use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::extractors::{AudioFormat, ExtractedMedia};

/// Column order of the metadata table
pub const METADATA_COLUMNS: [&str; 9] = [
    "input_url",
    "status",
    "filepath",
    "title",
    "uploader",
    "id",
    "duration",
    "webpage_url",
    "error",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    Ok,
    Error,
}

impl OutcomeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeStatus::Ok => "ok",
            OutcomeStatus::Error => "error",
        }
    }
}

impl std::fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one acquisition attempt for one URL.
///
/// Built only through [`OutcomeRecord::success`] or [`OutcomeRecord::failure`], so a
/// record carries either a file path with metadata or an error message, never both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeRecord {
    input_url: String,
    status: OutcomeStatus,
    filepath: Option<PathBuf>,
    title: Option<String>,
    uploader: Option<String>,
    id: Option<String>,
    duration: Option<f64>,
    webpage_url: Option<String>,
    error: Option<String>,
}

impl OutcomeRecord {
    pub fn success(input_url: &str, media: ExtractedMedia, codec: AudioFormat) -> Self {
        let filepath = media.final_path(codec);
        Self {
            input_url: input_url.to_string(),
            status: OutcomeStatus::Ok,
            filepath: Some(filepath),
            title: media.title,
            uploader: media.uploader,
            id: media.id,
            duration: media.duration,
            webpage_url: media.webpage_url,
            error: None,
        }
    }

    pub fn failure(input_url: &str, error: impl Into<String>) -> Self {
        Self {
            input_url: input_url.to_string(),
            status: OutcomeStatus::Error,
            filepath: None,
            title: None,
            uploader: None,
            id: None,
            duration: None,
            webpage_url: None,
            error: Some(error.into()),
        }
    }

    pub fn input_url(&self) -> &str {
        &self.input_url
    }

    pub fn status(&self) -> OutcomeStatus {
        self.status
    }

    pub fn filepath(&self) -> Option<&PathBuf> {
        self.filepath.as_ref()
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn duration(&self) -> Option<f64> {
        self.duration
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Cells in [`METADATA_COLUMNS`] order, absent fields as empty strings
    pub fn to_row(&self) -> [String; 9] {
        fn text(value: &Option<String>) -> String {
            value.clone().unwrap_or_default()
        }

        [
            self.input_url.clone(),
            self.status.to_string(),
            self.filepath
                .as_ref()
                .map(|p| p.to_string_lossy().into_owned())
                .unwrap_or_default(),
            text(&self.title),
            text(&self.uploader),
            text(&self.id),
            self.duration.map(format_seconds).unwrap_or_default(),
            text(&self.webpage_url),
            text(&self.error),
        ]
    }
}

/// Whole seconds print without a fractional part
fn format_seconds(seconds: f64) -> String {
    if seconds.fract() == 0.0 && seconds.abs() < 1e15 {
        format!("{}", seconds as i64)
    } else {
        seconds.to_string()
    }
}
