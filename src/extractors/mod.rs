use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use url::Url;

pub mod ytdlp;

use crate::{HarvestError, Result};

/// Format selection policy handed to the extractor: best audio-only stream, else best overall
pub const BEST_AUDIO: &str = "bestaudio/best";

/// Output name template; keeps re-runs collision-free across uploaders and items
pub const OUTPUT_TEMPLATE: &str = "%(uploader)s_%(id)s.%(ext)s";

/// Audio codecs the post-processing transcode step can target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    Aac,
    Alac,
    Flac,
    M4a,
    Mp3,
    Opus,
    Vorbis,
    Wav,
}

impl AudioFormat {
    /// Codec name as the transcoder expects it
    pub fn as_str(&self) -> &'static str {
        match self {
            AudioFormat::Aac => "aac",
            AudioFormat::Alac => "alac",
            AudioFormat::Flac => "flac",
            AudioFormat::M4a => "m4a",
            AudioFormat::Mp3 => "mp3",
            AudioFormat::Opus => "opus",
            AudioFormat::Vorbis => "vorbis",
            AudioFormat::Wav => "wav",
        }
    }

    /// File extension of the transcoded output
    pub fn extension(&self) -> &'static str {
        match self {
            AudioFormat::Aac => "m4a",
            AudioFormat::Alac => "m4a",
            AudioFormat::Vorbis => "ogg",
            other => other.as_str(),
        }
    }
}

impl Default for AudioFormat {
    fn default() -> Self {
        AudioFormat::Mp3
    }
}

impl FromStr for AudioFormat {
    type Err = HarvestError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "aac" => Ok(AudioFormat::Aac),
            "alac" => Ok(AudioFormat::Alac),
            "flac" => Ok(AudioFormat::Flac),
            "m4a" => Ok(AudioFormat::M4a),
            "mp3" => Ok(AudioFormat::Mp3),
            "opus" => Ok(AudioFormat::Opus),
            "vorbis" | "ogg" => Ok(AudioFormat::Vorbis),
            "wav" => Ok(AudioFormat::Wav),
            _ => Err(HarvestError::UnsupportedCodec(s.to_string())),
        }
    }
}

impl std::fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the extractor needs to fetch and transcode one URL
#[derive(Debug, Clone)]
pub struct ExtractionRequest {
    pub url: String,

    /// Full output path template, including the directory
    pub output_template: PathBuf,

    /// Source-stream selection policy
    pub format_selector: String,

    pub codec: AudioFormat,

    pub quality: String,

    /// Directory holding ffmpeg and ffprobe, when known
    pub ffmpeg_location: Option<PathBuf>,
}

impl ExtractionRequest {
    pub fn new(url: &str, output_dir: &Path, codec: AudioFormat, quality: &str) -> Self {
        Self {
            url: url.to_string(),
            output_template: output_dir.join(OUTPUT_TEMPLATE),
            format_selector: BEST_AUDIO.to_string(),
            codec,
            quality: quality.to_string(),
            ffmpeg_location: None,
        }
    }

    pub fn with_ffmpeg_location(mut self, location: Option<PathBuf>) -> Self {
        self.ffmpeg_location = location;
        self
    }
}

/// Descriptive fields and realized path reported for one media item
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedMedia {
    pub title: Option<String>,
    pub uploader: Option<String>,
    pub id: Option<String>,

    /// Duration in seconds
    pub duration: Option<f64>,

    /// Canonical page URL of the item
    pub webpage_url: Option<String>,

    /// Output path as predicted by the extractor, before transcoding
    pub filename: PathBuf,
}

impl ExtractedMedia {
    /// Final audio path: the predicted base path with its extension swapped for the codec's.
    ///
    /// The extractor's filename prediction and its transcode step can disagree on the
    /// extension, so the reported one is never trusted.
    pub fn final_path(&self, codec: AudioFormat) -> PathBuf {
        self.filename.with_extension(codec.extension())
    }
}

/// Opaque capability that downloads and transcodes the audio behind a URL
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AudioExtractor: Send + Sync {
    /// Download the audio for `request.url`, returning the item's metadata
    async fn extract(&self, request: &ExtractionRequest) -> Result<ExtractedMedia>;

    /// Name of the underlying tool
    fn name(&self) -> &'static str;
}

/// Validate and normalize URLs
pub fn validate_url(url: &str) -> Result<Url> {
    let parsed = Url::parse(url)
        .map_err(|_| anyhow::anyhow!("Invalid URL format: {}", url))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        anyhow::bail!("URL must use HTTP or HTTPS protocol");
    }

    Ok(parsed)
}
