use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::aggregate::{EntryOrder, Framing};
use crate::extractors::AudioFormat;

/// Metadata CSV name used when none is configured
pub const DEFAULT_METADATA_FILE: &str = "audio_metadata.csv";

/// Transcoder quality tier used when none is configured
pub const DEFAULT_QUALITY: &str = "64";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Download settings
    pub acquisition: AcquisitionConfig,

    /// Merge and tabulation settings
    pub aggregation: AggregationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AcquisitionConfig {
    /// Target audio codec
    pub codec: String,

    /// Target quality (bitrate or VBR tier)
    pub quality: String,

    /// Metadata CSV path, relative to the output directory unless absolute
    pub metadata_file: PathBuf,

    /// Directory containing ffmpeg and ffprobe
    pub ffmpeg_location: Option<PathBuf>,

    /// yt-dlp executable
    pub yt_dlp_path: PathBuf,

    /// Extra attempts per failing URL
    pub retries: u32,

    /// Base delay between attempts in seconds
    pub retry_delay_secs: u64,

    /// Per-URL time limit in seconds
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationConfig {
    /// Extension identifying text artifacts
    pub text_extension: String,

    /// Framing of the merged document
    pub framing: Framing,

    /// Read order for direct tabulation
    pub entry_order: EntryOrder,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            codec: AudioFormat::Mp3.as_str().to_string(),
            quality: DEFAULT_QUALITY.to_string(),
            metadata_file: PathBuf::from(DEFAULT_METADATA_FILE),
            ffmpeg_location: None,
            yt_dlp_path: PathBuf::from("yt-dlp"),
            retries: 0,
            retry_delay_secs: 2,
            timeout_secs: None,
        }
    }
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            text_extension: "txt".to_string(),
            framing: Framing::Sentinel,
            entry_order: EntryOrder::Name,
        }
    }
}

impl Config {
    /// Load configuration from file, or defaults when there is none
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::debug!("No config file at {}, using defaults", config_path.display());
            Ok(Self::default())
        }
    }

    /// Load and validate a specific configuration file
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        let content = fs_err::read_to_string(path)
            .context("Failed to read config file")?;

        let config: Config = serde_yaml::from_str(&content)
            .context("Failed to parse config file")?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<PathBuf> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            fs_err::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(self)
            .context("Failed to serialize config")?;

        fs_err::write(&config_path, content)
            .context("Failed to write config file")?;

        Ok(config_path)
    }

    /// Get configuration file path
    pub fn config_path() -> Result<PathBuf> {
        // First try current directory for easy testing
        let local_config = PathBuf::from("config.yaml");
        if local_config.exists() {
            return Ok(local_config);
        }

        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?;

        Ok(config_dir.join("audio-harvest").join("config.yaml"))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.codec()?;

        if self.acquisition.quality.trim().is_empty() {
            anyhow::bail!("Audio quality must not be empty");
        }

        if self.aggregation.text_extension.trim_start_matches('.').is_empty() {
            anyhow::bail!("Text extension must not be empty");
        }

        Ok(())
    }

    /// Configured codec
    pub fn codec(&self) -> Result<AudioFormat> {
        Ok(self.acquisition.codec.parse::<AudioFormat>()?)
    }

    /// Display current configuration
    pub fn display(&self) {
        println!("Current Configuration:");
        println!("  Codec: {}", self.acquisition.codec);
        println!("  Quality: {}", self.acquisition.quality);
        println!("  Metadata File: {}", self.acquisition.metadata_file.display());
        match &self.acquisition.ffmpeg_location {
            Some(location) => println!("  ffmpeg Location: {}", location.display()),
            None => println!("  ffmpeg Location: (probed on PATH)"),
        }
        println!("  yt-dlp: {}", self.acquisition.yt_dlp_path.display());
        println!("  Retries: {}", self.acquisition.retries);
        if let Some(timeout) = self.acquisition.timeout_secs {
            println!("  Timeout: {}s", timeout);
        }
        println!("  Text Extension: .{}", self.aggregation.text_extension.trim_start_matches('.'));
        println!("  Framing: {:?}", self.aggregation.framing);
        println!("  Entry Order: {:?}", self.aggregation.entry_order);
    }
}
