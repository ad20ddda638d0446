use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

use super::{AudioExtractor, ExtractedMedia, ExtractionRequest};
use crate::{HarvestError, Result};

/// Audio extractor backed by the yt-dlp executable
pub struct YtDlpExtractor {
    yt_dlp_path: PathBuf,
}

/// Subset of the info dict yt-dlp prints with `--dump-single-json`
#[derive(Debug, Default, Deserialize)]
struct YtDlpInfo {
    title: Option<String>,
    uploader: Option<String>,
    id: Option<String>,
    duration: Option<f64>,
    webpage_url: Option<String>,
    original_url: Option<String>,
    filename: Option<String>,
    #[serde(rename = "_filename")]
    legacy_filename: Option<String>,
    /// Present when the URL resolved to a playlist or collection
    entries: Option<Vec<Option<YtDlpInfo>>>,
}

impl YtDlpExtractor {
    pub fn new() -> Self {
        Self::with_binary("yt-dlp")
    }

    pub fn with_binary(path: impl Into<PathBuf>) -> Self {
        Self {
            yt_dlp_path: path.into(),
        }
    }

    /// Command-line arguments for one download
    fn build_args(request: &ExtractionRequest) -> Vec<String> {
        let mut args = vec![
            "--format".to_string(),
            request.format_selector.clone(),
            "--output".to_string(),
            request.output_template.to_string_lossy().into_owned(),
            // Transcode after download
            "--extract-audio".to_string(),
            "--audio-format".to_string(),
            request.codec.as_str().to_string(),
            "--audio-quality".to_string(),
            request.quality.clone(),
            // No interactive output; metadata comes back as one JSON document
            "--quiet".to_string(),
            "--no-warnings".to_string(),
            "--no-progress".to_string(),
            "--dump-single-json".to_string(),
            "--no-simulate".to_string(),
        ];

        if let Some(location) = &request.ffmpeg_location {
            args.push("--ffmpeg-location".to_string());
            args.push(location.to_string_lossy().into_owned());
        }

        args.push(request.url.clone());
        args
    }
}

/// Collections report their items under `entries`; only the first one is used
fn first_item(mut info: YtDlpInfo) -> Result<YtDlpInfo> {
    match info.entries.take() {
        Some(entries) if !entries.is_empty() => entries
            .into_iter()
            .next()
            .flatten()
            .ok_or_else(|| HarvestError::ExtractionFailed("first playlist entry is empty".into()).into()),
        _ => Ok(info),
    }
}

/// Fill the output template the way yt-dlp names files, `NA` standing in for missing fields
pub fn render_template(template: &Path, uploader: Option<&str>, id: Option<&str>, ext: &str) -> PathBuf {
    let rendered = template
        .to_string_lossy()
        .replace("%(uploader)s", uploader.unwrap_or("NA"))
        .replace("%(id)s", id.unwrap_or("NA"))
        .replace("%(ext)s", ext);
    PathBuf::from(rendered)
}

/// Parse yt-dlp's JSON into media metadata
fn parse_info(stdout: &[u8], request: &ExtractionRequest) -> Result<ExtractedMedia> {
    let info: YtDlpInfo = serde_json::from_slice(stdout).map_err(|e| {
        HarvestError::ExtractionFailed(format!("unexpected yt-dlp response: {}", e))
    })?;
    let info = first_item(info)?;

    let filename = info
        .filename
        .or(info.legacy_filename)
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            render_template(
                &request.output_template,
                info.uploader.as_deref(),
                info.id.as_deref(),
                request.codec.extension(),
            )
        });

    Ok(ExtractedMedia {
        title: info.title,
        uploader: info.uploader,
        id: info.id,
        duration: info.duration,
        webpage_url: info.webpage_url.or(info.original_url),
        filename,
    })
}

#[async_trait]
impl AudioExtractor for YtDlpExtractor {
    async fn extract(&self, request: &ExtractionRequest) -> Result<ExtractedMedia> {
        let args = Self::build_args(request);
        tracing::debug!("Running {} {}", self.yt_dlp_path.display(), args.join(" "));

        let output = Command::new(&self.yt_dlp_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                HarvestError::ExtractionFailed(format!(
                    "failed to run {}: {}",
                    self.yt_dlp_path.display(),
                    e
                ))
            })?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            return Err(HarvestError::ExtractionFailed(error.trim().to_string()).into());
        }

        parse_info(&output.stdout, request)
    }

    fn name(&self) -> &'static str {
        "yt-dlp"
    }
}

impl Default for YtDlpExtractor {
    fn default() -> Self {
        Self::new()
    }
}
