use anyhow::Context;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::extractors::{validate_url, AudioExtractor, AudioFormat, ExtractedMedia, ExtractionRequest};
use crate::{utils, HarvestError, Result};

pub mod record;

pub use record::{OutcomeRecord, OutcomeStatus, METADATA_COLUMNS};

/// Longest pause between two attempts at the same URL
const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

/// Settings for one acquisition run
#[derive(Debug, Clone)]
pub struct AcquisitionOptions {
    /// Directory audio files are written to
    pub output_dir: PathBuf,

    /// Metadata CSV location, already resolved against the output directory
    pub metadata_path: PathBuf,

    pub codec: AudioFormat,

    pub quality: String,

    /// Explicit ffmpeg directory; probed on PATH when absent
    pub ffmpeg_location: Option<PathBuf>,

    /// Extra attempts after a failure
    pub retries: u32,

    /// Base delay between attempts, multiplied by the attempt number
    pub retry_delay: Duration,

    /// Upper bound for a single attempt
    pub timeout: Option<Duration>,

    /// Hide the progress bar
    pub quiet: bool,
}

impl AcquisitionOptions {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        let output_dir = output_dir.into();
        Self {
            metadata_path: output_dir.join(crate::config::DEFAULT_METADATA_FILE),
            output_dir,
            codec: AudioFormat::default(),
            quality: crate::config::DEFAULT_QUALITY.to_string(),
            ffmpeg_location: None,
            retries: 0,
            retry_delay: Duration::from_secs(2),
            timeout: None,
            quiet: false,
        }
    }
}

/// Fault-isolated batch downloader: one outcome record per URL, whatever happens
pub struct AcquisitionPipeline {
    options: AcquisitionOptions,
    extractor: Box<dyn AudioExtractor>,
    ffmpeg_location: Option<PathBuf>,
}

impl AcquisitionPipeline {
    /// Create a pipeline, probing PATH for ffmpeg when no location is configured
    pub fn new(options: AcquisitionOptions, extractor: Box<dyn AudioExtractor>) -> Self {
        let ffmpeg_location = match &options.ffmpeg_location {
            Some(location) => Some(location.clone()),
            None => {
                let probed = utils::locate_ffmpeg(std::env::var_os("PATH").as_deref());
                match &probed {
                    Some(dir) => tracing::debug!("Found ffmpeg and ffprobe in {}", dir.display()),
                    None => tracing::debug!("ffmpeg/ffprobe not found on PATH, leaving lookup to the extractor"),
                }
                probed
            }
        };

        Self {
            options,
            extractor,
            ffmpeg_location,
        }
    }

    pub fn options(&self) -> &AcquisitionOptions {
        &self.options
    }

    /// Process every URL in order, reporting each one on the console
    pub async fn run(&self, urls: &[String]) -> Vec<OutcomeRecord> {
        let progress = if self.options.quiet {
            ProgressBar::hidden()
        } else {
            ProgressBar::new(urls.len() as u64)
        };
        progress.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );

        let total = urls.len();
        let mut records = Vec::with_capacity(total);

        for (index, url) in urls.iter().enumerate() {
            progress.suspend(|| println!("[{}/{}] {}", index + 1, total, url));
            progress.set_message(url.clone());

            let record = self.process_url(url).await;

            progress.suspend(|| report(&record));
            progress.inc(1);
            records.push(record);
        }

        progress.finish_and_clear();
        records
    }

    /// Download one URL. Failures become an error record instead of propagating.
    pub async fn process_url(&self, url: &str) -> OutcomeRecord {
        match self.acquire(url).await {
            Ok(media) => OutcomeRecord::success(url, media, self.options.codec),
            Err(e) => {
                tracing::debug!("Acquisition failed for {}: {:#}", url, e);
                OutcomeRecord::failure(url, failure_message(&e))
            }
        }
    }

    async fn acquire(&self, url: &str) -> Result<ExtractedMedia> {
        fs_err::create_dir_all(&self.options.output_dir)
            .context("Failed to create output directory")?;

        let request = ExtractionRequest::new(
            url,
            &self.options.output_dir,
            self.options.codec,
            &self.options.quality,
        )
        .with_ffmpeg_location(self.ffmpeg_location.clone());

        let mut attempt = 0;
        loop {
            match self.attempt(&request).await {
                Ok(media) => return Ok(media),
                Err(e) if attempt < self.options.retries => {
                    attempt += 1;
                    let delay = retry_delay(self.options.retry_delay, attempt);
                    tracing::warn!(
                        "Attempt {} for {} failed ({:#}), retrying in {}s",
                        attempt,
                        url,
                        e,
                        delay.as_secs()
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn attempt(&self, request: &ExtractionRequest) -> Result<ExtractedMedia> {
        match self.options.timeout {
            Some(limit) => tokio::time::timeout(limit, self.extractor.extract(request))
                .await
                .map_err(|_| {
                    HarvestError::ExtractionFailed(format!(
                        "timed out after {}s",
                        limit.as_secs_f64()
                    ))
                })?,
            None => self.extractor.extract(request).await,
        }
    }

    /// Write all records to the metadata CSV
    pub fn write_metadata(&self, records: &[OutcomeRecord]) -> Result<()> {
        crate::output::write_metadata_table(&self.options.metadata_path, records)
    }
}

/// Message stored on an error record: the extractor's own text when it reported one
fn failure_message(error: &anyhow::Error) -> String {
    match error.downcast_ref::<HarvestError>() {
        Some(HarvestError::ExtractionFailed(message)) => message.clone(),
        _ => format!("{:#}", error),
    }
}

/// Delay before retry number `attempt` (1-based), growing linearly and capped
fn retry_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(attempt).min(MAX_RETRY_DELAY)
}

fn report(record: &OutcomeRecord) {
    let status = match record.status() {
        OutcomeStatus::Ok => style(record.status().as_str()).green(),
        OutcomeStatus::Error => style(record.status().as_str()).red(),
    };

    match (record.title(), record.duration()) {
        (Some(title), Some(duration)) => println!(
            "   → {} ({}, {})",
            status,
            title,
            utils::format_duration(duration)
        ),
        _ => println!("   → {}", status),
    }

    if let Some(error) = record.error() {
        println!("   error: {}", error);
    }
}

/// Read URLs from a text file, one per non-blank line, keeping order and duplicates
pub fn read_url_list(path: &Path) -> Result<Vec<String>> {
    if !path.exists() {
        return Err(HarvestError::UrlListNotFound(path.to_path_buf()).into());
    }

    let content = fs_err::read_to_string(path).context("Failed to read URLs file")?;
    let urls: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();

    for url in &urls {
        if let Err(e) = validate_url(url) {
            tracing::warn!("{} ({}); passing it to the extractor anyway", e, url);
        }
    }

    Ok(urls)
}
