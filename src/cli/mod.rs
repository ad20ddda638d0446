use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::aggregate::{EntryOrder, Framing};
use crate::extractors::AudioFormat;

#[derive(Parser)]
#[command(
    name = "harvest",
    about = "Audio Harvest - Download audio from URL lists and turn transcript folders into spreadsheet rows",
    version,
    long_about = "A batch CLI that downloads audio tracks for a list of URLs with yt-dlp, writes a metadata CSV with one row per URL, and merges a folder of transcript text files into a delimited document and a single-column CSV for spreadsheet import."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Download audio for every URL in a list, recording one metadata row per URL
    Download {
        /// Text file containing URLs (one per line)
        #[arg(long, value_name = "FILE")]
        urls_file: PathBuf,

        /// Directory to save audio files in
        #[arg(long, value_name = "DIR")]
        output_dir: PathBuf,

        /// Metadata CSV path (relative paths are created inside the output directory)
        #[arg(long, value_name = "FILE")]
        metadata: Option<PathBuf>,

        /// Directory containing ffmpeg and ffprobe (probed on PATH if not specified)
        #[arg(long, value_name = "DIR", env = "HARVEST_FFMPEG_LOCATION")]
        ffmpeg_location: Option<PathBuf>,

        /// Audio codec to transcode to
        #[arg(long, value_enum)]
        codec: Option<AudioFormat>,

        /// Audio quality passed to the transcoder (bitrate in kbps or a 0-10 VBR tier)
        #[arg(long)]
        quality: Option<String>,

        /// Extra attempts for a failing URL (0 keeps one attempt per URL)
        #[arg(long, value_name = "COUNT")]
        retries: Option<u32>,

        /// Give up on a single URL after this many seconds
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,
    },

    /// Merge every text file in a directory into one delimited document
    Merge {
        /// Directory containing transcript text files
        #[arg(long, value_name = "DIR")]
        input_dir: PathBuf,

        /// Merged document path
        #[arg(short, long, value_name = "FILE", default_value = "merged_output.txt")]
        output: PathBuf,

        /// How each file's content is framed
        #[arg(long, value_enum)]
        framing: Option<Framing>,

        /// Extension that marks a file as text (case-insensitive)
        #[arg(long, value_name = "EXT")]
        extension: Option<String>,
    },

    /// Split a merged document into sections and write them as CSV rows, newest first
    Segment {
        /// Merged document to read
        #[arg(short, long, value_name = "FILE", default_value = "merged_output.txt")]
        input: PathBuf,

        /// CSV file to write
        #[arg(short, long, value_name = "FILE", default_value = "merged_for_sheets.csv")]
        output: PathBuf,

        /// How the merged document was framed
        #[arg(long, value_enum)]
        framing: Option<Framing>,

        /// Fail on unmatched or nested markers instead of skipping them
        #[arg(long)]
        strict: bool,
    },

    /// Write each text file in a directory as one CSV row, skipping the merge step
    Tabulate {
        /// Directory containing transcript text files
        #[arg(long, value_name = "DIR")]
        input_dir: PathBuf,

        /// CSV file to write
        #[arg(short, long, value_name = "FILE", default_value = "merged_for_sheets.csv")]
        output: PathBuf,

        /// Order in which files are read before the rows are reversed
        #[arg(long, value_enum)]
        order: Option<EntryOrder>,

        /// Extension that marks a file as text (case-insensitive)
        #[arg(long, value_name = "EXT")]
        extension: Option<String>,
    },

    /// Show or initialize the configuration file
    Config {
        /// Show current configuration
        #[arg(short, long)]
        show: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_download_requires_urls_file() {
        let parsed = Cli::try_parse_from(["harvest", "download", "--output-dir", "out"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_download_parses_codec_and_quality() {
        let cli = Cli::try_parse_from([
            "harvest",
            "download",
            "--urls-file",
            "urls.txt",
            "--output-dir",
            "out",
            "--codec",
            "opus",
            "--quality",
            "128",
        ])
        .unwrap();

        match cli.command {
            Commands::Download { codec, quality, retries, .. } => {
                assert_eq!(codec, Some(AudioFormat::Opus));
                assert_eq!(quality.as_deref(), Some("128"));
                assert_eq!(retries, None);
            }
            _ => panic!("expected download command"),
        }
    }

    #[test]
    fn test_segment_defaults() {
        let cli = Cli::try_parse_from(["harvest", "segment"]).unwrap();
        match cli.command {
            Commands::Segment { input, output, framing, strict } => {
                assert_eq!(input, PathBuf::from("merged_output.txt"));
                assert_eq!(output, PathBuf::from("merged_for_sheets.csv"));
                assert_eq!(framing, None);
                assert!(!strict);
            }
            _ => panic!("expected segment command"),
        }
    }

    #[test]
    fn test_tabulate_order_flag() {
        let cli = Cli::try_parse_from([
            "harvest",
            "tabulate",
            "--input-dir",
            "texts",
            "--order",
            "listing",
        ])
        .unwrap();
        match cli.command {
            Commands::Tabulate { order, .. } => assert_eq!(order, Some(EntryOrder::Listing)),
            _ => panic!("expected tabulate command"),
        }
    }
}
