use anyhow::Result;
use clap::Parser;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use audio_harvest::acquire::{self, AcquisitionOptions, AcquisitionPipeline};
use audio_harvest::aggregate::{self, TextFilter};
use audio_harvest::extractors::ytdlp::YtDlpExtractor;
use audio_harvest::extractors::AudioExtractor;
use audio_harvest::{utils, Cli, Commands, Config};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let default_filter = if cli.verbose {
        "audio_harvest=debug"
    } else {
        "audio_harvest=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::load()?;

    match cli.command {
        Commands::Download {
            urls_file,
            output_dir,
            metadata,
            ffmpeg_location,
            codec,
            quality,
            retries,
            timeout,
        } => {
            let acq = &config.acquisition;
            let metadata = metadata.unwrap_or_else(|| acq.metadata_file.clone());

            let mut options = AcquisitionOptions::new(&output_dir);
            options.metadata_path = utils::resolve_against(&output_dir, &metadata);
            options.codec = match codec {
                Some(codec) => codec,
                None => config.codec()?,
            };
            options.quality = quality.unwrap_or_else(|| acq.quality.clone());
            options.ffmpeg_location = ffmpeg_location.or_else(|| acq.ffmpeg_location.clone());
            options.retries = retries.unwrap_or(acq.retries);
            options.retry_delay = Duration::from_secs(acq.retry_delay_secs);
            options.timeout = timeout.or(acq.timeout_secs).map(Duration::from_secs);
            options.quiet = cli.quiet;

            let urls = match acquire::read_url_list(&urls_file) {
                Ok(urls) => urls,
                Err(e) => {
                    eprintln!("ERROR: {:#}", e);
                    std::process::exit(1);
                }
            };
            if urls.is_empty() {
                println!("No URLs found in {}", urls_file.display());
                return Ok(());
            }

            // Check for required external dependencies (non-fatal)
            let missing_deps = utils::check_dependencies(&acq.yt_dlp_path).await;
            if !missing_deps.is_empty() {
                eprintln!("⚠️  Dependency check warnings:");
                for dep in missing_deps {
                    eprintln!("   • {}", dep);
                }
                eprintln!("   (Continuing anyway - failures will be recorded per URL)");
            }

            println!("Found {} URLs.", urls.len());
            println!("Saving audio to: {}", output_dir.display());
            println!("Metadata CSV: {}", options.metadata_path.display());

            let extractor = YtDlpExtractor::with_binary(&acq.yt_dlp_path);
            tracing::info!("Downloading with {} as {} at quality {}", extractor.name(), options.codec, options.quality);

            let pipeline = AcquisitionPipeline::new(options, Box::new(extractor));
            let records = pipeline.run(&urls).await;
            pipeline.write_metadata(&records)?;

            let failed = records
                .iter()
                .filter(|r| r.status() == audio_harvest::OutcomeStatus::Error)
                .count();
            tracing::info!("{} of {} URLs downloaded", records.len() - failed, records.len());
            println!("Done.");
        }
        Commands::Merge {
            input_dir,
            output,
            framing,
            extension,
        } => {
            let agg = &config.aggregation;
            let filter = TextFilter::new(extension.as_deref().unwrap_or(&agg.text_extension));
            let framing = framing.unwrap_or(agg.framing);

            let summary = aggregate::merge_directory(&input_dir, &output, &filter, framing)?;
            println!(
                "Merged {} files ({} skipped). Merged text saved to: {}",
                summary.merged.len(),
                summary.skipped.len(),
                output.display()
            );
        }
        Commands::Segment {
            input,
            output,
            framing,
            strict,
        } => {
            let framing = framing.unwrap_or(config.aggregation.framing);
            let rows = aggregate::segment_file(&input, &output, framing, strict)?;
            println!("Done! {} rows written to: {}", rows, output.display());
        }
        Commands::Tabulate {
            input_dir,
            output,
            order,
            extension,
        } => {
            let agg = &config.aggregation;
            let filter = TextFilter::new(extension.as_deref().unwrap_or(&agg.text_extension));
            let order = order.unwrap_or(agg.entry_order);

            let rows = aggregate::tabulate_directory(&input_dir, &output, order, &filter)?;
            println!("Done! {} rows written to: {}", rows, output.display());
        }
        Commands::Config { show } => {
            if show {
                config.display();
            } else {
                let path = config.save()?;
                println!("Configuration written to: {}", path.display());
            }
        }
    }

    Ok(())
}
