//! Tubeloader - video downloader for the `get_video_info` endpoint
//!
//! Decodes the streams advertised for a video, picks the one matching the
//! requested quality and format and writes it to a file, to stdout or through
//! ffmpeg as MP3.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tubeloader::app::{self, StreamListing};
use tubeloader::downloader::{DownloadConfig, DownloadEngine, DownloadProgress, DownloadStatus};
use tubeloader::extractor::YoutubeInfoFetcher;
use tubeloader::selector::{FormatPreference, QualityPreference};
use tubeloader::utils::{AppSettings, AudioBitrate};
use tokio::task::JoinHandle;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tubeloader", version, about = "Download a video stream by quality and format")]
struct Args {
    /// Video URL or id
    video: String,

    /// best, worst (or max/min), highres, hd1080, hd720, large, medium, small, unknown
    #[arg(short, long)]
    quality: Option<QualityPreference>,

    /// any, mp4, webm, flv, 3gp, unknown
    #[arg(short, long)]
    format: Option<FormatPreference>,

    /// Destination template (%title%, %author%, %format%, %quality%, %id%), `-` for stdout
    #[arg(short, long)]
    output: Option<String>,

    /// Extract the audio as MP3: auto, low, medium, high or a kbps value
    #[arg(short = 'b', long)]
    audio_bitrate: Option<AudioBitrate>,

    /// JSON settings file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the decoded streams and exit
    #[arg(long)]
    list: bool,

    /// With --list, print the streams as JSON
    #[arg(long, requires = "list")]
    json: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn settings(&self) -> Result<AppSettings> {
        let mut settings = match &self.config {
            Some(path) => AppSettings::load(path)
                .with_context(|| format!("unable to load settings from {}", path.display()))?,
            None => AppSettings::default(),
        };

        if let Some(quality) = self.quality {
            settings.quality = quality;
        }
        if let Some(format) = self.format {
            settings.format = format;
        }
        if let Some(output) = &self.output {
            settings.destination = Some(output.clone());
        }
        if let Some(bitrate) = self.audio_bitrate {
            settings.audio_bitrate = Some(bitrate);
        }

        settings.validate()?;
        Ok(settings)
    }
}

fn main() {
    let args = Args::parse();

    // Logs go to stderr so stdout can carry the stream
    let default_filter = if args.verbose {
        "warn,tubeloader=debug"
    } else {
        "warn,tubeloader=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(args) {
        eprintln!("ERROR: {:#}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let settings = args.settings()?;

    // Every stage is awaited in turn; the runtime only drives I/O
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    rt.block_on(download(args, settings))
}

async fn download(args: Args, settings: AppSettings) -> Result<()> {
    let fetcher = YoutubeInfoFetcher::new(&settings)?;

    if args.list {
        let (video_id, streams) = app::fetch_streams(&args.video, &fetcher).await?;
        if args.json {
            let listing = StreamListing { video_id, streams };
            println!("{}", serde_json::to_string_pretty(&listing)?);
        } else {
            println!("{} stream(s) for {}:", streams.len(), video_id);
            for (i, stream) in streams.iter().enumerate() {
                println!("  [{}] {}", i, stream);
            }
        }
        return Ok(());
    }

    let engine = DownloadEngine::new(DownloadConfig::from(&settings))?;

    let (progress_tx, mut progress_rx) = tokio::sync::mpsc::channel::<DownloadProgress>(100);
    let reporter = tokio::spawn(async move {
        while let Some(progress) = progress_rx.recv().await {
            report_progress(&progress);
        }
    });

    let outcome = app::run(&settings, &args.video, &fetcher, &engine, progress_tx).await;
    join_reporter(reporter).await;

    let outcome = outcome?;
    eprintln!(
        "Done: {} bytes of {} written to {}",
        outcome.bytes, outcome.stream, outcome.destination
    );
    Ok(())
}

/// Wait for the progress reporter, returning whether it ended cleanly
async fn join_reporter(reporter: JoinHandle<()>) -> bool {
    match reporter.await {
        Ok(()) => true,
        Err(e) => {
            warn!("Progress reporter stopped abnormally: {}", e);
            false
        }
    }
}

fn report_progress(progress: &DownloadProgress) {
    match &progress.status {
        DownloadStatus::Downloading if progress.total_bytes > 0 => eprintln!(
            "Progress: {:.1}%, Speed: {:.2} MB/s",
            progress.percentage() * 100.0,
            progress.speed / 1024.0 / 1024.0
        ),
        DownloadStatus::Downloading => eprintln!(
            "Progress: {:.2} MB, Speed: {:.2} MB/s",
            progress.downloaded_bytes as f64 / 1024.0 / 1024.0,
            progress.speed / 1024.0 / 1024.0
        ),
        DownloadStatus::Completed => eprintln!("Progress: 100%"),
        DownloadStatus::Failed(reason) => eprintln!("Download failed: {}", reason),
        DownloadStatus::Initializing => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_join_reporter_reports_panics() {
        assert!(join_reporter(tokio::spawn(async {})).await);

        let panicking = tokio::spawn(async { panic!("reporter failed") });
        assert!(!join_reporter(panicking).await);
    }

    #[test]
    fn test_json_requires_list() {
        assert!(Args::try_parse_from(["tubeloader", "abc", "--json"]).is_err());
        let args = Args::try_parse_from(["tubeloader", "abc", "--list", "--json"]).unwrap();
        assert!(args.list && args.json);
    }
}
