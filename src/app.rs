//! One download run, from user input to a closed output
//!
//! Stages run strictly in sequence: video id, fetch, decode, select, open the
//! output, download, close the output.

use crate::downloader::{open_output, DownloadEngine, DownloadProgress};
use crate::extractor::{decode_video_info, find_video_id, InfoFetcher, StreamDescriptor, StreamList};
use crate::selector::select_stream;
use crate::utils::config::AppSettings;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// What a successful run produced
#[derive(Debug, Clone)]
pub struct DownloadOutcome {
    pub video_id: String,
    pub stream: StreamDescriptor,
    pub destination: String,
    pub bytes: u64,
}

/// Decoded streams of one video, as printed by `--list --json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamListing {
    pub video_id: String,
    pub streams: StreamList,
}

/// Resolve the video id and decode the streams the server advertises for it
pub async fn fetch_streams(input: &str, fetcher: &dyn InfoFetcher) -> Result<(String, StreamList)> {
    let video_id = find_video_id(input).context("unable to detect the video id")?;
    info!("Video id: {} (fetcher: {})", video_id, fetcher.id());

    let answer = fetcher
        .fetch(&video_id)
        .await
        .context("unable to request the video information")?;

    let streams = decode_video_info(&answer).context("unable to decode the server's answer")?;
    info!("Decoded {} streams", streams.len());

    Ok((video_id, streams))
}

/// Download the stream matching the configured preference
pub async fn run(
    settings: &AppSettings,
    input: &str,
    fetcher: &dyn InfoFetcher,
    engine: &DownloadEngine,
    progress_tx: mpsc::Sender<DownloadProgress>,
) -> Result<DownloadOutcome> {
    let (video_id, streams) = fetch_streams(input, fetcher).await?;

    let stream = select_stream(&streams, &settings.preference())
        .context("unable to select a stream")?;
    info!("Selected {}", stream);

    let mut sink = open_output(settings, stream, &video_id)
        .await
        .context("unable to create the output writer")?;
    let destination = sink.describe();

    let downloaded = engine
        .download(stream, sink.as_mut(), progress_tx)
        .await
        .context("unable to download the stream");
    let closed = sink.close().await.context("unable to close destination");
    let bytes = first_error_wins(downloaded, closed)?;

    Ok(DownloadOutcome {
        video_id,
        stream: stream.clone(),
        destination,
        bytes,
    })
}

/// Combine a download result with the result of closing its sink.
///
/// A download error takes precedence; the close error only surfaces when the
/// download itself succeeded.
pub fn first_error_wins<T, E: Display>(result: Result<T, E>, close: Result<(), E>) -> Result<T, E> {
    match (result, close) {
        (Err(e), Err(close_err)) => {
            warn!("Also failed to close the destination: {}", close_err);
            Err(e)
        }
        (Err(e), Ok(())) => Err(e),
        (Ok(_), Err(close_err)) => Err(close_err),
        (Ok(value), Ok(())) => Ok(value),
    }
}
