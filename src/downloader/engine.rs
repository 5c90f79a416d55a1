//! Single-connection stream download engine

use crate::downloader::progress::DownloadProgress;
use crate::downloader::writer::OutputSink;
use crate::extractor::StreamDescriptor;
use crate::utils::config::AppSettings;
use crate::utils::error::TubeloaderError;
use futures::StreamExt;
use reqwest::Client;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, instrument, warn};

/// Download configuration
#[derive(Debug, Clone)]
pub struct DownloadConfig {
    pub user_agent: String,
    pub connect_timeout: Duration,  // Only bounds connecting, not the whole body
    pub progress_interval: Duration, // Minimum delay between progress reports
}

impl Default for DownloadConfig {
    fn default() -> Self {
        DownloadConfig::from(&AppSettings::default())
    }
}

impl From<&AppSettings> for DownloadConfig {
    fn from(settings: &AppSettings) -> Self {
        Self {
            user_agent: settings.user_agent.clone(),
            connect_timeout: Duration::from_secs(settings.timeout_secs),
            progress_interval: Duration::from_millis(settings.progress_interval_ms),
        }
    }
}

/// Copies a selected stream into an output sink
pub struct DownloadEngine {
    client: Client,
    config: DownloadConfig,
}

impl DownloadEngine {
    /// Create new download engine with configuration
    pub fn new(config: DownloadConfig) -> Result<Self, TubeloaderError> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .connect_timeout(config.connect_timeout)
            .build()?;

        Ok(Self { client, config })
    }

    /// Download the stream into `sink`, returning the number of bytes written.
    ///
    /// The sink is left open: closing it is the caller's job, whatever the
    /// outcome here.
    #[instrument(skip_all, fields(quality = %stream.quality, format = %stream.format()))]
    pub async fn download(
        &self,
        stream: &StreamDescriptor,
        sink: &mut dyn OutputSink,
        progress_tx: mpsc::Sender<DownloadProgress>,
    ) -> Result<u64, TubeloaderError> {
        let mut progress = DownloadProgress::new(0);

        match self.copy(stream, sink, &mut progress, &progress_tx).await {
            Ok(downloaded) => {
                progress.complete();
                if let Err(e) = progress_tx.send(progress).await {
                    warn!("Failed to send final progress: {}", e);
                }
                Ok(downloaded)
            }
            Err(e) => {
                progress.failed(e.to_string());
                if let Err(send_err) = progress_tx.send(progress).await {
                    warn!("Failed to send failed progress: {}", send_err);
                }
                Err(e)
            }
        }
    }

    async fn copy(
        &self,
        stream: &StreamDescriptor,
        sink: &mut dyn OutputSink,
        progress: &mut DownloadProgress,
        progress_tx: &mpsc::Sender<DownloadProgress>,
    ) -> Result<u64, TubeloaderError> {
        let url = stream.signed_url();
        debug!("Downloading stream from {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| TubeloaderError::Download(format!("requesting the stream: {}", e)))?;

        if !response.status().is_success() {
            return Err(TubeloaderError::Download(format!(
                "HTTP error: {}",
                response.status()
            )));
        }

        progress.total_bytes = response.content_length().unwrap_or(0);
        progress.update(0, 0.0);
        if let Err(e) = progress_tx.send(progress.clone()).await {
            warn!("Failed to send initial progress: {}", e);
        }

        let start_time = Instant::now();
        let mut last_update_time = start_time;
        let mut downloaded = 0u64;

        let mut body = response.bytes_stream();
        while let Some(chunk_result) = body.next().await {
            let chunk = chunk_result
                .map_err(|e| TubeloaderError::Download(format!("reading the stream: {}", e)))?;
            sink.write(&chunk).await?;
            downloaded += chunk.len() as u64;

            let now = Instant::now();
            if now.duration_since(last_update_time) >= self.config.progress_interval {
                progress.update(downloaded, average_speed(downloaded, start_time));
                if let Err(e) = progress_tx.send(progress.clone()).await {
                    warn!("Failed to send progress update: {}", e);
                }
                last_update_time = now;
            }
        }

        progress.update(downloaded, average_speed(downloaded, start_time));
        debug!("Downloaded {} bytes", downloaded);
        Ok(downloaded)
    }
}

fn average_speed(downloaded: u64, start_time: Instant) -> f64 {
    let elapsed = start_time.elapsed().as_secs_f64();
    if elapsed > 0.0 {
        downloaded as f64 / elapsed
    } else {
        0.0
    }
}
