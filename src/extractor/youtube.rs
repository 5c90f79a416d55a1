use crate::extractor::traits::InfoFetcher;
use crate::utils::config::AppSettings;
use crate::utils::error::TubeloaderError;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, instrument};

/// Fetches video information from the `get_video_info` endpoint
pub struct YoutubeInfoFetcher {
    client: Client,
    endpoint: String,
}

impl YoutubeInfoFetcher {
    pub fn new(settings: &AppSettings) -> Result<Self, TubeloaderError> {
        let client = Client::builder()
            .user_agent(settings.user_agent.as_str())
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: settings.info_endpoint.clone(),
        })
    }

    /// URL requested for a given video id
    pub fn info_url(&self, video_id: &str) -> String {
        let separator = if self.endpoint.contains('?') { '&' } else { '?' };
        format!(
            "{}{}video_id={}",
            self.endpoint,
            separator,
            urlencoding::encode(video_id)
        )
    }
}

#[async_trait]
impl InfoFetcher for YoutubeInfoFetcher {
    fn id(&self) -> &'static str {
        "youtube-info"
    }

    #[instrument(skip(self))]
    async fn fetch(&self, video_id: &str) -> Result<String, TubeloaderError> {
        let url = self.info_url(video_id);
        debug!("Requesting video info: {}", url);

        let response = self.client.get(&url).send().await.map_err(|e| {
            TubeloaderError::Transport(format!("requesting the video information: {}", e))
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(TubeloaderError::Transport(format!(
                "non-success status code received: {}",
                status
            )));
        }

        let body = response.text().await.map_err(|e| {
            TubeloaderError::Transport(format!("reading the video information: {}", e))
        })?;

        debug!("Got {} bytes answer", body.len());
        Ok(body)
    }
}
