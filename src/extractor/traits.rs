use crate::utils::error::TubeloaderError;
use async_trait::async_trait;

/// Source of raw `get_video_info` answers
///
/// This trait isolates the decoding pipeline from the transport, so it can be
/// driven by a stub in tests.
#[async_trait]
pub trait InfoFetcher: Send + Sync {
    /// Returns a unique identifier for this fetcher (e.g., "youtube-info")
    fn id(&self) -> &'static str;

    /// Fetches the raw, still URL-encoded info answer for a video id
    async fn fetch(&self, video_id: &str) -> Result<String, TubeloaderError>;
}
