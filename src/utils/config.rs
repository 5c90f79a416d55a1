//! Application configuration

use crate::selector::{FormatPreference, Preference, QualityPreference};
use crate::utils::error::TubeloaderError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

pub const DEFAULT_INFO_ENDPOINT: &str = "http://youtube.com/get_video_info";
pub const DEFAULT_DESTINATION: &str = "./%title%.%format%";
pub const DEFAULT_DESTINATION_MP3: &str = "./%title%.mp3";

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Info endpoint queried with `?video_id=<id>`
    pub info_endpoint: String,

    /// Destination template, `-` for stdout
    pub destination: Option<String>,

    /// Preferred stream quality
    pub quality: QualityPreference,

    /// Preferred container format
    pub format: FormatPreference,

    /// Transcode to MP3 at this bitrate instead of saving the container
    pub audio_bitrate: Option<AudioBitrate>,

    /// User agent sent with every request
    pub user_agent: String,

    /// Timeout for the info request and for connecting to the stream (seconds)
    pub timeout_secs: u64,

    /// Minimum delay between two progress reports (milliseconds)
    pub progress_interval_ms: u64,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            info_endpoint: DEFAULT_INFO_ENDPOINT.to_string(),
            destination: None,
            quality: QualityPreference::Best,
            format: FormatPreference::Any,
            audio_bitrate: None,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36".to_string(),
            timeout_secs: 30,
            progress_interval_ms: 1000,
        }
    }
}

impl AppSettings {
    /// Load settings from a JSON file; missing keys keep their defaults
    pub fn load(path: &Path) -> Result<Self, TubeloaderError> {
        let content = std::fs::read_to_string(path)?;
        let settings: AppSettings = serde_json::from_str(&content)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), TubeloaderError> {
        if self.info_endpoint.trim().is_empty() {
            return Err(TubeloaderError::Config("info_endpoint is empty".to_string()));
        }
        if self.timeout_secs == 0 {
            return Err(TubeloaderError::Config("timeout_secs must be positive".to_string()));
        }
        if matches!(&self.destination, Some(d) if d.trim().is_empty()) {
            return Err(TubeloaderError::Config("destination is empty".to_string()));
        }
        Ok(())
    }

    pub fn preference(&self) -> Preference {
        Preference::new(self.quality, self.format)
    }

    /// Destination template in effect, taking MP3 output into account
    pub fn destination_template(&self) -> &str {
        match (&self.destination, &self.audio_bitrate) {
            (Some(destination), _) => destination.as_str(),
            (None, Some(_)) => DEFAULT_DESTINATION_MP3,
            (None, None) => DEFAULT_DESTINATION,
        }
    }
}

/// MP3 bitrate for audio extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum AudioBitrate {
    /// Let the encoder pick
    Auto,
    Kbps(u32),
}

impl AudioBitrate {
    pub const LOW: AudioBitrate = AudioBitrate::Kbps(64);
    pub const MEDIUM: AudioBitrate = AudioBitrate::Kbps(128);
    pub const HIGH: AudioBitrate = AudioBitrate::Kbps(192);
}

impl FromStr for AudioBitrate {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().trim_end_matches('k') {
            "auto" | "0" => Ok(AudioBitrate::Auto),
            "low" => Ok(AudioBitrate::LOW),
            "medium" => Ok(AudioBitrate::MEDIUM),
            "high" => Ok(AudioBitrate::HIGH),
            other => other
                .parse::<u32>()
                .map(AudioBitrate::Kbps)
                .map_err(|_| format!("invalid audio bitrate '{}'", s)),
        }
    }
}

impl TryFrom<String> for AudioBitrate {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AudioBitrate> for String {
    fn from(value: AudioBitrate) -> Self {
        value.to_string()
    }
}

impl fmt::Display for AudioBitrate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AudioBitrate::Auto => f.write_str("auto"),
            AudioBitrate::Kbps(kbps) => write!(f, "{}", kbps),
        }
    }
}
