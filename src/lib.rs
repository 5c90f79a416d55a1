//! Tubeloader library

pub mod app;
pub mod downloader;
pub mod extractor;
pub mod selector;
pub mod utils;

// Re-export main types for easier use
pub use downloader::{DownloadConfig, DownloadEngine, DownloadProgress, DownloadStatus};
pub use extractor::{
    decode_video_info, FormatClass, InfoFetcher, QualityClass, StreamDescriptor, StreamList,
    YoutubeInfoFetcher,
};
pub use selector::{select_stream, FormatPreference, Preference, QualityPreference};
pub use utils::{AppSettings, DecodeError, SelectionError, TubeloaderError};
