//! Download engine module

pub mod engine;
pub mod progress;
pub mod writer;

// Re-export for convenience
pub use engine::{DownloadConfig, DownloadEngine};
pub use progress::{DownloadProgress, DownloadStatus};
pub use writer::{open_output, FileSink, Mp3Sink, OutputSink, StdoutSink};
