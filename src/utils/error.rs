//! Error handling for Tubeloader

use thiserror::Error;

/// Failures of the info payload as a whole.
///
/// Problems with a single stream entry never surface here: the decoder logs
/// them and moves on to the next entry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("malformed server answer: {0}")]
    MalformedResponse(String),

    #[error("field '{0}' is missing in the server's answer")]
    MissingField(String),

    #[error("'fail' response status found in the server's answer, reason: '{0}'")]
    UpstreamRejected(String),

    #[error("non-success response status found in the server's answer (status: '{0}')")]
    UnexpectedStatus(String),
}

/// Failures of stream selection.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SelectionError {
    #[error("no stream could be decoded from the server's answer")]
    EmptyStreamList,

    #[error("no stream matches quality '{quality}' and format '{format}'")]
    NoMatchingStream { quality: String, format: String },
}

/// Main error type for Tubeloader
#[derive(Debug, Error)]
pub enum TubeloaderError {
    #[error("Invalid video id or url: {0}")]
    InvalidVideoId(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error("Download failed: {0}")]
    Download(String),

    #[error("Write failed: {0}")]
    Write(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
