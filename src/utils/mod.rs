//! Utility modules for error handling, configuration and file naming

pub mod config;
pub mod error;
pub mod naming;

// Re-export for convenience
pub use config::{AppSettings, AudioBitrate};
pub use error::{DecodeError, SelectionError, TubeloaderError};
pub use naming::{expand_destination, sanitize_filename};
