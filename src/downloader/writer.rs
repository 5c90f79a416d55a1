//! Output sinks for downloaded streams
//!
//! A sink is opened only once a stream has been selected and must be closed
//! on every path afterwards, including a failed download.

use crate::extractor::StreamDescriptor;
use crate::utils::config::{AppSettings, AudioBitrate};
use crate::utils::error::TubeloaderError;
use crate::utils::naming::expand_destination;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::fs::{self, File};
use tokio::io::{AsyncWriteExt, BufWriter, Stdout};
use tokio::process::{Child, ChildStdin, Command as AsyncCommand};
use tracing::{debug, info};

/// Destination for stream bytes
#[async_trait]
pub trait OutputSink: Send {
    /// Human readable destination, for messages
    fn describe(&self) -> String;

    async fn write(&mut self, bytes: &[u8]) -> Result<(), TubeloaderError>;

    /// Flush and release the destination. Further writes fail.
    async fn close(&mut self) -> Result<(), TubeloaderError>;
}

fn write_error(target: &str, action: &str, e: std::io::Error) -> TubeloaderError {
    TubeloaderError::Write(format!("{} {}: {}", action, target, e))
}

/// Plain file destination
pub struct FileSink {
    path: PathBuf,
    file: Option<BufWriter<File>>,
}

impl FileSink {
    /// Create (or truncate) the file, creating missing parent directories
    pub async fn create(path: &Path) -> Result<Self, TubeloaderError> {
        let target = path.display().to_string();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| write_error(&target, "creating the directory of", e))?;
        }

        let file = File::create(path)
            .await
            .map_err(|e| write_error(&target, "creating", e))?;

        Ok(Self {
            path: path.to_path_buf(),
            file: Some(BufWriter::new(file)),
        })
    }
}

#[async_trait]
impl OutputSink for FileSink {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    async fn write(&mut self, bytes: &[u8]) -> Result<(), TubeloaderError> {
        let path = &self.path;
        let file = self.file.as_mut().ok_or_else(|| {
            TubeloaderError::Write(format!("{} is already closed", path.display()))
        })?;
        file.write_all(bytes)
            .await
            .map_err(|e| write_error(&path.display().to_string(), "writing to", e))
    }

    async fn close(&mut self) -> Result<(), TubeloaderError> {
        let target = self.describe();
        match self.file.take() {
            Some(mut file) => {
                file.flush()
                    .await
                    .map_err(|e| write_error(&target, "closing", e))?;
                debug!("Closed {}", target);
                Ok(())
            }
            None => Ok(()),
        }
    }
}

/// Standard output destination (`-`)
pub struct StdoutSink {
    out: BufWriter<Stdout>,
}

impl StdoutSink {
    pub fn new() -> Self {
        Self {
            out: BufWriter::new(tokio::io::stdout()),
        }
    }
}

impl Default for StdoutSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OutputSink for StdoutSink {
    fn describe(&self) -> String {
        "standard output".to_string()
    }

    async fn write(&mut self, bytes: &[u8]) -> Result<(), TubeloaderError> {
        self.out
            .write_all(bytes)
            .await
            .map_err(|e| write_error("standard output", "writing to", e))
    }

    async fn close(&mut self) -> Result<(), TubeloaderError> {
        self.out
            .flush()
            .await
            .map_err(|e| write_error("standard output", "closing", e))
    }
}

/// MP3 transcoding destination: bytes are piped through `ffmpeg`
pub struct Mp3Sink {
    target: String,
    child: Child,
    stdin: Option<ChildStdin>,
}

impl Mp3Sink {
    /// `ffmpeg` arguments reading the container from stdin and writing MP3 to `target`
    pub fn ffmpeg_args(target: &str, bitrate: AudioBitrate) -> Vec<String> {
        let mut args: Vec<String> = ["-hide_banner", "-loglevel", "error", "-y", "-i", "pipe:0", "-vn"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        if let AudioBitrate::Kbps(kbps) = bitrate {
            args.push("-b:a".to_string());
            args.push(format!("{}k", kbps));
        }
        args.extend(["-f".to_string(), "mp3".to_string(), target.to_string()]);
        args
    }

    /// Spawn `ffmpeg`; `target` is a file path or `pipe:1` for stdout
    pub async fn spawn(target: &str, bitrate: AudioBitrate) -> Result<Self, TubeloaderError> {
        let ffmpeg = which::which("ffmpeg").map_err(|_| {
            TubeloaderError::Write("ffmpeg not found, it is required for MP3 output".to_string())
        })?;

        if target != "pipe:1" {
            if let Some(parent) = Path::new(target).parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .await
                    .map_err(|e| write_error(target, "creating the directory of", e))?;
            }
        }

        debug!("Spawning {} for {}", ffmpeg.display(), target);
        let mut child = AsyncCommand::new(ffmpeg)
            .args(Self::ffmpeg_args(target, bitrate))
            .stdin(Stdio::piped())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| write_error(target, "starting ffmpeg for", e))?;
        let stdin = child.stdin.take();

        Ok(Self {
            target: target.to_string(),
            child,
            stdin,
        })
    }
}

#[async_trait]
impl OutputSink for Mp3Sink {
    fn describe(&self) -> String {
        format!("{} (mp3)", self.target)
    }

    async fn write(&mut self, bytes: &[u8]) -> Result<(), TubeloaderError> {
        let target = &self.target;
        let stdin = self.stdin.as_mut().ok_or_else(|| {
            TubeloaderError::Write(format!("{} is already closed", target))
        })?;
        stdin
            .write_all(bytes)
            .await
            .map_err(|e| write_error(target, "writing to ffmpeg for", e))
    }

    async fn close(&mut self) -> Result<(), TubeloaderError> {
        let target = self.describe();
        let Some(mut stdin) = self.stdin.take() else {
            return Ok(());
        };
        // ffmpeg only finishes once its input is closed
        let flushed = stdin.flush().await;
        drop(stdin);

        let status = self
            .child
            .wait()
            .await
            .map_err(|e| write_error(&target, "waiting for ffmpeg on", e))?;
        flushed.map_err(|e| write_error(&target, "closing", e))?;

        if !status.success() {
            return Err(TubeloaderError::Write(format!(
                "ffmpeg exited with {} for {}",
                status, target
            )));
        }
        debug!("ffmpeg finished {}", target);
        Ok(())
    }
}

/// Open the destination configured in `settings` for the selected stream
pub async fn open_output(
    settings: &AppSettings,
    stream: &StreamDescriptor,
    video_id: &str,
) -> Result<Box<dyn OutputSink>, TubeloaderError> {
    let template = settings.destination_template();

    let sink: Box<dyn OutputSink> = match (template, settings.audio_bitrate) {
        ("-", Some(bitrate)) => Box::new(Mp3Sink::spawn("pipe:1", bitrate).await?),
        ("-", None) => Box::new(StdoutSink::new()),
        (template, Some(bitrate)) => {
            let path = expand_destination(template, stream, video_id);
            Box::new(Mp3Sink::spawn(&path.to_string_lossy(), bitrate).await?)
        }
        (template, None) => {
            let path = expand_destination(template, stream, video_id);
            Box::new(FileSink::create(&path).await?)
        }
    };

    info!("Writing to {}", sink.describe());
    Ok(sink)
}
