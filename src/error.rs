//! Error taxonomy for the command path and the speech service boundary.
//!
//! Everything here is recoverable: task failures become user-facing narration
//! and speech failures end the current cycle. Only audio device acquisition
//! errors are fatal, and those travel as `anyhow::Error` from the recorder.

use std::path::PathBuf;
use thiserror::Error;

/// Failures from the external speech-to-text service.
///
/// Call sites must handle both kinds without terminating the listening loop.
#[derive(Debug, Clone, Error)]
pub enum SttError {
    /// Audio was processed but produced no usable text.
    #[error("no speech could be understood")]
    Unintelligible,
    /// The service itself failed (model state, backend error).
    #[error("speech service unavailable: {0}")]
    Unavailable(String),
}

/// Failures from task execution, surfaced to the user as narration.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("the name '{0}' contains invalid characters")]
    InvalidPath(String),
    #[error("application '{0}' was not found on this system")]
    ApplicationNotFound(String),
    #[error("command '{0}' is not supported on this platform")]
    CommandNotSupported(String),
    #[error("refusing to overwrite existing file {}", .0.display())]
    DownloadConflict(PathBuf),
    #[error("download failed: {0}")]
    DownloadFailed(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
