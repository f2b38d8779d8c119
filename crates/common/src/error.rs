//! Error types shared across PushClip crates.

use std::path::PathBuf;

/// Top-level error type for PushClip operations.
///
/// Variants map one-to-one onto the stable error codes surfaced to the UI
/// through `recording-error` events; see [`PushclipError::code`].
#[derive(Debug, thiserror::Error)]
pub enum PushclipError {
    /// OS screen-recording or microphone permission is missing.
    #[error("Permission denied: {message}")]
    PermissionDenied { message: String },

    /// No displays, no content filter, or the capture framework is absent.
    #[error("Capture unavailable: {message}")]
    CaptureUnavailable { message: String },

    /// The encoder or stream rejected the supplied parameters.
    #[error("Configuration rejected: {message}")]
    ConfigurationRejected { message: String },

    /// The writer could not complete the container; the output may be partial.
    #[error("Finalization failed: {message}")]
    FinalizationFailed { message: String },

    /// The timeline JSON could not be written or renamed into place.
    #[error("Timeline write failed: {message}")]
    TimelineWrite { message: String },

    /// General capture-path failure that fits no narrower class.
    #[error("Capture error: {message}")]
    Capture { message: String },

    /// Project lookup or creation failure.
    #[error("Project error: {message}")]
    Project { message: String },

    /// Filesystem watcher failure.
    #[error("Watcher error: {message}")]
    Watcher { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using PushclipError.
pub type PushclipResult<T> = Result<T, PushclipError>;

impl PushclipError {
    pub fn permission_denied(msg: impl Into<String>) -> Self {
        Self::PermissionDenied {
            message: msg.into(),
        }
    }

    pub fn capture_unavailable(msg: impl Into<String>) -> Self {
        Self::CaptureUnavailable {
            message: msg.into(),
        }
    }

    pub fn configuration_rejected(msg: impl Into<String>) -> Self {
        Self::ConfigurationRejected {
            message: msg.into(),
        }
    }

    pub fn finalization_failed(msg: impl Into<String>) -> Self {
        Self::FinalizationFailed {
            message: msg.into(),
        }
    }

    pub fn timeline_write(msg: impl Into<String>) -> Self {
        Self::TimelineWrite {
            message: msg.into(),
        }
    }

    pub fn capture(msg: impl Into<String>) -> Self {
        Self::Capture {
            message: msg.into(),
        }
    }

    pub fn project(msg: impl Into<String>) -> Self {
        Self::Project {
            message: msg.into(),
        }
    }

    pub fn watcher(msg: impl Into<String>) -> Self {
        Self::Watcher {
            message: msg.into(),
        }
    }

    /// Stable machine-readable code for UI consumption.
    pub fn code(&self) -> &'static str {
        match self {
            Self::PermissionDenied { .. } => "permission-denied",
            Self::CaptureUnavailable { .. } => "capture-unavailable",
            Self::ConfigurationRejected { .. } => "configuration-rejected",
            Self::FinalizationFailed { .. } => "finalization-failed",
            Self::TimelineWrite { .. } => "timeline-write-failed",
            Self::Capture { .. } => "capture-error",
            Self::Project { .. } => "project-error",
            Self::Watcher { .. } => "watcher-error",
            Self::FileNotFound { .. } => "file-not-found",
            Self::Io(_) => "io-error",
            Self::Json(_) => "json-error",
            Self::Other(_) => "internal-error",
        }
    }
}
