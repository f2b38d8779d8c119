//! Events emitted to the UI layer.
//!
//! Delivered through a broadcast bus; the UI treats `clip-saved` as a file
//! notification, not a status transition, because it may arrive after the
//! next recording's `recording-status` event.

use pushclip_capture_engine::PreInitState;
use serde::Serialize;
use tokio::sync::broadcast;

/// Coarse recording state shown by the UI status indicator.
///
/// `Saving` exists in the wire protocol but the coordinator never emits it:
/// a post-release status that lags even slightly can overtake the next
/// press's `Recording` and pin the UI to a stale state, so release emits
/// `Idle` synchronously and finalization stays invisible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordingStatus {
    Idle,
    Recording,
    Saving,
    Error,
}

/// Everything the engine tells the UI.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "payload", rename_all = "kebab-case")]
pub enum EngineEvent {
    RecordingStatus(RecordingStatus),
    ClipSaved { path: String, duration_ms: u64 },
    RecordingError { code: String, message: String },
    FilesystemChanged,
    PreInitStatusChanged(PreInitState),
    PreInitIdleShutdown,
    ProjectRequired,
}

/// Broadcast fan-out of engine events.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<EngineEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.tx.subscribe()
    }

    /// Emit to all subscribers. Send errors just mean nobody is listening.
    pub fn emit(&self, event: EngineEvent) {
        tracing::debug!(?event, "Engine event");
        let _ = self.tx.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
