//! Recording coordinator.
//!
//! A single-owner actor fed by the hotkey channel. One atomic flag guards
//! entry: the press handler CASes `false → true` and the release handler
//! the inverse, so OS key auto-repeat and rapid press/release sequences
//! collapse to at most one active recording with built-in debounce.
//!
//! Ordering rules this module must never break:
//! - `recording-status` is emitted synchronously from both handlers; the
//!   release emits `idle` *before* finalization so a delayed transition can
//!   never overtake the next press's `recording`.
//! - The watcher is paused at press and resumed only after `clip-saved`
//!   has been emitted, or unconditionally on error paths.
//! - The recording flag is set before the stream starts, so a release that
//!   arrives while start is still in flight queues behind it and wins its
//!   CAS the moment start completes.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Instant;

use pushclip_capture_engine::{CaptureSession, PreInitManager};
use pushclip_common::error::{PushclipError, PushclipResult};
use pushclip_timeline::{file_checksum, AspectRatio, Resolution, TimelineEntry, TimelineStore};
use tokio::sync::mpsc;

use crate::events::{EngineEvent, EventBus, RecordingStatus};
use crate::hotkey::HotkeyEvent;
use crate::paths::next_recording_path;
use crate::watcher::WatcherControl;

/// Shared state between the coordinator, the engine facade, and the
/// background finalization tasks.
pub(crate) struct CoordinatorContext {
    pub(crate) bus: EventBus,
    pub(crate) preinit: Arc<PreInitManager>,
    pub(crate) watcher: Arc<WatcherControl>,
    pub(crate) output_root: Arc<RwLock<PathBuf>>,
    pub(crate) current_project: Arc<RwLock<Option<String>>>,
    pub(crate) is_recording: Arc<AtomicBool>,
}

impl CoordinatorContext {
    fn current_project(&self) -> Option<String> {
        self.current_project.read().ok().and_then(|g| g.clone())
    }

    fn project_dir(&self, project: &str) -> PathBuf {
        self.output_root
            .read()
            .map(|root| root.join(project))
            .unwrap_or_else(|_| PathBuf::from(project))
    }
}

/// The in-flight recording between press and release.
struct ActiveRecording {
    session: CaptureSession,
    project_dir: PathBuf,
    path: PathBuf,
}

enum BeginFailure {
    NoProject,
    Start(PushclipError),
}

impl From<PushclipError> for BeginFailure {
    fn from(e: PushclipError) -> Self {
        Self::Start(e)
    }
}

/// Worker actor consuming hotkey events.
pub struct RecordingCoordinator {
    rx: mpsc::UnboundedReceiver<HotkeyEvent>,
    ctx: Arc<CoordinatorContext>,
    active: Option<ActiveRecording>,
}

impl RecordingCoordinator {
    pub(crate) fn new(
        rx: mpsc::UnboundedReceiver<HotkeyEvent>,
        ctx: Arc<CoordinatorContext>,
    ) -> Self {
        Self {
            rx,
            ctx,
            active: None,
        }
    }

    /// Main loop; run as a tokio task. Exits when the hotkey handle side
    /// is dropped.
    pub async fn run(mut self) {
        tracing::info!("Recording coordinator started");
        while let Some(event) = self.rx.recv().await {
            match event {
                HotkeyEvent::Pressed => self.on_press().await,
                HotkeyEvent::Released => self.on_release().await,
            }
        }
        tracing::info!("Recording coordinator shutting down");
    }

    async fn on_press(&mut self) {
        if self
            .ctx
            .is_recording
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::debug!("Press dropped, already recording (auto-repeat)");
            return;
        }

        // Status first, with no intermediate "preparing" state: anything
        // emitted later could arrive out of order on a rapid re-press.
        self.ctx
            .bus
            .emit(EngineEvent::RecordingStatus(RecordingStatus::Recording));
        self.ctx.watcher.pause();

        match self.begin_recording().await {
            Ok(active) => {
                tracing::info!(output = %active.path.display(), "Recording started");
                self.active = Some(active);
            }
            Err(BeginFailure::NoProject) => {
                tracing::warn!("Recording attempted with no active project");
                self.ctx.bus.emit(EngineEvent::ProjectRequired);
                self.ctx
                    .bus
                    .emit(EngineEvent::RecordingStatus(RecordingStatus::Idle));
                self.ctx.watcher.resume();
                self.ctx.is_recording.store(false, Ordering::SeqCst);
            }
            Err(BeginFailure::Start(e)) => {
                tracing::error!(error = %e, "Recording start failed");
                self.ctx.bus.emit(EngineEvent::RecordingError {
                    code: e.code().to_string(),
                    message: e.to_string(),
                });
                self.ctx
                    .bus
                    .emit(EngineEvent::RecordingStatus(RecordingStatus::Error));
                self.ctx.watcher.resume();
                self.ctx.is_recording.store(false, Ordering::SeqCst);
                rearm_pre_init(&self.ctx);
            }
        }
    }

    async fn begin_recording(&mut self) -> Result<ActiveRecording, BeginFailure> {
        let project = self
            .ctx
            .current_project()
            .ok_or(BeginFailure::NoProject)?;
        let project_dir = self.ctx.project_dir(&project);
        std::fs::create_dir_all(&project_dir).map_err(PushclipError::from)?;

        let acquire_started = Instant::now();

        // Fast path: the pre-built session. Slow path: build one now and
        // own up to the delay.
        let (mut session, cold_path) = match self.ctx.preinit.take_session().await {
            Some(session) => (session, false),
            None => {
                let config = self.ctx.preinit.current_config();
                let mut session = CaptureSession::new(config);
                {
                    let backend = self.ctx.preinit.backend();
                    let mut guard = backend.lock().await;
                    session.pre_initialize(guard.as_mut()).await?;
                }
                (session, true)
            }
        };

        let path = match next_recording_path(&project_dir) {
            Ok(path) => path,
            Err(e) => {
                session.dismantle();
                return Err(e.into());
            }
        };

        let start_result = {
            let backend = self.ctx.preinit.backend();
            let guard = backend.lock().await;
            session.start(&**guard, &path).await
        };
        if let Err(e) = start_result {
            session.dismantle();
            return Err(e.into());
        }

        let startup_ms = acquire_started.elapsed().as_millis() as u64;
        if cold_path {
            tracing::warn!(
                delay_ms = startup_ms,
                "Apologies: the capture pipeline was not pre-initialized, so this recording \
                 started {startup_ms} ms after the key went down"
            );
        } else if startup_ms > 100 {
            tracing::warn!(delay_ms = startup_ms, "Start exceeded the 100 ms hot-path budget");
        }

        Ok(ActiveRecording {
            session,
            project_dir,
            path,
        })
    }

    async fn on_release(&mut self) {
        if self
            .ctx
            .is_recording
            .compare_exchange(true, false, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::debug!("Release dropped, no recording in flight");
            return;
        }

        // Idle synchronously; finalization is invisible to the status line.
        self.ctx
            .bus
            .emit(EngineEvent::RecordingStatus(RecordingStatus::Idle));

        let Some(active) = self.active.take() else {
            tracing::error!("Recording flag was set with no active session");
            self.ctx.watcher.resume();
            return;
        };

        let ctx = self.ctx.clone();
        tokio::spawn(async move {
            if let Err(e) = finalize_recording(&ctx, active).await {
                tracing::error!(error = %e, "Recording finalization failed");
                ctx.bus.emit(EngineEvent::RecordingError {
                    code: e.code().to_string(),
                    message: e.to_string(),
                });
                ctx.bus
                    .emit(EngineEvent::RecordingStatus(RecordingStatus::Error));
            }
        });
    }
}

/// Stop, persist, announce. The watcher resumes on every exit path, and on
/// success only after `clip-saved` went out, so the watcher can never
/// observe the in-progress file and double-report it.
async fn finalize_recording(
    ctx: &Arc<CoordinatorContext>,
    mut active: ActiveRecording,
) -> PushclipResult<()> {
    let outcome = save_clip(ctx, &mut active).await;
    ctx.watcher.resume();
    rearm_pre_init(ctx);
    outcome
}

async fn save_clip(
    ctx: &Arc<CoordinatorContext>,
    active: &mut ActiveRecording,
) -> PushclipResult<()> {
    let finished = active.session.stop().await?;

    let filename = finished
        .path
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .ok_or_else(|| PushclipError::capture("output path has no filename"))?;

    let mut entry = TimelineEntry::new(filename, finished.recorded_at.clone());
    entry.duration_ms = finished.duration_ms;
    entry.mic_enabled = finished.mic_enabled;
    entry.resolution = Resolution {
        width: finished.width,
        height: finished.height,
    };
    entry.aspect_ratio = AspectRatio::from_resolution(finished.width, finished.height);
    entry.checksum = Some(file_checksum(&finished.path)?);
    if let Some(thumbnail) = capture_thumbnail(&finished.path) {
        entry.thumbnail = Some(thumbnail);
    }

    let store = TimelineStore::new(&active.project_dir);
    store.append_entry(entry)?;

    ctx.bus.emit(EngineEvent::ClipSaved {
        path: finished.path.display().to_string(),
        duration_ms: finished.duration_ms,
    });
    tracing::info!(
        path = %finished.path.display(),
        duration_ms = finished.duration_ms,
        "Clip saved"
    );
    Ok(())
}

/// Kick a fresh pre-initialization so the next press is fast again.
fn rearm_pre_init(ctx: &Arc<CoordinatorContext>) {
    let preinit = ctx.preinit.clone();
    tokio::spawn(async move {
        if let Err(e) = preinit.initialize().await {
            tracing::warn!(error = %e, "Pre-init re-arm failed");
        }
    });
}

/// Best-effort single-frame thumbnail next to the clip. Requires ffmpeg on
/// PATH; any failure just means no thumbnail.
fn capture_thumbnail(clip: &Path) -> Option<String> {
    let thumbnail = clip.with_extension("png");
    let status = Command::new("ffmpeg")
        .args(["-y", "-v", "error", "-i"])
        .arg(clip)
        .args(["-frames:v", "1"])
        .arg(&thumbnail)
        .status()
        .ok()?;
    if status.success() && thumbnail.exists() {
        thumbnail
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
    } else {
        None
    }
}
