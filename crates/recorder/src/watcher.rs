//! Filesystem watcher over the clip root.
//!
//! We watch directories rather than individual files because saves are
//! commonly written as temp-file-then-rename, and we pause rather than
//! debounce around recordings: a timer cannot distinguish "in-progress
//! write of our own recording" from "user dropped a finished file into the
//! folder", but pausing over the known interval removes the ambiguity by
//! construction. Events received while paused are discarded for good.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use pushclip_common::error::{PushclipError, PushclipResult};

use crate::events::{EngineEvent, EventBus};

/// Pause gate shared between the coordinator and the watcher callback.
///
/// Pause/resume maintain a depth counter so that overlapping pause windows
/// (a new press during the previous recording's finalization) cannot
/// re-enable emission while a recording is still in flight. Every `pause`
/// must be paired with a `resume` on all exit paths, including errors.
#[derive(Debug, Default)]
pub struct WatcherControl {
    pause_depth: AtomicUsize,
}

impl WatcherControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pause(&self) {
        self.pause_depth.fetch_add(1, Ordering::SeqCst);
    }

    pub fn resume(&self) {
        let previous = self.pause_depth.fetch_sub(1, Ordering::SeqCst);
        if previous == 0 {
            // Unpaired resume; undo the underflow.
            self.pause_depth.fetch_add(1, Ordering::SeqCst);
            tracing::warn!("Watcher resume without matching pause");
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.pause_depth.load(Ordering::SeqCst) == 0
    }
}

/// Whether a changed path is worth telling the UI about: clips, or
/// directories (new projects). Everything else (timeline JSON, temp
/// files, thumbnails) is app-internal noise.
fn is_relevant(root: &Path, path: &Path) -> bool {
    if !path.starts_with(root) || path == root {
        return false;
    }
    match path.extension().and_then(|e| e.to_str()) {
        Some("mp4") => true,
        // Removed paths cannot be stat'ed, so "no extension" is the best
        // available directory signal.
        None => true,
        Some(_) => false,
    }
}

/// Recursive watcher over the output root, alive as long as this value is.
pub struct ProjectWatcher {
    _watcher: RecommendedWatcher,
}

impl ProjectWatcher {
    /// Watch `root`, emitting `filesystem-changed` for relevant events
    /// whenever the control gate is open.
    pub fn spawn(
        root: &Path,
        control: Arc<WatcherControl>,
        bus: EventBus,
    ) -> PushclipResult<Self> {
        std::fs::create_dir_all(root)?;
        let root_owned: PathBuf = root.to_path_buf();

        let mut watcher = RecommendedWatcher::new(
            move |result: Result<Event, notify::Error>| match result {
                Ok(event) => {
                    if !control.is_enabled() {
                        return;
                    }
                    if event.paths.iter().any(|p| is_relevant(&root_owned, p)) {
                        bus.emit(EngineEvent::FilesystemChanged);
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Watcher backend error");
                }
            },
            notify::Config::default(),
        )
        .map_err(|e| PushclipError::watcher(e.to_string()))?;

        watcher
            .watch(root, RecursiveMode::Recursive)
            .map_err(|e| PushclipError::watcher(e.to_string()))?;

        tracing::info!(root = %root.display(), "Filesystem watcher started");
        Ok(Self { _watcher: watcher })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn pause_depth_nests() {
        let control = WatcherControl::new();
        assert!(control.is_enabled());

        control.pause();
        control.pause();
        assert!(!control.is_enabled());

        control.resume();
        assert!(!control.is_enabled());
        control.resume();
        assert!(control.is_enabled());
    }

    #[test]
    fn unpaired_resume_is_harmless() {
        let control = WatcherControl::new();
        control.resume();
        assert!(control.is_enabled());
        control.pause();
        assert!(!control.is_enabled());
    }

    #[test]
    fn relevance_filter() {
        let root = Path::new("/clips");
        assert!(is_relevant(root, Path::new("/clips/demo/recording-1.mp4")));
        assert!(is_relevant(root, Path::new("/clips/new-project")));
        assert!(!is_relevant(root, Path::new("/clips/demo/timeline.json")));
        assert!(!is_relevant(root, Path::new("/clips/demo/timeline.json.tmp")));
        assert!(!is_relevant(root, Path::new("/clips/demo/thumb.png")));
        assert!(!is_relevant(root, Path::new("/elsewhere/clip.mp4")));
        assert!(!is_relevant(root, Path::new("/clips")));
    }

    #[tokio::test]
    async fn paused_events_are_discarded_and_resume_reopens() {
        let dir = tempfile::tempdir().unwrap();
        let control = Arc::new(WatcherControl::new());
        let bus = EventBus::default();
        let mut rx = bus.subscribe();
        let _watcher = ProjectWatcher::spawn(dir.path(), control.clone(), bus.clone()).unwrap();

        control.pause();
        std::fs::write(dir.path().join("during-pause.mp4"), b"x").unwrap();
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert!(matches!(
            rx.try_recv(),
            Err(tokio::sync::broadcast::error::TryRecvError::Empty)
        ));

        control.resume();
        std::fs::write(dir.path().join("after-resume.mp4"), b"x").unwrap();
        let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("watcher event after resume")
            .unwrap();
        assert!(matches!(event, EngineEvent::FilesystemChanged));
    }
}
