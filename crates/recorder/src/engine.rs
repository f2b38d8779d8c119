//! Engine facade: the command surface the UI shell invokes.
//!
//! Owns the pre-init manager, the coordinator worker, the filesystem
//! watcher, and per-project edit histories. Configuration changes that
//! touch the capture pipeline (microphone, device, region, project, output
//! root) tear down and rebuild the warm session; the set of settings that
//! are safe to change without a rebuild is deliberately empty.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex, RwLock};
use std::time::Duration;

use pushclip_capture_engine::backend::{
    default_backend, AudioDeviceInfo, AuthorizationStatus, Capability, CaptureBackend,
};
use pushclip_capture_engine::{PreInitManager, PreInitState, RecordingConfig, Region};
use pushclip_common::config::{AppConfig, RecordingDefaults};
use pushclip_common::error::{PushclipError, PushclipResult};
use pushclip_timeline::{
    reconcile_project, ProjectTimeline, TimelineHistory, TimelineStore,
};
use tokio::sync::broadcast;

use crate::coordinator::{CoordinatorContext, RecordingCoordinator};
use crate::events::{EngineEvent, EventBus};
use crate::hotkey::{self, HotkeyHandle};
use crate::watcher::{ProjectWatcher, WatcherControl};

/// The capture engine core, one per app process.
pub struct Engine {
    bus: EventBus,
    preinit: Arc<PreInitManager>,
    watcher_control: Arc<WatcherControl>,
    watcher: StdMutex<Option<ProjectWatcher>>,
    hotkey: HotkeyHandle,
    output_root: Arc<RwLock<PathBuf>>,
    current_project: Arc<RwLock<Option<String>>>,
    is_recording: Arc<AtomicBool>,
    recording_config: StdMutex<RecordingConfig>,
    histories: StdMutex<HashMap<String, TimelineHistory>>,
}

impl Engine {
    /// Build with the platform backend.
    pub fn new(config: AppConfig) -> PushclipResult<Arc<Self>> {
        Self::with_backend(config, default_backend())
    }

    /// Build with an explicit backend (tests use the synthetic one).
    /// Spawns the coordinator worker, the watcher, the pre-init status
    /// forwarder, and the idle monitor; must run inside a tokio runtime.
    pub fn with_backend(
        config: AppConfig,
        backend: Box<dyn CaptureBackend>,
    ) -> PushclipResult<Arc<Self>> {
        let bus = EventBus::default();
        let recording_config = recording_config_from(&config.recording);
        let preinit = Arc::new(PreInitManager::new(
            backend,
            recording_config.clone(),
            Duration::from_secs(config.pre_init.idle_timeout_secs),
        ));
        let watcher_control = Arc::new(WatcherControl::new());
        let output_root = Arc::new(RwLock::new(config.output_root.clone()));
        let current_project = Arc::new(RwLock::new(None));
        let is_recording = Arc::new(AtomicBool::new(false));

        let (hotkey, hotkey_rx) = hotkey::channel();
        let ctx = Arc::new(CoordinatorContext {
            bus: bus.clone(),
            preinit: preinit.clone(),
            watcher: watcher_control.clone(),
            output_root: output_root.clone(),
            current_project: current_project.clone(),
            is_recording: is_recording.clone(),
        });
        tokio::spawn(RecordingCoordinator::new(hotkey_rx, ctx).run());

        let watcher =
            ProjectWatcher::spawn(&config.output_root, watcher_control.clone(), bus.clone())?;

        spawn_state_forwarder(&preinit, &bus);
        spawn_idle_monitor(&preinit, &bus);

        // Warm up off the startup path; a failure here surfaces through the
        // state watch and the slow-path apology, not a panic.
        {
            let preinit = preinit.clone();
            tokio::spawn(async move {
                if let Err(e) = preinit.initialize().await {
                    tracing::warn!(error = %e, "Initial pre-initialization failed");
                }
            });
        }

        Ok(Arc::new(Self {
            bus,
            preinit,
            watcher_control,
            watcher: StdMutex::new(Some(watcher)),
            hotkey,
            output_root,
            current_project,
            is_recording,
            recording_config: StdMutex::new(recording_config),
            histories: StdMutex::new(HashMap::new()),
        }))
    }

    // ---- event / hotkey wiring ------------------------------------------

    /// Subscribe to engine events.
    pub fn events(&self) -> broadcast::Receiver<EngineEvent> {
        self.bus.subscribe()
    }

    /// The handle the external hotkey provider dispatches into.
    pub fn hotkey_handle(&self) -> HotkeyHandle {
        self.hotkey.clone()
    }

    pub fn is_recording(&self) -> bool {
        self.is_recording.load(Ordering::SeqCst)
    }

    // ---- pre-initialization ---------------------------------------------

    pub fn get_pre_init_status(&self) -> PreInitState {
        self.preinit.state()
    }

    pub async fn toggle_pre_init(&self) -> PushclipResult<PreInitState> {
        self.preinit.update_activity();
        self.preinit.toggle().await
    }

    /// Build the warm session now and wait for it (the shells call this
    /// before their first press; the engine also warms up on startup).
    pub async fn pre_initialize(&self) -> PushclipResult<()> {
        self.preinit.initialize().await
    }

    pub fn update_activity(&self) {
        self.preinit.update_activity();
    }

    // ---- capture configuration ------------------------------------------

    pub async fn authorize_capture(&self) -> PushclipResult<AuthorizationStatus> {
        let backend = self.preinit.backend();
        let mut guard = backend.lock().await;
        guard.request_authorization().await
    }

    pub async fn capabilities(&self) -> Vec<Capability> {
        let backend = self.preinit.backend();
        let guard = backend.lock().await;
        guard.capabilities()
    }

    pub async fn get_audio_devices(&self) -> PushclipResult<Vec<AudioDeviceInfo>> {
        let backend = self.preinit.backend();
        let guard = backend.lock().await;
        guard.list_audio_devices()
    }

    pub async fn set_audio_device(&self, device_id: Option<String>) -> PushclipResult<()> {
        self.mutate_config(|config| config.microphone_device_id = device_id)
            .await
    }

    pub async fn set_mic_enabled(&self, enabled: bool) -> PushclipResult<()> {
        self.mutate_config(|config| config.capture_microphone = enabled)
            .await
    }

    pub async fn set_capture_region(&self, region: Region) -> PushclipResult<()> {
        self.mutate_config(|config| config.region = Some(region)).await
    }

    /// Clear the region (switching back to full-display capture).
    pub async fn clear_capture_region(&self) -> PushclipResult<()> {
        self.mutate_config(|config| config.region = None).await
    }

    async fn mutate_config(
        &self,
        mutate: impl FnOnce(&mut RecordingConfig),
    ) -> PushclipResult<()> {
        self.preinit.update_activity();
        let updated = {
            let mut guard = self
                .recording_config
                .lock()
                .map_err(|_| PushclipError::capture("config lock poisoned"))?;
            mutate(&mut guard);
            guard.clone()
        };
        // A rebuild failure is not a settings failure: the change is
        // recorded and the next press falls back to the slow path, which
        // surfaces the real error.
        if let Err(e) = self.preinit.apply_config(updated).await {
            tracing::warn!(error = %e, "Warm session rebuild failed after settings change");
        }
        Ok(())
    }

    // ---- projects -------------------------------------------------------

    pub fn get_output_folder(&self) -> PathBuf {
        self.output_root
            .read()
            .map(|g| g.clone())
            .unwrap_or_default()
    }

    /// Move the clip root; restarts the watcher over the new root and
    /// invalidates the warm session.
    pub async fn set_output_folder(&self, path: PathBuf) -> PushclipResult<()> {
        let watcher =
            ProjectWatcher::spawn(&path, self.watcher_control.clone(), self.bus.clone())?;
        if let Ok(mut guard) = self.watcher.lock() {
            *guard = Some(watcher);
        }
        if let Ok(mut guard) = self.output_root.write() {
            *guard = path;
        }
        self.preinit.update_activity();
        if let Err(e) = self.preinit.rebuild().await {
            tracing::warn!(error = %e, "Warm session rebuild failed after output folder change");
        }
        Ok(())
    }

    pub fn create_project(&self, name: &str) -> PushclipResult<()> {
        validate_project_name(name)?;
        let dir = self.get_output_folder().join(name);
        std::fs::create_dir_all(&dir)?;
        let store = TimelineStore::new(&dir);
        if !store.timeline_path().exists() {
            store.save(&ProjectTimeline::new(name))?;
        }
        self.preinit.update_activity();
        tracing::info!(project = name, "Project created");
        Ok(())
    }

    pub fn get_projects(&self) -> PushclipResult<Vec<String>> {
        let root = self.get_output_folder();
        let mut projects = Vec::new();
        if root.exists() {
            for dirent in std::fs::read_dir(&root)? {
                let dirent = dirent?;
                if !dirent.path().is_dir() {
                    continue;
                }
                if let Some(name) = dirent.file_name().to_str() {
                    if !name.starts_with('.') {
                        projects.push(name.to_string());
                    }
                }
            }
        }
        projects.sort();
        Ok(projects)
    }

    pub fn get_current_project(&self) -> Option<String> {
        self.current_project.read().ok().and_then(|g| g.clone())
    }

    /// Select the project recordings land in. Invalidates the warm session:
    /// the pre-built pipeline encodes the project it will write into.
    pub async fn set_current_project(&self, name: &str) -> PushclipResult<()> {
        validate_project_name(name)?;
        let dir = self.get_output_folder().join(name);
        if !dir.is_dir() {
            return Err(PushclipError::project(format!("no such project: {name}")));
        }
        if let Ok(mut guard) = self.current_project.write() {
            *guard = Some(name.to_string());
        }
        self.preinit.update_activity();
        if let Err(e) = self.preinit.rebuild().await {
            tracing::warn!(error = %e, "Warm session rebuild failed after project change");
        }
        Ok(())
    }

    // ---- timeline access ------------------------------------------------

    fn project_store(&self, project: &str) -> PushclipResult<TimelineStore> {
        validate_project_name(project)?;
        Ok(TimelineStore::new(self.get_output_folder().join(project)))
    }

    pub fn get_project_timeline(&self, project: &str) -> PushclipResult<ProjectTimeline> {
        self.project_store(project)?.load()
    }

    /// Persist a user edit (reorder, relabel). Soft-deleted entries the
    /// caller dropped are re-attached, and the previous state is pushed
    /// onto this project's undo history.
    pub fn save_project_timeline(
        &self,
        project: &str,
        timeline: ProjectTimeline,
    ) -> PushclipResult<ProjectTimeline> {
        let store = self.project_store(project)?;
        let current = store.load()?;

        let mut incoming = timeline;
        for entry in &current.entries {
            if entry.deleted && !incoming.entries.iter().any(|e| e.id == entry.id) {
                incoming.entries.push(entry.clone());
            }
        }
        incoming.touch();
        store.save(&incoming)?;

        self.push_history(project, current);
        self.preinit.update_activity();
        Ok(incoming)
    }

    /// Soft-delete one clip, with undo history.
    pub fn soft_delete_clip(&self, project: &str, entry_id: &str) -> PushclipResult<bool> {
        let store = self.project_store(project)?;
        let previous = store.load()?;
        let deleted = store.soft_delete(entry_id)?;
        if deleted {
            self.push_history(project, previous);
        }
        Ok(deleted)
    }

    pub fn undo_timeline(&self, project: &str) -> PushclipResult<Option<ProjectTimeline>> {
        let store = self.project_store(project)?;
        let current = store.load()?;
        let restored = self
            .histories
            .lock()
            .map_err(|_| PushclipError::capture("history lock poisoned"))?
            .entry(project.to_string())
            .or_default()
            .undo(current);
        if let Some(ref timeline) = restored {
            store.save(timeline)?;
        }
        Ok(restored)
    }

    pub fn redo_timeline(&self, project: &str) -> PushclipResult<Option<ProjectTimeline>> {
        let store = self.project_store(project)?;
        let current = store.load()?;
        let restored = self
            .histories
            .lock()
            .map_err(|_| PushclipError::capture("history lock poisoned"))?
            .entry(project.to_string())
            .or_default()
            .redo(current);
        if let Some(ref timeline) = restored {
            store.save(timeline)?;
        }
        Ok(restored)
    }

    /// Cross-check the timeline against the files on disk; returns how many
    /// orphan files were promoted. Reconciliation is external, so it does
    /// not touch the undo history.
    pub fn reconcile_project_timeline(&self, project: &str) -> PushclipResult<usize> {
        let store = self.project_store(project)?;
        self.preinit.update_activity();
        reconcile_project(&store)
    }

    fn push_history(&self, project: &str, previous: ProjectTimeline) {
        if let Ok(mut histories) = self.histories.lock() {
            histories
                .entry(project.to_string())
                .or_default()
                .push(previous);
        }
    }
}

fn recording_config_from(defaults: &RecordingDefaults) -> RecordingConfig {
    RecordingConfig {
        fps: defaults.fps,
        quality: defaults.quality,
        capture_cursor: defaults.capture_cursor,
        capture_microphone: defaults.capture_microphone,
        ..Default::default()
    }
}

fn validate_project_name(name: &str) -> PushclipResult<()> {
    let bad = name.is_empty()
        || name == "."
        || name == ".."
        || name.starts_with('.')
        || name.contains('/')
        || name.contains('\\');
    if bad {
        return Err(PushclipError::project(format!(
            "invalid project name: {name:?}"
        )));
    }
    Ok(())
}

fn spawn_state_forwarder(preinit: &Arc<PreInitManager>, bus: &EventBus) {
    let mut state_rx = preinit.subscribe();
    let bus = bus.clone();
    tokio::spawn(async move {
        while state_rx.changed().await.is_ok() {
            let state = *state_rx.borrow();
            bus.emit(EngineEvent::PreInitStatusChanged(state));
        }
    });
}

/// Poll the activity tracker and release OS capture resources when the
/// user is clearly not about to record.
fn spawn_idle_monitor(preinit: &Arc<PreInitManager>, bus: &EventBus) {
    let preinit = preinit.clone();
    let bus = bus.clone();
    let poll = (preinit.idle_timeout() / 4)
        .clamp(Duration::from_millis(50), Duration::from_secs(15));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(poll);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            if preinit.state() == PreInitState::Ready
                && preinit.idle_for() >= preinit.idle_timeout()
            {
                tracing::info!("Idle timeout reached, releasing capture resources");
                if let Err(e) = preinit.shutdown().await {
                    tracing::warn!(error = %e, "Idle shutdown failed");
                }
                bus.emit(EngineEvent::PreInitIdleShutdown);
            }
        }
    });
}
