//! Pre-initialization manager.
//!
//! Keeps one fully built capture session warm so that a hotkey press costs
//! a writer open and a stream start instead of seconds of framework setup.
//! Transitions are monotone along `NotInitialized → Initializing → Ready →
//! ShuttingDown → NotInitialized`; the transient states are serialized so
//! only one build or teardown runs at a time, and an `initialize` issued
//! during a teardown queues behind it.

use std::sync::{Arc, Mutex as StdMutex};
use std::time::{Duration, Instant};

use pushclip_common::error::PushclipResult;
use serde::Serialize;
use tokio::sync::{watch, Mutex};

use crate::backend::CaptureBackend;
use crate::config::RecordingConfig;
use crate::session::CaptureSession;

/// Observable manager state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PreInitState {
    NotInitialized,
    Initializing,
    Ready,
    ShuttingDown,
}

/// Holds the warm session and drives its lifecycle.
pub struct PreInitManager {
    backend: Arc<Mutex<Box<dyn CaptureBackend>>>,
    slot: Mutex<Option<CaptureSession>>,
    config: StdMutex<RecordingConfig>,
    state_tx: watch::Sender<PreInitState>,
    last_activity: StdMutex<Instant>,
    idle_timeout: Duration,
    /// Serializes the transient transitions (build / teardown).
    transition: Mutex<()>,
}

impl PreInitManager {
    pub fn new(
        backend: Box<dyn CaptureBackend>,
        config: RecordingConfig,
        idle_timeout: Duration,
    ) -> Self {
        let (state_tx, _) = watch::channel(PreInitState::NotInitialized);
        Self {
            backend: Arc::new(Mutex::new(backend)),
            slot: Mutex::new(None),
            config: StdMutex::new(config),
            state_tx,
            last_activity: StdMutex::new(Instant::now()),
            idle_timeout,
            transition: Mutex::new(()),
        }
    }

    pub fn state(&self) -> PreInitState {
        *self.state_tx.borrow()
    }

    /// Watch state transitions (the engine forwards these to the UI).
    pub fn subscribe(&self) -> watch::Receiver<PreInitState> {
        self.state_tx.subscribe()
    }

    /// Shared backend handle, also used by the coordinator's slow path and
    /// by session start/stop.
    pub fn backend(&self) -> Arc<Mutex<Box<dyn CaptureBackend>>> {
        self.backend.clone()
    }

    /// The config the next warm session will be built from.
    pub fn current_config(&self) -> RecordingConfig {
        self.config
            .lock()
            .map(|c| c.clone())
            .unwrap_or_default()
    }

    fn set_state(&self, state: PreInitState) {
        let previous = *self.state_tx.borrow();
        if previous != state {
            tracing::info!(?previous, current = ?state, "Pre-init state changed");
            let _ = self.state_tx.send_replace(state);
        }
    }

    /// Build the warm session. Idempotent: a no-op when `Ready`, waits for
    /// an in-flight build, and queues behind an in-flight teardown. A build
    /// failure surfaces the error and returns to `NotInitialized` with no
    /// retry loop.
    pub async fn initialize(&self) -> PushclipResult<()> {
        let _transition = self.transition.lock().await;
        if self.state() == PreInitState::Ready {
            return Ok(());
        }

        self.set_state(PreInitState::Initializing);
        let config = self.current_config();
        let mut session = CaptureSession::new(config);

        let result = {
            let mut backend = self.backend.lock().await;
            session.pre_initialize(backend.as_mut()).await
        };

        match result {
            Ok(()) => {
                *self.slot.lock().await = Some(session);
                self.set_state(PreInitState::Ready);
                Ok(())
            }
            Err(e) => {
                self.set_state(PreInitState::NotInitialized);
                Err(e)
            }
        }
    }

    /// Move the warm session out for a recording. The slot empties and the
    /// state drops to `NotInitialized` until the coordinator re-arms it.
    pub async fn take_session(&self) -> Option<CaptureSession> {
        let session = self.slot.lock().await.take();
        if session.is_some() {
            self.set_state(PreInitState::NotInitialized);
        }
        session
    }

    /// Tear down the warm session and release framework resources.
    pub async fn shutdown(&self) -> PushclipResult<()> {
        let _transition = self.transition.lock().await;

        let session = self.slot.lock().await.take();
        if session.is_none() && self.state() == PreInitState::NotInitialized {
            return Ok(());
        }

        self.set_state(PreInitState::ShuttingDown);
        if let Some(session) = session {
            session.dismantle();
        }
        {
            let mut backend = self.backend.lock().await;
            if let Err(e) = backend.shutdown().await {
                tracing::warn!(error = %e, "Backend shutdown reported an error");
            }
        }
        self.set_state(PreInitState::NotInitialized);
        Ok(())
    }

    /// Full teardown + rebuild, for configuration changes that invalidate
    /// the warm session (mic, device, region, project, display: all of
    /// them; there is no partial reconfiguration).
    pub async fn rebuild(&self) -> PushclipResult<()> {
        self.shutdown().await?;
        self.initialize().await
    }

    /// Replace the build config and rebuild the warm session.
    pub async fn apply_config(&self, config: RecordingConfig) -> PushclipResult<()> {
        {
            if let Ok(mut guard) = self.config.lock() {
                if *guard == config {
                    // Nothing changed; keep the warm session.
                    return Ok(());
                }
                *guard = config;
            }
        }
        self.rebuild().await
    }

    /// User-facing on/off switch.
    pub async fn toggle(&self) -> PushclipResult<PreInitState> {
        if self.state() == PreInitState::Ready {
            self.shutdown().await?;
        } else {
            self.initialize().await?;
        }
        Ok(self.state())
    }

    /// Record user activity; gates the idle auto-shutdown.
    pub fn update_activity(&self) {
        if let Ok(mut guard) = self.last_activity.lock() {
            *guard = Instant::now();
        }
    }

    /// Time since the last recorded user activity.
    pub fn idle_for(&self) -> Duration {
        self.last_activity
            .lock()
            .map(|t| t.elapsed())
            .unwrap_or(Duration::ZERO)
    }

    pub fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::synthetic::SyntheticBackend;
    use crate::backend::{
        AudioDeviceInfo, AudioStream, AuthorizationStatus, Capability, DisplayInfo, ScreenStream,
    };
    use crate::config::SinkConfig;
    use crate::session::SampleRouterHandle;
    use crate::sink::MediaWriter;
    use pushclip_common::error::PushclipError;

    fn manager() -> PreInitManager {
        PreInitManager::new(
            Box::new(SyntheticBackend::new()),
            RecordingConfig::default(),
            Duration::from_secs(180),
        )
    }

    #[tokio::test]
    async fn initialize_is_idempotent_and_take_empties_slot() {
        let manager = manager();
        assert_eq!(manager.state(), PreInitState::NotInitialized);

        manager.initialize().await.unwrap();
        assert_eq!(manager.state(), PreInitState::Ready);
        manager.initialize().await.unwrap();
        assert_eq!(manager.state(), PreInitState::Ready);

        let session = manager.take_session().await;
        assert!(session.is_some());
        assert_eq!(manager.state(), PreInitState::NotInitialized);
        assert!(manager.take_session().await.is_none());
        session.unwrap().dismantle();
    }

    #[tokio::test]
    async fn toggle_flips_between_off_and_ready() {
        let manager = manager();
        assert_eq!(manager.toggle().await.unwrap(), PreInitState::Ready);
        assert_eq!(manager.toggle().await.unwrap(), PreInitState::NotInitialized);
    }

    #[tokio::test]
    async fn config_change_rebuilds_the_warm_session() {
        let manager = manager();
        manager.initialize().await.unwrap();

        let changed = RecordingConfig {
            capture_microphone: true,
            ..Default::default()
        };
        manager.apply_config(changed.clone()).await.unwrap();
        assert_eq!(manager.state(), PreInitState::Ready);

        let session = manager.take_session().await.unwrap();
        assert_eq!(session.config(), &changed);
        assert!(session.mic_enabled());
        session.dismantle();
    }

    #[tokio::test]
    async fn unchanged_config_keeps_the_warm_session() {
        let manager = manager();
        manager.initialize().await.unwrap();
        manager
            .apply_config(RecordingConfig::default())
            .await
            .unwrap();
        assert_eq!(manager.state(), PreInitState::Ready);
    }

    struct FailingBackend;

    #[async_trait::async_trait]
    impl CaptureBackend for FailingBackend {
        async fn init(&mut self) -> PushclipResult<()> {
            Err(PushclipError::capture_unavailable("no capture framework"))
        }
        fn authorization(&self) -> AuthorizationStatus {
            AuthorizationStatus::Denied
        }
        async fn request_authorization(&mut self) -> PushclipResult<AuthorizationStatus> {
            Ok(AuthorizationStatus::Denied)
        }
        fn detect_displays(&self) -> PushclipResult<Vec<DisplayInfo>> {
            Ok(vec![])
        }
        fn list_audio_devices(&self) -> PushclipResult<Vec<AudioDeviceInfo>> {
            Ok(vec![])
        }
        async fn build_screen_stream(
            &mut self,
            _config: &RecordingConfig,
            _router: SampleRouterHandle,
        ) -> PushclipResult<Box<dyn ScreenStream>> {
            Err(PushclipError::capture_unavailable("no streams"))
        }
        async fn build_audio_stream(
            &mut self,
            _device: &AudioDeviceInfo,
            _router: SampleRouterHandle,
        ) -> PushclipResult<Box<dyn AudioStream>> {
            Err(PushclipError::capture_unavailable("no streams"))
        }
        fn open_writer(&self, _config: &SinkConfig) -> PushclipResult<Box<dyn MediaWriter>> {
            Err(PushclipError::capture_unavailable("no writer"))
        }
        fn capabilities(&self) -> Vec<Capability> {
            vec![]
        }
        async fn shutdown(&mut self) -> PushclipResult<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn failed_initialize_returns_to_not_initialized() {
        let manager = PreInitManager::new(
            Box::new(FailingBackend),
            RecordingConfig::default(),
            Duration::from_secs(180),
        );
        let err = manager.initialize().await.unwrap_err();
        assert_eq!(err.code(), "capture-unavailable");
        assert_eq!(manager.state(), PreInitState::NotInitialized);
    }

    #[tokio::test]
    async fn activity_tracking_resets_idle_clock() {
        let manager = manager();
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(manager.idle_for() >= Duration::from_millis(20));
        manager.update_activity();
        assert!(manager.idle_for() < Duration::from_millis(20));
    }

    #[test]
    fn state_serializes_to_spec_names() {
        assert_eq!(
            serde_json::to_string(&PreInitState::NotInitialized).unwrap(),
            "\"NotInitialized\""
        );
        assert_eq!(
            serde_json::to_string(&PreInitState::ShuttingDown).unwrap(),
            "\"ShuttingDown\""
        );
    }
}
