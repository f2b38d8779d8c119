//! Capture session lifecycle.
//!
//! One session owns one screen stream and optionally one audio stream, and
//! routes their samples through the normalizer into the encoder sink. The
//! expensive construction work happens in `pre_initialize` (seconds); once
//! that has run, `start` is a writer open plus a single stream-start call.
//!
//! State machine: `Created → PreInitialized → Recording → Stopping →
//! Finalized`, then the session is destroyed.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use pushclip_common::clock::RecordingClock;
use pushclip_common::error::{PushclipError, PushclipResult};

use crate::backend::{resolve_microphone, AudioStream, CaptureBackend, ScreenStream};
use crate::config::{RecordingConfig, SinkConfig};
use crate::normalizer::TimestampNormalizer;
use crate::sample::{AudioChunk, VideoFrame};
use crate::sink::{EncoderSink, SinkStats};

/// Lifecycle state of a capture session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Created,
    PreInitialized,
    Recording,
    Stopping,
    Finalized,
}

/// Normalizer + sink pair that exists only while a recording is active.
struct Pipeline {
    normalizer: TimestampNormalizer,
    sink: EncoderSink,
}

/// State shared with the capture callbacks.
///
/// `recording` is set before the screen stream starts so the first audio
/// buffer, which may arrive immediately, is not dropped; the audio stream
/// is already live from pre-initialization and its samples are discarded
/// here while the flag is clear.
#[derive(Default)]
struct SessionShared {
    recording: AtomicBool,
    pipeline: Mutex<Option<Pipeline>>,
}

/// Handle given to the platform streams; invoked from their capture
/// threads. Never blocks beyond the pipeline lock.
#[derive(Clone)]
pub struct SampleRouterHandle {
    shared: Arc<SessionShared>,
}

impl SampleRouterHandle {
    pub fn push_video(&self, frame: VideoFrame) {
        if !self.shared.recording.load(Ordering::Acquire) {
            return;
        }
        let Ok(mut guard) = self.shared.pipeline.lock() else {
            return;
        };
        let Some(pipeline) = guard.as_mut() else {
            return;
        };
        let was_first = pipeline.normalizer.video_pending();
        let frame = pipeline.normalizer.normalize_video(frame);
        let appended = pipeline.sink.append_video(&frame);
        if !appended && was_first {
            // The reference frame never landed; the next one takes its place.
            pipeline.normalizer.rearm_video();
        }
    }

    pub fn push_audio(&self, chunk: AudioChunk) {
        if !self.shared.recording.load(Ordering::Acquire) {
            // Live pre-init audio, nothing recording yet.
            return;
        }
        let Ok(mut guard) = self.shared.pipeline.lock() else {
            return;
        };
        let Some(pipeline) = guard.as_mut() else {
            return;
        };
        let chunk = pipeline.normalizer.normalize_audio(chunk);
        pipeline.sink.append_audio(&chunk);
    }
}

/// Result of a completed recording.
#[derive(Debug, Clone)]
pub struct FinishedRecording {
    pub path: PathBuf,
    /// Wall-clock duration from start to stop; samples may still have been
    /// in flight at stop, so encoded timestamps are not used here.
    pub duration_ms: u64,
    /// ISO 8601 wall-clock time at which recording started.
    pub recorded_at: String,
    pub mic_enabled: bool,
    pub width: u32,
    pub height: u32,
    pub stats: SinkStats,
}

/// One screen (+ optional microphone) recording.
pub struct CaptureSession {
    config: RecordingConfig,
    state: SessionState,
    shared: Arc<SessionShared>,
    screen: Option<Box<dyn ScreenStream>>,
    audio: Option<Box<dyn AudioStream>>,
    clock: Option<RecordingClock>,
    output_path: Option<PathBuf>,
}

impl CaptureSession {
    pub fn new(config: RecordingConfig) -> Self {
        Self {
            config,
            state: SessionState::Created,
            shared: Arc::new(SessionShared::default()),
            screen: None,
            audio: None,
            clock: None,
            output_path: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> &RecordingConfig {
        &self.config
    }

    /// Whether an audio stream was attached during pre-initialization.
    pub fn mic_enabled(&self) -> bool {
        self.audio.is_some()
    }

    /// Build everything that cannot be deferred: display enumeration,
    /// config validation, stream construction with callbacks attached, and
    /// (if enabled) a live audio capture session. Slow (seconds on real
    /// platforms) and therefore run off the hot path.
    pub async fn pre_initialize(
        &mut self,
        backend: &mut dyn CaptureBackend,
    ) -> PushclipResult<()> {
        if self.state != SessionState::Created {
            return Err(PushclipError::capture("session already initialized"));
        }

        backend.init().await?;

        let displays = backend.detect_displays()?;
        self.config.validate(&displays)?;

        let router = SampleRouterHandle {
            shared: self.shared.clone(),
        };

        if self.config.capture_microphone {
            let devices = backend.list_audio_devices()?;
            match resolve_microphone(&devices, self.config.microphone_device_id.as_deref()) {
                Some(device) => {
                    tracing::info!(device = %device.name, "Attaching microphone");
                    let audio = backend.build_audio_stream(&device, router.clone()).await?;
                    self.audio = Some(audio);
                }
                None => {
                    tracing::warn!("No audio input device available, recording without audio");
                }
            }
        }

        let screen = backend.build_screen_stream(&self.config, router).await?;
        self.screen = Some(screen);
        self.state = SessionState::PreInitialized;

        tracing::info!(
            width = self.config.width,
            height = self.config.height,
            fps = self.config.fps,
            mic = self.audio.is_some(),
            "Capture session pre-initialized"
        );
        Ok(())
    }

    /// Start recording into `output_path`. Fast: the target is a single
    /// stream-start call on top of the writer open.
    pub async fn start(
        &mut self,
        backend: &dyn CaptureBackend,
        output_path: &Path,
    ) -> PushclipResult<()> {
        if self.state != SessionState::PreInitialized {
            return Err(PushclipError::capture(
                "session must be pre-initialized before start",
            ));
        }

        let sink_config = SinkConfig::from_recording(&self.config, output_path);
        let writer = backend.open_writer(&sink_config)?;
        let mut sink = EncoderSink::new(sink_config, writer);
        sink.start()?;

        {
            let Ok(mut guard) = self.shared.pipeline.lock() else {
                return Err(PushclipError::capture("pipeline lock poisoned"));
            };
            *guard = Some(Pipeline {
                normalizer: TimestampNormalizer::new(),
                sink,
            });
        }

        // Flag first: the live audio stream must not lose the buffer that
        // arrives while stream.start is still in flight.
        self.shared.recording.store(true, Ordering::Release);

        if let Some(screen) = self.screen.as_mut() {
            if let Err(e) = screen.start() {
                self.shared.recording.store(false, Ordering::Release);
                if let Ok(mut guard) = self.shared.pipeline.lock() {
                    guard.take();
                }
                return Err(e);
            }
        }

        self.clock = Some(RecordingClock::start());
        self.output_path = Some(output_path.to_path_buf());
        self.state = SessionState::Recording;
        Ok(())
    }

    /// Stop the streams, finalize the container, and report the result.
    pub async fn stop(&mut self) -> PushclipResult<FinishedRecording> {
        if self.state != SessionState::Recording {
            return Err(PushclipError::capture("session is not recording"));
        }
        self.state = SessionState::Stopping;
        let had_audio = self.audio.is_some();

        if let Some(mut screen) = self.screen.take() {
            if let Err(e) = screen.stop() {
                tracing::warn!(error = %e, "Screen stream stop failed");
            }
        }
        if let Some(mut audio) = self.audio.take() {
            if let Err(e) = audio.stop() {
                tracing::warn!(error = %e, "Audio stream stop failed");
            }
        }

        let pipeline = self
            .shared
            .pipeline
            .lock()
            .ok()
            .and_then(|mut guard| guard.take());

        let finish_result = match pipeline {
            Some(pipeline) => {
                if let Some(offset) = pipeline.normalizer.intake_offset() {
                    if offset.exceeds_threshold_ms(100.0) {
                        tracing::warn!(
                            offset_ms = offset.drift_ms(),
                            "First-sample offset between tracks exceeds 100ms"
                        );
                    } else {
                        tracing::debug!(
                            offset_ms = offset.drift_ms(),
                            "Track intake offset within threshold"
                        );
                    }
                }
                pipeline.sink.finish()
            }
            None => Err(PushclipError::finalization_failed("no active pipeline")),
        };

        self.shared.recording.store(false, Ordering::Release);

        let duration_ms = self.clock.as_ref().map(|c| c.elapsed_ms()).unwrap_or(0);
        // The clock exists whenever we got past start; the fallback is
        // unreachable in practice.
        let recorded_at = self
            .clock
            .as_ref()
            .map(|c| c.epoch_wall().to_string())
            .unwrap_or_default();
        let path = self.output_path.clone().unwrap_or_default();
        self.state = SessionState::Finalized;

        let stats = finish_result?;

        tracing::info!(
            output = %path.display(),
            duration_ms,
            frames = stats.frames_appended,
            "Recording finalized"
        );

        Ok(FinishedRecording {
            path,
            duration_ms,
            recorded_at,
            mic_enabled: had_audio,
            width: self.config.width,
            height: self.config.height,
            stats,
        })
    }

    /// Tear down a warm session that never recorded: stop the live audio
    /// stream and drop the prepared screen stream.
    pub fn dismantle(mut self) {
        if let Some(mut audio) = self.audio.take() {
            if let Err(e) = audio.stop() {
                tracing::warn!(error = %e, "Audio stream stop failed during dismantle");
            }
        }
        self.screen = None;
        tracing::debug!("Warm capture session dismantled");
    }

    /// Wall-clock elapsed while recording; zero once finalized (the durable
    /// value lives in the timeline entry).
    pub fn duration(&self) -> Duration {
        match self.state {
            SessionState::Recording | SessionState::Stopping => self
                .clock
                .as_ref()
                .map(|c| c.elapsed())
                .unwrap_or(Duration::ZERO),
            _ => Duration::ZERO,
        }
    }
}
