//! Deterministic capture backend for tests and capture-less platforms.
//!
//! Generates pattern frames at the configured rate and 100 ms audio chunks
//! at 48 kHz, with presentation timestamps taken from a single monotonic
//! epoch shared by both streams, the same shape real frameworks deliver,
//! minus the pixels. The writer records one line per sample so tests can
//! inspect exactly what reached the container.
//!
//! Payloads are small placeholders; real backends carry pixel buffers.

use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use pushclip_common::clock::FramePacer;
use pushclip_common::error::{PushclipError, PushclipResult};

use crate::backend::{
    AudioDeviceInfo, AudioStream, AuthorizationStatus, Capability, CaptureBackend, DisplayInfo,
    ScreenStream,
};
use crate::config::{RecordingConfig, SinkConfig};
use crate::sample::{AudioChunk, VideoFrame};
use crate::session::SampleRouterHandle;
use crate::sink::MediaWriter;

const AUDIO_CHUNK_MS: u64 = 100;
const AUDIO_SAMPLE_RATE: u32 = 48_000;

/// In-process backend with one display and two audio devices.
pub struct SyntheticBackend {
    epoch: Instant,
    displays: Vec<DisplayInfo>,
    devices: Vec<AudioDeviceInfo>,
}

impl SyntheticBackend {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
            displays: vec![DisplayInfo {
                id: 1,
                name: "Synthetic Display".to_string(),
                width: 1920,
                height: 1080,
                x: 0,
                y: 0,
                scale_factor: 2.0,
                primary: true,
            }],
            devices: vec![
                AudioDeviceInfo {
                    id: "synthetic-builtin".to_string(),
                    name: "Built-in Microphone".to_string(),
                    is_default: false,
                    is_builtin: true,
                },
                AudioDeviceInfo {
                    id: "synthetic-headset".to_string(),
                    name: "Headset".to_string(),
                    is_default: true,
                    is_builtin: false,
                },
            ],
        }
    }

    /// Variant with no audio inputs, for the fall-back-to-silent path.
    pub fn without_audio_devices() -> Self {
        let mut backend = Self::new();
        backend.devices.clear();
        backend
    }
}

impl Default for SyntheticBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl CaptureBackend for SyntheticBackend {
    async fn init(&mut self) -> PushclipResult<()> {
        Ok(())
    }

    fn authorization(&self) -> AuthorizationStatus {
        AuthorizationStatus::Authorized
    }

    async fn request_authorization(&mut self) -> PushclipResult<AuthorizationStatus> {
        Ok(AuthorizationStatus::Authorized)
    }

    fn detect_displays(&self) -> PushclipResult<Vec<DisplayInfo>> {
        Ok(self.displays.clone())
    }

    fn list_audio_devices(&self) -> PushclipResult<Vec<AudioDeviceInfo>> {
        Ok(self.devices.clone())
    }

    async fn build_screen_stream(
        &mut self,
        config: &RecordingConfig,
        router: SampleRouterHandle,
    ) -> PushclipResult<Box<dyn ScreenStream>> {
        Ok(Box::new(SyntheticScreenStream {
            fps: config.fps,
            width: config.width,
            height: config.height,
            router,
            epoch: self.epoch,
            stop: Arc::new(AtomicBool::new(false)),
            handle: None,
        }))
    }

    async fn build_audio_stream(
        &mut self,
        device: &AudioDeviceInfo,
        router: SampleRouterHandle,
    ) -> PushclipResult<Box<dyn AudioStream>> {
        tracing::debug!(device = %device.id, "Starting synthetic audio stream");
        Ok(Box::new(SyntheticAudioStream::spawn(router, self.epoch)))
    }

    fn open_writer(&self, config: &SinkConfig) -> PushclipResult<Box<dyn MediaWriter>> {
        Ok(Box::new(SyntheticWriter::new(config)))
    }

    fn capabilities(&self) -> Vec<Capability> {
        vec![
            Capability {
                name: "Screen Capture".to_string(),
                description: "Synthetic pattern generator".to_string(),
                available: true,
                required: true,
                fix_instructions: None,
            },
            Capability {
                name: "Audio Input".to_string(),
                description: "Synthetic 48 kHz mono source".to_string(),
                available: !self.devices.is_empty(),
                required: false,
                fix_instructions: None,
            },
        ]
    }

    async fn shutdown(&mut self) -> PushclipResult<()> {
        Ok(())
    }
}

/// Frame generator thread; delivery begins at `start` and is confirmed
/// through a ready channel before `start` returns.
struct SyntheticScreenStream {
    fps: u32,
    width: u32,
    height: u32,
    router: SampleRouterHandle,
    epoch: Instant,
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl ScreenStream for SyntheticScreenStream {
    fn start(&mut self) -> PushclipResult<()> {
        if self.handle.is_some() {
            return Err(PushclipError::capture("screen stream already started"));
        }

        let (ready_tx, ready_rx) = std::sync::mpsc::sync_channel::<()>(1);
        let router = self.router.clone();
        let stop = self.stop.clone();
        let epoch = self.epoch;
        let (fps, width, height) = (self.fps, self.width, self.height);

        let handle = std::thread::spawn(move || {
            let mut pacer = FramePacer::from_hz(fps);
            let frame_duration_ns = pacer.interval().as_nanos() as u64;
            let _ = ready_tx.send(());

            let mut frame_index: u64 = 0;
            while !stop.load(Ordering::Relaxed) {
                pacer.wait_for_tick();
                let pts_ns = epoch.elapsed().as_nanos() as u64;
                router.push_video(VideoFrame {
                    data: pattern_payload(frame_index),
                    pts_ns,
                    duration_ns: frame_duration_ns,
                    width,
                    height,
                });
                frame_index += 1;
            }
        });

        // Completion semaphore: callers observe a live stream on return.
        ready_rx
            .recv_timeout(Duration::from_secs(2))
            .map_err(|_| PushclipError::capture("screen stream did not confirm startup"))?;

        self.handle = Some(handle);
        Ok(())
    }

    fn stop(&mut self) -> PushclipResult<()> {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            handle
                .join()
                .map_err(|_| PushclipError::capture("screen stream thread panicked"))?;
        }
        Ok(())
    }
}

impl Drop for SyntheticScreenStream {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Audio generator thread; live from construction, matching the contract
/// that the audio capture session runs from pre-initialization on.
struct SyntheticAudioStream {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl SyntheticAudioStream {
    fn spawn(router: SampleRouterHandle, epoch: Instant) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = stop.clone();

        let handle = std::thread::spawn(move || {
            let mut pacer = FramePacer::from_interval(Duration::from_millis(AUDIO_CHUNK_MS));
            let chunk_duration_ns = pacer.interval().as_nanos() as u64;
            let samples = (AUDIO_SAMPLE_RATE as u64 * AUDIO_CHUNK_MS / 1000) as usize;
            while !thread_stop.load(Ordering::Relaxed) {
                pacer.wait_for_tick();
                let pts_ns = epoch.elapsed().as_nanos() as u64;
                router.push_audio(AudioChunk {
                    data: vec![0.0; samples],
                    pts_ns,
                    duration_ns: chunk_duration_ns,
                    sample_rate: AUDIO_SAMPLE_RATE,
                    channels: 1,
                });
            }
        });

        Self {
            stop,
            handle: Some(handle),
        }
    }
}

impl AudioStream for SyntheticAudioStream {
    fn stop(&mut self) -> PushclipResult<()> {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            handle
                .join()
                .map_err(|_| PushclipError::capture("audio stream thread panicked"))?;
        }
        Ok(())
    }
}

impl Drop for SyntheticAudioStream {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn pattern_payload(frame_index: u64) -> Vec<u8> {
    frame_index
        .to_le_bytes()
        .iter()
        .cycle()
        .take(32)
        .copied()
        .collect()
}

/// Line-per-sample writer: a `V`/`A` record per appended sample, a trailer
/// with totals at finalize.
struct SyntheticWriter {
    path: PathBuf,
    has_audio: bool,
    header: String,
    file: Option<BufWriter<std::fs::File>>,
    video_samples: u64,
    audio_samples: u64,
}

impl SyntheticWriter {
    fn new(config: &SinkConfig) -> Self {
        Self {
            path: config.output_path.clone(),
            has_audio: config.audio.is_some(),
            header: format!(
                "pushclip-synthetic v1 {}x{}@{} bitrate={} keyint={} audio={}",
                config.width,
                config.height,
                config.fps,
                config.bitrate_bps,
                config.keyframe_interval,
                config.audio.is_some(),
            ),
            file: None,
            video_samples: 0,
            audio_samples: 0,
        }
    }

    fn file(&mut self) -> PushclipResult<&mut BufWriter<std::fs::File>> {
        self.file
            .as_mut()
            .ok_or_else(|| PushclipError::capture("writer not started"))
    }
}

impl MediaWriter for SyntheticWriter {
    fn start(&mut self) -> PushclipResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = std::fs::File::create(&self.path)?;
        let mut writer = BufWriter::new(file);
        writeln!(writer, "{}", self.header)?;
        self.file = Some(writer);
        Ok(())
    }

    fn append_video(&mut self, frame: &VideoFrame) -> PushclipResult<bool> {
        let pts = frame.pts_ns;
        let len = frame.data.len();
        let file = self.file()?;
        writeln!(file, "V {pts} {len}")?;
        self.video_samples += 1;
        Ok(true)
    }

    fn append_audio(&mut self, chunk: &AudioChunk) -> PushclipResult<bool> {
        if !self.has_audio {
            return Ok(false);
        }
        let pts = chunk.pts_ns;
        let len = chunk.data.len();
        let file = self.file()?;
        writeln!(file, "A {pts} {len}")?;
        self.audio_samples += 1;
        Ok(true)
    }

    fn finish(&mut self) -> PushclipResult<()> {
        let (video, audio) = (self.video_samples, self.audio_samples);
        let file = self.file()?;
        writeln!(file, "END video={video} audio={audio}")?;
        file.flush()?;
        self.file = None;
        Ok(())
    }
}
