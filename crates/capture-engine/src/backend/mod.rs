//! The narrow abstraction over the platform capture primitives.
//!
//! Everything OS-specific lives behind these traits: the screen capture
//! framework, the audio capture session, the hardware encoders, and the MP4
//! muxer. The engine never touches a platform API directly, which is what
//! makes the whole recording path drivable by the deterministic synthetic
//! backend in tests.

use pushclip_common::error::PushclipResult;
use serde::{Deserialize, Serialize};

use crate::config::{RecordingConfig, SinkConfig};
use crate::session::SampleRouterHandle;
use crate::sink::MediaWriter;

pub mod macos;
pub mod synthetic;

pub use macos::MacOsBackend;
pub use synthetic::SyntheticBackend;

/// One attached display.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayInfo {
    pub id: u32,
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub x: i32,
    pub y: i32,
    pub scale_factor: f64,
    pub primary: bool,
}

/// One audio input device as surfaced to the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioDeviceInfo {
    pub id: String,
    pub name: String,
    pub is_default: bool,
    pub is_builtin: bool,
}

/// Screen-recording permission state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AuthorizationStatus {
    Authorized,
    Denied,
    NotDetermined,
}

/// A system capability this platform may or may not provide.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Capability {
    pub name: String,
    pub description: String,
    pub available: bool,
    pub required: bool,
    pub fix_instructions: Option<String>,
}

/// A running (or startable) screen stream bound to one session's router.
pub trait ScreenStream: Send {
    /// Begin sample delivery. Blocks until the platform confirms the stream
    /// is live (completion callback → semaphore on the native side).
    fn start(&mut self) -> PushclipResult<()>;

    /// Stop sample delivery and release the stream.
    fn stop(&mut self) -> PushclipResult<()>;
}

/// A live audio capture session.
///
/// Built during pre-initialization and running from that moment on; its
/// samples are discarded by the router until recording starts, so the first
/// buffer after `start` is never lost to session spin-up.
pub trait AudioStream: Send {
    fn stop(&mut self) -> PushclipResult<()>;
}

/// Platform entry point: enumeration, authorization, stream construction,
/// and writer creation.
#[async_trait::async_trait]
pub trait CaptureBackend: Send + Sync {
    /// Check framework availability and permissions. Called once per
    /// pre-initialization; slow (seconds) on real platforms.
    async fn init(&mut self) -> PushclipResult<()>;

    fn authorization(&self) -> AuthorizationStatus;

    /// Prompt the OS permission dialog where applicable.
    async fn request_authorization(&mut self) -> PushclipResult<AuthorizationStatus>;

    fn detect_displays(&self) -> PushclipResult<Vec<DisplayInfo>>;

    fn list_audio_devices(&self) -> PushclipResult<Vec<AudioDeviceInfo>>;

    /// Build the screen stream with its sample callback attached. The
    /// stream is constructed but not delivering until `start` is called.
    async fn build_screen_stream(
        &mut self,
        config: &RecordingConfig,
        router: SampleRouterHandle,
    ) -> PushclipResult<Box<dyn ScreenStream>>;

    /// Build and start the audio capture session for the given device.
    async fn build_audio_stream(
        &mut self,
        device: &AudioDeviceInfo,
        router: SampleRouterHandle,
    ) -> PushclipResult<Box<dyn AudioStream>>;

    /// Open a media writer for one output file.
    fn open_writer(&self, config: &SinkConfig) -> PushclipResult<Box<dyn MediaWriter>>;

    /// Report platform capabilities for diagnostics.
    fn capabilities(&self) -> Vec<Capability>;

    /// Release framework resources.
    async fn shutdown(&mut self) -> PushclipResult<()>;
}

/// Pick the microphone to record from: the requested device if present,
/// otherwise a built-in input, otherwise the OS default. None means record
/// without audio.
pub fn resolve_microphone(
    devices: &[AudioDeviceInfo],
    requested: Option<&str>,
) -> Option<AudioDeviceInfo> {
    if let Some(id) = requested {
        if let Some(device) = devices.iter().find(|d| d.id == id) {
            return Some(device.clone());
        }
        tracing::warn!(device_id = id, "Requested microphone not found, falling back");
    }
    devices
        .iter()
        .find(|d| d.is_builtin)
        .or_else(|| devices.iter().find(|d| d.is_default))
        .cloned()
}

/// The platform backend for this build target.
pub fn default_backend() -> Box<dyn CaptureBackend> {
    #[cfg(target_os = "macos")]
    {
        Box::new(MacOsBackend::new())
    }
    #[cfg(not(target_os = "macos"))]
    {
        // No native integration yet on this platform; the synthetic backend
        // keeps the engine drivable for development.
        Box::new(SyntheticBackend::new())
    }
}
