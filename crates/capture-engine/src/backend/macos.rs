//! macOS capture backend scaffolding.
//!
//! Compile-safe placeholders for the ScreenCaptureKit / AVFoundation
//! integration: SCShareableContent enumeration, SCStream with an attached
//! sample handler, AVCaptureSession for the microphone, and AVAssetWriter
//! with hardware H.264/AAC encoders feeding the streaming MP4 muxer.

use pushclip_common::error::{PushclipError, PushclipResult};

use crate::backend::{
    AudioDeviceInfo, AudioStream, AuthorizationStatus, Capability, CaptureBackend, DisplayInfo,
    ScreenStream,
};
use crate::config::{RecordingConfig, SinkConfig};
use crate::session::SampleRouterHandle;
use crate::sink::MediaWriter;

/// Placeholder backend until the native layer lands.
///
/// TODO(backend/macos): wire SCShareableContent, SCStream, AVCaptureSession,
/// and AVAssetWriter through the objc2 bindings.
pub struct MacOsBackend;

impl MacOsBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MacOsBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn not_implemented(what: &str) -> PushclipError {
    PushclipError::capture_unavailable(format!("macOS {what} is not implemented yet"))
}

#[async_trait::async_trait]
impl CaptureBackend for MacOsBackend {
    async fn init(&mut self) -> PushclipResult<()> {
        Err(not_implemented("capture framework probing"))
    }

    fn authorization(&self) -> AuthorizationStatus {
        AuthorizationStatus::NotDetermined
    }

    async fn request_authorization(&mut self) -> PushclipResult<AuthorizationStatus> {
        Err(not_implemented("screen-recording authorization"))
    }

    fn detect_displays(&self) -> PushclipResult<Vec<DisplayInfo>> {
        Err(not_implemented("display enumeration"))
    }

    fn list_audio_devices(&self) -> PushclipResult<Vec<AudioDeviceInfo>> {
        Err(not_implemented("audio device enumeration"))
    }

    async fn build_screen_stream(
        &mut self,
        _config: &RecordingConfig,
        _router: SampleRouterHandle,
    ) -> PushclipResult<Box<dyn ScreenStream>> {
        Err(not_implemented("screen stream construction"))
    }

    async fn build_audio_stream(
        &mut self,
        _device: &AudioDeviceInfo,
        _router: SampleRouterHandle,
    ) -> PushclipResult<Box<dyn AudioStream>> {
        Err(not_implemented("audio capture session"))
    }

    fn open_writer(&self, _config: &SinkConfig) -> PushclipResult<Box<dyn MediaWriter>> {
        Err(not_implemented("asset writer"))
    }

    fn capabilities(&self) -> Vec<Capability> {
        vec![Capability {
            name: "ScreenCaptureKit".to_string(),
            description: "Native screen capture and hardware encoding".to_string(),
            available: false,
            required: true,
            fix_instructions: Some("Native macOS integration is not built yet".to_string()),
        }]
    }

    async fn shutdown(&mut self) -> PushclipResult<()> {
        Ok(())
    }
}
