//! Recording and encoder configuration.

use std::path::{Path, PathBuf};

use pushclip_common::error::{PushclipError, PushclipResult};
use serde::{Deserialize, Serialize};

use crate::backend::DisplayInfo;

/// A capture rectangle in display-local pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Parameters a capture session is built from. Immutable per pre-init
/// generation: any change forces a teardown and rebuild of the warm session.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingConfig {
    /// Encoded frame dimensions.
    pub width: u32,
    pub height: u32,

    /// Frames per second.
    pub fps: u32,

    /// Quality hint in `[0, 100]`, not a bitrate; see [`SinkConfig`].
    pub quality: u32,

    pub capture_cursor: bool,
    pub capture_microphone: bool,

    /// Preferred microphone; absent means "prefer built-in, fall back to
    /// the OS default input".
    pub microphone_device_id: Option<String>,

    /// Display selector; absent means the primary display.
    pub display_id: Option<u32>,

    /// Capture rectangle; absent captures the full display.
    pub region: Option<Region>,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            fps: 30,
            quality: 100,
            capture_cursor: true,
            capture_microphone: false,
            microphone_device_id: None,
            display_id: None,
            region: None,
        }
    }
}

impl RecordingConfig {
    /// Validate against the available displays: dimensions and fps must be
    /// positive, and a region must lie inside the chosen display.
    pub fn validate(&self, displays: &[DisplayInfo]) -> PushclipResult<()> {
        if self.fps == 0 {
            return Err(PushclipError::configuration_rejected("fps must be positive"));
        }
        if self.width == 0 || self.height == 0 {
            return Err(PushclipError::configuration_rejected(
                "frame dimensions must be positive",
            ));
        }

        let display = self.resolve_display(displays)?;

        if let Some(region) = &self.region {
            if region.width == 0 || region.height == 0 {
                return Err(PushclipError::configuration_rejected(
                    "capture region must be non-empty",
                ));
            }
            let fits = region.x + region.width <= display.width
                && region.y + region.height <= display.height;
            if !fits {
                return Err(PushclipError::configuration_rejected(format!(
                    "region {}x{}@{},{} exceeds display {} ({}x{})",
                    region.width,
                    region.height,
                    region.x,
                    region.y,
                    display.id,
                    display.width,
                    display.height,
                )));
            }
        }

        Ok(())
    }

    /// The display this config captures, by id or the primary fallback.
    pub fn resolve_display<'a>(
        &self,
        displays: &'a [DisplayInfo],
    ) -> PushclipResult<&'a DisplayInfo> {
        if displays.is_empty() {
            return Err(PushclipError::capture_unavailable("no displays detected"));
        }
        match self.display_id {
            Some(id) => displays.iter().find(|d| d.id == id).ok_or_else(|| {
                PushclipError::configuration_rejected(format!("unknown display id {id}"))
            }),
            None => Ok(displays
                .iter()
                .find(|d| d.primary)
                .unwrap_or(&displays[0])),
        }
    }
}

/// AAC audio track parameters. Fixed per the container contract:
/// AAC-LC, 48 kHz, mono, 128 kbit/s.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioEncoding {
    pub sample_rate: u32,
    pub channels: u16,
    pub bitrate_bps: u32,
}

impl Default for AudioEncoding {
    fn default() -> Self {
        Self {
            sample_rate: 48_000,
            channels: 1,
            bitrate_bps: 128_000,
        }
    }
}

/// Resolved encoder/muxer parameters for one output file.
#[derive(Debug, Clone, PartialEq)]
pub struct SinkConfig {
    pub output_path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub fps: u32,

    /// H.264 target bitrate: `width * height * 3 * fps / 4`, scaled by the
    /// quality hint. A hint for the hardware encoder, not a guarantee.
    pub bitrate_bps: u64,

    /// Keyframe every `2 * fps` frames (one every two seconds).
    pub keyframe_interval: u32,

    /// Present iff the microphone track is enabled.
    pub audio: Option<AudioEncoding>,
}

impl SinkConfig {
    /// Derive the sink parameters for a recording config and output file.
    pub fn from_recording(config: &RecordingConfig, output_path: &Path) -> Self {
        let base = config.width as u64 * config.height as u64 * 3 * config.fps as u64 / 4;
        let quality = config.quality.min(100) as u64;
        Self {
            output_path: output_path.to_path_buf(),
            width: config.width,
            height: config.height,
            fps: config.fps,
            bitrate_bps: base * quality / 100,
            keyframe_interval: 2 * config.fps,
            audio: config
                .capture_microphone
                .then(AudioEncoding::default),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::DisplayInfo;

    fn display(id: u32, width: u32, height: u32, primary: bool) -> DisplayInfo {
        DisplayInfo {
            id,
            name: format!("Display {id}"),
            width,
            height,
            x: 0,
            y: 0,
            scale_factor: 1.0,
            primary,
        }
    }

    #[test]
    fn default_bitrate_matches_formula() {
        let config = RecordingConfig::default();
        let sink = SinkConfig::from_recording(&config, Path::new("/tmp/out.mp4"));
        // 1920 * 1080 * 3 * 30 / 4
        assert_eq!(sink.bitrate_bps, 46_656_000);
        assert_eq!(sink.keyframe_interval, 60);
        assert!(sink.audio.is_none());
    }

    #[test]
    fn quality_scales_bitrate() {
        let config = RecordingConfig {
            quality: 50,
            ..Default::default()
        };
        let sink = SinkConfig::from_recording(&config, Path::new("/tmp/out.mp4"));
        assert_eq!(sink.bitrate_bps, 23_328_000);
    }

    #[test]
    fn microphone_enables_aac_track() {
        let config = RecordingConfig {
            capture_microphone: true,
            ..Default::default()
        };
        let sink = SinkConfig::from_recording(&config, Path::new("/tmp/out.mp4"));
        let audio = sink.audio.unwrap();
        assert_eq!(audio.sample_rate, 48_000);
        assert_eq!(audio.channels, 1);
    }

    #[test]
    fn region_outside_display_is_rejected() {
        let displays = [display(1, 1920, 1080, true)];
        let config = RecordingConfig {
            region: Some(Region {
                x: 1800,
                y: 0,
                width: 400,
                height: 300,
            }),
            ..Default::default()
        };
        let err = config.validate(&displays).unwrap_err();
        assert_eq!(err.code(), "configuration-rejected");
    }

    #[test]
    fn region_inside_display_is_accepted() {
        let displays = [display(1, 1920, 1080, true)];
        let config = RecordingConfig {
            region: Some(Region {
                x: 100,
                y: 100,
                width: 1280,
                height: 720,
            }),
            ..Default::default()
        };
        assert!(config.validate(&displays).is_ok());
    }

    #[test]
    fn display_selection_prefers_primary() {
        let displays = [display(1, 2560, 1440, false), display(2, 1920, 1080, true)];
        let config = RecordingConfig::default();
        assert_eq!(config.resolve_display(&displays).unwrap().id, 2);

        let pinned = RecordingConfig {
            display_id: Some(1),
            ..Default::default()
        };
        assert_eq!(pinned.resolve_display(&displays).unwrap().id, 1);

        let unknown = RecordingConfig {
            display_id: Some(9),
            ..Default::default()
        };
        assert!(unknown.resolve_display(&displays).is_err());
    }

    #[test]
    fn no_displays_is_capture_unavailable() {
        let config = RecordingConfig::default();
        let err = config.validate(&[]).unwrap_err();
        assert_eq!(err.code(), "capture-unavailable");
    }
}
