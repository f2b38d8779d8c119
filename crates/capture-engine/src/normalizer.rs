//! Timestamp normalization.
//!
//! The two OS capture subsystems do not begin delivering at the same
//! instant, and their native timestamps are large opaque values. Writing
//! them through unchanged would produce a file whose playback starts
//! seconds in; rebasing each track against its own first sample would
//! produce audible A/V drift at the head of the file. Instead, the first
//! sample to arrive on either track defines a single shared origin, and
//! every subsequent sample on both tracks is rebased against it. Sample
//! durations pass through untouched; decode timestamps are left to the
//! muxer.

use pushclip_common::clock::DriftMeasurement;

use crate::sample::{AudioChunk, VideoFrame};

/// Rebases native sample timestamps to a shared zero-based origin.
#[derive(Debug, Default)]
pub struct TimestampNormalizer {
    /// Native timestamp of the first sample seen on either track.
    origin_ns: Option<u64>,

    /// True until a video sample has been emitted. Re-armed when the first
    /// video sample is dropped downstream, so the next one becomes the
    /// reference frame.
    video_pending: bool,

    first_video_native_ns: Option<u64>,
    first_audio_native_ns: Option<u64>,
}

impl TimestampNormalizer {
    pub fn new() -> Self {
        Self {
            origin_ns: None,
            video_pending: true,
            first_video_native_ns: None,
            first_audio_native_ns: None,
        }
    }

    /// Reset all first-sample state. Called on every session start.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Whether the next video sample will be treated as the first.
    pub fn video_pending(&self) -> bool {
        self.video_pending
    }

    /// The shared origin, once established.
    pub fn origin_ns(&self) -> Option<u64> {
        self.origin_ns
    }

    /// Rebase a video frame. The first frame establishes the origin unless
    /// an audio chunk already did.
    pub fn normalize_video(&mut self, mut frame: VideoFrame) -> VideoFrame {
        let origin = *self.origin_ns.get_or_insert(frame.pts_ns);
        if self.video_pending {
            self.video_pending = false;
            self.first_video_native_ns = Some(frame.pts_ns);
        }
        frame.pts_ns = frame.pts_ns.saturating_sub(origin);
        frame
    }

    /// Rebase an audio chunk. Audio arriving before any video also sets the
    /// origin, which the first video frame then shares.
    pub fn normalize_audio(&mut self, mut chunk: AudioChunk) -> AudioChunk {
        let origin = *self.origin_ns.get_or_insert(chunk.pts_ns);
        if self.first_audio_native_ns.is_none() {
            self.first_audio_native_ns = Some(chunk.pts_ns);
        }
        chunk.pts_ns = chunk.pts_ns.saturating_sub(origin);
        chunk
    }

    /// Forget the first video sample after it was dropped downstream; the
    /// next frame becomes the reference. If no audio has arrived either,
    /// the origin itself is re-derived from that next sample.
    pub fn rearm_video(&mut self) {
        self.video_pending = true;
        self.first_video_native_ns = None;
        if self.first_audio_native_ns.is_none() {
            self.origin_ns = None;
        }
    }

    /// Offset between the tracks' first samples, once both have arrived.
    pub fn intake_offset(&self) -> Option<DriftMeasurement> {
        let origin = self.origin_ns?;
        let video = self.first_video_native_ns?;
        let audio = self.first_audio_native_ns?;
        Some(DriftMeasurement {
            reference_ns: video - origin,
            measured_ns: audio - origin,
        })
    }
}
