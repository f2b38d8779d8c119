//! Encoder sink: the write side of the media pipeline.
//!
//! Samples stream directly into the platform writer as they arrive; nothing
//! is buffered in process. Open/start failures are fatal for the session,
//! per-sample append failures are not (the sample is dropped and counted),
//! and finalize failures are fatal for the recording.

use pushclip_common::error::{PushclipError, PushclipResult};

use crate::config::SinkConfig;
use crate::sample::{AudioChunk, VideoFrame};

/// Platform writer behind the sink: hardware H.264/AAC encoders feeding a
/// streaming MP4 muxer.
///
/// `append_*` returns `Ok(false)` when the input is not ready for more
/// data; the sink counts the sample as dropped and the recording continues.
pub trait MediaWriter: Send {
    /// Open the output, declare the inputs, and start a writing session
    /// anchored at source time zero.
    fn start(&mut self) -> PushclipResult<()>;

    fn append_video(&mut self, frame: &VideoFrame) -> PushclipResult<bool>;

    fn append_audio(&mut self, chunk: &AudioChunk) -> PushclipResult<bool>;

    /// Mark the inputs finished and write the container trailer.
    fn finish(&mut self) -> PushclipResult<()>;
}

/// Counters accumulated over one recording.
#[derive(Debug, Clone, Copy, Default)]
pub struct SinkStats {
    pub frames_appended: u64,
    pub frames_dropped: u64,
    pub chunks_appended: u64,
    pub chunks_dropped: u64,
    pub bytes_written: u64,
}

impl SinkStats {
    /// Video drop rate as a percentage.
    pub fn drop_rate(&self) -> f64 {
        let total = self.frames_appended + self.frames_dropped;
        if total == 0 {
            return 0.0;
        }
        self.frames_dropped as f64 / total as f64 * 100.0
    }
}

/// Owns the writer for one recording and applies the append protocol.
pub struct EncoderSink {
    config: SinkConfig,
    writer: Box<dyn MediaWriter>,
    stats: SinkStats,
    started: bool,
}

impl EncoderSink {
    pub fn new(config: SinkConfig, writer: Box<dyn MediaWriter>) -> Self {
        Self {
            config,
            writer,
            stats: SinkStats::default(),
            started: false,
        }
    }

    pub fn config(&self) -> &SinkConfig {
        &self.config
    }

    pub fn stats(&self) -> SinkStats {
        self.stats
    }

    /// Open the writer. Failure here is fatal and aborts the session start.
    pub fn start(&mut self) -> PushclipResult<()> {
        self.writer.start()?;
        self.started = true;
        tracing::debug!(
            output = %self.config.output_path.display(),
            bitrate_bps = self.config.bitrate_bps,
            keyframe_interval = self.config.keyframe_interval,
            audio = self.config.audio.is_some(),
            "Encoder sink started"
        );
        Ok(())
    }

    /// Append a normalized video frame. Returns whether the frame landed;
    /// transient failures are logged and counted, never propagated.
    pub fn append_video(&mut self, frame: &VideoFrame) -> bool {
        match self.writer.append_video(frame) {
            Ok(true) => {
                self.stats.frames_appended += 1;
                self.stats.bytes_written += frame.data.len() as u64;
                true
            }
            Ok(false) => {
                self.stats.frames_dropped += 1;
                tracing::debug!(pts_ns = frame.pts_ns, "Video input not ready, frame dropped");
                false
            }
            Err(e) => {
                self.stats.frames_dropped += 1;
                tracing::warn!(pts_ns = frame.pts_ns, error = %e, "Video append failed, frame dropped");
                false
            }
        }
    }

    /// Append a normalized audio chunk; same failure policy as video.
    pub fn append_audio(&mut self, chunk: &AudioChunk) -> bool {
        match self.writer.append_audio(chunk) {
            Ok(true) => {
                self.stats.chunks_appended += 1;
                self.stats.bytes_written += (chunk.data.len() * 4) as u64;
                true
            }
            Ok(false) => {
                self.stats.chunks_dropped += 1;
                false
            }
            Err(e) => {
                self.stats.chunks_dropped += 1;
                tracing::warn!(pts_ns = chunk.pts_ns, error = %e, "Audio append failed, chunk dropped");
                false
            }
        }
    }

    /// Finalize the container. Failure leaves a partial file on disk and is
    /// fatal for the recording.
    pub fn finish(mut self) -> PushclipResult<SinkStats> {
        if !self.started {
            return Err(PushclipError::finalization_failed(
                "sink was never started",
            ));
        }
        self.writer.finish().map_err(|e| {
            PushclipError::finalization_failed(format!(
                "{}: {e}",
                self.config.output_path.display()
            ))
        })?;

        tracing::info!(
            output = %self.config.output_path.display(),
            frames = self.stats.frames_appended,
            dropped = self.stats.frames_dropped,
            chunks = self.stats.chunks_appended,
            bytes = self.stats.bytes_written,
            "Encoder sink finalized"
        );
        Ok(self.stats)
    }
}
