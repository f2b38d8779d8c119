//! Raw media samples as delivered by the platform capture streams.
//!
//! Timestamps are native presentation times in nanoseconds on whatever
//! monotonic base the OS framework uses; the normalizer rebases them to the
//! session origin before they reach the writer.

/// One captured video frame.
#[derive(Debug, Clone)]
pub struct VideoFrame {
    /// Pixel payload in the capture format (the encoder's converter handles
    /// colorspace; this crate never inspects it).
    pub data: Vec<u8>,

    /// Native presentation timestamp in nanoseconds.
    pub pts_ns: u64,

    /// Display duration in nanoseconds, preserved from the source.
    pub duration_ns: u64,

    pub width: u32,
    pub height: u32,
}

/// One captured audio buffer.
#[derive(Debug, Clone)]
pub struct AudioChunk {
    /// Interleaved f32 samples, `[-1.0, 1.0]`.
    pub data: Vec<f32>,

    /// Native presentation timestamp in nanoseconds.
    pub pts_ns: u64,

    /// Buffer duration in nanoseconds, preserved from the source.
    pub duration_ns: u64,

    pub sample_rate: u32,
    pub channels: u16,
}
