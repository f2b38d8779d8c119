//! PushClip Capture Engine
//!
//! Turns raw OS capture streams into finished MP4 clips. The engine owns
//! everything between "the hotkey went down" and "a playable file exists":
//! stream routing, timestamp normalization, encoding, and the warm-session
//! machinery that keeps the hot path under the latency budget.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────┐
//! │                 CaptureSession                     │
//! │  ┌──────────┐   ┌───────────┐                     │
//! │  │ Screen   │   │ Audio     │   (platform streams) │
//! │  │ Stream   │   │ Stream    │                     │
//! │  └────┬─────┘   └────┬──────┘                     │
//! │       ▼              ▼                            │
//! │  ┌─────────────────────────────┐                  │
//! │  │   TimestampNormalizer       │  shared origin   │
//! │  └──────────────┬──────────────┘                  │
//! │                 ▼                                 │
//! │  ┌─────────────────────────────┐                  │
//! │  │   EncoderSink (MediaWriter) │  H.264/AAC MP4   │
//! │  └─────────────────────────────┘                  │
//! └───────────────────────────────────────────────────┘
//! ```
//!
//! The [`preinit::PreInitManager`] holds a fully built session so that
//! `start` collapses to a single stream-start call when the hotkey fires.

pub mod backend;
pub mod config;
pub mod normalizer;
pub mod preinit;
pub mod sample;
pub mod session;
pub mod sink;

pub use config::*;
pub use normalizer::*;
pub use preinit::*;
pub use sample::*;
pub use session::*;
pub use sink::*;
