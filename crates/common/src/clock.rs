//! Clock and timing utilities for recording lifecycle and track alignment.
//!
//! Durations reported to the timeline come from a monotonic clock captured
//! when recording starts, never from encoded sample timestamps (samples may
//! still be in flight at stop). This module provides:
//! - The recording clock (monotonic epoch + wall-clock anchor)
//! - Drift measurement between track intake offsets
//! - A frame pacer for fixed-rate sample generation

use std::time::{Duration, Instant};

/// Monotonic clock anchored at the moment recording entered the
/// `Recording` state.
#[derive(Debug, Clone)]
pub struct RecordingClock {
    /// The instant recording started.
    epoch: Instant,

    /// Wall-clock time at epoch (ISO 8601 string), written into the
    /// timeline entry as `recordedAt`.
    epoch_wall: String,
}

impl RecordingClock {
    /// Create a new recording clock anchored to now.
    pub fn start() -> Self {
        Self {
            epoch: Instant::now(),
            epoch_wall: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Milliseconds elapsed since recording start.
    pub fn elapsed_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }

    /// Nanoseconds elapsed since recording start.
    pub fn elapsed_ns(&self) -> u64 {
        self.epoch.elapsed().as_nanos() as u64
    }

    /// Elapsed time since recording start.
    pub fn elapsed(&self) -> Duration {
        self.epoch.elapsed()
    }

    /// Wall-clock time at recording start.
    pub fn epoch_wall(&self) -> &str {
        &self.epoch_wall
    }

    /// The underlying epoch instant.
    pub fn epoch(&self) -> Instant {
        self.epoch
    }
}

/// Offset between two tracks' first samples, measured against the shared
/// timestamp origin.
#[derive(Debug, Clone, Copy)]
pub struct DriftMeasurement {
    /// First-sample timestamp of the reference track (ns, normalized).
    pub reference_ns: u64,
    /// First-sample timestamp of the measured track (ns, normalized).
    pub measured_ns: u64,
}

impl DriftMeasurement {
    /// Drift in nanoseconds (positive = measured track started later).
    pub fn drift_ns(&self) -> i64 {
        self.measured_ns as i64 - self.reference_ns as i64
    }

    /// Drift in milliseconds.
    pub fn drift_ms(&self) -> f64 {
        self.drift_ns() as f64 / 1_000_000.0
    }

    /// Whether drift exceeds an acceptable threshold.
    pub fn exceeds_threshold_ms(&self, threshold_ms: f64) -> bool {
        self.drift_ms().abs() > threshold_ms
    }
}

/// Fixed-rate cadence for sample generator threads.
///
/// Ticks are scheduled on an absolute deadline grid from the first call,
/// so jitter in the generator loop does not accumulate into timestamp
/// drift over a long recording. The first tick fires immediately; a
/// generator that falls more than one interval behind has its grid
/// rebased instead of bursting the missed ticks.
#[derive(Debug)]
pub struct FramePacer {
    interval: Duration,
    next_deadline: Option<Instant>,
}

impl FramePacer {
    /// Cadence for the given Hz rate.
    pub fn from_hz(hz: u32) -> Self {
        Self::from_interval(Duration::from_nanos(1_000_000_000 / hz.max(1) as u64))
    }

    /// Cadence with an explicit tick interval.
    pub fn from_interval(interval: Duration) -> Self {
        Self {
            interval,
            next_deadline: None,
        }
    }

    /// Block until the next tick is due.
    pub fn wait_for_tick(&mut self) {
        let now = Instant::now();
        let due = self.next_deadline.unwrap_or(now);
        if due > now {
            std::thread::sleep(due - now);
        }

        let mut next = due + self.interval;
        let after = Instant::now();
        if next < after {
            next = after + self.interval;
        }
        self.next_deadline = Some(next);
    }

    /// The tick interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }
}
