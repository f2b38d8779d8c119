//! PushClip Recorder
//!
//! Turns global-hotkey press/release gestures into finished, race-free
//! recordings. This crate is the seam between the outside world and the
//! capture engine:
//!
//! - **Hotkey intake:** an external hotkey provider calls into
//!   [`hotkey::HotkeyHandle`] from its own thread; events are handed to the
//!   coordinator worker without blocking.
//! - **Coordinator:** the at-most-one-recording state machine; picks output
//!   paths, pauses the watcher around recordings, writes timeline entries,
//!   and emits lifecycle events.
//! - **Watcher:** notify-based observation of the clip root, pausable so
//!   in-progress recordings never masquerade as external file drops.
//! - **Engine:** the facade the UI shell invokes (projects, devices,
//!   region, timeline access, pre-init control).

pub mod coordinator;
pub mod engine;
pub mod events;
pub mod hotkey;
pub mod paths;
pub mod watcher;

pub use coordinator::*;
pub use engine::*;
pub use events::*;
pub use hotkey::*;
pub use paths::*;
pub use watcher::*;
