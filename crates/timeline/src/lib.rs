//! PushClip Timeline
//!
//! The durable, per-project record of captured clips:
//! - **Entry model:** append-only, soft-delete clip entries with content
//!   checksums (`timeline.json`, camelCase for UI compatibility)
//! - **Store:** atomic read/write of the timeline file (temp file + rename)
//! - **Reconcile:** cross-check entries against the files actually on disk,
//!   matching by filename first and content checksum second so renames
//!   survive, promoting orphan files, and never auto-deleting entries
//! - **History:** bounded undo/redo over user-initiated timeline edits

pub mod entry;
pub mod history;
pub mod reconcile;
pub mod store;

pub use entry::*;
pub use history::*;
pub use reconcile::*;
pub use store::*;
