//! Atomic persistence for per-project timelines.
//!
//! One writer at a time; readers observe either the pre-write or post-write
//! file because every save goes through a temp file in the same directory
//! followed by a rename.

use std::io::Read;
use std::path::{Path, PathBuf};

use pushclip_common::error::{PushclipError, PushclipResult};
use sha2::{Digest, Sha256};

use crate::entry::{ProjectTimeline, TimelineEntry};

/// Handle to one project's `timeline.json`.
#[derive(Debug, Clone)]
pub struct TimelineStore {
    project_dir: PathBuf,
}

impl TimelineStore {
    pub fn new(project_dir: impl Into<PathBuf>) -> Self {
        Self {
            project_dir: project_dir.into(),
        }
    }

    /// The project directory this store persists into.
    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    /// Path of the timeline file.
    pub fn timeline_path(&self) -> PathBuf {
        self.project_dir.join("timeline.json")
    }

    /// Load the timeline, or a fresh one named after the project directory
    /// when no file exists yet.
    pub fn load(&self) -> PushclipResult<ProjectTimeline> {
        let path = self.timeline_path();
        if !path.exists() {
            let name = self
                .project_dir
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "untitled".to_string());
            return Ok(ProjectTimeline::new(name));
        }

        let content = std::fs::read_to_string(&path)?;
        let timeline = serde_json::from_str(&content)?;
        Ok(timeline)
    }

    /// Persist the timeline atomically: serialize to `timeline.json.tmp` in
    /// the same directory, then rename over the destination.
    pub fn save(&self, timeline: &ProjectTimeline) -> PushclipResult<()> {
        std::fs::create_dir_all(&self.project_dir)?;

        let path = self.timeline_path();
        let tmp_path = self.project_dir.join("timeline.json.tmp");

        let json = serde_json::to_string_pretty(timeline)?;
        std::fs::write(&tmp_path, json).map_err(|e| {
            PushclipError::timeline_write(format!("write {}: {e}", tmp_path.display()))
        })?;
        std::fs::rename(&tmp_path, &path).map_err(|e| {
            PushclipError::timeline_write(format!("rename into {}: {e}", path.display()))
        })?;

        tracing::debug!(path = %path.display(), entries = timeline.entries.len(), "Timeline saved");
        Ok(())
    }

    /// Append a freshly recorded entry at the tail and persist.
    ///
    /// Filenames must be unique among non-deleted entries; a duplicate is a
    /// caller bug and is rejected rather than silently merged.
    pub fn append_entry(&self, entry: TimelineEntry) -> PushclipResult<ProjectTimeline> {
        let mut timeline = self.load()?;

        if timeline
            .visible_entries()
            .any(|e| e.filename == entry.filename)
        {
            return Err(PushclipError::timeline_write(format!(
                "duplicate entry for {}",
                entry.filename
            )));
        }

        timeline.entries.push(entry);
        timeline.touch();
        self.save(&timeline)?;
        Ok(timeline)
    }

    /// Soft-delete the entry with the given id. Returns false when no such
    /// entry exists.
    pub fn soft_delete(&self, id: &str) -> PushclipResult<bool> {
        let mut timeline = self.load()?;
        let Some(entry) = timeline.entry_by_id_mut(id) else {
            return Ok(false);
        };
        entry.soft_delete();
        timeline.touch();
        self.save(&timeline)?;
        Ok(true)
    }
}

/// SHA-256 of a file's contents, streamed, as lowercase hex.
pub fn file_checksum(path: &Path) -> PushclipResult<String> {
    let mut file = std::fs::File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}
