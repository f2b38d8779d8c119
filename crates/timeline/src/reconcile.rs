//! Filesystem reconciliation.
//!
//! Filenames are an unstable identity: users rename clips, and imported
//! files can collide with the app's sequential names. The content checksum
//! is the stable identity; the filename is a hint. Reconciliation:
//!
//! 1. Matches files to entries by filename.
//! 2. Matches the remaining files by checksum against entries whose file is
//!    missing, relinking renamed clips in place.
//! 3. Promotes files with no match into new entries.
//! 4. Leaves entries whose file is gone untouched; the user may restore the
//!    file later.

use std::collections::BTreeSet;
use std::path::Path;
use std::process::Command;

use pushclip_common::error::PushclipResult;

use crate::entry::{AspectRatio, Resolution, TimelineEntry};
use crate::store::{file_checksum, TimelineStore};

/// Reconcile a project's timeline against the MP4 files in its directory.
///
/// Returns the number of newly promoted entries. Saves only when something
/// changed, so running reconcile twice is a no-op the second time.
pub fn reconcile_project(store: &TimelineStore) -> PushclipResult<usize> {
    let dir = store.project_dir();
    let files = list_clip_files(dir)?;
    let mut timeline = store.load()?;

    let mut changed = false;

    // Pass 1: filename matches. Backfill checksums for entries that were
    // written before hashing (or whose save raced a crash).
    let mut unmatched: Vec<String> = Vec::new();
    for name in &files {
        match timeline.entries.iter_mut().find(|e| &e.filename == name) {
            Some(entry) => {
                if entry.checksum.is_none() {
                    if let Ok(sum) = file_checksum(&dir.join(name)) {
                        entry.checksum = Some(sum);
                        changed = true;
                    }
                }
            }
            None => unmatched.push(name.clone()),
        }
    }

    let present: BTreeSet<&String> = files.iter().collect();

    // Pass 2: checksum matches against entries whose file is missing; this
    // is how renames keep their id, label, and duration.
    let mut promoted = 0;
    for name in unmatched {
        let path = dir.join(&name);
        let sum = match file_checksum(&path) {
            Ok(sum) => sum,
            Err(e) => {
                tracing::warn!(file = %path.display(), error = %e, "Skipping unreadable clip");
                continue;
            }
        };

        let relinked = timeline
            .entries
            .iter_mut()
            .find(|e| !present.contains(&e.filename) && e.checksum.as_deref() == Some(sum.as_str()));

        if let Some(entry) = relinked {
            tracing::info!(from = %entry.filename, to = %name, "Relinked renamed clip");
            entry.filename = name;
            changed = true;
            continue;
        }

        // Pass 3: no match at all; promote the orphan.
        let mut entry = TimelineEntry::new(&name, file_recorded_at(&path));
        entry.checksum = Some(sum);
        entry.duration_ms = probe_duration_ms(&path).unwrap_or(0);
        if let Some((width, height)) = probe_video_dimensions(&path) {
            entry.resolution = Resolution { width, height };
            entry.aspect_ratio = AspectRatio::from_resolution(width, height);
        }
        tracing::info!(file = %name, duration_ms = entry.duration_ms, "Promoted orphan clip");
        timeline.entries.push(entry);
        promoted += 1;
        changed = true;
    }

    if changed {
        timeline.touch();
        store.save(&timeline)?;
    }

    Ok(promoted)
}

/// MP4 basenames in the project directory, sorted for deterministic passes.
fn list_clip_files(dir: &Path) -> PushclipResult<Vec<String>> {
    let mut files = Vec::new();
    if !dir.exists() {
        return Ok(files);
    }
    for dirent in std::fs::read_dir(dir)? {
        let dirent = dirent?;
        let path = dirent.path();
        if path.is_file() && path.extension().and_then(|e| e.to_str()) == Some("mp4") {
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                files.push(name.to_string());
            }
        }
    }
    files.sort();
    Ok(files)
}

/// Best-effort capture timestamp for a promoted file: its mtime.
fn file_recorded_at(path: &Path) -> String {
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .map(|t| chrono::DateTime::<chrono::Utc>::from(t).to_rfc3339())
        .unwrap_or_else(|_| chrono::Utc::now().to_rfc3339())
}

/// Probe a clip's duration via ffprobe. None when the binary is missing or
/// the file is not a parsable container.
fn probe_duration_ms(path: &Path) -> Option<u64> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(path)
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    let raw = String::from_utf8(output.stdout).ok()?;
    let secs = raw.lines().next()?.trim().parse::<f64>().ok()?;
    if !secs.is_finite() || secs <= 0.0 {
        return None;
    }

    Some((secs * 1000.0).round() as u64)
}

/// Probe a clip's pixel dimensions via ffprobe.
fn probe_video_dimensions(path: &Path) -> Option<(u32, u32)> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=width,height",
            "-of",
            "csv=p=0:s=x",
        ])
        .arg(path)
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    let raw = String::from_utf8(output.stdout).ok()?;
    let line = raw.lines().next()?.trim();
    let (w, h) = line.split_once('x')?;
    let width = w.parse::<u32>().ok()?;
    let height = h.parse::<u32>().ok()?;
    if width == 0 || height == 0 {
        return None;
    }

    Some((width, height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::TimelineStore;

    fn store_in(dir: &Path) -> TimelineStore {
        TimelineStore::new(dir)
    }

    #[test]
    fn promotes_orphan_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("dropped.mp4"), b"external clip").unwrap();

        let store = store_in(dir.path());
        let promoted = reconcile_project(&store).unwrap();
        assert_eq!(promoted, 1);

        let timeline = store.load().unwrap();
        assert_eq!(timeline.entries.len(), 1);
        assert_eq!(timeline.entries[0].filename, "dropped.mp4");
        assert!(timeline.entries[0].checksum.is_some());
    }

    #[test]
    fn rename_is_relinked_by_checksum() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());

        let original = dir.path().join("recording-2.mp4");
        std::fs::write(&original, b"clip payload").unwrap();

        let mut entry = TimelineEntry::new("recording-2.mp4", "2026-03-01T12:00:00Z");
        entry.label = Some("Demo take".to_string());
        entry.duration_ms = 4200;
        entry.checksum = Some(file_checksum(&original).unwrap());
        let saved = store.append_entry(entry).unwrap();
        let id = saved.entries[0].id.clone();

        std::fs::rename(&original, dir.path().join("demo.mp4")).unwrap();

        let promoted = reconcile_project(&store).unwrap();
        assert_eq!(promoted, 0);

        let timeline = store.load().unwrap();
        assert_eq!(timeline.entries.len(), 1);
        let entry = &timeline.entries[0];
        assert_eq!(entry.filename, "demo.mp4");
        assert_eq!(entry.id, id);
        assert_eq!(entry.label.as_deref(), Some("Demo take"));
        assert_eq!(entry.duration_ms, 4200);
    }

    #[test]
    fn missing_file_entry_is_preserved() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());

        let mut entry = TimelineEntry::new("recording-1.mp4", "2026-03-01T12:00:00Z");
        entry.checksum = Some("deadbeef".to_string());
        store.append_entry(entry).unwrap();

        let promoted = reconcile_project(&store).unwrap();
        assert_eq!(promoted, 0);
        let timeline = store.load().unwrap();
        assert_eq!(timeline.entries.len(), 1);
        assert_eq!(timeline.entries[0].filename, "recording-1.mp4");
    }

    #[test]
    fn reconcile_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        std::fs::write(dir.path().join("a.mp4"), b"aaa").unwrap();
        std::fs::write(dir.path().join("b.mp4"), b"bbb").unwrap();

        let first = reconcile_project(&store).unwrap();
        assert_eq!(first, 2);
        let after_first = store.load().unwrap();

        let second = reconcile_project(&store).unwrap();
        assert_eq!(second, 0);
        let after_second = store.load().unwrap();
        assert_eq!(after_first, after_second);
    }

    #[test]
    fn soft_deleted_entry_still_claims_its_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());

        let clip = dir.path().join("recording-1.mp4");
        std::fs::write(&clip, b"payload").unwrap();
        let mut entry = TimelineEntry::new("recording-1.mp4", "2026-03-01T12:00:00Z");
        entry.checksum = Some(file_checksum(&clip).unwrap());
        let saved = store.append_entry(entry).unwrap();
        store.soft_delete(&saved.entries[0].id).unwrap();

        // The file on disk belongs to the hidden entry; no duplicate appears.
        let promoted = reconcile_project(&store).unwrap();
        assert_eq!(promoted, 0);
        assert_eq!(store.load().unwrap().entries.len(), 1);
    }
}
