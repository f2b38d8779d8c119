//! Timeline entry and project timeline data model.
//!
//! Serialized as camelCase JSON so the UI layer can consume `timeline.json`
//! directly. Soft-deleted entries stay in the file; views filter them out.

use serde::{Deserialize, Serialize};

/// Display aspect class of a clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum AspectRatio {
    #[serde(rename = "16:9")]
    SixteenNine,
    #[serde(rename = "9:16")]
    NineSixteen,
    #[serde(rename = "none")]
    #[default]
    None,
}

impl AspectRatio {
    /// Classify a pixel resolution. Tolerates small deviations from the
    /// exact ratio (rounded dimensions, menu-bar cropping).
    pub fn from_resolution(width: u32, height: u32) -> Self {
        if width == 0 || height == 0 {
            return Self::None;
        }
        let ratio = width as f64 / height as f64;
        if (ratio - 16.0 / 9.0).abs() < 0.05 {
            Self::SixteenNine
        } else if (ratio - 9.0 / 16.0).abs() < 0.03 {
            Self::NineSixteen
        } else {
            Self::None
        }
    }
}

/// Pixel dimensions of a clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

/// One captured clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEntry {
    /// Opaque unique identifier (UUID v4), assigned at creation.
    pub id: String,

    /// Basename of the clip file; resolved against the project directory.
    pub filename: String,

    /// User-editable display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Basename of a still image colocated with the clip.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,

    /// ISO 8601 timestamp of capture start.
    pub recorded_at: String,

    /// Recording duration in milliseconds.
    pub duration_ms: u64,

    /// Soft-delete marker; deleted entries stay in the file.
    #[serde(default)]
    pub deleted: bool,

    /// ISO 8601 timestamp of the soft delete.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<String>,

    #[serde(default)]
    pub aspect_ratio: AspectRatio,

    #[serde(default)]
    pub resolution: Resolution,

    #[serde(default)]
    pub mic_enabled: bool,

    /// SHA-256 of the file contents; the stable identity used to reattach
    /// entries to renamed files.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
}

impl TimelineEntry {
    /// Create a fresh entry for a newly recorded clip.
    pub fn new(filename: impl Into<String>, recorded_at: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            filename: filename.into(),
            label: None,
            thumbnail: None,
            recorded_at: recorded_at.into(),
            duration_ms: 0,
            deleted: false,
            deleted_at: None,
            aspect_ratio: AspectRatio::None,
            resolution: Resolution::default(),
            mic_enabled: false,
            checksum: None,
        }
    }

    /// Mark this entry soft-deleted.
    pub fn soft_delete(&mut self) {
        self.deleted = true;
        self.deleted_at = Some(chrono::Utc::now().to_rfc3339());
    }
}

/// Aggregate counters carried alongside the entry list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TimelineMetadata {
    /// Count of non-deleted entries.
    #[serde(default)]
    pub total_videos: u64,
}

/// The per-project timeline file (`timeline.json`).
///
/// `entries` is the durable, insertion-ordered sequence; new recordings are
/// appended at the tail and presentation order is computed by readers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectTimeline {
    pub project_name: String,
    pub created_at: String,
    pub last_modified: String,
    pub entries: Vec<TimelineEntry>,
    #[serde(default)]
    pub metadata: TimelineMetadata,
}

impl ProjectTimeline {
    /// Create an empty timeline for a project.
    pub fn new(project_name: impl Into<String>) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            project_name: project_name.into(),
            created_at: now.clone(),
            last_modified: now,
            entries: Vec::new(),
            metadata: TimelineMetadata::default(),
        }
    }

    /// Non-deleted entries in durable order.
    pub fn visible_entries(&self) -> impl Iterator<Item = &TimelineEntry> {
        self.entries.iter().filter(|e| !e.deleted)
    }

    /// Look up an entry by clip filename, deleted or not.
    pub fn entry_by_filename(&self, filename: &str) -> Option<&TimelineEntry> {
        self.entries.iter().find(|e| e.filename == filename)
    }

    /// Look up an entry by id.
    pub fn entry_by_id_mut(&mut self, id: &str) -> Option<&mut TimelineEntry> {
        self.entries.iter_mut().find(|e| e.id == id)
    }

    /// Refresh `last_modified` and the aggregate counters. Call before
    /// every persisted write.
    pub fn touch(&mut self) {
        self.last_modified = chrono::Utc::now().to_rfc3339();
        self.metadata.total_videos = self.visible_entries().count() as u64;
    }
}
