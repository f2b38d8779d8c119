//! Show a project's timeline.

use pushclip_common::config::AppConfig;
use pushclip_timeline::TimelineStore;

pub fn run(config: AppConfig, project: String, all: bool, json: bool) -> anyhow::Result<()> {
    let store = TimelineStore::new(config.output_root.join(&project));
    let timeline = store.load()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&timeline)?);
        return Ok(());
    }

    println!("Project: {}", timeline.project_name);
    println!("  Created: {}", timeline.created_at);
    println!("  Modified: {}", timeline.last_modified);
    println!("  Clips: {}", timeline.metadata.total_videos);
    println!();

    for entry in &timeline.entries {
        if entry.deleted && !all {
            continue;
        }
        let label = entry.label.as_deref().unwrap_or("-");
        let checksum = entry
            .checksum
            .as_deref()
            .map(|c| &c[..c.len().min(12)])
            .unwrap_or("-");
        println!(
            "  {}{}  {:>8.2}s  {}x{}  mic={}  label={label}  sha256={checksum}",
            entry.filename,
            if entry.deleted { " (deleted)" } else { "" },
            entry.duration_ms as f64 / 1000.0,
            entry.resolution.width,
            entry.resolution.height,
            entry.mic_enabled,
        );
    }
    Ok(())
}
