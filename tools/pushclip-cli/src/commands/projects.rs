//! List projects under the clip root.

use pushclip_common::config::AppConfig;
use pushclip_timeline::TimelineStore;

pub fn run(config: AppConfig) -> anyhow::Result<()> {
    let root = &config.output_root;
    println!("Clip root: {}", root.display());

    if !root.exists() {
        println!("(no projects yet)");
        return Ok(());
    }

    let mut names: Vec<String> = std::fs::read_dir(root)?
        .filter_map(|d| d.ok())
        .filter(|d| d.path().is_dir())
        .filter_map(|d| d.file_name().to_str().map(str::to_string))
        .filter(|name| !name.starts_with('.'))
        .collect();
    names.sort();

    if names.is_empty() {
        println!("(no projects yet)");
        return Ok(());
    }

    for name in names {
        let store = TimelineStore::new(root.join(&name));
        match store.load() {
            Ok(timeline) => println!(
                "  {name}  ({} clips, modified {})",
                timeline.metadata.total_videos, timeline.last_modified
            ),
            Err(e) => println!("  {name}  (timeline unreadable: {e})"),
        }
    }
    Ok(())
}
