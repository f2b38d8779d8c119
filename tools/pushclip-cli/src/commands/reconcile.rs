//! Reconcile a project's timeline against the files on disk.

use pushclip_common::config::AppConfig;
use pushclip_timeline::{reconcile_project, TimelineStore};

pub fn run(config: AppConfig, project: String) -> anyhow::Result<()> {
    let store = TimelineStore::new(config.output_root.join(&project));
    let promoted = reconcile_project(&store)?;

    if promoted == 0 {
        println!("Timeline already matches the filesystem.");
    } else {
        println!("Promoted {promoted} orphan file(s) into the timeline.");
    }
    Ok(())
}
