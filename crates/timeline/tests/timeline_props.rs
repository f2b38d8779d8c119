//! Property tests for the timeline store: reconcile idempotence, undo/redo
//! inversion, and serde round-trips.

use proptest::prelude::*;

use pushclip_timeline::{
    reconcile_project, ProjectTimeline, TimelineEntry, TimelineHistory, TimelineStore,
};

fn timeline_from_specs(specs: &[(String, u64, bool)]) -> ProjectTimeline {
    let mut timeline = ProjectTimeline::new("prop");
    for (i, (label, duration_ms, deleted)) in specs.iter().enumerate() {
        let mut entry = TimelineEntry::new(
            format!("recording-{}.mp4", i + 1),
            "2026-03-01T12:00:00Z",
        );
        if !label.is_empty() {
            entry.label = Some(label.clone());
        }
        entry.duration_ms = *duration_ms;
        if *deleted {
            entry.soft_delete();
        }
        timeline.entries.push(entry);
    }
    timeline.touch();
    timeline
}

proptest! {
    /// reconcile(reconcile(dir)) == reconcile(dir): the second pass promotes
    /// nothing and leaves the file byte-identical in meaning.
    #[test]
    fn reconcile_twice_equals_once(
        files in prop::collection::btree_map(
            "[a-z]{1,8}",
            prop::collection::vec(any::<u8>(), 0..64),
            0..6,
        )
    ) {
        let dir = tempfile::tempdir().unwrap();
        let store = TimelineStore::new(dir.path());
        for (stem, content) in &files {
            std::fs::write(dir.path().join(format!("{stem}.mp4")), content).unwrap();
        }

        let promoted = reconcile_project(&store).unwrap();
        prop_assert_eq!(promoted, files.len());
        let first = store.load().unwrap();

        let promoted_again = reconcile_project(&store).unwrap();
        prop_assert_eq!(promoted_again, 0);
        let second = store.load().unwrap();

        prop_assert_eq!(first, second);
    }

    /// Undo(Redo(s)) == s and Redo(Undo(s)) == s for a single user mutation.
    #[test]
    fn undo_redo_inversion(
        specs in prop::collection::vec(
            ("[ -~]{0,12}", 0u64..600_000, any::<bool>()),
            1..5,
        ),
        new_label in "[ -~]{1,12}",
    ) {
        let before = timeline_from_specs(&specs);

        // One user mutation: relabel the first entry.
        let mut after = before.clone();
        after.entries[0].label = Some(new_label);
        after.touch();

        let mut history = TimelineHistory::new();
        history.push(before.clone());

        let undone = history.undo(after.clone()).unwrap();
        prop_assert_eq!(&undone, &before);

        let redone = history.redo(undone).unwrap();
        prop_assert_eq!(&redone, &after);

        let undone_again = history.undo(redone).unwrap();
        prop_assert_eq!(&undone_again, &before);
    }

    /// The JSON representation round-trips without loss.
    #[test]
    fn timeline_serde_roundtrip(
        specs in prop::collection::vec(
            ("[ -~]{0,12}", 0u64..600_000, any::<bool>()),
            0..6,
        )
    ) {
        let timeline = timeline_from_specs(&specs);
        let json = serde_json::to_string_pretty(&timeline).unwrap();
        let back: ProjectTimeline = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(back, timeline);
    }
}
