//! End-to-end push-to-hold scenarios over the synthetic backend: hotkey
//! press/release in, finished clip + timeline entry + events out.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use pushclip_capture_engine::backend::SyntheticBackend;
use pushclip_common::config::AppConfig;
use pushclip_recorder::{Engine, EngineEvent, RecordingStatus};
use tokio::sync::broadcast;

async fn ready_engine(root: &Path, mic: bool) -> Arc<Engine> {
    let mut config = AppConfig {
        output_root: root.to_path_buf(),
        ..Default::default()
    };
    config.recording.capture_microphone = mic;

    let engine = Engine::with_backend(config, Box::new(SyntheticBackend::new())).unwrap();
    engine.create_project("demo").unwrap();
    engine.set_current_project("demo").await.unwrap();
    engine.pre_initialize().await.unwrap();
    engine
}

/// Receive events until one matches, or give up at the deadline.
async fn next_matching(
    rx: &mut broadcast::Receiver<EngineEvent>,
    timeout: Duration,
    pred: impl Fn(&EngineEvent) -> bool,
) -> Option<EngineEvent> {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        let remaining = deadline.checked_duration_since(tokio::time::Instant::now())?;
        match tokio::time::timeout(remaining, rx.recv()).await {
            Ok(Ok(event)) => {
                if pred(&event) {
                    return Some(event);
                }
            }
            Ok(Err(broadcast::error::RecvError::Lagged(_))) => continue,
            _ => return None,
        }
    }
}

fn is_clip_saved(event: &EngineEvent) -> bool {
    matches!(event, EngineEvent::ClipSaved { .. })
}

#[tokio::test]
async fn short_recording_produces_clip_and_timeline_entry() {
    let dir = tempfile::tempdir().unwrap();
    let engine = ready_engine(dir.path(), true).await;
    let mut rx = engine.events();
    let hotkey = engine.hotkey_handle();

    hotkey.press();
    tokio::time::sleep(Duration::from_millis(600)).await;
    hotkey.release();

    let saved = next_matching(&mut rx, Duration::from_secs(5), is_clip_saved)
        .await
        .expect("clip-saved event");
    let EngineEvent::ClipSaved { path, duration_ms } = saved else {
        unreachable!()
    };

    assert!(path.ends_with("recording-1.mp4"));
    assert!(Path::new(&path).exists());
    assert!(
        (450..=1000).contains(&duration_ms),
        "duration {duration_ms} outside hold window"
    );

    let timeline = engine.get_project_timeline("demo").unwrap();
    assert_eq!(timeline.entries.len(), 1);
    let entry = &timeline.entries[0];
    assert_eq!(entry.filename, "recording-1.mp4");
    assert_eq!(entry.duration_ms, duration_ms);
    assert!(entry.mic_enabled);
    assert!(entry.checksum.is_some());
    assert!(!entry.recorded_at.is_empty());
}

#[tokio::test]
async fn rapid_re_press_yields_sequential_clips_and_clean_status_pairs() {
    let dir = tempfile::tempdir().unwrap();
    let engine = ready_engine(dir.path(), false).await;
    let project_dir = dir.path().join("demo");

    // A populated directory: numbering continues after the existing clips.
    std::fs::write(project_dir.join("recording-1.mp4"), b"old").unwrap();
    std::fs::write(project_dir.join("recording-2.mp4"), b"old").unwrap();

    let mut rx = engine.events();
    let hotkey = engine.hotkey_handle();

    let mut events = Vec::new();
    for _ in 0..3 {
        hotkey.press();
        tokio::time::sleep(Duration::from_millis(300)).await;
        hotkey.release();
        tokio::time::sleep(Duration::from_millis(120)).await;
    }
    let deadline = tokio::time::Instant::now() + Duration::from_secs(8);
    while events.iter().filter(|e| is_clip_saved(e)).count() < 3 {
        let remaining = deadline
            .checked_duration_since(tokio::time::Instant::now())
            .expect("three clip-saved events before deadline");
        match tokio::time::timeout(remaining, rx.recv()).await {
            Ok(Ok(event)) => events.push(event),
            _ => panic!("event stream ended early"),
        }
    }

    for n in 3..=5 {
        assert!(
            project_dir.join(format!("recording-{n}.mp4")).exists(),
            "recording-{n}.mp4 missing"
        );
    }
    assert!(!project_dir.join("recording-6.mp4").exists());

    // Exactly three Recording→Idle pairs, in order, no stale states.
    let statuses: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            EngineEvent::RecordingStatus(s) => Some(*s),
            _ => None,
        })
        .collect();
    assert_eq!(
        statuses,
        vec![
            RecordingStatus::Recording,
            RecordingStatus::Idle,
            RecordingStatus::Recording,
            RecordingStatus::Idle,
            RecordingStatus::Recording,
            RecordingStatus::Idle,
        ]
    );

    // No duplicate timeline entries.
    let timeline = engine.get_project_timeline("demo").unwrap();
    assert_eq!(timeline.entries.len(), 3);
    let mut filenames: Vec<_> = timeline.entries.iter().map(|e| e.filename.clone()).collect();
    filenames.sort();
    filenames.dedup();
    assert_eq!(filenames.len(), 3);
}

#[tokio::test]
async fn auto_repeat_presses_collapse_to_one_recording() {
    let dir = tempfile::tempdir().unwrap();
    let engine = ready_engine(dir.path(), false).await;
    let mut rx = engine.events();
    let hotkey = engine.hotkey_handle();

    // 20 repeat callbacks over ~300 ms, then a single release.
    for _ in 0..20 {
        hotkey.press();
        tokio::time::sleep(Duration::from_millis(15)).await;
    }
    tokio::time::sleep(Duration::from_millis(100)).await;
    hotkey.release();

    let saved = next_matching(&mut rx, Duration::from_secs(5), is_clip_saved)
        .await
        .expect("clip-saved event");
    let EngineEvent::ClipSaved { duration_ms, .. } = saved else {
        unreachable!()
    };
    // Duration spans first press to release, not the last repeat.
    assert!(
        (300..=900).contains(&duration_ms),
        "duration {duration_ms} outside expected window"
    );

    // No second recording appears.
    assert!(
        next_matching(&mut rx, Duration::from_millis(800), is_clip_saved)
            .await
            .is_none()
    );
    let timeline = engine.get_project_timeline("demo").unwrap();
    assert_eq!(timeline.entries.len(), 1);
}

#[tokio::test]
async fn external_drop_during_recording_is_deferred_to_reconcile() {
    let dir = tempfile::tempdir().unwrap();
    let engine = ready_engine(dir.path(), false).await;
    let project_dir = dir.path().join("demo");

    // Let the watcher's view of the setup writes drain before subscribing.
    tokio::time::sleep(Duration::from_millis(500)).await;
    let mut rx = engine.events();
    let hotkey = engine.hotkey_handle();

    hotkey.press();
    tokio::time::sleep(Duration::from_millis(200)).await;
    std::fs::write(project_dir.join("dropped.mp4"), b"external file").unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;
    hotkey.release();

    // Everything up to clip-saved: the watcher must stay silent about the
    // in-progress window.
    let mut before_save = Vec::new();
    loop {
        let event = next_matching(&mut rx, Duration::from_secs(5), |_| true)
            .await
            .expect("events until clip-saved");
        let done = is_clip_saved(&event);
        before_save.push(event);
        if done {
            break;
        }
    }
    assert!(
        !before_save
            .iter()
            .any(|e| matches!(e, EngineEvent::FilesystemChanged)),
        "watcher fired during the pause window"
    );

    // Exactly one new timeline entry (the recording).
    let timeline = engine.get_project_timeline("demo").unwrap();
    assert_eq!(timeline.entries.len(), 1);
    assert_eq!(timeline.entries[0].filename, "recording-1.mp4");

    // The dropped file surfaces through reconcile afterwards.
    let promoted = engine.reconcile_project_timeline("demo").unwrap();
    assert_eq!(promoted, 1);
    let timeline = engine.get_project_timeline("demo").unwrap();
    assert!(timeline.entries.iter().any(|e| e.filename == "dropped.mp4"));

    // And the watcher is live again after the save.
    std::fs::write(project_dir.join("late-drop.mp4"), b"after resume").unwrap();
    let fs_event = next_matching(&mut rx, Duration::from_secs(5), |e| {
        matches!(e, EngineEvent::FilesystemChanged)
    })
    .await;
    assert!(fs_event.is_some(), "watcher did not resume after clip-saved");
}

#[tokio::test]
async fn release_during_start_still_yields_exactly_one_clip() {
    let dir = tempfile::tempdir().unwrap();
    let engine = ready_engine(dir.path(), false).await;
    let mut rx = engine.events();
    let hotkey = engine.hotkey_handle();

    // Release queues behind the in-flight start and wins its CAS as soon as
    // start completes.
    hotkey.press();
    hotkey.release();

    let saved = next_matching(&mut rx, Duration::from_secs(5), is_clip_saved)
        .await
        .expect("clip-saved event");
    let EngineEvent::ClipSaved { path, duration_ms } = saved else {
        unreachable!()
    };
    assert!(Path::new(&path).exists());
    assert!(duration_ms < 500, "stop did not follow start promptly");

    let timeline = engine.get_project_timeline("demo").unwrap();
    assert_eq!(timeline.entries.len(), 1);
}

#[tokio::test]
async fn cold_pre_init_falls_back_to_slow_path() {
    let dir = tempfile::tempdir().unwrap();
    let engine = ready_engine(dir.path(), false).await;
    let mut rx = engine.events();
    let hotkey = engine.hotkey_handle();

    // Shut the warm session down; the next press must build on demand.
    engine.toggle_pre_init().await.unwrap();
    assert_eq!(
        engine.get_pre_init_status(),
        pushclip_capture_engine::PreInitState::NotInitialized
    );

    hotkey.press();
    tokio::time::sleep(Duration::from_millis(400)).await;
    hotkey.release();

    let saved = next_matching(&mut rx, Duration::from_secs(5), is_clip_saved)
        .await
        .expect("clip-saved event despite cold pre-init");
    let EngineEvent::ClipSaved { path, .. } = saved else {
        unreachable!()
    };
    assert!(Path::new(&path).exists());
}

#[tokio::test]
async fn press_without_project_emits_project_required() {
    let dir = tempfile::tempdir().unwrap();
    let config = AppConfig {
        output_root: dir.path().to_path_buf(),
        ..Default::default()
    };
    let engine = Engine::with_backend(config, Box::new(SyntheticBackend::new())).unwrap();
    let mut rx = engine.events();
    let hotkey = engine.hotkey_handle();

    hotkey.press();
    let event = next_matching(&mut rx, Duration::from_secs(5), |e| {
        matches!(e, EngineEvent::ProjectRequired)
    })
    .await;
    assert!(event.is_some());
    assert!(!engine.is_recording());

    // The stray release is debounced away and the next cycle works once a
    // project exists.
    hotkey.release();
    engine.create_project("demo").unwrap();
    engine.set_current_project("demo").await.unwrap();
    hotkey.press();
    tokio::time::sleep(Duration::from_millis(250)).await;
    hotkey.release();
    assert!(
        next_matching(&mut rx, Duration::from_secs(5), is_clip_saved)
            .await
            .is_some()
    );
}

#[tokio::test]
async fn rename_survives_reconcile_via_checksum() {
    let dir = tempfile::tempdir().unwrap();
    let engine = ready_engine(dir.path(), false).await;
    let mut rx = engine.events();
    let hotkey = engine.hotkey_handle();

    hotkey.press();
    tokio::time::sleep(Duration::from_millis(250)).await;
    hotkey.release();
    next_matching(&mut rx, Duration::from_secs(5), is_clip_saved)
        .await
        .expect("clip-saved event");

    let before = engine.get_project_timeline("demo").unwrap();
    let original = before.entries[0].clone();

    let project_dir = dir.path().join("demo");
    std::fs::rename(
        project_dir.join("recording-1.mp4"),
        project_dir.join("my-clip.mp4"),
    )
    .unwrap();

    let promoted = engine.reconcile_project_timeline("demo").unwrap();
    assert_eq!(promoted, 0);

    let after = engine.get_project_timeline("demo").unwrap();
    assert_eq!(after.entries.len(), 1);
    let entry = &after.entries[0];
    assert_eq!(entry.filename, "my-clip.mp4");
    assert_eq!(entry.id, original.id);
    assert_eq!(entry.duration_ms, original.duration_ms);
    assert_eq!(entry.label, original.label);
}
