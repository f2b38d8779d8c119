//! Record one clip through the full press-and-hold path.

use pushclip_common::config::AppConfig;
use pushclip_recorder::{Engine, EngineEvent};

pub async fn run(
    mut config: AppConfig,
    project: String,
    mic: bool,
    seconds: Option<f64>,
) -> anyhow::Result<()> {
    if mic {
        config.recording.capture_microphone = true;
    }

    let engine = Engine::new(config)?;
    engine.create_project(&project)?;
    engine.set_current_project(&project).await?;
    engine.pre_initialize().await?;

    let hotkey = engine.hotkey_handle();
    let mut events = engine.events();

    hotkey.press();
    match seconds {
        Some(secs) => {
            println!("Recording {secs:.1}s into project '{project}'...");
            tokio::time::sleep(std::time::Duration::from_secs_f64(secs)).await;
        }
        None => {
            println!("Recording into project '{project}'... press Ctrl-C to stop");
            tokio::signal::ctrl_c().await?;
        }
    }
    hotkey.release();

    // Finalization is asynchronous; wait for its verdict.
    loop {
        match events.recv().await? {
            EngineEvent::ClipSaved { path, duration_ms } => {
                println!("Saved {path} ({:.2}s)", duration_ms as f64 / 1000.0);
                return Ok(());
            }
            EngineEvent::RecordingError { code, message } => {
                anyhow::bail!("recording failed [{code}]: {message}");
            }
            _ => {}
        }
    }
}
