//! Check capture capabilities on this system.

use pushclip_capture_engine::backend::{default_backend, CaptureBackend};

pub async fn run(_config: pushclip_common::config::AppConfig) -> anyhow::Result<()> {
    println!("PushClip System Check");
    println!("{}", "=".repeat(50));

    let backend: Box<dyn CaptureBackend> = default_backend();

    match backend.detect_displays() {
        Ok(displays) => {
            println!("[OK] Displays detected: {}", displays.len());
            for d in &displays {
                println!(
                    "     {} {}x{} (scale: {}x) {}",
                    d.name,
                    d.width,
                    d.height,
                    d.scale_factor,
                    if d.primary { "(primary)" } else { "" }
                );
            }
        }
        Err(e) => println!("[WARN] Display detection failed: {e}"),
    }

    match backend.list_audio_devices() {
        Ok(devices) => {
            println!("[OK] Audio inputs: {}", devices.len());
            for d in &devices {
                let mut tags = Vec::new();
                if d.is_default {
                    tags.push("default");
                }
                if d.is_builtin {
                    tags.push("built-in");
                }
                println!("     {} [{}] {}", d.name, d.id, tags.join(", "));
            }
        }
        Err(e) => println!("[WARN] Audio device enumeration failed: {e}"),
    }

    println!();
    let capabilities = backend.capabilities();
    for c in &capabilities {
        let status = if c.available { "[OK]  " } else { "[MISS]" };
        println!("{status} {}: {}", c.name, c.description);
        if let Some(ref fix) = c.fix_instructions {
            println!("       fix: {fix}");
        }
    }

    let all_required_ok = capabilities.iter().filter(|c| c.required).all(|c| c.available);
    println!();
    if all_required_ok {
        println!("All required capabilities are available. PushClip is ready.");
    } else {
        println!("Some required capabilities are missing. See above for fixes.");
    }

    Ok(())
}
