//! Logging and tracing initialization.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

/// Initialize the tracing subscriber with the given configuration.
///
/// Always logs to stdout; when `config.file` is set, a second layer
/// appends to that file without ANSI escapes. Safe to call more than once
/// (later calls are no-ops).
pub fn init_logging(config: &LoggingConfig) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let file_layer = config.file.as_ref().and_then(|path| {
        if let Some(parent) = path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                eprintln!("pushclip: cannot create log directory: {e}");
                return None;
            }
        }
        match std::fs::OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => Some(fmt::layer().with_writer(file).with_ansi(false).with_target(true)),
            Err(e) => {
                eprintln!("pushclip: cannot open log file {}: {e}", path.display());
                None
            }
        }
    });

    if config.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(file_layer)
            .with(fmt::layer().json())
            .try_init()
            .ok();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(file_layer)
            .with(fmt::layer().with_target(true))
            .try_init()
            .ok();
    }
}

/// Initialize logging with defaults (useful for tests and quick scripts).
pub fn init_default_logging() {
    init_logging(&LoggingConfig::default());
}
