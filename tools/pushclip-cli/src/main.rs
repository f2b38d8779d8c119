//! PushClip CLI: developer shell around the capture engine core.
//!
//! Usage:
//!   pushclip record [OPTIONS]        Hold a recording (Ctrl-C releases)
//!   pushclip projects                List projects under the clip root
//!   pushclip timeline <PROJECT>      Show a project's timeline
//!   pushclip reconcile <PROJECT>     Reconcile a timeline against disk
//!   pushclip check                   Check capture capabilities

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "pushclip",
    about = "Push-to-hold screen recording",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Override the clip root directory
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record one clip; press is issued immediately, Ctrl-C releases
    Record {
        /// Project the clip lands in (created if missing)
        #[arg(short, long, default_value = "scratch")]
        project: String,

        /// Capture microphone audio
        #[arg(long)]
        mic: bool,

        /// Release automatically after this many seconds instead of Ctrl-C
        #[arg(long)]
        seconds: Option<f64>,
    },

    /// List projects under the clip root
    Projects,

    /// Show a project's timeline
    Timeline {
        /// Project name
        project: String,

        /// Include soft-deleted entries
        #[arg(long)]
        all: bool,

        /// Print the raw timeline JSON
        #[arg(long)]
        json: bool,
    },

    /// Reconcile a project's timeline against the files on disk
    Reconcile {
        /// Project name
        project: String,
    },

    /// Check capture capabilities on this system
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = pushclip_common::config::AppConfig::load();
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    pushclip_common::logging::init_logging(&config.logging);
    if let Some(root) = cli.output {
        config.output_root = root;
    }
    tracing::debug!(root = %config.output_root.display(), "Configuration loaded");

    match cli.command {
        Commands::Record {
            project,
            mic,
            seconds,
        } => commands::record::run(config, project, mic, seconds).await,
        Commands::Projects => commands::projects::run(config),
        Commands::Timeline { project, all, json } => {
            commands::timeline::run(config, project, all, json)
        }
        Commands::Reconcile { project } => commands::reconcile::run(config, project),
        Commands::Check => commands::check::run(config).await,
    }
}
