//! Command-line tool for inspecting and managing save slots.
//!
//! Run with: `save-cli <command>`. The save directory comes from `--dir`,
//! then `SAVE_DATA_DIR` (a `.env` file is honored), then the platform data
//! directory.

mod commands;
mod dirs;
mod logging;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use commands::{Delete, List, New, SaveContext, Settings, Show};
use save_runtime::{FileStorage, SaveSystem, SaveSystemConfig};

/// Inspect and manage save slots
#[derive(Parser)]
#[command(name = "save-cli")]
#[command(about = "Inspect and manage save slots", long_about = None)]
#[command(version)]
struct Cli {
    /// Save directory to operate on
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// List every slot with a readable header
    List(List),

    /// Show one slot's header and fragments
    Show(Show),

    /// Create a new named slot
    New(New),

    /// Delete a slot and all of its fragments
    Delete(Delete),

    /// Show or change user settings
    Settings(Settings),
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (for SAVE_DATA_DIR and other env vars)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let _log_guard = logging::setup_logging()?;

    let mut config = SaveSystemConfig::from_env();
    if let Some(dir) = cli.dir {
        config.save_dir = dir;
    }
    // Tooling never restores a slot on its own.
    config.auto_load_on_start = false;

    let storage = Arc::new(
        FileStorage::new(&config.save_dir)
            .with_context(|| format!("Failed to open save directory: {}", config.save_dir.display()))?,
    );
    let system = SaveSystem::builder()
        .config(config.clone())
        .storage(storage.clone())
        .build()
        .await
        .context("Failed to start save system")?;

    let ctx = SaveContext {
        handle: system.handle(),
        storage,
        config,
    };

    let result = match cli.command {
        Command::List(cmd) => cmd.execute(&ctx).await,
        Command::Show(cmd) => cmd.execute(&ctx).await,
        Command::New(cmd) => cmd.execute(&ctx).await,
        Command::Delete(cmd) => cmd.execute(&ctx).await,
        Command::Settings(cmd) => cmd.execute(&ctx).await,
    };

    system.shutdown().await?;
    result
}
