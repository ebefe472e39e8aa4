//! Save slot commands.

mod delete;
mod list;
mod new;
mod settings;
mod show;

use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use console::style;
use save_runtime::{FileStorage, SaveManagerHandle, SaveSystemConfig};

pub use delete::Delete;
pub use list::List;
pub use new::New;
pub use settings::Settings;
pub use show::Show;

/// Everything a command needs to talk to the save directory.
pub struct SaveContext {
    pub handle: SaveManagerHandle,
    pub storage: Arc<FileStorage>,
    pub config: SaveSystemConfig,
}

impl SaveContext {
    fn check_slot(&self, slot: u32) -> Result<()> {
        if !self.config.is_valid_slot(slot) {
            anyhow::bail!(
                "Slot {} is out of range (0..{})",
                slot,
                self.config.max_slots
            );
        }
        Ok(())
    }
}

/// `1h 02m 05s`, or `2m 05s` under an hour.
pub fn format_play_time(play_time: Duration) -> String {
    let total = play_time.as_secs();
    let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);
    if hours > 0 {
        format!("{}h {:02}m {:02}s", hours, minutes, seconds)
    } else {
        format!("{}m {:02}s", minutes, seconds)
    }
}

/// Prompt user for confirmation
fn confirm(prompt: &str) -> Result<bool> {
    print!("{} ", style(prompt).yellow().bold());
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    let input = input.trim().to_lowercase();
    Ok(input == "y" || input == "yes")
}
