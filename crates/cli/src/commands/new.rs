//! Create a new save slot command

use anyhow::Result;
use clap::Parser;
use console::style;
use save_runtime::{Event, Topic};

use super::SaveContext;

/// Create a new named slot
///
/// The slot is created with an empty registry: only the header is written.
#[derive(Parser, Debug)]
pub struct New {
    /// Slot index
    pub slot: u32,

    /// Slot name (usually the character name)
    pub name: String,

    /// Replace an existing slot, deleting everything it held
    #[arg(long)]
    pub force: bool,
}

impl New {
    pub async fn execute(self, ctx: &SaveContext) -> Result<()> {
        ctx.check_slot(self.slot)?;

        if let Some(existing) = ctx.handle.slot_name_by_index(self.slot).await?
            && !self.force
        {
            anyhow::bail!(
                "Slot {} already holds '{}' (use --force to overwrite)",
                self.slot,
                existing
            );
        }

        let mut saves = ctx.handle.subscribe(Topic::Save);
        ctx.handle
            .request_new_game_save(self.slot, self.name.clone())
            .await?;

        let report = loop {
            if let Event::SaveComplete(report) = saves.recv().await? {
                break report;
            }
        };

        if report.success() {
            println!(
                "{} Created slot {} ({})",
                style("✓").green().bold(),
                style(self.slot).cyan(),
                style(&self.name).bold()
            );
        } else {
            for issue in &report.issues {
                eprintln!("  {} {}", style("✗").red(), issue);
            }
            anyhow::bail!("Failed to create slot {}", self.slot);
        }

        Ok(())
    }
}
