//! Delete a save slot command
//!
//! Safety: prompts for confirmation unless `-y` is given.

use anyhow::Result;
use clap::Parser;
use console::style;

use super::{SaveContext, confirm};

/// Delete a slot and all of its fragments
#[derive(Parser, Debug)]
pub struct Delete {
    /// Slot index
    pub slot: u32,

    /// Skip confirmation prompt (dangerous!)
    #[arg(short = 'y', long)]
    pub yes: bool,
}

impl Delete {
    pub async fn execute(self, ctx: &SaveContext) -> Result<()> {
        ctx.check_slot(self.slot)?;

        let label = match ctx.handle.slot_name_by_index(self.slot).await? {
            Some(name) => format!("Slot {} ({})", self.slot, name),
            None => format!("Slot {} (no readable header)", self.slot),
        };

        println!("The following will be deleted:");
        println!("  {} {}", style("→").cyan(), style(&label).bold());
        println!();

        if !self.yes && !confirm("Proceed? [y/N]")? {
            println!("{}", style("Cancelled").dim());
            return Ok(());
        }

        if ctx.handle.request_delete_slot(self.slot).await? {
            println!("{} Deleted {}", style("✓").green().bold(), label);
        } else {
            println!("{}", style("Nothing to delete - slot does not exist").dim());
        }

        Ok(())
    }
}
