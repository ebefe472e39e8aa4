//! User settings command

use anyhow::Result;
use clap::Parser;
use console::style;

use super::SaveContext;

/// Show or change user settings
#[derive(Parser, Debug)]
pub struct Settings {
    /// Remember this slot as the last selected one
    #[arg(long)]
    pub last_slot: Option<u32>,

    /// Load the last selected slot on startup
    #[arg(long)]
    pub auto_load: Option<bool>,
}

impl Settings {
    pub async fn execute(self, ctx: &SaveContext) -> Result<()> {
        if let Some(slot) = self.last_slot {
            ctx.check_slot(slot)?;
            ctx.handle.set_last_selected_save_slot(slot).await?;
        }
        if let Some(enabled) = self.auto_load {
            ctx.handle.set_should_auto_load_last_save(enabled).await?;
        }

        let settings = ctx.handle.user_settings().await?;
        println!("{}", style("User Settings").cyan().bold());
        println!("  last selected slot: {}", settings.last_selected_slot);
        println!("  auto-load on start: {}", settings.auto_load_last_save);

        Ok(())
    }
}
