//! List save slots command

use anyhow::Result;
use clap::Parser;
use console::style;

use super::{SaveContext, format_play_time};

/// List every slot with a readable header
#[derive(Parser, Debug)]
pub struct List {}

impl List {
    pub async fn execute(self, ctx: &SaveContext) -> Result<()> {
        let headers = ctx.handle.all_save_slot_headers().await?;

        if headers.is_empty() {
            println!("{}", style("No save slots found").dim());
            println!("  {}", style(ctx.storage.base_dir().display()).dim());
            return Ok(());
        }

        let settings = ctx.handle.user_settings().await?;

        println!("{}", style("Save Slots").cyan().bold());
        println!("  {}", style(ctx.storage.base_dir().display()).dim());
        println!();
        println!(
            "  {:<6} {:<24} {:<20} {}",
            style("SLOT").bold(),
            style("NAME").bold(),
            style("SAVED (UTC)").bold(),
            style("PLAYTIME").bold()
        );

        for header in headers {
            let marker = if header.slot_index == settings.last_selected_slot {
                style("→").cyan().to_string()
            } else {
                " ".to_string()
            };
            println!(
                "{} {:<6} {:<24} {:<20} {}",
                marker,
                header.slot_index,
                header.slot_name,
                header.saved_at.format("%Y-%m-%d %H:%M:%S"),
                format_play_time(header.play_time)
            );
        }

        Ok(())
    }
}
