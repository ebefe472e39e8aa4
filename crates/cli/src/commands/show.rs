//! Show a single save slot command

use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use save_runtime::pipeline::read_header;
use save_runtime::{BlobPath, SaveStorage};

use super::{SaveContext, format_play_time};

/// Show one slot's header and fragments
#[derive(Parser, Debug)]
pub struct Show {
    /// Slot index
    pub slot: u32,
}

impl Show {
    pub async fn execute(self, ctx: &SaveContext) -> Result<()> {
        ctx.check_slot(self.slot)?;

        let Some(header) = read_header(ctx.storage.as_ref(), self.slot).await else {
            println!(
                "{} Slot {} has no readable header",
                style("✗").red().bold(),
                style(self.slot).cyan()
            );
            return Ok(());
        };

        println!(
            "{} {}",
            style(format!("Slot {}", header.slot_index)).cyan().bold(),
            style(&header.slot_name).bold()
        );
        println!("  Saved:    {}", header.saved_at.format("%Y-%m-%d %H:%M:%S UTC"));
        println!("  Playtime: {}", format_play_time(header.play_time));
        println!();

        let mut fragments = ctx
            .storage
            .list_fragments(self.slot)
            .await
            .with_context(|| format!("Failed to list fragments of slot {}", self.slot))?;
        fragments.sort();

        if fragments.is_empty() {
            println!("  {}", style("No fragments").dim());
            return Ok(());
        }

        println!("  {}", style("Fragments").bold());
        for name in fragments {
            let size = ctx
                .storage
                .read_blob(&BlobPath::fragment(self.slot, name.clone()))
                .await?
                .map(|bytes| bytes.len());
            match size {
                Some(size) => println!("    {:<24} {} bytes", name, size),
                None => println!("    {:<24} {}", name, style("missing").red()),
            }
        }

        Ok(())
    }
}
