//! Offline page rendering.

use anyhow::{Context as _, Result};
use pwa_worker::render_offline_page;

use super::OfflinePageArgs;
use crate::context::Context;

/// Run the offline-page command.
pub async fn run(args: OfflinePageArgs, ctx: &Context) -> Result<()> {
    let html = render_offline_page(&ctx.config.worker.offline_page);

    match args.output {
        Some(path) => {
            let path = ctx.resolve_path(&path);
            std::fs::write(&path, &html)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            ctx.output
                .success(&format!("Wrote offline page to {}", path.display()));
        }
        None if ctx.output.is_json() => {
            ctx.output.json(&serde_json::json!({ "html": html }));
        }
        None => println!("{}", html),
    }

    Ok(())
}
