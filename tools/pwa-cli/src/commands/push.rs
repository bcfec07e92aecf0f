//! Push payload commands.

use anyhow::{Context as _, Result};
use chrono::{DateTime, Utc};
use pwa_core::NotificationDefaults;
use pwa_worker::{NotificationPayload, NotificationRequest};

use super::{PushArgs, PushCommand};
use crate::context::Context;

/// Run the push command.
pub async fn run(args: PushArgs, ctx: &Context) -> Result<()> {
    match args.command {
        PushCommand::Preview { payload, at } => preview(payload, at, ctx).await,
    }
}

async fn preview(payload: Option<String>, at: Option<String>, ctx: &Context) -> Result<()> {
    let data = match payload {
        Some(text) => Some(read_payload(&text, ctx)?),
        None => None,
    };
    let received_at = match at {
        Some(at) => DateTime::parse_from_rfc3339(&at)
            .with_context(|| format!("Invalid timestamp: {}", at))?
            .with_timezone(&Utc),
        None => Utc::now(),
    };

    let notification = build_notification(
        data.as_deref(),
        &ctx.config.worker.notifications,
        received_at,
    );

    if ctx.output.is_json() {
        ctx.output.json(&notification);
        return Ok(());
    }

    let options = &notification.options;
    ctx.output.header(&notification.title);
    ctx.output.kv("body", &options.body);
    ctx.output.kv("url", &options.data.url);
    ctx.output.kv("icon", &options.icon);
    ctx.output.kv("tag", &options.tag);
    ctx.output
        .kv("require_interaction", &options.require_interaction.to_string());
    for action in &options.actions {
        ctx.output
            .list_item(&format!("{} ({})", action.title, action.action));
    }

    Ok(())
}

/// Inline text, or `@path` for a file.
fn read_payload(text: &str, ctx: &Context) -> Result<Vec<u8>> {
    match text.strip_prefix('@') {
        Some(path) => {
            let path = ctx.resolve_path(path);
            std::fs::read(&path)
                .with_context(|| format!("Failed to read payload: {}", path.display()))
        }
        None => Ok(text.as_bytes().to_vec()),
    }
}

/// The notification the worker would show for this payload.
pub fn build_notification(
    data: Option<&[u8]>,
    defaults: &NotificationDefaults,
    received_at: DateTime<Utc>,
) -> NotificationRequest {
    NotificationPayload::parse(data).normalize(defaults, received_at)
}
