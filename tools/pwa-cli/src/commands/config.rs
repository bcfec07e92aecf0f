//! Configuration commands.

use anyhow::{Context as _, Result};

use super::{ConfigArgs, ConfigCommand};
use crate::context::Context;

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Check => check_config(ctx).await,
        ConfigCommand::Show { toml } => show_config(toml, ctx).await,
    }
}

async fn check_config(ctx: &Context) -> Result<()> {
    let source = match &ctx.config_path {
        Some(path) => path.display().to_string(),
        None => "built-in defaults".to_string(),
    };
    ctx.output.debug(&format!("Checking {}", source));

    ctx.config.validate().context("Configuration is invalid")?;

    if ctx.output.is_json() {
        ctx.output.json(&serde_json::json!({
            "valid": true,
            "source": source,
            "cache_version": ctx.config.worker.cache_version.to_string(),
        }));
        return Ok(());
    }

    ctx.output.success(&format!("Configuration is valid ({})", source));
    ctx.output.kv("cache_version", &ctx.config.worker.cache_version.to_string());
    ctx.output.kv(
        "shell_resources",
        &ctx.config.worker.shell_resources.len().to_string(),
    );

    if !ctx.config.worker.shell_resources.iter().any(|path| path == "/") {
        ctx.output
            .warn("\"/\" is not precached; offline navigations fall back to the offline page");
    }

    Ok(())
}

async fn show_config(as_toml: bool, ctx: &Context) -> Result<()> {
    if ctx.output.is_json() {
        ctx.output.json(&ctx.config);
        return Ok(());
    }

    if as_toml {
        let text = ctx
            .config
            .to_toml_string()
            .context("Failed to serialize configuration")?;
        println!("{}", text);
        return Ok(());
    }

    let worker = &ctx.config.worker;
    let push = &ctx.config.push;

    ctx.output.header("Current Configuration");

    ctx.output.info("[worker]");
    ctx.output.kv("cache_version", &worker.cache_version.to_string());
    ctx.output.kv("offline_page.title", &worker.offline_page.title);

    ctx.output.info("shell_resources:");
    for path in &worker.shell_resources {
        ctx.output.list_item(path);
    }
    ctx.output.info("navigation_fallbacks:");
    for path in &worker.navigation_fallbacks {
        ctx.output.list_item(path);
    }
    ctx.output.info("excluded_prefixes:");
    for prefix in &worker.excluded_prefixes {
        ctx.output.list_item(prefix);
    }

    ctx.output.info("[worker.notifications]");
    ctx.output.kv("title", &worker.notifications.title);
    ctx.output.kv("url", &worker.notifications.url);
    ctx.output.kv(
        "require_interaction",
        &worker.notifications.require_interaction.to_string(),
    );

    ctx.output.info("[push]");
    ctx.output.kv("public_key_endpoint", &push.public_key_endpoint);
    ctx.output.kv("subscribe_endpoint", &push.subscribe_endpoint);
    ctx.output.kv("unsubscribe_endpoint", &push.unsubscribe_endpoint);
    ctx.output.kv("user_visible_only", &push.user_visible_only.to_string());
    ctx.output.kv("verify_rekey_key", &push.verify_rekey_key.to_string());

    Ok(())
}
