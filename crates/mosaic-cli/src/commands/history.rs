use super::{Context, SessionTarget};
use crate::render;
use anyhow::{Context as _, Result};
use colored::Colorize;

pub async fn run(ctx: &Context, target: &SessionTarget, json: bool, expand: bool) -> Result<()> {
    let key = target.key();
    let messages = ctx
        .loader()
        .load(&key)
        .await
        .with_context(|| format!("Failed to load history of {key}"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&messages)?);
        return Ok(());
    }

    if messages.is_empty() {
        println!("{}", "No messages".bright_black());
    }
    for message in &messages {
        render::print_message(message, !expand && message.is_collapsed_by_default());
    }
    Ok(())
}
