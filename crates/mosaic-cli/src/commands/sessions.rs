use super::Context;
use crate::render;
use anyhow::{Context as _, Result};
use colored::Colorize;

pub async fn run(ctx: &Context, scope: &str, node: &str) -> Result<()> {
    let sessions = ctx
        .client
        .list_sessions(scope, node)
        .await
        .with_context(|| format!("Failed to list sessions of {scope}/{node}"))?;

    if sessions.is_empty() {
        println!("{}", "No sessions".bright_black());
    }
    for session in &sessions {
        println!(
            "{}  {:<8} {:<8} {}",
            session.id.bold(),
            render::lifecycle_label(session.lifecycle),
            render::runtime_label(session.runtime),
            session.title
        );
    }
    Ok(())
}
