use super::{Context, SessionTarget};
use anyhow::{Result, bail};
use colored::Colorize;
use mosaic_application::ChatSurface;
use mosaic_core::feed::FeedHub;
use mosaic_core::reconcile::LoadOutcome;
use mosaic_core::session::SessionCommands;
use std::sync::Arc;

/// Sends through a chat surface so the composer rules (closed, busy, empty)
/// apply exactly as in an interactive view.
pub async fn message(ctx: &Context, target: &SessionTarget, text: &str) -> Result<()> {
    let key = target.key();
    let sessions = ctx.client.list_sessions(&key.scope_id, &key.node_id).await?;
    let Some(session) = sessions.iter().find(|s| s.id == key.session_id) else {
        bail!("Session {key} not found");
    };

    let surface = ChatSurface::new(ctx.loader(), Arc::new(FeedHub::new()), ctx.client.clone());
    if let LoadOutcome::Failed(e) = surface.open(session).await {
        tracing::warn!(error = %e, "History unavailable; sending anyway");
    }

    let client_message_id = surface.send(text).await?;
    println!("{} {}", "sent".bright_green(), client_message_id.bright_black());
    surface.close();
    Ok(())
}

pub async fn interrupt(ctx: &Context, target: &SessionTarget) -> Result<()> {
    let key = target.key();
    ctx.client.interrupt(&key).await?;
    println!("{} {}", "interrupt requested for".bright_yellow(), key);
    Ok(())
}
