use super::{Context, SessionTarget};
use crate::render;
use anyhow::Result;
use colored::Colorize;
use mosaic_application::ChatSurface;
use mosaic_core::bus::EventBus;
use mosaic_core::feed::{FeedHub, LiveFeed, LiveHandler, LiveItem};
use mosaic_core::reconcile::LoadOutcome;
use mosaic_infrastructure::WsLiveTransport;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

/// Follows one session: prints its history, then every reconciled change.
pub async fn run(ctx: &Context, target: &SessionTarget) -> Result<()> {
    let key = target.key();
    let hub = FeedHub::new();
    let bus = EventBus::new();
    let mut transport =
        WsLiveTransport::connect(&ctx.config.server.ws_url, hub.clone(), bus.clone()).await?;

    let surface = ChatSurface::new(ctx.loader(), Arc::new(hub.clone()), ctx.client.clone());
    if let LoadOutcome::Failed(e) = surface.select(key.clone()).await {
        eprintln!("{}", format!("History unavailable: {e}").red());
    }

    let mut printed = HashSet::new();
    print_new(&surface, &mut printed);
    println!(
        "{}",
        format!("--- following {key} (Ctrl-C to stop) ---").bright_magenta()
    );

    // Registered after the surface, so it fires once the surface has merged.
    let changed = Arc::new(Notify::new());
    let wake: LiveHandler = {
        let changed = changed.clone();
        Arc::new(move |_item: LiveItem| changed.notify_one())
    };
    let _wake = hub.subscribe(&key.session_id, wake);

    let mut composer = surface.watch_composer();
    let mut others = bus.runtime_status.subscribe();
    // Gap reloads complete outside the feed callback.
    let mut tick = tokio::time::interval(Duration::from_secs(1));

    loop {
        tokio::select! {
            _ = changed.notified() => print_new(&surface, &mut printed),
            _ = tick.tick() => print_new(&surface, &mut printed),
            Ok(()) = composer.changed() => {
                let state = *composer.borrow_and_update();
                println!("{} {}", "composer:".bright_black(), render::composer_label(state));
            }
            Ok(event) = others.recv() => {
                if event.session_id != key.session_id {
                    println!(
                        "{}",
                        format!("[{}] runtime {}", event.session_id, render::runtime_label(event.status))
                            .bright_black()
                    );
                }
            }
            _ = tokio::signal::ctrl_c() => break,
            _ = transport.closed() => {
                println!("{}", "Connection closed".bright_yellow());
                break;
            }
        }
    }

    surface.close();
    Ok(())
}

fn print_new(surface: &ChatSurface, printed: &mut HashSet<String>) {
    for message in surface.messages() {
        if printed.insert(message.id.clone()) {
            render::print_message(&message, surface.is_collapsed(&message.id));
        }
    }
}
