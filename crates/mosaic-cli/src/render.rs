//! Terminal rendering of reconciled messages.

use colored::Colorize;
use mosaic_core::message::{Message, MessageRole};
use mosaic_core::session::{ComposerState, RuntimeStatus, SessionLifecycle};

const COLLAPSED_PREVIEW_CHARS: usize = 80;

pub fn print_message(message: &Message, collapsed: bool) {
    let author = match message.role {
        MessageRole::User => "you".bright_green().bold(),
        MessageRole::Assistant => "assistant".bright_blue().bold(),
        MessageRole::System => "system".bright_black().bold(),
    };
    let header = format!("#{} {}", message.sequence, message.kind);
    println!("{} {}", author, header.bright_black());

    let preview = message.body.preview();
    if collapsed {
        println!("  {}", truncate(&preview, COLLAPSED_PREVIEW_CHARS).bright_black());
        return;
    }
    for line in preview.lines() {
        println!("  {line}");
    }
}

pub fn composer_label(state: ComposerState) -> colored::ColoredString {
    match state {
        ComposerState::Ready => "ready".bright_green(),
        ComposerState::Busy => "busy".bright_yellow(),
        ComposerState::Closed => "closed".bright_black(),
    }
}

pub fn runtime_label(status: RuntimeStatus) -> colored::ColoredString {
    match status {
        RuntimeStatus::Idle => "idle".green(),
        RuntimeStatus::Busy => "busy".yellow(),
    }
}

pub fn lifecycle_label(lifecycle: SessionLifecycle) -> colored::ColoredString {
    match lifecycle {
        SessionLifecycle::Active => "active".green(),
        SessionLifecycle::Closed => "closed".bright_black(),
        SessionLifecycle::Archived => "archived".bright_black(),
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    let first_line = text.lines().next().unwrap_or_default();
    let mut out: String = first_line.chars().take(max_chars).collect();
    let cut = first_line.chars().nth(max_chars).is_some() || text.lines().nth(1).is_some();
    if cut {
        out.push('…');
    }
    out
}
