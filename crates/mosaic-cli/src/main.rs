use anyhow::Result;
use clap::{Parser, Subcommand};
use mosaic_infrastructure::MosaicConfig;
use std::path::PathBuf;

mod commands;
mod logging;
mod render;

use commands::{Context, SessionTarget};

#[derive(Parser)]
#[command(name = "mosaic")]
#[command(about = "Mosaic CLI - follow and drive node sessions from the terminal", long_about = None)]
struct Cli {
    /// Config file to use instead of ~/.config/mosaic/config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the sessions of a node
    Sessions {
        scope: String,
        node: String,
    },
    /// Print the full history of a session
    History {
        #[command(flatten)]
        target: SessionTarget,
        /// Print decoded messages as JSON
        #[arg(long)]
        json: bool,
        /// Show messages that are collapsed by default in full
        #[arg(long)]
        expand: bool,
    },
    /// Follow a session live
    Tail {
        #[command(flatten)]
        target: SessionTarget,
    },
    /// Send a message to a session
    Send {
        #[command(flatten)]
        target: SessionTarget,
        /// Message text
        #[arg(required = true, trailing_var_arg = true)]
        text: Vec<String>,
    },
    /// Stop the turn currently running in a session
    Interrupt {
        #[command(flatten)]
        target: SessionTarget,
    },
    /// Inspect the client configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Print the config file location
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => MosaicConfig::load_from(path)?,
        None => MosaicConfig::load()?,
    };
    let _log_guard = logging::init(&config.logging)?;

    let ctx = Context::new(config)?;

    match cli.command {
        Commands::Sessions { scope, node } => commands::sessions::run(&ctx, &scope, &node).await?,
        Commands::History {
            target,
            json,
            expand,
        } => commands::history::run(&ctx, &target, json, expand).await?,
        Commands::Tail { target } => commands::tail::run(&ctx, &target).await?,
        Commands::Send { target, text } => {
            commands::send::message(&ctx, &target, &text.join(" ")).await?
        }
        Commands::Interrupt { target } => commands::send::interrupt(&ctx, &target).await?,
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config::show(&ctx.config)?,
            ConfigAction::Path => commands::config::path(cli.config.as_deref())?,
        },
    }

    Ok(())
}
