//! Terminal front-end for the hosted to-do list service
//!
//! Every invocation restores the saved session, runs one command, and
//! prints the notifications the stores emitted along the way.

mod commands;
mod forms;
mod render;

use clap::Parser;
use std::path::PathBuf;
use tokio::sync::broadcast::error::TryRecvError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use todo_core::notify::Notification;
use todo_core::{ClientConfig, TodoClient};

use crate::commands::Command;

#[derive(Debug, Parser)]
#[command(name = "todo", version, about = "Manage your tasks from the terminal")]
struct Cli {
    /// Base URL of the task service
    #[arg(long, env = "TODO_API_URL", global = true)]
    api_url: Option<String>,

    /// Where the saved session lives
    #[arg(long, env = "TODO_DATA_DIR", global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so command output stays clean
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "todo_cli=info,todo_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = ClientConfig::from_env()?;
    if let Some(url) = cli.api_url {
        config = config.with_base_url(url);
    }
    if let Some(dir) = cli.data_dir {
        config = config.with_data_dir(dir);
    }
    tracing::debug!("Using service {} and data directory {:?}", config.base_url, config.data_dir);

    let client = TodoClient::from_config(&config).await?;
    let mut notes = client.subscribe();

    client.restore().await;
    let outcome = commands::run(cli.command, &client).await;

    loop {
        match notes.try_recv() {
            Ok(note) => print_notification(&note),
            Err(TryRecvError::Lagged(skipped)) => {
                tracing::warn!("Skipped {} notifications", skipped);
            }
            Err(_) => break,
        }
    }

    outcome
}

fn print_notification(note: &Notification) {
    eprintln!("{}", render::notification_line(note));
}
