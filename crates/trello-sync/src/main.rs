mod board;
mod config;
mod crossweb;
mod models;
mod sync;
mod trello;

use std::path::PathBuf;

use anyhow::Result;
use chrono::Local;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::board::{BoardRepository, CardFilter};
use crate::config::Credentials;
use crate::trello::TrelloClient;

#[derive(Parser)]
#[command(name = "trello-sync")]
#[command(about = "Mirror the Crossweb event listing onto a Trello board")]
struct Cli {
    /// City to download events for (ALL fetches every city)
    #[arg(long, default_value = "ALL")]
    city: String,

    /// Board id or shortlink on Trello
    #[arg(long)]
    board: String,

    /// List name on the board
    #[arg(long, default_value = "Wydarzenia")]
    list: String,

    /// Limit of cards created in one run
    #[arg(long, default_value_t = 5)]
    antyflood: u32,

    /// Path to the TOML credentials file
    #[arg(long, default_value = "trello-sync.toml")]
    config: PathBuf,

    /// Only archive past-due cards on this run
    #[arg(long, conflicts_with = "add_only")]
    archive_only: bool,

    /// Only add missing cards on this run
    #[arg(long, conflicts_with = "archive_only")]
    add_only: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "trello_sync=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let credentials = Credentials::obtain(&cli.config)?;
    let trello = TrelloClient::new(credentials)?;

    let board_id = trello.board_id(&cli.board).await?;
    let list_id = sync::ensure_list(&trello, &board_id, &cli.list).await?;
    let now = Local::now().naive_local();

    if !cli.archive_only {
        tracing::info!("Started adding missing cards");
        let listing = crossweb::listing_client()?;
        let events = crossweb::fetch_events(&listing, &cli.city).await?;
        let existing = trello.cards(&list_id, CardFilter::All).await?;
        let stats =
            sync::add_missing_cards(&trello, &list_id, events, &existing, cli.antyflood, now)
                .await?;
        tracing::info!(
            "Added {} cards ({} already tracked, {} stale skipped)",
            stats.created,
            stats.matched,
            stats.skipped_stale
        );
    }

    if !cli.add_only {
        tracing::info!("Archiving past-due cards");
        let open = trello.cards(&list_id, CardFilter::Open).await?;
        let stats = sync::archive_due_cards(&trello, &open, now).await?;
        tracing::info!("Closed {} cards ({} left open)", stats.closed, stats.skipped);
    }

    Ok(())
}
