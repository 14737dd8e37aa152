use clap::Parser;
use log::{error, info};
use pollz::commands::Cli;
use pollz::db::SqliteStore;
use pollz::models::sample_polls;
use pollz::render::TerminalRenderer;
use pollz::{handlers, Config, HttpPollSync, PollCache, VoteCoordinator, VoteLedger};
use std::process::ExitCode;
use std::sync::Arc;

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    dotenvy::dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = Config::load()?;

    // Local storage standing in for the browser's
    let store = Arc::new(SqliteStore::open(&config.database_url).await?);
    let ledger = VoteLedger::new(store.clone(), config.storage_prefix.clone());
    let sync = Arc::new(HttpPollSync::new(&config.api_base, config.http_timeout)?);
    let renderer = Arc::new(TerminalRenderer {
        show_pending: cli.show_pending,
    });

    // The feed always starts with the samples; commands decide what gets printed
    let mut cache = PollCache::new();
    for poll in sample_polls() {
        cache.upsert(poll);
    }

    let coordinator = Arc::new(VoteCoordinator::new(sync, ledger, cache, renderer));
    info!("Using poll store at {}", config.api_base);

    let result = handlers::handle_command(coordinator, cli.command, config.refresh_interval).await;
    store.close().await;
    result
}
