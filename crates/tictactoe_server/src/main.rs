//! Tic-tac-toe server - unified CLI
//!
//! Serves the REST API, migrates the database, or prints a stored game.

#![warn(missing_docs)]

mod cli;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command};
use tictactoe_server::{
    GameRepository, GameService, MemoryStore, ServerConfig, SessionStore, StorageKind,
    create_router,
};
use tracing::{info, instrument};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tictactoe_server=debug")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve {
            config,
            host,
            port,
            storage,
            db_path,
        } => {
            let base = match config {
                Some(path) => ServerConfig::from_file(path)?,
                None => ServerConfig::default(),
            };
            let config = base
                .with_env()?
                .with_overrides(host, port, storage, db_path);
            run_server(config).await
        }
        Command::Migrate { db_path } => run_migrations(db_path),
        Command::Show { game_id, db_path } => show_game(game_id, db_path),
    }
}

/// Run the HTTP game server
#[instrument(skip(config), fields(bind = %config.bind_address(), storage = %config.storage()))]
async fn run_server(config: ServerConfig) -> Result<()> {
    let store: Arc<dyn SessionStore> = match config.storage() {
        StorageKind::Memory => Arc::new(MemoryStore::new()),
        StorageKind::Sqlite => Arc::new(GameRepository::open(config.database_path().clone())?),
    };
    let app = create_router(GameService::new(store));

    let listener = tokio::net::TcpListener::bind(config.bind_address())
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_address()))?;
    info!(addr = %listener.local_addr()?, "Tic-tac-toe server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

/// Apply pending database migrations
#[instrument]
fn run_migrations(db_path: String) -> Result<()> {
    GameRepository::open(db_path)?;
    info!("Database is up to date");
    Ok(())
}

/// Print a stored game
#[instrument]
fn show_game(game_id: uuid::Uuid, db_path: String) -> Result<()> {
    let repo = GameRepository::open(db_path)?;
    let game = repo
        .get_game(game_id)?
        .with_context(|| format!("Game {} not found", game_id))?;
    println!("{}", game.report());
    Ok(())
}
