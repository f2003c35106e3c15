//! Command-line interface for the tic-tac-toe server.

use tictactoe_server::StorageKind;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Tic-Tac-Toe - two-player game server with persisted sessions
#[derive(Parser, Debug)]
#[command(name = "tictactoe_server")]
#[command(about = "Tic-tac-toe game server with REST API", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP game server
    Serve {
        /// Path to a TOML config file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(short, long)]
        port: Option<u16>,

        /// Storage backend
        #[arg(long, value_enum)]
        storage: Option<StorageKind>,

        /// Path to the database file (created if it doesn't exist)
        #[arg(long)]
        db_path: Option<String>,
    },

    /// Apply pending database migrations
    Migrate {
        /// Path to the database file
        #[arg(long, env = "DATABASE_URL", default_value = "tictactoe.db")]
        db_path: String,
    },

    /// Print the board and status of a stored game
    Show {
        /// Game id
        game_id: uuid::Uuid,

        /// Path to the database file
        #[arg(long, env = "DATABASE_URL", default_value = "tictactoe.db")]
        db_path: String,
    },
}
