//! Tic-tac-toe server - persisted game sessions over a REST API
//!
//! Wraps the pure [`tictactoe_engine`] with storage and an HTTP surface.
//!
//! # Architecture
//!
//! - **Store**: [`SessionStore`] keyed by game id, in memory or SQLite
//! - **Service**: [`GameService`] runs load → apply → save under a per-game lock
//! - **API**: axum router built by [`create_router`]
//! - **Config**: [`ServerConfig`] from TOML, environment and CLI
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use tictactoe_server::{GameService, MemoryStore, create_router};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let service = GameService::new(Arc::new(MemoryStore::new()));
//! let app = create_router(service);
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod api;
mod config;
mod db;
mod service;
mod store;

// Crate-level exports - HTTP API
pub use api::{
    ApiError, CreateGameRequest, ErrorBody, GameDetail, GameSummary, HealthResponse,
    ListGamesQuery, MoveRequest, MoveResponse, MoveView, create_router,
};

// Crate-level exports - Configuration
pub use config::{ConfigError, ServerConfig, StorageKind, default_database_path};

// Crate-level exports - Database
pub use db::{DbError, GameRepository};

// Crate-level exports - Service
pub use service::{GameService, MoveOutcome, ServiceError};

// Crate-level exports - Storage
pub use store::{GameFilter, GameId, MemoryStore, SessionStore, StoreError, StoredGame};
