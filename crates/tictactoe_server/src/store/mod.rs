//! Key-value persistence for game sessions.
//!
//! The engine never touches storage. A [`SessionStore`] hands out
//! [`StoredGame`] records keyed by game id; the service turns their
//! [`SessionState`] into a live session, applies a move and saves the result.

mod memory;

pub use memory::MemoryStore;

use crate::db::DbError;
use chrono::{DateTime, Utc};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use tictactoe_engine::{GameSession, GameStatus, Player, Position, SessionState};
use uuid::Uuid;

/// Public identifier of a game.
pub type GameId = Uuid;

/// A persisted game: engine state plus record metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct StoredGame {
    id: GameId,
    player_x: String,
    player_o: Option<String>,
    state: SessionState,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl StoredGame {
    /// Creates a record for a fresh session.
    pub fn new(id: GameId, player_x: String, player_o: Option<String>, now: DateTime<Utc>) -> Self {
        Self {
            id,
            player_x,
            player_o,
            state: SessionState::from(GameSession::new()),
            created_at: now,
            updated_at: now,
        }
    }

    /// Reassembles a record read back from storage.
    pub(crate) fn from_parts(
        id: GameId,
        player_x: String,
        player_o: Option<String>,
        state: SessionState,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            player_x,
            player_o,
            state,
            created_at,
            updated_at,
        }
    }

    /// Replaces the stored state with `session`.
    pub fn update(&mut self, session: &GameSession, now: DateTime<Utc>) {
        self.state = SessionState::from(session);
        self.updated_at = now;
    }

    /// Name of the player holding `symbol`.
    pub fn player_name(&self, symbol: Player) -> Option<&str> {
        match symbol {
            Player::X => Some(self.player_x.as_str()),
            Player::O => self.player_o.as_deref(),
        }
    }

    /// Name of the winning player, once the game is finished.
    pub fn winner_name(&self) -> Option<&str> {
        self.state.winner.and_then(|symbol| self.player_name(symbol))
    }

    /// Lifecycle status of the stored state.
    pub fn status(&self) -> GameStatus {
        self.state.status
    }

    /// Plain-text report: players, board, status, last move and open squares.
    pub fn report(&self) -> String {
        let state = &self.state;
        let mut lines = vec![
            format!("Game {}", self.id),
            format!(
                "X: {}  O: {}",
                self.player_x,
                self.player_o.as_deref().unwrap_or("(open)")
            ),
            state.board.display(),
        ];

        lines.push(match self.winner_name() {
            Some(name) => format!("Status: {} ({} wins)", state.status, name),
            None if state.status.is_terminal() => format!("Status: {}", state.status),
            None => format!("Status: {} ({} to move)", state.status, state.current_turn),
        });

        if let Some(last) = state.moves.last() {
            let square = Position::from_index(last.position())
                .map_or_else(|| last.position().to_string(), |pos| pos.to_string());
            lines.push(format!(
                "Move {}: {} at {}",
                last.sequence_index(),
                last.symbol(),
                square
            ));
        }

        if !state.status.is_terminal() {
            let open: Vec<String> = Position::valid_moves(&state.board)
                .into_iter()
                .map(|pos| format!("{} ({})", pos, pos.to_index()))
                .collect();
            lines.push(format!("Open: {}", open.join(", ")));
        }

        lines.join("\n")
    }
}

/// Listing filter; unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameFilter {
    /// Only games in this status.
    pub status: Option<GameStatus>,
    /// Only games where this name plays either side.
    pub player: Option<String>,
}

impl GameFilter {
    /// Returns true if `game` passes the filter.
    pub fn matches(&self, game: &StoredGame) -> bool {
        let status_ok = self.status.is_none_or(|s| game.status() == s);
        let player_ok = self.player.as_deref().is_none_or(|name| {
            game.player_x() == name || game.player_o().as_deref() == Some(name)
        });
        status_ok && player_ok
    }
}

/// Storage failure.
#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum StoreError {
    /// The database rejected the operation.
    #[display("{}", _0)]
    #[from]
    Db(DbError),
    /// A stored record could not be encoded or decoded.
    #[display("Stored record could not be decoded: {}", _0)]
    Encoding(#[error(not(source))] String),
}

/// Durable home for game records.
///
/// Implementations need not serialize writers; the service holds a
/// per-game lock around every load-modify-save cycle.
pub trait SessionStore: std::fmt::Debug + Send + Sync {
    /// Loads a game, `None` if the id is unknown.
    fn load(&self, id: GameId) -> Result<Option<StoredGame>, StoreError>;

    /// Inserts or replaces a game and its full move log.
    fn save(&self, game: &StoredGame) -> Result<(), StoreError>;

    /// Lists games matching `filter`, newest first.
    fn list(&self, filter: &GameFilter) -> Result<Vec<StoredGame>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_is_waiting() {
        let game = StoredGame::new(Uuid::new_v4(), "alice".into(), None, Utc::now());
        assert_eq!(game.status(), GameStatus::Waiting);
        assert_eq!(game.winner_name(), None);
        assert_eq!(game.player_name(Player::O), None);
    }

    #[test]
    fn test_winner_name_follows_symbol() {
        let mut game = StoredGame::new(Uuid::new_v4(), "alice".into(), Some("bob".into()), Utc::now());
        let mut session = GameSession::new();
        for (pos, player) in [(0, Player::X), (3, Player::O), (1, Player::X), (4, Player::O), (2, Player::X)] {
            session.apply_move(pos, player).unwrap();
        }
        game.update(&session, Utc::now());
        assert_eq!(game.winner_name(), Some("alice"));
    }

    #[test]
    fn test_filter_by_status_and_player() {
        let game = StoredGame::new(Uuid::new_v4(), "alice".into(), Some("bob".into()), Utc::now());
        assert!(GameFilter::default().matches(&game));
        assert!(
            GameFilter {
                status: Some(GameStatus::Waiting),
                player: Some("bob".into())
            }
            .matches(&game)
        );
        assert!(
            !GameFilter {
                status: Some(GameStatus::Draw),
                player: None
            }
            .matches(&game)
        );
        assert!(
            !GameFilter {
                status: None,
                player: Some("carol".into())
            }
            .matches(&game)
        );
    }

    #[test]
    fn test_store_error_wraps_db_error() {
        use std::error::Error;

        let err = StoreError::from(DbError::new("disk full"));
        assert!(matches!(err, StoreError::Db(_)));
        assert!(err.source().is_some());
        assert!(StoreError::Encoding("bad json".into()).source().is_none());
    }

    #[test]
    fn test_report_names_squares() {
        let mut game = StoredGame::new(Uuid::new_v4(), "alice".into(), Some("bob".into()), Utc::now());
        let mut session = GameSession::new();
        session.apply_move(4, Player::X).unwrap();
        game.update(&session, Utc::now());

        let report = game.report();
        assert!(report.contains("Status: in_progress (O to move)"));
        assert!(report.contains("Move 1: X at Center"));
        assert!(report.contains("Open: Top-left (0), Top-center (1)"));
        assert!(!report.contains("Center (4)"));
    }
}
