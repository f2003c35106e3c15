//! Serializable session state for persistence and transport.
//!
//! A [`GameSession`] cannot be deserialized directly: incoming state is
//! untrusted and goes through [`TryFrom<SessionState>`], which replays the
//! move log and cross-checks every stored field against the result.

use super::action::{Move, MoveError};
use super::rules::Line;
use super::session::GameSession;
use super::types::{Board, GameStatus, Player};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

/// Stable wire form of a session.
///
/// ```json
/// { "board": [null, "X", ...], "current_turn": "O", "status": "in_progress",
///   "winner": null, "moves": [{"position": 1, "symbol": "X", "sequence_index": 1}] }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    /// Nine cells, row-major.
    pub board: Board,
    /// Symbol to move next.
    pub current_turn: Player,
    /// Lifecycle status.
    pub status: GameStatus,
    /// Winner, if finished.
    pub winner: Option<Player>,
    /// Ordered move log.
    pub moves: Vec<Move>,
    /// Completed line, if finished.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winning_line: Option<Line>,
    /// When the game reached a terminal status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

/// Why a stored state could not be turned back into a session.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum StateError {
    /// The text was not a valid state document.
    #[display("Malformed session state: {}", _0)]
    Malformed(#[error(not(source))] String),

    /// The move log itself is illegal.
    #[display("Move log cannot be replayed: {}", _0)]
    #[from]
    Replay(MoveError),

    /// A stored field disagrees with what the move log produces.
    #[display("Stored {} does not match the move log", _0)]
    Mismatch(#[error(not(source))] &'static str),

    /// Symbol counts on the board are out of balance.
    #[display("Board is unbalanced: {} X against {} O", x_count, o_count)]
    Unbalanced {
        /// Number of X cells.
        x_count: usize,
        /// Number of O cells.
        o_count: usize,
    },
}

impl From<&GameSession> for SessionState {
    fn from(session: &GameSession) -> Self {
        Self {
            board: session.board().clone(),
            current_turn: session.current_turn(),
            status: session.status(),
            winner: session.winner(),
            moves: session.moves().to_vec(),
            winning_line: session.winning_line(),
            finished_at: session.finished_at(),
        }
    }
}

impl From<GameSession> for SessionState {
    fn from(session: GameSession) -> Self {
        Self::from(&session)
    }
}

impl TryFrom<SessionState> for GameSession {
    type Error = StateError;

    #[instrument(skip(state), fields(status = %state.status, moves = state.moves.len()))]
    fn try_from(state: SessionState) -> Result<Self, Self::Error> {
        let x_count = state.board.count(Player::X);
        let o_count = state.board.count(Player::O);
        if x_count != o_count && x_count != o_count + 1 {
            warn!(x_count, o_count, "Rejecting unbalanced board");
            return Err(StateError::Unbalanced { x_count, o_count });
        }

        let mut session = GameSession::replay(&state.moves).inspect_err(|e| {
            warn!(error = %e, "Rejecting unreplayable move log");
        })?;

        let checks: [(&'static str, bool); 5] = [
            ("board", session.board() == &state.board),
            ("status", session.status() == state.status),
            ("winner", session.winner() == state.winner),
            ("current_turn", session.current_turn() == state.current_turn),
            (
                "winning_line",
                state.winning_line.is_none() || session.winning_line() == state.winning_line,
            ),
        ];
        if let Some(&(field, _)) = checks.iter().find(|(_, ok)| !ok) {
            warn!(field, "Rejecting inconsistent session state");
            return Err(StateError::Mismatch(field));
        }

        if state.finished_at.is_some() && !session.is_over() {
            return Err(StateError::Mismatch("finished_at"));
        }
        session.finished_at = state.finished_at;

        debug!("Session state restored");
        Ok(session)
    }
}

impl SessionState {
    /// Serializes to JSON.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::Malformed`] if serialization fails.
    pub fn to_json(&self) -> Result<String, StateError> {
        serde_json::to_string(self).map_err(|e| StateError::Malformed(e.to_string()))
    }

    /// Parses JSON and validates it into a session.
    ///
    /// # Errors
    ///
    /// Returns [`StateError`] if the document is malformed or inconsistent.
    pub fn session_from_json(json: &str) -> Result<GameSession, StateError> {
        let state: SessionState =
            serde_json::from_str(json).map_err(|e| StateError::Malformed(e.to_string()))?;
        GameSession::try_from(state)
    }
}
