//! First-class action types for tic-tac-toe.
//!
//! Moves are domain events, not side effects. A recorded [`Move`] never
//! changes; the session only appends to its log.

use super::types::{GameStatus, Player};
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// A recorded move: a symbol placed at a position.
///
/// `sequence_index` starts at 1 and increases by one per accepted move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    position: usize,
    symbol: Player,
    sequence_index: u32,
}

impl Move {
    /// Creates a new move record.
    #[instrument]
    pub fn new(position: usize, symbol: Player, sequence_index: u32) -> Self {
        Self {
            position,
            symbol,
            sequence_index,
        }
    }

    /// Board position (0-8).
    pub fn position(&self) -> usize {
        self.position
    }

    /// The symbol placed.
    pub fn symbol(&self) -> Player {
        self.symbol
    }

    /// 1-based index of this move within its session.
    pub fn sequence_index(&self) -> u32 {
        self.sequence_index
    }
}

impl std::fmt::Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "#{} {} -> {}",
            self.sequence_index, self.symbol, self.position
        )
    }
}

/// Error that can occur when validating or applying a move.
///
/// Every variant except `InvariantViolation` is an ordinary rejection: the
/// session is left untouched and stays usable.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum MoveError {
    /// Position is not in `0..=8`.
    #[display("Position {} is out of range (must be 0-8)", _0)]
    OutOfRange(usize),

    /// The square at the position is already occupied.
    #[display("Position {} is already occupied", _0)]
    CellOccupied(usize),

    /// The symbol does not match the player whose turn it is.
    #[display("It's not {}'s turn, waiting for {}", got, expected)]
    WrongTurn {
        /// Symbol whose turn it is.
        expected: Player,
        /// Symbol that attempted to move.
        got: Player,
    },

    /// The game has reached a terminal status.
    #[display("Game is already over ({})", _0)]
    GameOver(GameStatus),

    /// An invariant was violated (postcondition failure).
    #[display("Invariant violation: {}", _0)]
    InvariantViolation(String),
}

impl std::error::Error for MoveError {}

impl MoveError {
    /// Short machine-readable kind, stable across releases.
    pub fn kind(&self) -> &'static str {
        match self {
            MoveError::OutOfRange(_) => "out_of_range",
            MoveError::CellOccupied(_) => "cell_occupied",
            MoveError::WrongTurn { .. } => "wrong_turn",
            MoveError::GameOver(_) => "game_over",
            MoveError::InvariantViolation(_) => "invariant_violation",
        }
    }
}
