//! Game rules for tic-tac-toe.
//!
//! Pure functions over a [`Board`]. The outcome of a position depends on the
//! board alone, never on history or whose turn it is.

pub mod draw;
pub mod win;

pub use draw::{is_draw, is_full};
pub use win::{Line, WINNING_LINES, check_winner, winning_line};

use super::{Board, Player};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Result of inspecting a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    /// Game can continue.
    NoOutcome,
    /// `symbol` holds all three cells of `line`.
    Win {
        /// The winning symbol.
        symbol: Player,
        /// The completed line.
        line: Line,
    },
    /// Board is full and nobody won.
    Draw,
}

impl Outcome {
    /// Returns the winner if there is one.
    pub fn winner(&self) -> Option<Player> {
        match self {
            Outcome::Win { symbol, .. } => Some(*symbol),
            _ => None,
        }
    }

    /// Returns the winning line if there is one.
    pub fn line(&self) -> Option<Line> {
        match self {
            Outcome::Win { line, .. } => Some(*line),
            _ => None,
        }
    }

    /// True for `Win` and `Draw`.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Outcome::NoOutcome)
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::NoOutcome => write!(f, "No outcome"),
            Outcome::Win { symbol, line } => write!(f, "Player {} wins on {:?}", symbol, line),
            Outcome::Draw => write!(f, "Draw"),
        }
    }
}

/// Inspects the board for a win or a draw.
#[instrument(skip(board))]
pub fn detect(board: &Board) -> Outcome {
    let outcome = match winning_line(board) {
        Some((symbol, line)) => Outcome::Win { symbol, line },
        None if board.is_full() => Outcome::Draw,
        None => Outcome::NoOutcome,
    };
    debug!(%outcome, "Outcome detected");
    outcome
}
