//! Core domain types for tic-tac-toe.

use super::action::MoveError;
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Number of cells on the board.
pub const BOARD_SIZE: usize = 9;

/// Player symbol placed on the board.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
pub enum Player {
    /// Player X (goes first).
    X,
    /// Player O (goes second).
    O,
}

impl Player {
    /// Returns the opponent player.
    pub fn opponent(self) -> Self {
        match self {
            Player::X => Player::O,
            Player::O => Player::X,
        }
    }
}

/// A square on the tic-tac-toe board.
///
/// Serialized as `null`, `"X"` or `"O"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Option<Player>", into = "Option<Player>")]
pub enum Square {
    /// Empty square.
    #[default]
    Empty,
    /// Square occupied by a player.
    Occupied(Player),
}

impl Square {
    /// Returns the occupying player, if any.
    pub fn player(self) -> Option<Player> {
        match self {
            Square::Empty => None,
            Square::Occupied(player) => Some(player),
        }
    }
}

impl From<Option<Player>> for Square {
    fn from(value: Option<Player>) -> Self {
        value.map_or(Square::Empty, Square::Occupied)
    }
}

impl From<Square> for Option<Player> {
    fn from(square: Square) -> Self {
        square.player()
    }
}

/// 3x3 tic-tac-toe board.
///
/// Positions are `0..=8` in row-major order: position `p` sits at row
/// `p / 3`, column `p % 3`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Board {
    squares: [Square; BOARD_SIZE],
}

impl Board {
    /// Creates a new empty board.
    pub fn new() -> Self {
        Self {
            squares: [Square::Empty; BOARD_SIZE],
        }
    }

    /// Creates a board from explicit squares.
    ///
    /// No balance check is made here; see the invariants module for that.
    pub fn from_squares(squares: [Square; BOARD_SIZE]) -> Self {
        Self { squares }
    }

    /// Returns the square at the given position.
    ///
    /// # Errors
    ///
    /// Returns [`MoveError::OutOfRange`] if `pos` is not in `0..=8`.
    pub fn cell_at(&self, pos: usize) -> Result<Square, MoveError> {
        self.squares
            .get(pos)
            .copied()
            .ok_or(MoveError::OutOfRange(pos))
    }

    /// Checks if the square at `pos` is empty.
    ///
    /// # Errors
    ///
    /// Returns [`MoveError::OutOfRange`] if `pos` is not in `0..=8`.
    pub fn is_empty(&self, pos: usize) -> Result<bool, MoveError> {
        Ok(self.cell_at(pos)? == Square::Empty)
    }

    /// Checks if every square is occupied.
    pub fn is_full(&self) -> bool {
        self.squares.iter().all(|s| *s != Square::Empty)
    }

    /// Positions that are still empty, in ascending order.
    #[instrument(skip(self))]
    pub fn available_positions(&self) -> Vec<usize> {
        self.squares
            .iter()
            .enumerate()
            .filter(|(_, s)| **s == Square::Empty)
            .map(|(pos, _)| pos)
            .collect()
    }

    /// Number of squares held by `player`.
    pub fn count(&self, player: Player) -> usize {
        self.squares
            .iter()
            .filter(|s| **s == Square::Occupied(player))
            .count()
    }

    /// Number of occupied squares.
    pub fn occupied(&self) -> usize {
        self.squares.iter().filter(|s| **s != Square::Empty).count()
    }

    /// Returns all squares as a slice.
    pub fn squares(&self) -> &[Square; BOARD_SIZE] {
        &self.squares
    }

    /// Sets the square at the given position.
    pub(crate) fn set(&mut self, pos: usize, square: Square) -> Result<(), MoveError> {
        let slot = self
            .squares
            .get_mut(pos)
            .ok_or(MoveError::OutOfRange(pos))?;
        *slot = square;
        Ok(())
    }

    /// Formats the board as a human-readable string.
    ///
    /// Empty squares show their position index.
    pub fn display(&self) -> String {
        let mut result = String::new();
        for row in 0..3 {
            for col in 0..3 {
                let pos = row * 3 + col;
                let symbol = match self.squares[pos] {
                    Square::Empty => pos.to_string(),
                    Square::Occupied(player) => player.to_string(),
                };
                result.push_str(&symbol);
                if col < 2 {
                    result.push('|');
                }
            }
            if row < 2 {
                result.push_str("\n-+-+-\n");
            }
        }
        result
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.display())
    }
}

/// Lifecycle status of a game session.
///
/// `Waiting` and `InProgress` accept moves; `Finished` and `Draw` are terminal.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum GameStatus {
    /// Created, no moves yet.
    #[default]
    Waiting,
    /// At least one move played, no outcome yet.
    InProgress,
    /// Someone completed a line.
    Finished,
    /// Board full with no line.
    Draw,
}

impl GameStatus {
    /// Returns true for `Finished` and `Draw`.
    pub fn is_terminal(self) -> bool {
        matches!(self, GameStatus::Finished | GameStatus::Draw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_cell_at_out_of_range() {
        let board = Board::new();
        assert_eq!(board.cell_at(9), Err(MoveError::OutOfRange(9)));
        assert_eq!(board.is_empty(42), Err(MoveError::OutOfRange(42)));
    }

    #[test]
    fn test_row_major_layout() {
        let mut board = Board::new();
        board.set(5, Square::Occupied(Player::O)).unwrap();
        assert_eq!(board.display(), "0|1|2\n-+-+-\n3|4|O\n-+-+-\n6|7|8");
    }

    #[test]
    fn test_available_positions_skips_occupied() {
        let mut board = Board::new();
        board.set(0, Square::Occupied(Player::X)).unwrap();
        board.set(4, Square::Occupied(Player::O)).unwrap();
        assert_eq!(board.available_positions(), vec![1, 2, 3, 5, 6, 7, 8]);
        assert_eq!(board.count(Player::X), 1);
        assert_eq!(board.occupied(), 2);
    }

    #[test]
    fn test_board_serializes_as_nullable_symbols() {
        let mut board = Board::new();
        board.set(0, Square::Occupied(Player::X)).unwrap();
        board.set(8, Square::Occupied(Player::O)).unwrap();
        let json = serde_json::to_string(&board).unwrap();
        assert_eq!(json, r#"["X",null,null,null,null,null,null,null,"O"]"#);
    }

    #[test]
    fn test_board_rejects_wrong_length_and_symbols() {
        assert!(serde_json::from_str::<Board>(r#"[null,null,null]"#).is_err());
        assert!(
            serde_json::from_str::<Board>(r#"["Z",null,null,null,null,null,null,null,null]"#)
                .is_err()
        );
    }

    #[test]
    fn test_status_strings() {
        assert_eq!(GameStatus::InProgress.to_string(), "in_progress");
        assert_eq!(GameStatus::from_str("draw"), Ok(GameStatus::Draw));
        assert!(GameStatus::from_str("abandoned").is_err());
        assert_eq!(
            serde_json::to_string(&GameStatus::Waiting).unwrap(),
            r#""waiting""#
        );
        assert!(GameStatus::Draw.is_terminal());
        assert!(!GameStatus::Waiting.is_terminal());
    }
}
