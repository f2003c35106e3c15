//! Win detection logic for tic-tac-toe.

use super::super::{Board, Player, Square};
use tracing::instrument;

/// A line of three board indices.
pub type Line = [usize; 3];

/// The eight winning lines: rows, then columns, then diagonals.
pub const WINNING_LINES: [Line; 8] = [
    // Rows
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    // Columns
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    // Diagonals
    [0, 4, 8],
    [2, 4, 6],
];

/// Finds the first completed line and who completed it.
///
/// Lines are checked in [`WINNING_LINES`] order.
#[instrument(skip(board))]
pub fn winning_line(board: &Board) -> Option<(Player, Line)> {
    let squares = board.squares();
    WINNING_LINES.iter().find_map(|&[a, b, c]| {
        let sq = squares[a];
        match sq {
            Square::Occupied(player) if sq == squares[b] && sq == squares[c] => {
                Some((player, [a, b, c]))
            }
            _ => None,
        }
    })
}

/// Checks if there is a winner on the board.
///
/// Returns `Some(player)` if the player has three in a row,
/// `None` otherwise.
pub fn check_winner(board: &Board) -> Option<Player> {
    winning_line(board).map(|(player, _)| player)
}
