//! Monotonic board invariant: squares never change once set.

use super::super::{Board, GameSession, Square};
use super::Invariant;

/// Invariant: replaying the move log onto an empty board reproduces the
/// current board, and no move lands on an occupied square.
pub struct MonotonicBoardInvariant;

impl Invariant<GameSession> for MonotonicBoardInvariant {
    fn holds(session: &GameSession) -> bool {
        let mut reconstructed = Board::new();

        for mov in session.moves() {
            if reconstructed.cell_at(mov.position()) != Ok(Square::Empty) {
                return false;
            }
            if reconstructed
                .set(mov.position(), Square::Occupied(mov.symbol()))
                .is_err()
            {
                return false;
            }
        }

        reconstructed == *session.board()
    }

    fn description() -> &'static str {
        "Replaying the move log reproduces the board"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Move, Player};

    #[test]
    fn test_empty_game_holds() {
        assert!(MonotonicBoardInvariant::holds(&GameSession::new()));
    }

    #[test]
    fn test_multiple_moves_hold() {
        let mut session = GameSession::new();
        for (pos, player) in [(0, Player::X), (4, Player::O), (2, Player::X), (6, Player::O)] {
            session.apply_move(pos, player).unwrap();
        }
        assert!(MonotonicBoardInvariant::holds(&session));
    }

    #[test]
    fn test_overwritten_square_violates() {
        let mut session = GameSession::new();
        session.apply_move(4, Player::X).unwrap();
        session.board.set(4, Square::Occupied(Player::O)).unwrap();
        assert!(!MonotonicBoardInvariant::holds(&session));
    }

    #[test]
    fn test_duplicate_position_in_log_violates() {
        let mut session = GameSession::new();
        session.apply_move(4, Player::X).unwrap();
        session.moves.push(Move::new(4, Player::O, 2));
        assert!(!MonotonicBoardInvariant::holds(&session));
    }
}
