//! Alternating turn invariant: players alternate X, O, X, O, ...

use super::super::{GameSession, Player};
use super::Invariant;

/// Invariant: the move log reads X, O, X, O, ... with sequence indices
/// 1, 2, 3, ..., and `current_turn` is X after an even number of moves.
pub struct AlternatingTurnInvariant;

impl Invariant<GameSession> for AlternatingTurnInvariant {
    fn holds(session: &GameSession) -> bool {
        let moves = session.moves();

        let ordered = moves.iter().enumerate().all(|(i, mov)| {
            let expected = if i % 2 == 0 { Player::X } else { Player::O };
            mov.symbol() == expected && mov.sequence_index() as usize == i + 1
        });
        if !ordered {
            return false;
        }

        let expected_next = if moves.len() % 2 == 0 {
            Player::X
        } else {
            Player::O
        };

        session.current_turn() == expected_next
    }

    fn description() -> &'static str {
        "Players alternate turns (X, O, X, O, ...)"
    }
}
