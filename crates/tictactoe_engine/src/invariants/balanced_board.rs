//! Balanced board invariant: X is never behind O, and at most one ahead.

use super::super::{GameSession, Player};
use super::Invariant;
use tracing::warn;

/// Invariant: `count(X)` is `count(O)` or `count(O) + 1`.
pub struct BalancedBoardInvariant;

impl Invariant<GameSession> for BalancedBoardInvariant {
    fn holds(session: &GameSession) -> bool {
        let x_count = session.board().count(Player::X);
        let o_count = session.board().count(Player::O);

        let valid = x_count == o_count || x_count == o_count + 1;
        if !valid {
            warn!(x_count, o_count, "Board balance violated");
        }
        valid
    }

    fn description() -> &'static str {
        "X count equals O count or exceeds it by one"
    }
}
