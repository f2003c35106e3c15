//! History consistency invariant: history length matches occupied squares.

use super::super::GameSession;
use super::Invariant;

/// Invariant: every move in history corresponds to exactly one occupied
/// square.
pub struct HistoryConsistentInvariant;

impl Invariant<GameSession> for HistoryConsistentInvariant {
    fn holds(session: &GameSession) -> bool {
        session.moves().len() == session.board().occupied()
    }

    fn description() -> &'static str {
        "History length matches number of occupied squares"
    }
}
