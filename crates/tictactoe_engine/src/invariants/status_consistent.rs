//! Status consistency invariant: the lifecycle status agrees with the board.

use super::super::rules::{self, Outcome};
use super::super::{GameSession, GameStatus};
use super::Invariant;

/// Invariant: `Finished` iff a line is complete (with matching winner and
/// line), `Draw` iff the board is full without a line, `Waiting` iff no
/// move has been played, `InProgress` otherwise.
pub struct StatusConsistentInvariant;

impl Invariant<GameSession> for StatusConsistentInvariant {
    fn holds(session: &GameSession) -> bool {
        match rules::detect(session.board()) {
            Outcome::Win { symbol, line } => {
                session.status() == GameStatus::Finished
                    && session.winner() == Some(symbol)
                    && session.winning_line() == Some(line)
            }
            Outcome::Draw => session.status() == GameStatus::Draw && session.winner().is_none(),
            Outcome::NoOutcome => {
                let expected = if session.moves().is_empty() {
                    GameStatus::Waiting
                } else {
                    GameStatus::InProgress
                };
                session.status() == expected
                    && session.winner().is_none()
                    && session.winning_line().is_none()
            }
        }
    }

    fn description() -> &'static str {
        "Status, winner and winning line agree with the board"
    }
}
