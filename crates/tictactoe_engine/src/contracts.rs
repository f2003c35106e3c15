//! Contract-based move validation.
//!
//! Contracts define correctness through preconditions and postconditions:
//! `{P} action {Q}`. Preconditions are the move validator and always run;
//! postconditions check the session invariants in debug builds.

use super::action::MoveError;
use super::invariants::{InvariantSet, SessionInvariants};
use super::session::GameSession;
use super::types::{Board, GameStatus, Player, Square};
use tracing::{instrument, warn};

/// A contract defines preconditions and postconditions for state transitions.
pub trait Contract<S, A> {
    /// Checks preconditions before applying the action.
    fn pre(state: &S, action: &A) -> Result<(), MoveError>;

    /// Checks postconditions after applying the action.
    fn post(before: &S, after: &S) -> Result<(), MoveError>;
}

/// The state a move is validated against.
#[derive(Debug, Clone, Copy)]
pub struct MoveContext<'a> {
    /// Current board.
    pub board: &'a Board,
    /// Symbol expected to move next.
    pub current_turn: Player,
    /// Lifecycle status.
    pub status: GameStatus,
}

/// A move as submitted by a caller, before it is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProposedMove {
    /// Requested position; may be out of range.
    pub position: usize,
    /// Symbol the caller wants to place.
    pub symbol: Player,
}

/// Precondition: the game has not reached a terminal status.
pub struct GameNotOver;

impl GameNotOver {
    /// Rejects with [`MoveError::GameOver`] once finished or drawn.
    pub fn check(ctx: &MoveContext<'_>, _mov: &ProposedMove) -> Result<(), MoveError> {
        if ctx.status.is_terminal() {
            Err(MoveError::GameOver(ctx.status))
        } else {
            Ok(())
        }
    }
}

/// Precondition: it must be the player's turn.
pub struct PlayersTurn;

impl PlayersTurn {
    /// Rejects with [`MoveError::WrongTurn`] on a symbol mismatch.
    pub fn check(ctx: &MoveContext<'_>, mov: &ProposedMove) -> Result<(), MoveError> {
        if mov.symbol != ctx.current_turn {
            Err(MoveError::WrongTurn {
                expected: ctx.current_turn,
                got: mov.symbol,
            })
        } else {
            Ok(())
        }
    }
}

/// Precondition: the position is on the board.
pub struct PositionInRange;

impl PositionInRange {
    /// Rejects with [`MoveError::OutOfRange`] outside `0..=8`.
    pub fn check(ctx: &MoveContext<'_>, mov: &ProposedMove) -> Result<(), MoveError> {
        ctx.board.cell_at(mov.position).map(|_| ())
    }
}

/// Precondition: the square at the move's position must be empty.
pub struct SquareIsEmpty;

impl SquareIsEmpty {
    /// Rejects with [`MoveError::CellOccupied`] if the cell holds a symbol.
    pub fn check(ctx: &MoveContext<'_>, mov: &ProposedMove) -> Result<(), MoveError> {
        match ctx.board.cell_at(mov.position)? {
            Square::Empty => Ok(()),
            Square::Occupied(_) => Err(MoveError::CellOccupied(mov.position)),
        }
    }
}

/// Composite precondition, checked in a fixed order: game over, turn,
/// range, occupancy. The first failure is reported.
pub struct LegalMove;

impl LegalMove {
    /// Validates all preconditions for a move.
    #[instrument(skip(ctx), fields(status = %ctx.status, current_turn = %ctx.current_turn))]
    pub fn check(ctx: &MoveContext<'_>, mov: &ProposedMove) -> Result<(), MoveError> {
        GameNotOver::check(ctx, mov)?;
        PlayersTurn::check(ctx, mov)?;
        PositionInRange::check(ctx, mov)?;
        SquareIsEmpty::check(ctx, mov)?;
        Ok(())
    }
}

/// Validates a proposed move without touching any state.
///
/// # Errors
///
/// Returns the first failing rule as a [`MoveError`].
pub fn validate(
    board: &Board,
    position: usize,
    symbol: Player,
    current_turn: Player,
    status: GameStatus,
) -> Result<(), MoveError> {
    let ctx = MoveContext {
        board,
        current_turn,
        status,
    };
    LegalMove::check(&ctx, &ProposedMove { position, symbol })
}

/// Contract for move actions on a [`GameSession`].
///
/// Postconditions: exactly one move was appended and every session
/// invariant still holds.
pub struct MoveContract;

impl Contract<GameSession, ProposedMove> for MoveContract {
    fn pre(session: &GameSession, action: &ProposedMove) -> Result<(), MoveError> {
        LegalMove::check(&session.context(), action)
    }

    fn post(before: &GameSession, after: &GameSession) -> Result<(), MoveError> {
        if after.moves().len() != before.moves().len() + 1 {
            warn!(
                before = before.moves().len(),
                after = after.moves().len(),
                "Move log did not grow by one"
            );
            return Err(MoveError::InvariantViolation(
                "Postcondition failed: move log must grow by exactly one".to_string(),
            ));
        }

        SessionInvariants::check_all(after).map_err(|violations| {
            let descriptions = violations
                .iter()
                .map(|v| v.description.as_str())
                .collect::<Vec<_>>()
                .join("; ");
            warn!(%descriptions, "Session invariants violated");
            MoveError::InvariantViolation(format!("Postcondition failed: {}", descriptions))
        })
    }
}
