//! Tic-tac-toe game engine.
//!
//! A pure, synchronous state machine over a 3x3 board. The engine never
//! performs I/O: callers load a [`SessionState`], turn it into a
//! [`GameSession`], apply moves and persist the result themselves.
//!
//! # Architecture
//!
//! - **Board**: nine [`Square`]s in row-major order
//! - **Validator**: [`contracts::validate`], a pure precondition check
//! - **Outcome detector**: [`rules::detect`]
//! - **Session**: [`GameSession`], the `Waiting -> InProgress -> {Finished, Draw}` lifecycle
//! - **Invariants**: [`invariants::SessionInvariants`], checked after every move in debug builds
//!
//! # Example
//!
//! ```
//! use tictactoe_engine::{GameSession, GameStatus, Player};
//!
//! let mut session = GameSession::new();
//! for (pos, player) in [(0, Player::X), (3, Player::O), (1, Player::X), (4, Player::O)] {
//!     session.apply_move(pos, player)?;
//! }
//! let summary = session.apply_move(2, Player::X)?;
//! assert_eq!(summary.status, GameStatus::Finished);
//! assert_eq!(summary.winning_line, Some([0, 1, 2]));
//! # Ok::<(), tictactoe_engine::MoveError>(())
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod action;
mod position;
mod session;
mod state;
mod types;

pub mod contracts;
pub mod invariants;
pub mod rules;

pub use action::{Move, MoveError};
pub use position::Position;
pub use rules::{Line, Outcome};
pub use session::{GameSession, MoveSummary, apply_move, reset};
pub use state::{SessionState, StateError};
pub use types::{BOARD_SIZE, Board, GameStatus, Player, Square};
