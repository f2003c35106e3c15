//! Game session: the lifecycle state machine.
//!
//! `Waiting -> InProgress -> {Finished, Draw}`. A session accepts moves
//! until it reaches a terminal status, after which it is read-only until
//! [`GameSession::reset`].

use super::action::{Move, MoveError};
use super::contracts::{Contract, MoveContext, MoveContract, ProposedMove};
use super::rules::{self, Line, Outcome};
use super::types::{Board, GameStatus, Player, Square};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

/// One game from creation to terminal outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameSession {
    pub(crate) board: Board,
    pub(crate) current_turn: Player,
    pub(crate) status: GameStatus,
    pub(crate) winner: Option<Player>,
    pub(crate) winning_line: Option<Line>,
    pub(crate) moves: Vec<Move>,
    pub(crate) finished_at: Option<DateTime<Utc>>,
}

/// What a caller gets back from an accepted move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveSummary {
    /// Status after the move.
    pub status: GameStatus,
    /// Winner, once `status` is `Finished`.
    pub winner: Option<Player>,
    /// Completed line, once `status` is `Finished`.
    pub winning_line: Option<Line>,
    /// Symbol to move next.
    pub current_turn: Player,
    /// Board after the move.
    pub board: Board,
    /// The move just recorded.
    pub last_move: Move,
}

impl GameSession {
    /// Creates an empty session waiting for X.
    #[instrument]
    pub fn new() -> Self {
        debug!("Creating new game session");
        Self {
            board: Board::new(),
            current_turn: Player::X,
            status: GameStatus::Waiting,
            winner: None,
            winning_line: None,
            moves: Vec::new(),
            finished_at: None,
        }
    }

    /// Returns the board.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Returns the symbol to move next.
    pub fn current_turn(&self) -> Player {
        self.current_turn
    }

    /// Returns the lifecycle status.
    pub fn status(&self) -> GameStatus {
        self.status
    }

    /// Returns the winner, if the game is finished.
    pub fn winner(&self) -> Option<Player> {
        self.winner
    }

    /// Returns the completed line, if the game is finished.
    pub fn winning_line(&self) -> Option<Line> {
        self.winning_line
    }

    /// Returns the move log, ordered by sequence index.
    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    /// Returns the most recent move.
    pub fn last_move(&self) -> Option<&Move> {
        self.moves.last()
    }

    /// When the game reached a terminal status.
    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    /// Returns true once the game is finished or drawn.
    pub fn is_over(&self) -> bool {
        self.status.is_terminal()
    }

    /// Positions that are still empty.
    pub fn available_positions(&self) -> Vec<usize> {
        self.board.available_positions()
    }

    /// Runs the outcome detector on the current board.
    pub fn outcome(&self) -> Outcome {
        rules::detect(&self.board)
    }

    pub(crate) fn context(&self) -> MoveContext<'_> {
        MoveContext {
            board: &self.board,
            current_turn: self.current_turn,
            status: self.status,
        }
    }

    /// Applies a move, stamping a terminal transition with the current time.
    ///
    /// # Errors
    ///
    /// Returns the validator's rejection; the session is left unchanged.
    pub fn apply_move(&mut self, position: usize, symbol: Player) -> Result<MoveSummary, MoveError> {
        self.apply(position, symbol, Some(Utc::now()))
    }

    /// Applies a move with an explicit timestamp for a terminal transition.
    ///
    /// # Errors
    ///
    /// Returns the validator's rejection; the session is left unchanged.
    pub fn apply_move_at(
        &mut self,
        position: usize,
        symbol: Player,
        now: DateTime<Utc>,
    ) -> Result<MoveSummary, MoveError> {
        self.apply(position, symbol, Some(now))
    }

    #[instrument(skip(self, now), fields(status = %self.status, current_turn = %self.current_turn))]
    fn apply(
        &mut self,
        position: usize,
        symbol: Player,
        now: Option<DateTime<Utc>>,
    ) -> Result<MoveSummary, MoveError> {
        let proposed = ProposedMove { position, symbol };
        MoveContract::pre(self, &proposed).inspect_err(|e| {
            warn!(position, %symbol, error = %e, "Move rejected");
        })?;

        #[cfg(debug_assertions)]
        let before = self.clone();

        self.board.set(position, Square::Occupied(symbol))?;
        let sequence_index = self.next_sequence_index();
        let last_move = Move::new(position, symbol, sequence_index);
        self.moves.push(last_move);
        self.current_turn = symbol.opponent();

        match rules::detect(&self.board) {
            Outcome::Win { symbol, line } => {
                self.status = GameStatus::Finished;
                self.winner = Some(symbol);
                self.winning_line = Some(line);
                self.finished_at = now;
                info!(winner = %symbol, ?line, moves = self.moves.len(), "Game won");
            }
            Outcome::Draw => {
                self.status = GameStatus::Draw;
                self.finished_at = now;
                info!(moves = self.moves.len(), "Game drawn");
            }
            Outcome::NoOutcome => {
                self.status = GameStatus::InProgress;
            }
        }

        #[cfg(debug_assertions)]
        if let Err(e) = MoveContract::post(&before, self) {
            *self = before;
            return Err(e);
        }

        debug!(%last_move, status = %self.status, "Move accepted");
        Ok(self.summary(last_move))
    }

    fn next_sequence_index(&self) -> u32 {
        self.moves.last().map_or(1, |m| m.sequence_index() + 1)
    }

    fn summary(&self, last_move: Move) -> MoveSummary {
        MoveSummary {
            status: self.status,
            winner: self.winner,
            winning_line: self.winning_line,
            current_turn: self.current_turn,
            board: self.board.clone(),
            last_move,
        }
    }

    /// Discards every move and returns to an empty board waiting for X.
    #[instrument(skip(self), fields(status = %self.status, moves = self.moves.len()))]
    pub fn reset(&mut self) {
        info!("Resetting game session");
        *self = Self::new();
    }

    /// Rebuilds a session by replaying a move log through the validator.
    ///
    /// Terminal transitions are not timestamped.
    ///
    /// # Errors
    ///
    /// Returns the first rejected move, or [`MoveError::InvariantViolation`]
    /// if sequence indices are not `1, 2, 3, ...`.
    #[instrument(skip(moves), fields(count = moves.len()))]
    pub fn replay(moves: &[Move]) -> Result<Self, MoveError> {
        let mut session = Self::new();
        for mov in moves {
            let expected = session.next_sequence_index();
            if mov.sequence_index() != expected {
                warn!(expected, got = mov.sequence_index(), "Move log out of sequence");
                return Err(MoveError::InvariantViolation(format!(
                    "Move log out of sequence: expected index {}, found {}",
                    expected,
                    mov.sequence_index()
                )));
            }
            session.apply(mov.position(), mov.symbol(), None)?;
        }
        Ok(session)
    }
}

impl Default for GameSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies a move to an owned session and hands it back.
///
/// On rejection the session is dropped; callers that need to keep it
/// should use [`GameSession::apply_move`] on a borrowed session instead.
///
/// # Errors
///
/// Returns the validator's rejection.
pub fn apply_move(
    mut session: GameSession,
    position: usize,
    symbol: Player,
) -> Result<(GameSession, MoveSummary), MoveError> {
    let summary = session.apply_move(position, symbol)?;
    Ok((session, summary))
}

/// Returns a fresh session in place of `session`.
pub fn reset(mut session: GameSession) -> GameSession {
    session.reset();
    session
}
