//! Database models and their mapping to stored games.

use std::str::FromStr;

use chrono::NaiveDateTime;
use derive_getters::Getters;
use derive_new::new;
use diesel::prelude::*;
use tictactoe_engine::{Board, GameStatus, Line, Move, Player, SessionState};
use tracing::instrument;
use uuid::Uuid;

use crate::db::{DbError, schema};
use crate::store::StoredGame;

/// Game row.
#[derive(Debug, Clone, Queryable, Selectable, Getters)]
#[diesel(table_name = schema::games)]
pub struct GameRow {
    id: String,
    player_x: String,
    player_o: Option<String>,
    status: String,
    board: String,
    current_turn: String,
    winner: Option<String>,
    winning_line: Option<String>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
    finished_at: Option<NaiveDateTime>,
}

impl GameRow {
    /// Combines the row with its moves into a stored game.
    ///
    /// Column values are parsed strictly; any unknown status or symbol
    /// string is an error.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a column does not parse.
    #[instrument(skip(self, moves), fields(game_id = %self.id, moves = moves.len()))]
    pub fn into_stored(self, moves: Vec<MoveRow>) -> Result<StoredGame, DbError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| DbError::new(format!("Invalid game id '{}': {}", self.id, e)))?;

        let mut moves = moves
            .into_iter()
            .map(MoveRow::into_move)
            .collect::<Result<Vec<_>, _>>()?;
        moves.sort_by_key(Move::sequence_index);

        let state = SessionState {
            board: serde_json::from_str::<Board>(&self.board)?,
            current_turn: Player::from_str(&self.current_turn)?,
            status: GameStatus::from_str(&self.status)?,
            winner: self.winner.as_deref().map(Player::from_str).transpose()?,
            moves,
            winning_line: self
                .winning_line
                .as_deref()
                .map(serde_json::from_str::<Line>)
                .transpose()?,
            finished_at: self.finished_at.map(|t| t.and_utc()),
        };

        Ok(StoredGame::from_parts(
            id,
            self.player_x,
            self.player_o,
            state,
            self.created_at.and_utc(),
            self.updated_at.and_utc(),
        ))
    }
}

/// Insertable game row, also used as the upsert changeset.
#[derive(Debug, Clone, Insertable, AsChangeset, new)]
#[diesel(table_name = schema::games)]
#[diesel(treat_none_as_null = true)]
pub struct NewGameRow {
    id: String,
    player_x: String,
    player_o: Option<String>,
    status: String,
    board: String,
    current_turn: String,
    winner: Option<String>,
    winning_line: Option<String>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
    finished_at: Option<NaiveDateTime>,
}

impl NewGameRow {
    /// Flattens a stored game into column values.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the board cannot be encoded.
    #[instrument(skip(game), fields(game_id = %game.id()))]
    pub fn from_stored(game: &StoredGame) -> Result<Self, DbError> {
        let state = game.state();
        Ok(Self::new(
            game.id().to_string(),
            game.player_x().clone(),
            game.player_o().clone(),
            state.status.to_string(),
            serde_json::to_string(&state.board)?,
            state.current_turn.to_string(),
            state.winner.map(|p| p.to_string()),
            state
                .winning_line
                .map(|line| serde_json::to_string(&line))
                .transpose()?,
            game.created_at().naive_utc(),
            game.updated_at().naive_utc(),
            state.finished_at.map(|t| t.naive_utc()),
        ))
    }
}

/// Move row.
#[derive(Debug, Clone, Queryable, Selectable, Getters)]
#[diesel(table_name = schema::moves)]
pub struct MoveRow {
    id: i32,
    game_id: String,
    position: i32,
    symbol: String,
    sequence_index: i32,
}

impl MoveRow {
    /// Parses the row into an engine move.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] on negative numbers or an unknown symbol.
    pub fn into_move(self) -> Result<Move, DbError> {
        let position = usize::try_from(self.position)
            .map_err(|_| DbError::new(format!("Invalid move position {}", self.position)))?;
        let sequence_index = u32::try_from(self.sequence_index)
            .map_err(|_| DbError::new(format!("Invalid sequence index {}", self.sequence_index)))?;
        Ok(Move::new(
            position,
            Player::from_str(&self.symbol)?,
            sequence_index,
        ))
    }
}

/// Insertable move row.
#[derive(Debug, Clone, Insertable, new)]
#[diesel(table_name = schema::moves)]
pub struct NewMoveRow {
    game_id: String,
    position: i32,
    symbol: String,
    sequence_index: i32,
}

impl NewMoveRow {
    /// Builds the row for `mov` in game `game_id`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a number does not fit the column.
    pub fn from_move(game_id: &str, mov: &Move) -> Result<Self, DbError> {
        let position = i32::try_from(mov.position())
            .map_err(|_| DbError::new(format!("Position {} does not fit", mov.position())))?;
        let sequence_index = i32::try_from(mov.sequence_index()).map_err(|_| {
            DbError::new(format!("Sequence index {} does not fit", mov.sequence_index()))
        })?;
        Ok(Self::new(
            game_id.to_string(),
            position,
            mov.symbol().to_string(),
            sequence_index,
        ))
    }
}
