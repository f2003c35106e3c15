//! HTTP API route handlers.

use std::str::FromStr;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tictactoe_engine::{Board, GameStatus, Line, Move, MoveError, Player};
use tracing::{error, instrument, warn};

use crate::service::{GameService, ServiceError};
use crate::store::{GameFilter, GameId, StoredGame};

/// Health check response.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Status string.
    pub status: String,
}

/// Body of `POST /games`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CreateGameRequest {
    /// Name of the player holding X.
    pub player_x: String,
    /// Name of the player holding O, if known.
    #[serde(default)]
    pub player_o: Option<String>,
}

/// Body of `POST /games/{id}/moves`.
///
/// Fields are loosely typed so that a negative position or an unknown
/// symbol is answered with a domain error instead of a decoding failure.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MoveRequest {
    /// Cell index, `0..=8`.
    pub position: i64,
    /// `"X"` or `"O"`.
    pub symbol: String,
}

/// Query string of `GET /games`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ListGamesQuery {
    /// One of `waiting`, `in_progress`, `finished`, `draw`.
    pub status: Option<String>,
    /// Player name on either side.
    pub player: Option<String>,
}

/// One entry of the move log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveView {
    /// Cell index.
    pub position: usize,
    /// Symbol placed.
    pub symbol: Player,
    /// 1-based order within the game.
    pub sequence_index: u32,
    /// Name of the player holding `symbol`.
    pub player: Option<String>,
}

impl MoveView {
    fn new(game: &StoredGame, mov: &Move) -> Self {
        Self {
            position: mov.position(),
            symbol: mov.symbol(),
            sequence_index: mov.sequence_index(),
            player: game.player_name(mov.symbol()).map(str::to_string),
        }
    }
}

/// Full view of one game.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameDetail {
    /// Game id.
    pub id: GameId,
    /// Player holding X.
    pub player_x: String,
    /// Player holding O.
    pub player_o: Option<String>,
    /// Lifecycle status.
    pub status: GameStatus,
    /// Nine cells, row-major.
    pub board: Board,
    /// Symbol to move next.
    pub current_turn: Player,
    /// Winning symbol.
    pub winner: Option<Player>,
    /// Winning player's name.
    pub winner_name: Option<String>,
    /// Completed line.
    pub winning_line: Option<Line>,
    /// Empty cells; none once the game is over.
    pub available_positions: Vec<usize>,
    /// Number of moves played.
    pub move_count: usize,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last change.
    pub updated_at: DateTime<Utc>,
    /// Time the game ended.
    pub finished_at: Option<DateTime<Utc>>,
}

impl From<&StoredGame> for GameDetail {
    fn from(game: &StoredGame) -> Self {
        let state = game.state();
        let available_positions = if state.status.is_terminal() {
            Vec::new()
        } else {
            state.board.available_positions()
        };
        Self {
            id: *game.id(),
            player_x: game.player_x().clone(),
            player_o: game.player_o().clone(),
            status: state.status,
            board: state.board.clone(),
            current_turn: state.current_turn,
            winner: state.winner,
            winner_name: game.winner_name().map(str::to_string),
            winning_line: state.winning_line,
            available_positions,
            move_count: state.moves.len(),
            created_at: *game.created_at(),
            updated_at: *game.updated_at(),
            finished_at: state.finished_at,
        }
    }
}

/// List entry for `GET /games`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSummary {
    /// Game id.
    pub id: GameId,
    /// Player holding X.
    pub player_x: String,
    /// Player holding O.
    pub player_o: Option<String>,
    /// Lifecycle status.
    pub status: GameStatus,
    /// Winning player's name.
    pub winner_name: Option<String>,
    /// Number of moves played.
    pub move_count: usize,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl From<&StoredGame> for GameSummary {
    fn from(game: &StoredGame) -> Self {
        Self {
            id: *game.id(),
            player_x: game.player_x().clone(),
            player_o: game.player_o().clone(),
            status: game.status(),
            winner_name: game.winner_name().map(str::to_string),
            move_count: game.state().moves.len(),
            created_at: *game.created_at(),
        }
    }
}

/// Response of `POST /games/{id}/moves`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveResponse {
    /// The game after the move.
    pub game: GameDetail,
    /// The move just recorded.
    pub last_move: MoveView,
}

/// Error body.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human-readable message.
    pub error: String,
    /// Machine-readable kind.
    pub kind: String,
}

/// Error returned by handlers.
#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum ApiError {
    /// Request input was rejected before reaching the service.
    #[display("{}", message)]
    BadRequest {
        /// Machine-readable kind.
        kind: &'static str,
        /// Human-readable message.
        message: String,
    },
    /// The service failed.
    #[display("{}", _0)]
    #[from]
    Service(ServiceError),
}

impl ApiError {
    fn bad_request(kind: &'static str, message: impl Into<String>) -> Self {
        ApiError::BadRequest {
            kind,
            message: message.into(),
        }
    }

    /// HTTP status and machine-readable kind.
    pub fn status_and_kind(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::BadRequest { kind, .. } => (StatusCode::BAD_REQUEST, *kind),
            ApiError::Service(err) => match err {
                ServiceError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
                ServiceError::InvalidPlayers(_) => (StatusCode::BAD_REQUEST, "invalid_players"),
                ServiceError::Move(move_err) => {
                    let status = match move_err {
                        MoveError::OutOfRange(_) => StatusCode::BAD_REQUEST,
                        MoveError::CellOccupied(_)
                        | MoveError::WrongTurn { .. }
                        | MoveError::GameOver(_) => StatusCode::CONFLICT,
                        MoveError::InvariantViolation(_) => StatusCode::INTERNAL_SERVER_ERROR,
                    };
                    (status, move_err.kind())
                }
                ServiceError::Corrupt { .. } => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "corrupt_state")
                }
                ServiceError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "storage"),
                ServiceError::Task(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind) = self.status_and_kind();
        if status.is_server_error() {
            error!(error = %self, kind, "Request failed");
        } else {
            warn!(error = %self, kind, "Request rejected");
        }
        let body = ErrorBody {
            error: self.to_string(),
            kind: kind.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Creates the HTTP router with all routes.
pub fn create_router(service: GameService) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/games", post(create_game).get(list_games))
        .route("/games/{id}", get(get_game))
        .route("/games/{id}/moves", post(make_move).get(list_moves))
        .route("/games/{id}/reset", post(reset_game))
        .with_state(service)
}

/// Health check endpoint.
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

#[instrument(skip(service))]
async fn create_game(
    State(service): State<GameService>,
    Json(req): Json<CreateGameRequest>,
) -> Result<(StatusCode, Json<GameDetail>), ApiError> {
    let game = service.create_game(req.player_x, req.player_o).await?;
    Ok((StatusCode::CREATED, Json(GameDetail::from(&game))))
}

#[instrument(skip(service))]
async fn list_games(
    State(service): State<GameService>,
    Query(query): Query<ListGamesQuery>,
) -> Result<Json<Vec<GameSummary>>, ApiError> {
    let status = query
        .status
        .as_deref()
        .map(GameStatus::from_str)
        .transpose()
        .map_err(|_| {
            ApiError::bad_request(
                "invalid_status",
                format!(
                    "Unknown status '{}'",
                    query.status.as_deref().unwrap_or_default()
                ),
            )
        })?;
    let filter = GameFilter {
        status,
        player: query.player,
    };
    let games = service.list_games(filter).await?;
    Ok(Json(games.iter().map(GameSummary::from).collect()))
}

#[instrument(skip(service))]
async fn get_game(
    State(service): State<GameService>,
    Path(id): Path<GameId>,
) -> Result<Json<GameDetail>, ApiError> {
    let game = service.get_game(id).await?;
    Ok(Json(GameDetail::from(&game)))
}

#[instrument(skip(service))]
async fn make_move(
    State(service): State<GameService>,
    Path(id): Path<GameId>,
    Json(req): Json<MoveRequest>,
) -> Result<Json<MoveResponse>, ApiError> {
    let position = usize::try_from(req.position).map_err(|_| {
        ApiError::bad_request(
            "out_of_range",
            format!("Position {} is out of range (must be 0-8)", req.position),
        )
    })?;
    let symbol = Player::from_str(&req.symbol).map_err(|_| {
        ApiError::bad_request(
            "invalid_symbol",
            format!("Symbol must be 'X' or 'O', got '{}'", req.symbol),
        )
    })?;

    let outcome = service.make_move(id, position, symbol).await?;
    let last_move = MoveView::new(&outcome.game, &outcome.summary.last_move);
    Ok(Json(MoveResponse {
        game: GameDetail::from(&outcome.game),
        last_move,
    }))
}

#[instrument(skip(service))]
async fn reset_game(
    State(service): State<GameService>,
    Path(id): Path<GameId>,
) -> Result<Json<GameDetail>, ApiError> {
    let game = service.reset_game(id).await?;
    Ok(Json(GameDetail::from(&game)))
}

#[instrument(skip(service))]
async fn list_moves(
    State(service): State<GameService>,
    Path(id): Path<GameId>,
) -> Result<Json<Vec<MoveView>>, ApiError> {
    let game = service.get_game(id).await?;
    let moves = game
        .state()
        .moves
        .iter()
        .map(|mov| MoveView::new(&game, mov))
        .collect();
    Ok(Json(moves))
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_move_errors_map_to_status() {
        let cases = [
            (MoveError::OutOfRange(9), StatusCode::BAD_REQUEST),
            (MoveError::CellOccupied(4), StatusCode::CONFLICT),
            (
                MoveError::WrongTurn {
                    expected: Player::X,
                    got: Player::O,
                },
                StatusCode::CONFLICT,
            ),
            (MoveError::GameOver(GameStatus::Draw), StatusCode::CONFLICT),
        ];
        for (err, expected) in cases {
            let api = ApiError::from(ServiceError::Move(err));
            assert_eq!(api.status_and_kind().0, expected);
        }
    }

    #[test]
    fn test_not_found_maps_to_404() {
        let api = ApiError::from(ServiceError::NotFound(Uuid::new_v4()));
        assert_eq!(api.status_and_kind(), (StatusCode::NOT_FOUND, "not_found"));
    }

    #[test]
    fn test_error_source_chain() {
        use std::error::Error;

        let api = ApiError::from(ServiceError::InvalidPlayers("blank".into()));
        assert!(api.source().is_some());
        assert!(ApiError::bad_request("invalid_symbol", "Z").source().is_none());
    }
}
