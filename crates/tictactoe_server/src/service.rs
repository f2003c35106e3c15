//! Game service: loads a session, runs the engine, saves the result.
//!
//! Mutations of one game are serialized through a per-game async lock so
//! that load → apply → save never interleaves for the same id. Different
//! games proceed independently. Store calls run on the blocking pool.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use tictactoe_engine::{GameSession, Move, MoveError, MoveSummary, Player, StateError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tokio::task::JoinError;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::store::{GameFilter, GameId, SessionStore, StoreError, StoredGame};

/// Failure of a service operation.
#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum ServiceError {
    /// No game with this id.
    #[display("Game {} not found", _0)]
    NotFound(#[error(not(source))] GameId),
    /// The engine rejected the move.
    #[display("{}", _0)]
    #[from]
    Move(MoveError),
    /// The stored state failed validation.
    #[display("Game {} has corrupt state: {}", id, reason)]
    Corrupt {
        /// Affected game.
        id: GameId,
        /// What failed.
        #[error(source)]
        reason: StateError,
    },
    /// Player names were rejected.
    #[display("Invalid players: {}", _0)]
    InvalidPlayers(#[error(not(source))] String),
    /// Storage failed.
    #[display("{}", _0)]
    #[from]
    Store(StoreError),
    /// A blocking store call panicked or was cancelled.
    #[display("Storage task failed: {}", _0)]
    #[from]
    Task(JoinError),
}

/// Result of an accepted move.
#[derive(Debug, Clone)]
pub struct MoveOutcome {
    /// The game as saved after the move.
    pub game: StoredGame,
    /// Engine summary of the move.
    pub summary: MoveSummary,
}

type LockMap = Arc<Mutex<HashMap<GameId, Arc<AsyncMutex<()>>>>>;

/// Held mutation lock for one game.
///
/// Dropping it releases the lock and removes the map entry once no other
/// caller holds or waits on it.
struct GameLock {
    id: GameId,
    locks: LockMap,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for GameLock {
    fn drop(&mut self) {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        // Release under the map lock so no new waiter can clone the entry in between.
        drop(self.guard.take());
        let idle = locks
            .get(&self.id)
            .is_some_and(|entry| Arc::strong_count(entry) == 1);
        if idle {
            locks.remove(&self.id);
        }
    }
}

/// Coordinates the engine and a [`SessionStore`].
#[derive(Debug, Clone)]
pub struct GameService {
    store: Arc<dyn SessionStore>,
    locks: LockMap,
}

impl GameService {
    /// Creates a service over `store`.
    #[instrument(skip(store))]
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        info!("Creating game service");
        Self {
            store,
            locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Waits for exclusive mutation rights on `id`.
    async fn lock_game(&self, id: GameId) -> GameLock {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(locks.entry(id).or_default())
        };
        let mut held = GameLock {
            id,
            locks: Arc::clone(&self.locks),
            guard: None,
        };
        held.guard = Some(lock.lock_owned().await);
        held
    }

    /// Number of games with a live lock entry.
    #[cfg(test)]
    fn lock_entries(&self) -> usize {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Runs a store call on the blocking pool.
    async fn with_store<T, F>(&self, f: F) -> Result<T, ServiceError>
    where
        T: Send + 'static,
        F: FnOnce(&dyn SessionStore) -> Result<T, StoreError> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        Ok(tokio::task::spawn_blocking(move || f(store.as_ref())).await??)
    }

    async fn load(&self, id: GameId) -> Result<StoredGame, ServiceError> {
        self.with_store(move |store| store.load(id))
            .await?
            .ok_or_else(|| {
                debug!(game_id = %id, "Game not found");
                ServiceError::NotFound(id)
            })
    }

    async fn save(&self, game: StoredGame) -> Result<StoredGame, ServiceError> {
        self.with_store(move |store| store.save(&game).map(|()| game))
            .await
    }

    fn session_of(game: &StoredGame) -> Result<GameSession, ServiceError> {
        GameSession::try_from(game.state().clone()).map_err(|reason| {
            warn!(game_id = %game.id(), error = %reason, "Stored state failed validation");
            ServiceError::Corrupt {
                id: *game.id(),
                reason,
            }
        })
    }

    /// Creates and saves a new game. `player_x` moves first.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::InvalidPlayers`] for blank or identical
    /// names, or a storage error.
    #[instrument(skip(self))]
    pub async fn create_game(
        &self,
        player_x: String,
        player_o: Option<String>,
    ) -> Result<StoredGame, ServiceError> {
        let player_x = player_x.trim().to_string();
        let player_o = player_o
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty());

        if player_x.is_empty() {
            return Err(ServiceError::InvalidPlayers(
                "player_x must not be blank".to_string(),
            ));
        }
        if player_o.as_deref() == Some(player_x.as_str()) {
            return Err(ServiceError::InvalidPlayers(
                "You cannot play against yourself".to_string(),
            ));
        }

        let game = self
            .save(StoredGame::new(Uuid::new_v4(), player_x, player_o, Utc::now()))
            .await?;
        info!(game_id = %game.id(), "Game created");
        Ok(game)
    }

    /// Fetches a game.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::NotFound`] or a storage error.
    #[instrument(skip(self))]
    pub async fn get_game(&self, id: GameId) -> Result<StoredGame, ServiceError> {
        self.load(id).await
    }

    /// Returns the ordered move log of a game.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::NotFound`] or a storage error.
    #[instrument(skip(self))]
    pub async fn moves(&self, id: GameId) -> Result<Vec<Move>, ServiceError> {
        Ok(self.load(id).await?.state().moves.clone())
    }

    /// Lists games, newest first.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    #[instrument(skip(self))]
    pub async fn list_games(&self, filter: GameFilter) -> Result<Vec<StoredGame>, ServiceError> {
        self.with_store(move |store| store.list(&filter)).await
    }

    /// Applies a move and saves the result.
    ///
    /// A rejected move saves nothing.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Move`] for a rejected move, or
    /// not-found/corrupt/storage errors.
    #[instrument(skip(self))]
    pub async fn make_move(
        &self,
        id: GameId,
        position: usize,
        symbol: Player,
    ) -> Result<MoveOutcome, ServiceError> {
        let _lock = self.lock_game(id).await;

        let mut game = self.load(id).await?;
        let mut session = Self::session_of(&game)?;
        let summary = session.apply_move(position, symbol)?;

        game.update(&session, Utc::now());
        let game = self.save(game).await?;

        info!(
            game_id = %id,
            sequence_index = summary.last_move.sequence_index(),
            status = %summary.status,
            "Move saved"
        );
        Ok(MoveOutcome { game, summary })
    }

    /// Resets a game to an empty board waiting for X.
    ///
    /// The game keeps its id and players.
    ///
    /// # Errors
    ///
    /// Returns not-found or storage errors.
    #[instrument(skip(self))]
    pub async fn reset_game(&self, id: GameId) -> Result<StoredGame, ServiceError> {
        let _lock = self.lock_game(id).await;

        let mut game = self.load(id).await?;
        let session = tictactoe_engine::reset(Self::session_of(&game)?);
        game.update(&session, Utc::now());
        let game = self.save(game).await?;

        info!(game_id = %id, "Game reset");
        Ok(game)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use tictactoe_engine::GameStatus;

    fn service() -> GameService {
        GameService::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_create_game_rejects_self_play() {
        let service = service();
        assert!(matches!(
            service.create_game("alice".into(), Some(" alice ".into())).await,
            Err(ServiceError::InvalidPlayers(_))
        ));
        assert!(matches!(
            service.create_game("   ".into(), None).await,
            Err(ServiceError::InvalidPlayers(_))
        ));
    }

    #[tokio::test]
    async fn test_move_on_unknown_game() {
        let service = service();
        let id = Uuid::new_v4();
        assert!(matches!(
            service.make_move(id, 0, Player::X).await,
            Err(ServiceError::NotFound(missing)) if missing == id
        ));
    }

    #[tokio::test]
    async fn test_rejected_move_is_not_saved() {
        let service = service();
        let game = service.create_game("alice".into(), Some("bob".into())).await.unwrap();
        let id = *game.id();

        service.make_move(id, 4, Player::X).await.unwrap();
        let err = service.make_move(id, 4, Player::O).await.unwrap_err();
        assert!(matches!(err, ServiceError::Move(MoveError::CellOccupied(4))));

        let saved = service.get_game(id).await.unwrap();
        assert_eq!(saved.state().moves.len(), 1);
        assert_eq!(saved.status(), GameStatus::InProgress);
    }

    #[tokio::test]
    async fn test_reset_keeps_identity() {
        let service = service();
        let game = service.create_game("alice".into(), Some("bob".into())).await.unwrap();
        let id = *game.id();
        service.make_move(id, 0, Player::X).await.unwrap();

        let reset = service.reset_game(id).await.unwrap();
        assert_eq!(reset.id(), &id);
        assert_eq!(reset.player_o().as_deref(), Some("bob"));
        assert_eq!(reset.status(), GameStatus::Waiting);
        assert!(service.moves(id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_moves_on_one_game() {
        let service = service();
        let game = service.create_game("alice".into(), Some("bob".into())).await.unwrap();
        let id = *game.id();

        let handles: Vec<_> = (0..9)
            .map(|pos| {
                let service = service.clone();
                tokio::spawn(async move { service.make_move(id, pos, Player::X).await })
            })
            .collect();

        let mut accepted = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                accepted += 1;
            }
        }

        // Only one X move can be legal before O replies.
        assert_eq!(accepted, 1);
        let saved = service.get_game(id).await.unwrap();
        assert_eq!(saved.state().moves.len(), 1);
        assert_eq!(saved.state().current_turn, Player::O);
        assert_eq!(service.lock_entries(), 0);
    }

    #[tokio::test]
    async fn test_moves_on_unknown_ids_leave_no_locks() {
        let service = service();
        for _ in 0..1000 {
            let result = service.make_move(Uuid::new_v4(), 0, Player::X).await;
            assert!(matches!(result, Err(ServiceError::NotFound(_))));
        }
        assert!(matches!(
            service.reset_game(Uuid::new_v4()).await,
            Err(ServiceError::NotFound(_))
        ));
        assert_eq!(service.lock_entries(), 0);
    }

    #[tokio::test]
    async fn test_lock_released_after_each_move() {
        let service = service();
        let game = service.create_game("alice".into(), Some("bob".into())).await.unwrap();
        let id = *game.id();

        service.make_move(id, 0, Player::X).await.unwrap();
        assert_eq!(service.lock_entries(), 0);
        service.make_move(id, 0, Player::O).await.unwrap_err();
        assert_eq!(service.lock_entries(), 0);
        service.reset_game(id).await.unwrap();
        assert_eq!(service.lock_entries(), 0);
    }

    #[test]
    fn test_error_sources() {
        use std::error::Error;

        let err = ServiceError::from(MoveError::CellOccupied(4));
        assert!(matches!(err, ServiceError::Move(MoveError::CellOccupied(4))));
        assert!(err.source().is_some());

        let corrupt = ServiceError::Corrupt {
            id: Uuid::new_v4(),
            reason: StateError::Mismatch("board"),
        };
        assert_eq!(
            corrupt.source().map(|e| e.to_string()),
            Some(StateError::Mismatch("board").to_string())
        );
        assert!(ServiceError::NotFound(Uuid::new_v4()).source().is_none());
    }
}
