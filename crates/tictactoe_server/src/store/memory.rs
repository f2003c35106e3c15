//! In-process session store.

use super::{GameFilter, GameId, SessionStore, StoreError, StoredGame};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, instrument};

/// Keeps games as serialized JSON in a shared map.
///
/// Records are stored encoded so every load goes through the same
/// serialized state shape as the database does.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    games: Arc<Mutex<HashMap<GameId, String>>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[instrument]
    pub fn new() -> Self {
        debug!("Creating in-memory session store");
        Self::default()
    }

    fn games(&self) -> MutexGuard<'_, HashMap<GameId, String>> {
        // Whole records are inserted at once; a poisoned map is still consistent.
        self.games.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn decode(json: &str) -> Result<StoredGame, StoreError> {
        serde_json::from_str(json).map_err(|e| StoreError::Encoding(e.to_string()))
    }
}

impl SessionStore for MemoryStore {
    #[instrument(skip(self))]
    fn load(&self, id: GameId) -> Result<Option<StoredGame>, StoreError> {
        let games = self.games();
        games.get(&id).map(|json| Self::decode(json)).transpose()
    }

    #[instrument(skip(self, game), fields(game_id = %game.id()))]
    fn save(&self, game: &StoredGame) -> Result<(), StoreError> {
        let json = serde_json::to_string(game).map_err(|e| StoreError::Encoding(e.to_string()))?;
        self.games().insert(*game.id(), json);
        debug!("Game saved");
        Ok(())
    }

    #[instrument(skip(self))]
    fn list(&self, filter: &GameFilter) -> Result<Vec<StoredGame>, StoreError> {
        let mut games = self
            .games()
            .values()
            .map(|json| Self::decode(json))
            .filter(|game| game.as_ref().map_or(true, |g| filter.matches(g)))
            .collect::<Result<Vec<_>, _>>()?;
        games.sort_by(|a, b| b.created_at().cmp(a.created_at()));
        debug!(count = games.len(), "Games listed");
        Ok(games)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use pretty_assertions::assert_eq;
    use tictactoe_engine::{GameSession, GameStatus, Player};
    use uuid::Uuid;

    #[test]
    fn test_load_unknown_id() {
        let store = MemoryStore::new();
        assert_eq!(store.load(Uuid::new_v4()).unwrap(), None);
    }

    #[test]
    fn test_save_then_load() {
        let store = MemoryStore::new();
        let mut game = StoredGame::new(Uuid::new_v4(), "alice".into(), Some("bob".into()), Utc::now());
        let mut session = GameSession::new();
        session.apply_move(4, Player::X).unwrap();
        game.update(&session, Utc::now());

        store.save(&game).unwrap();
        assert_eq!(store.load(*game.id()).unwrap(), Some(game));
    }

    #[test]
    fn test_list_newest_first_with_filter() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let older = StoredGame::new(Uuid::new_v4(), "alice".into(), None, now - Duration::minutes(5));
        let mut newer = StoredGame::new(Uuid::new_v4(), "bob".into(), None, now);
        let mut session = GameSession::new();
        session.apply_move(0, Player::X).unwrap();
        newer.update(&session, now);
        store.save(&older).unwrap();
        store.save(&newer).unwrap();

        let all = store.list(&GameFilter::default()).unwrap();
        assert_eq!(all, vec![newer.clone(), older.clone()]);

        let waiting = store
            .list(&GameFilter {
                status: Some(GameStatus::Waiting),
                player: None,
            })
            .unwrap();
        assert_eq!(waiting, vec![older]);
    }
}
