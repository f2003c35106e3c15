//! SQLite-backed session store.

use std::collections::HashMap;

use diesel::prelude::*;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::{debug, info, instrument};

use crate::db::{DbError, GameRow, MoveRow, NewGameRow, NewMoveRow, schema};
use crate::store::{GameFilter, GameId, SessionStore, StoreError, StoredGame};

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Database repository for games and moves.
#[derive(Debug, Clone)]
pub struct GameRepository {
    db_path: String,
}

impl GameRepository {
    /// Creates a new repository for the database at the given path.
    ///
    /// Use `":memory:"` only with care: every connection gets its own
    /// empty database.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the path is empty.
    #[instrument(skip(db_path), fields(db_path = %db_path))]
    pub fn new(db_path: String) -> Result<Self, DbError> {
        if db_path.trim().is_empty() {
            return Err(DbError::new("Database path is empty"));
        }
        info!(path = %db_path, "Creating GameRepository");
        Ok(Self { db_path })
    }

    /// Opens the repository and applies pending migrations.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the database cannot be opened or migrated.
    pub fn open(db_path: String) -> Result<Self, DbError> {
        let repo = Self::new(db_path)?;
        repo.run_migrations()?;
        Ok(repo)
    }

    /// Applies any migrations not yet recorded in the database.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a migration fails.
    #[instrument(skip(self), fields(db_path = %self.db_path))]
    pub fn run_migrations(&self) -> Result<(), DbError> {
        let mut conn = self.connection()?;
        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| DbError::new(format!("Migration failed: {}", e)))?;
        info!(count = applied.len(), "Migrations applied");
        Ok(())
    }

    /// Establishes a database connection.
    #[instrument(skip(self))]
    fn connection(&self) -> Result<SqliteConnection, DbError> {
        debug!(path = %self.db_path, "Establishing connection");
        SqliteConnection::establish(&self.db_path)
            .map_err(|e| DbError::new(format!("Failed to connect to '{}': {}", self.db_path, e)))
    }

    /// Loads the moves of the given games, grouped by game id.
    fn moves_for(
        conn: &mut SqliteConnection,
        game_ids: &[String],
    ) -> Result<HashMap<String, Vec<MoveRow>>, DbError> {
        let rows = schema::moves::table
            .filter(schema::moves::game_id.eq_any(game_ids))
            .order(schema::moves::sequence_index.asc())
            .select(MoveRow::as_select())
            .load::<MoveRow>(conn)?;

        let mut grouped: HashMap<String, Vec<MoveRow>> = HashMap::new();
        for row in rows {
            grouped.entry(row.game_id().clone()).or_default().push(row);
        }
        Ok(grouped)
    }

    /// Loads one game with its move log.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs or a row is malformed.
    #[instrument(skip(self))]
    pub fn get_game(&self, id: GameId) -> Result<Option<StoredGame>, DbError> {
        let mut conn = self.connection()?;
        let key = id.to_string();

        let row = schema::games::table
            .filter(schema::games::id.eq(&key))
            .select(GameRow::as_select())
            .first::<GameRow>(&mut conn)
            .optional()?;

        let Some(row) = row else {
            debug!("Game not found");
            return Ok(None);
        };

        let moves = Self::moves_for(&mut conn, std::slice::from_ref(&key))?
            .remove(&key)
            .unwrap_or_default();
        debug!(moves = moves.len(), "Game found");
        row.into_stored(moves).map(Some)
    }

    /// Inserts or replaces a game and rewrites its move log in one
    /// transaction.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self, game), fields(game_id = %game.id(), status = %game.status()))]
    pub fn upsert_game(&self, game: &StoredGame) -> Result<(), DbError> {
        let mut conn = self.connection()?;
        let row = NewGameRow::from_stored(game)?;
        let key = game.id().to_string();
        let move_rows = game
            .state()
            .moves
            .iter()
            .map(|m| NewMoveRow::from_move(&key, m))
            .collect::<Result<Vec<_>, _>>()?;

        conn.transaction::<_, DbError, _>(|conn| {
            diesel::insert_into(schema::games::table)
                .values(&row)
                .on_conflict(schema::games::id)
                .do_update()
                .set(&row)
                .execute(conn)?;

            diesel::delete(schema::moves::table.filter(schema::moves::game_id.eq(&key)))
                .execute(conn)?;

            if !move_rows.is_empty() {
                diesel::insert_into(schema::moves::table)
                    .values(&move_rows)
                    .execute(conn)?;
            }
            Ok(())
        })?;

        info!(moves = move_rows.len(), "Game saved");
        Ok(())
    }

    /// Lists games matching `filter`, most recent first.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs or a row is malformed.
    #[instrument(skip(self))]
    pub fn list_games(&self, filter: &GameFilter) -> Result<Vec<StoredGame>, DbError> {
        let mut conn = self.connection()?;

        let mut query = schema::games::table
            .select(GameRow::as_select())
            .order(schema::games::created_at.desc())
            .into_boxed();
        if let Some(status) = filter.status {
            query = query.filter(schema::games::status.eq(status.to_string()));
        }
        if let Some(player) = &filter.player {
            query = query.filter(
                schema::games::player_x
                    .eq(player.clone())
                    .nullable()
                    .or(schema::games::player_o.eq(player.clone())),
            );
        }
        let rows = query.load::<GameRow>(&mut conn)?;

        let ids: Vec<String> = rows.iter().map(|r| r.id().clone()).collect();
        let mut moves = Self::moves_for(&mut conn, &ids)?;

        let games = rows
            .into_iter()
            .map(|row| {
                let game_moves = moves.remove(row.id()).unwrap_or_default();
                row.into_stored(game_moves)
            })
            .collect::<Result<Vec<_>, _>>()?;

        info!(count = games.len(), "Games loaded");
        Ok(games)
    }
}

impl SessionStore for GameRepository {
    fn load(&self, id: GameId) -> Result<Option<StoredGame>, StoreError> {
        Ok(self.get_game(id)?)
    }

    fn save(&self, game: &StoredGame) -> Result<(), StoreError> {
        Ok(self.upsert_game(game)?)
    }

    fn list(&self, filter: &GameFilter) -> Result<Vec<StoredGame>, StoreError> {
        Ok(self.list_games(filter)?)
    }
}
