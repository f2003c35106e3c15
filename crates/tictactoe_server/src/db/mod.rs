//! SQLite persistence for games and their move logs.

mod error;
mod models;
mod repository;
mod schema; // Diesel generated schema - internal use only

pub use error::DbError;
pub use models::{GameRow, MoveRow, NewGameRow, NewMoveRow};
pub use repository::GameRepository;
