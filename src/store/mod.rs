//! Game persistence behind a backend-agnostic trait.
//!
//! The layered store keeps live games in memory and mirrors them to
//! PostgreSQL when a database is available.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Game, PlayerId};

pub mod layered;
pub mod memory;
pub mod postgres;

pub use layered::LayeredStore;
pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Stored game {game_id} is corrupt: {reason}")]
    Corrupt { game_id: String, reason: String },
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait GameStore: Send + Sync {
    /// Load a game with all of its players. `None` means no such game.
    async fn load(&self, game_id: &str) -> StoreResult<Option<Game>>;

    /// Persist a game and all of its players, replacing any earlier copy.
    async fn save(&self, game: &Game) -> StoreResult<()>;

    /// Persist the game itself plus only the listed players.
    ///
    /// Stores without a cheaper partial write fall back to a full save.
    async fn save_players(&self, game: &Game, _players: &[PlayerId]) -> StoreResult<()> {
        self.save(game).await
    }
}
