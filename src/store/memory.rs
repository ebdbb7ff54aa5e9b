use async_trait::async_trait;
use dashmap::DashMap;

use crate::{
    models::Game,
    store::{GameStore, StoreResult},
};

/// Process-local game store. Lives as long as the instance that owns it.
#[derive(Debug, Default)]
pub struct MemoryStore {
    games: DashMap<String, Game>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GameStore for MemoryStore {
    async fn load(&self, game_id: &str) -> StoreResult<Option<Game>> {
        Ok(self.games.get(game_id).map(|entry| entry.value().clone()))
    }

    async fn save(&self, game: &Game) -> StoreResult<()> {
        self.games.insert(game.game_id.clone(), game.clone());
        Ok(())
    }
}
