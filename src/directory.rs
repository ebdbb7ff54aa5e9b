use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;

use crate::{
    game::{GameError, GameResult},
    models::Game,
    store::GameStore,
};

/// Serialized access to games in the store.
///
/// Every read-modify-write of a game runs under that game's lock, so calls,
/// marks and winner checks for the same game never interleave.
pub struct GameDirectory {
    store: Arc<dyn GameStore>,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl GameDirectory {
    pub fn new(store: Arc<dyn GameStore>) -> Self {
        Self {
            store,
            locks: DashMap::new(),
        }
    }

    fn lock_for(&self, game_id: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(game_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Store a freshly created game
    pub async fn create(&self, game: &Game) {
        let lock = self.lock_for(&game.game_id);
        let _guard = lock.lock().await;
        self.persist(game).await;
        tracing::info!("Game {} created by {}", game.game_id, game.host_name);
    }

    /// Snapshot of a game
    pub async fn get(&self, game_id: &str) -> GameResult<Game> {
        match self.store.load(game_id).await {
            Ok(Some(game)) => Ok(game),
            Ok(None) => Err(GameError::GameNotFound(game_id.to_string())),
            Err(e) => {
                tracing::warn!("Failed to load game {}: {}", game_id, e);
                Err(GameError::GameNotFound(game_id.to_string()))
            }
        }
    }

    /// Apply `f` to the game under its lock and save the result.
    ///
    /// Nothing is saved when `f` fails. Unknown games fail before a lock
    /// is created for them.
    pub async fn update<T, F>(&self, game_id: &str, f: F) -> GameResult<T>
    where
        F: FnOnce(&mut Game) -> GameResult<T>,
    {
        if !self.locks.contains_key(game_id) {
            self.get(game_id).await?;
        }
        let lock = self.lock_for(game_id);
        let _guard = lock.lock().await;

        let mut game = self.get(game_id).await?;
        let value = f(&mut game)?;
        self.persist(&game).await;

        Ok(value)
    }

    async fn persist(&self, game: &Game) {
        if let Err(e) = self.store.save(game).await {
            tracing::warn!("Failed to save game {}: {}", game.game_id, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{LayeredStore, MemoryStore, StoreError, StoreResult};
    use async_trait::async_trait;
    use std::time::Duration;

    fn directory() -> GameDirectory {
        GameDirectory::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_get_missing_game() {
        let dir = directory();
        assert_eq!(
            dir.get("MISSIN").await.unwrap_err(),
            GameError::GameNotFound("MISSIN".to_string())
        );
    }

    #[tokio::test]
    async fn test_update_saves_on_success_only() {
        let dir = directory();
        dir.create(&Game::new("UPD234".to_string(), "Host".to_string()))
            .await;

        let count = dir
            .update("UPD234", |game| {
                game.called_words.push("CAKE".to_string());
                Ok(game.called_words.len())
            })
            .await
            .unwrap();
        assert_eq!(count, 1);

        let result: GameResult<()> = dir
            .update("UPD234", |game| {
                game.called_words.push("FUN".to_string());
                Err(GameError::NotHost)
            })
            .await;
        assert_eq!(result, Err(GameError::NotHost));

        let game = dir.get("UPD234").await.unwrap();
        assert_eq!(game.called_words, vec!["CAKE"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_updates_do_not_lose_writes() {
        let dir = Arc::new(directory());
        dir.create(&Game::new("RACE23".to_string(), "Host".to_string()))
            .await;

        let mut handles = Vec::new();
        for i in 0..50 {
            let dir = dir.clone();
            handles.push(tokio::spawn(async move {
                dir.update("RACE23", |game| {
                    game.called_words.push(format!("W{}", i));
                    Ok(())
                })
                .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let game = dir.get("RACE23").await.unwrap();
        assert_eq!(game.called_words.len(), 50);
    }

    #[tokio::test]
    async fn test_unknown_games_get_no_lock() {
        let dir = directory();
        for i in 0..200 {
            let result = dir.update(&format!("NOPE{}", i), |_| Ok(())).await;
            assert!(matches!(result, Err(GameError::GameNotFound(_))));
        }
        assert!(dir.locks.is_empty());

        dir.create(&Game::new("REAL23".to_string(), "Host".to_string()))
            .await;
        dir.update("REAL23", |_| Ok(())).await.unwrap();
        assert_eq!(dir.locks.len(), 1);
    }

    /// Durable store whose writes take far longer than any game action
    struct SlowDatabase;

    #[async_trait]
    impl GameStore for SlowDatabase {
        async fn load(&self, _game_id: &str) -> StoreResult<Option<Game>> {
            Ok(None)
        }

        async fn save(&self, _game: &Game) -> StoreResult<()> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Err(StoreError::Database(sqlx::Error::PoolTimedOut))
        }
    }

    #[tokio::test]
    async fn test_slow_database_does_not_delay_updates() {
        let store = LayeredStore::new(MemoryStore::new(), Some(Arc::new(SlowDatabase)));
        let dir = GameDirectory::new(Arc::new(store));
        dir.create(&Game::new("SLOW22".to_string(), "Host".to_string()))
            .await;

        let calls = tokio::time::timeout(
            Duration::from_millis(500),
            dir.update("SLOW22", |game| {
                game.called_words.push("CAKE".to_string());
                Ok(game.called_words.clone())
            }),
        )
        .await
        .expect("update waited on the database")
        .unwrap();

        assert_eq!(calls, vec!["CAKE"]);
        assert_eq!(dir.get("SLOW22").await.unwrap().called_words, vec!["CAKE"]);
    }
}
