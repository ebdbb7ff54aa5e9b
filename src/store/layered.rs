use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc::{self, error::TrySendError};

use crate::{
    models::{Game, PlayerId},
    store::{GameStore, MemoryStore, StoreResult},
};

/// Snapshots waiting for the durable writer before new ones are skipped
const WRITE_QUEUE_DEPTH: usize = 1024;

/// Memory first, durable store best-effort.
///
/// Memory holds the live state of every game this process has touched. The
/// durable store is read only on a memory miss. Writes to it are queued to a
/// background task, so `save` returns once memory is updated; durable
/// failures are logged and never surface to callers.
pub struct LayeredStore {
    memory: MemoryStore,
    durable: Option<Arc<dyn GameStore>>,
    writer: Option<mpsc::Sender<Game>>,
}

impl LayeredStore {
    /// Must be called inside a tokio runtime when `durable` is set.
    pub fn new(memory: MemoryStore, durable: Option<Arc<dyn GameStore>>) -> Self {
        let writer = durable.clone().map(|store| {
            let (tx, rx) = mpsc::channel(WRITE_QUEUE_DEPTH);
            tokio::spawn(run_writer(store, rx));
            tx
        });

        Self {
            memory,
            durable,
            writer,
        }
    }

    pub fn memory_only() -> Self {
        Self::new(MemoryStore::new(), None)
    }

    pub fn has_durable(&self) -> bool {
        self.durable.is_some()
    }
}

#[async_trait]
impl GameStore for LayeredStore {
    async fn load(&self, game_id: &str) -> StoreResult<Option<Game>> {
        if let Some(game) = self.memory.load(game_id).await? {
            return Ok(Some(game));
        }

        let Some(durable) = &self.durable else {
            return Ok(None);
        };

        match durable.load(game_id).await {
            Ok(Some(game)) => {
                tracing::debug!("Hydrated game {} from durable store", game_id);
                self.memory.save(&game).await?;
                Ok(Some(game))
            }
            Ok(None) => Ok(None),
            Err(e) => {
                tracing::warn!("Failed to load game {} from durable store: {}", game_id, e);
                Ok(None)
            }
        }
    }

    async fn save(&self, game: &Game) -> StoreResult<()> {
        self.memory.save(game).await?;

        // A skipped snapshot is caught up by the next one for the same game
        if let Some(writer) = &self.writer {
            match writer.try_send(game.clone()) {
                Ok(()) => {}
                Err(TrySendError::Full(game)) => {
                    tracing::warn!("Durable write queue full; skipped a save of game {}", game.game_id);
                }
                Err(TrySendError::Closed(game)) => {
                    tracing::warn!("Durable writer stopped; game {} not persisted", game.game_id);
                }
            }
        }

        Ok(())
    }
}

/// Drain queued snapshots into the durable store, in order.
///
/// Snapshots of the same game queued together collapse into the newest one.
/// After a game's first successful write, only players whose marks changed
/// (or who are new) are written again.
async fn run_writer(durable: Arc<dyn GameStore>, mut queue: mpsc::Receiver<Game>) {
    // last snapshot of each game known to be in the durable store
    let mut written: HashMap<String, Game> = HashMap::new();

    while let Some(first) = queue.recv().await {
        let mut batch = vec![first];
        while let Ok(next) = queue.try_recv() {
            match batch.iter_mut().find(|game| game.game_id == next.game_id) {
                Some(slot) => *slot = next,
                None => batch.push(next),
            }
        }

        for game in batch {
            let result = match written.get(&game.game_id) {
                Some(previous) => {
                    let changed = changed_players(previous, &game);
                    durable.save_players(&game, &changed).await
                }
                None => durable.save(&game).await,
            };

            match result {
                Ok(()) => {
                    written.insert(game.game_id.clone(), game);
                }
                Err(e) => {
                    tracing::warn!("Failed to persist game {}: {}", game.game_id, e);
                    // next write of this game is a full one
                    written.remove(&game.game_id);
                }
            }
        }
    }

    tracing::debug!("Durable writer stopped");
}

fn changed_players(previous: &Game, game: &Game) -> Vec<PlayerId> {
    game.players
        .values()
        .filter(|player| {
            previous
                .players
                .get(&player.player_id)
                .map_or(true, |old| old.marked != player.marked)
        })
        .map(|player| player.player_id)
        .collect()
}
