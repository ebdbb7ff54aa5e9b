use std::{collections::HashMap, fmt};

use dashmap::DashMap;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::websocket::messages::ServerMessage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Live connections subscribed to each game's broadcasts, keyed by game id
#[derive(Debug, Default)]
pub struct Rooms {
    rooms: DashMap<String, HashMap<ConnectionId, mpsc::Sender<ServerMessage>>>,
}

impl Rooms {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn join(&self, game_id: &str, conn: ConnectionId, tx: mpsc::Sender<ServerMessage>) {
        self.rooms
            .entry(game_id.to_string())
            .or_default()
            .insert(conn, tx);
    }

    /// Drop a connection; the room goes away with its last member
    pub fn leave(&self, game_id: &str, conn: ConnectionId) {
        if let Some(mut room) = self.rooms.get_mut(game_id) {
            room.remove(&conn);
        }
        self.rooms.remove_if(game_id, |_, room| room.is_empty());
    }

    pub fn member_count(&self, game_id: &str) -> usize {
        self.rooms.get(game_id).map(|room| room.len()).unwrap_or(0)
    }

    /// Send a message to every connection in the room
    pub async fn broadcast(&self, game_id: &str, message: ServerMessage) {
        // Clone the senders out so no map guard is held across an await
        let members: Vec<mpsc::Sender<ServerMessage>> = match self.rooms.get(game_id) {
            Some(room) => room.values().cloned().collect(),
            None => return,
        };

        for tx in members {
            let _ = tx.send(message.clone()).await;
        }
    }
}
