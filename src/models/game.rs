use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::game::{CARD_SIZE, FREE_CELL};

pub type PlayerId = Uuid;

/// Live state of one bingo game
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Game {
    /// Short shareable join code (e.g., "K7QX2M")
    pub game_id: String,
    pub host_name: String,
    /// Words called so far, in call order
    pub called_words: Vec<String>,
    pub is_active: bool,
    /// Name of the first player to complete a line
    pub winner: Option<String>,
    pub created_at: DateTime<Utc>,
    pub players: HashMap<PlayerId, Player>,
}

impl Game {
    pub fn new(game_id: String, host_name: String) -> Self {
        Self {
            game_id,
            host_name,
            called_words: Vec::new(),
            is_active: false,
            winner: None,
            created_at: Utc::now(),
            players: HashMap::new(),
        }
    }

    pub fn is_called(&self, word: &str) -> bool {
        self.called_words.iter().any(|w| w == word)
    }

    pub fn player(&self, player_id: &PlayerId) -> Option<&Player> {
        self.players.get(player_id)
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }
}

/// A player's card and marks
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Player {
    pub player_id: PlayerId,
    pub name: String,
    /// 25 words in row-major order; index 12 is the free cell
    pub card: Vec<String>,
    pub marked: Vec<bool>,
    pub joined_at: DateTime<Utc>,
}

impl Player {
    pub fn new(player_id: PlayerId, name: String, card: Vec<String>) -> Self {
        Self {
            player_id,
            name,
            card,
            marked: vec![false; CARD_SIZE],
            joined_at: Utc::now(),
        }
    }

    pub fn is_free_cell(index: usize) -> bool {
        index == FREE_CELL
    }
}
