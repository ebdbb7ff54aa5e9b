use thiserror::Error;

use crate::models::PlayerId;

/// Reasons a game action is declined. None of these are fatal: the action
/// is dropped and the game carries on.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GameError {
    #[error("'{0}' is not in the word bank")]
    InvalidWord(String),

    #[error("'{0}' has already been called")]
    AlreadyCalled(String),

    #[error("Player {0} is not in this game")]
    UnknownPlayer(PlayerId),

    #[error("Square {0} is not on the card")]
    InvalidIndex(usize),

    #[error("Square {index} ('{word}') has not been called yet")]
    NotCallable { index: usize, word: String },

    #[error("Game {0} not found")]
    GameNotFound(String),

    #[error("Only the host can call words")]
    NotHost,

    #[error("Only players can mark squares")]
    NotAPlayer,
}

impl GameError {
    /// Get a message that is safe to send back to the client
    ///
    /// Player ids are redacted; everything else is already player-facing.
    pub fn client_message(&self) -> String {
        match self {
            GameError::UnknownPlayer(_) => "You are not a player in this game".to_string(),
            GameError::GameNotFound(_) => "game not found".to_string(),
            _ => self.to_string(),
        }
    }
}

pub type GameResult<T> = Result<T, GameError>;
