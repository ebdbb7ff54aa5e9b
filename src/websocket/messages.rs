use serde::{Deserialize, Serialize};

/// Messages sent from client to server
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    CallWord { word: String },
    MarkSquare { square_index: usize },
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    WordCalled {
        word: String,
    },
    UpdateCalls {
        calls: Vec<String>,
    },
    SquareMarked {
        square_index: usize,
    },
    GameWinner {
        winner: String,
    },
    PlayerCount {
        count: usize,
    },
    ActionDeclined {
        reason: String,
    },
    Error {
        message: String,
    },
}
