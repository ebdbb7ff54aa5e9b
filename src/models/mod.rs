pub mod game;

pub use game::{Game, Player, PlayerId};
