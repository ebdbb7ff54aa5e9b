use std::sync::Arc;

use crate::{
    game::{
        card::CardGenerator, generate_game_code, lines, GameError, GameResult, CARD_SIZE,
        FREE_CELL,
    },
    models::{Game, Player, PlayerId},
    words::{WordBank, WordBankError},
};

/// Result of adding a player to a game
#[derive(Debug, Clone, PartialEq)]
pub enum JoinOutcome {
    Joined(Player),
    /// The id was already in the game; the existing player is returned untouched
    AlreadyJoined(Player),
}

impl JoinOutcome {
    pub fn into_player(self) -> Player {
        match self {
            JoinOutcome::Joined(player) | JoinOutcome::AlreadyJoined(player) => player,
        }
    }
}

/// Rules of the game. Operates on a `Game` it is handed and holds no game
/// state of its own; callers serialize access per game.
pub struct GameEngine {
    words: Arc<WordBank>,
    cards: CardGenerator,
}

impl GameEngine {
    pub fn new(words: Arc<WordBank>) -> Result<Self, WordBankError> {
        let cards = CardGenerator::new(words.clone())?;
        Ok(Self { words, cards })
    }

    pub fn word_bank(&self) -> &WordBank {
        &self.words
    }

    pub fn create_game(&self, host_name: &str) -> Game {
        Game::new(generate_game_code(), host_name.to_string())
    }

    pub fn add_player(&self, game: &mut Game, player_id: PlayerId, name: &str) -> JoinOutcome {
        if let Some(existing) = game.players.get(&player_id) {
            return JoinOutcome::AlreadyJoined(existing.clone());
        }

        let player = Player::new(player_id, name.to_string(), self.cards.generate());
        game.players.insert(player_id, player.clone());

        tracing::debug!(
            "Player {} ({}) joined game {}",
            player.name,
            player_id,
            game.game_id
        );

        JoinOutcome::Joined(player)
    }

    pub fn call_word(&self, game: &mut Game, word: &str) -> GameResult<()> {
        if !self.words.contains(word) {
            return Err(GameError::InvalidWord(word.to_string()));
        }
        if game.is_called(word) {
            return Err(GameError::AlreadyCalled(word.to_string()));
        }

        game.called_words.push(word.to_string());
        if game.winner.is_none() {
            game.is_active = true;
        }
        Ok(())
    }

    /// Mark a square. Marking an already marked square succeeds and changes nothing.
    pub fn mark_square(
        &self,
        game: &mut Game,
        player_id: &PlayerId,
        index: usize,
    ) -> GameResult<()> {
        let player = game
            .players
            .get(player_id)
            .ok_or(GameError::UnknownPlayer(*player_id))?;

        if index >= CARD_SIZE {
            return Err(GameError::InvalidIndex(index));
        }

        let word = &player.card[index];
        if !Player::is_free_cell(index) && !game.is_called(word) {
            return Err(GameError::NotCallable {
                index,
                word: word.clone(),
            });
        }

        if let Some(player) = game.players.get_mut(player_id) {
            player.marked[index] = true;
        }
        Ok(())
    }

    /// Whether the player has a full line.
    ///
    /// The free cell is marked here rather than when the card is dealt, so a
    /// fresh card reports it unmarked until the first check.
    pub fn check_winner(&self, game: &mut Game, player_id: &PlayerId) -> bool {
        let Some(player) = game.players.get_mut(player_id) else {
            return false;
        };
        if let Some(free) = player.marked.get_mut(FREE_CELL) {
            *free = true;
        }
        lines::has_bingo(&player.marked)
    }

    /// Record the winner unless one already stands. Returns the winner's name
    /// only when this call set it.
    pub fn record_winner(&self, game: &mut Game, player_id: &PlayerId) -> Option<String> {
        if game.winner.is_some() {
            return None;
        }
        let name = game.players.get(player_id)?.name.clone();
        game.winner = Some(name.clone());
        game.is_active = false;
        Some(name)
    }
}
