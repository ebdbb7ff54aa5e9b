use std::sync::Arc;

use rand::{seq::SliceRandom, Rng};

use crate::{
    game::CARD_SIZE,
    words::{WordBank, WordBankError},
};

pub struct CardGenerator {
    words: Arc<WordBank>,
}

impl CardGenerator {
    /// Fails when the bank cannot fill a card without repeating words
    pub fn new(words: Arc<WordBank>) -> Result<Self, WordBankError> {
        if words.len() < CARD_SIZE {
            return Err(WordBankError::TooSmall {
                found: words.len(),
                required: CARD_SIZE,
            });
        }
        Ok(Self { words })
    }

    /// Draw 25 distinct words in random order
    pub fn generate(&self) -> Vec<String> {
        self.generate_with(&mut rand::rng())
    }

    pub fn generate_with(&self, rng: &mut impl Rng) -> Vec<String> {
        let mut card = self.words.words().to_vec();
        card.shuffle(rng);
        card.truncate(CARD_SIZE);
        card
    }
}
