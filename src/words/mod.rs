use std::collections::HashSet;
use std::path::Path;

use once_cell::sync::Lazy;
use thiserror::Error;
use tokio::fs;

use crate::game::CARD_SIZE;

/// Birthday-party words every game can call when no custom bank is configured
pub const DEFAULT_WORDS: [&str; 30] = [
    "HAPPY BIRTHDAY",
    "CAKE",
    "CANDLES",
    "PRESENTS",
    "BALLOONS",
    "PARTY HAT",
    "MUSIC",
    "DANCING",
    "FRIENDS",
    "FAMILY",
    "LAUGHTER",
    "PHOTOS",
    "MEMORIES",
    "CELEBRATION",
    "WISHES",
    "CONFETTI",
    "STREAMERS",
    "GAMES",
    "FUN",
    "JOY",
    "SMILE",
    "CHEERS",
    "TOAST",
    "SURPRISE",
    "HUGS",
    "SINGING",
    "DECORATIONS",
    "FOOD",
    "DRINKS",
    "ENTERTAINMENT",
];

static DEFAULT_BANK: Lazy<WordBank> = Lazy::new(|| {
    WordBank::from_words(DEFAULT_WORDS.iter().map(|w| w.to_string()))
        .expect("built-in word bank holds a full card")
});

#[derive(Debug, Error)]
pub enum WordBankError {
    #[error("Failed to read word bank: {0}")]
    Io(#[from] std::io::Error),

    #[error("Word bank has {found} entries but a card needs {required}")]
    TooSmall { found: usize, required: usize },
}

/// The words and phrases a host can call. Order is preserved from the source.
#[derive(Debug, Clone)]
pub struct WordBank {
    words: Vec<String>,
    index: HashSet<String>,
}

impl WordBank {
    /// Build a bank from raw entries, normalizing to trimmed uppercase and
    /// dropping blanks and duplicates.
    pub fn from_words<I>(words: I) -> Result<Self, WordBankError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut index = HashSet::new();
        let mut ordered = Vec::new();

        for word in words {
            let word = word.trim().to_uppercase();
            if word.is_empty() {
                continue;
            }
            if index.insert(word.clone()) {
                ordered.push(word);
            }
        }

        if ordered.len() < CARD_SIZE {
            return Err(WordBankError::TooSmall {
                found: ordered.len(),
                required: CARD_SIZE,
            });
        }

        Ok(Self {
            words: ordered,
            index,
        })
    }

    /// Load a word bank from a file, one entry per line
    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self, WordBankError> {
        let content = fs::read_to_string(path).await?;
        let bank = Self::from_words(content.lines().map(str::to_string))?;

        tracing::info!("Loaded {} words into word bank", bank.len());

        Ok(bank)
    }

    /// The built-in birthday bank
    pub fn builtin() -> Self {
        DEFAULT_BANK.clone()
    }

    /// Check if a word can be called. Matching is exact: callers send the
    /// word as it appears on cards.
    pub fn contains(&self, word: &str) -> bool {
        self.index.contains(word)
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }
}
