// Bingo rules: card dealing, calls, marks and line detection

pub mod card;
pub mod engine;
pub mod error;
pub mod lines;

pub use engine::GameEngine;
pub use error::{GameError, GameResult};

/// Squares along one side of a card
pub const GRID_SIDE: usize = 5;
/// Squares on a card
pub const CARD_SIZE: usize = GRID_SIDE * GRID_SIDE;
/// Center square, always treated as marked for win purposes
pub const FREE_CELL: usize = 12;
/// Allowed characters for game codes - excludes I, O, 0, 1 for readability
pub const GAME_CODE_CHARSET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
/// Length of generated game codes
pub const GAME_CODE_LENGTH: usize = 6;

/// Generate a short, readable game code (6 uppercase alphanumeric characters)
pub fn generate_game_code() -> String {
    use rand::Rng;
    let mut rng = rand::rng();
    (0..GAME_CODE_LENGTH)
        .map(|_| {
            let idx = rng.random_range(0..GAME_CODE_CHARSET.len());
            GAME_CODE_CHARSET[idx] as char
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_game_code_length() {
        for _ in 0..100 {
            let code = generate_game_code();
            assert_eq!(
                code.len(),
                GAME_CODE_LENGTH,
                "Generated game code '{}' should be exactly {} characters",
                code,
                GAME_CODE_LENGTH
            );
        }
    }

    #[test]
    fn test_generate_game_code_charset() {
        for _ in 0..100 {
            let code = generate_game_code();
            for c in code.chars() {
                assert!(
                    GAME_CODE_CHARSET.contains(&(c as u8)),
                    "Character '{}' in code '{}' is not in allowed charset",
                    c,
                    code
                );
                assert!(c.is_ascii_digit() || c.is_ascii_uppercase());
            }
        }
    }
}
