use crate::game::{CARD_SIZE, GRID_SIDE};

pub type Line = [usize; GRID_SIDE];

/// Every winning line on a 5x5 card: rows, then columns, then both diagonals
pub fn winning_lines() -> impl Iterator<Item = Line> {
    let rows = (0..GRID_SIDE).map(|r| -> Line { std::array::from_fn(|c| r * GRID_SIDE + c) });
    let cols = (0..GRID_SIDE).map(|c| -> Line { std::array::from_fn(|r| r * GRID_SIDE + c) });
    let diagonals: [Line; 2] = [
        std::array::from_fn(|i| i * GRID_SIDE + i),
        std::array::from_fn(|i| i * GRID_SIDE + (GRID_SIDE - 1 - i)),
    ];

    rows.chain(cols).chain(diagonals)
}

/// True if any row, column or diagonal is fully marked
pub fn has_bingo(marked: &[bool]) -> bool {
    if marked.len() != CARD_SIZE {
        return false;
    }
    winning_lines().any(|line| line.iter().all(|&i| marked[i]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::FREE_CELL;

    fn marked_at(indices: &[usize]) -> Vec<bool> {
        let mut marked = vec![false; CARD_SIZE];
        for &i in indices {
            marked[i] = true;
        }
        marked
    }

    #[test]
    fn test_twelve_lines() {
        assert_eq!(winning_lines().count(), 12);
    }

    #[test]
    fn test_rows_columns_and_diagonals() {
        assert!(has_bingo(&marked_at(&[0, 1, 2, 3, 4])));
        assert!(has_bingo(&marked_at(&[20, 21, 22, 23, 24])));
        assert!(has_bingo(&marked_at(&[2, 7, 12, 17, 22])));
        assert!(has_bingo(&marked_at(&[0, 6, 12, 18, 24])));
        assert!(has_bingo(&marked_at(&[4, 8, 12, 16, 20])));
    }

    #[test]
    fn test_no_bingo() {
        assert!(!has_bingo(&marked_at(&[])));
        assert!(!has_bingo(&marked_at(&[FREE_CELL])));
        assert!(!has_bingo(&marked_at(&[0, 1, 2, 3, 9])));
        // wraps across rows, not a line
        assert!(!has_bingo(&marked_at(&[3, 4, 5, 6, 7])));
    }

    #[test]
    fn test_wrong_length_is_never_a_bingo() {
        assert!(!has_bingo(&[true; 5]));
    }
}
