//! Draw detection for the grid game.

use crate::types::{Board, Square};
use tracing::instrument;

/// Checks if every square is occupied.
///
/// A full board with no winner is a draw.
#[instrument]
pub fn is_full(board: &Board) -> bool {
    board.squares().iter().all(|s| *s != Square::Empty)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::Cell;
    use crate::types::Mark;

    #[test]
    fn empty_board_is_not_full() {
        assert!(!is_full(&Board::new()));
    }

    #[test]
    fn partial_board_is_not_full() {
        let mut board = Board::new();
        board.set(Cell::Center, Square::Occupied(Mark::X));
        assert!(!is_full(&board));
    }

    #[test]
    fn nine_marks_fill_the_board() {
        let mut board = Board::new();
        for &cell in Cell::all() {
            board.set(cell, Square::Occupied(Mark::X));
        }
        assert!(is_full(&board));
    }
}
