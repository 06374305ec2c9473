//! Grid game state and the [`Rules`] implementation.

use crate::cell::Cell;
use crate::rules::{check_winner, is_full};
use crate::types::{Board, Mark, Square};
use parlor_core::{IllegalMove, Outcome, Rules, Seat};
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use tracing::instrument;

/// Score reported for a decided position, from X's perspective.
///
/// The grid game has no material, so evaluation is terminal-only.
const WIN_SCORE: i32 = 10_000;

/// Full position of one grid game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridState {
    board: Board,
    to_move: Mark,
}

impl GridState {
    /// Creates the starting position, X to move.
    pub fn new() -> Self {
        Self {
            board: Board::new(),
            to_move: Mark::X,
        }
    }

    /// The board.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// The mark that moves next.
    pub fn to_move(&self) -> Mark {
        self.to_move
    }
}

impl Default for GridState {
    fn default() -> Self {
        Self::new()
    }
}

/// Rule engine marker for the grid game.
#[derive(Debug, Clone, Copy)]
pub struct Grid;

impl Rules for Grid {
    type State = GridState;
    type Move = Cell;

    fn initial() -> GridState {
        GridState::new()
    }

    #[instrument(skip(state))]
    fn legal_moves(state: &GridState) -> Vec<Cell> {
        if Self::outcome(state).is_terminal() {
            return Vec::new();
        }
        Cell::iter()
            .filter(|&cell| state.board.is_empty(cell))
            .collect()
    }

    #[instrument(skip(state), fields(cell = %mv, mark = ?state.to_move))]
    fn apply(state: &GridState, mv: &Cell) -> Result<GridState, IllegalMove> {
        if Self::outcome(state).is_terminal() {
            return Err(IllegalMove::GameOver);
        }
        if !state.board.is_empty(*mv) {
            return Err(IllegalMove::CellOccupied(mv.index() as u8));
        }

        let mut next = state.clone();
        next.board.set(*mv, Square::Occupied(state.to_move));
        next.to_move = state.to_move.opponent();
        Ok(next)
    }

    fn outcome(state: &GridState) -> Outcome {
        if let Some(mark) = check_winner(&state.board) {
            return Outcome::Win(mark.seat());
        }
        if is_full(&state.board) {
            return Outcome::Draw;
        }
        Outcome::Undecided
    }

    fn to_move(state: &GridState) -> Seat {
        state.to_move.seat()
    }

    fn score(state: &GridState) -> i32 {
        match check_winner(&state.board) {
            Some(Mark::X) => WIN_SCORE,
            Some(Mark::O) => -WIN_SCORE,
            None => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_state_has_nine_legal_moves() {
        let state = Grid::initial();
        assert_eq!(Grid::legal_moves(&state).len(), 9);
        assert_eq!(Grid::to_move(&state), Seat::First);
        assert_eq!(Grid::outcome(&state), Outcome::Undecided);
    }

    #[test]
    fn apply_alternates_marks() {
        let state = Grid::initial();
        let state = Grid::apply(&state, &Cell::Center).unwrap();
        assert_eq!(state.to_move(), Mark::O);
        assert_eq!(state.board().get(Cell::Center), Square::Occupied(Mark::X));
    }

    #[test]
    fn occupied_cell_is_rejected_without_mutation() {
        let state = Grid::initial();
        let state = Grid::apply(&state, &Cell::Center).unwrap();
        let before = state.clone();
        let err = Grid::apply(&state, &Cell::Center).unwrap_err();
        assert_eq!(err, IllegalMove::CellOccupied(4));
        assert_eq!(state, before);
    }

    #[test]
    fn finished_game_rejects_further_moves() {
        // X: 0, 1, 2 wins the top row.
        let mut state = Grid::initial();
        for &cell in &[
            Cell::TopLeft,
            Cell::MiddleLeft,
            Cell::TopCenter,
            Cell::MiddleRight,
            Cell::TopRight,
        ] {
            state = Grid::apply(&state, &cell).unwrap();
        }
        assert_eq!(Grid::outcome(&state), Outcome::Win(Seat::First));
        assert!(Grid::legal_moves(&state).is_empty());
        assert_eq!(
            Grid::apply(&state, &Cell::BottomLeft).unwrap_err(),
            IllegalMove::GameOver
        );
    }

    #[test]
    fn terminal_score_reflects_the_winner() {
        let mut state = Grid::initial();
        for &cell in &[
            Cell::TopLeft,
            Cell::MiddleLeft,
            Cell::TopCenter,
            Cell::MiddleRight,
            Cell::TopRight,
        ] {
            state = Grid::apply(&state, &cell).unwrap();
        }
        assert_eq!(Grid::score(&state), WIN_SCORE);
        assert_eq!(Grid::score(&Grid::initial()), 0);
    }
}
