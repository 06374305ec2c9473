//! Exhaustive rule-engine checks over every reachable grid position.

use parlor_core::{Outcome, Rules, Seat};
use parlor_grid::rules::LINES;
use parlor_grid::{Cell, Grid, GridState, Mark, Square};

/// Reference predicate straight from the definition: a triple wins when all
/// three cells are non-empty and equal.
fn winner_by_triples(state: &GridState) -> Option<Mark> {
    for [a, b, c] in LINES {
        let sq = state.board().get(a);
        if sq != Square::Empty && sq == state.board().get(b) && sq == state.board().get(c) {
            if let Square::Occupied(mark) = sq {
                return Some(mark);
            }
        }
    }
    None
}

fn board_is_full(state: &GridState) -> bool {
    Cell::all().iter().all(|&c| !state.board().is_empty(c))
}

/// Walks the full game tree from the starting position, checking the
/// outcome contract at every reachable state.
#[test]
fn outcome_matches_triple_enumeration_on_all_reachable_states() {
    let mut stack = vec![Grid::initial()];
    let mut visited = 0usize;

    while let Some(state) = stack.pop() {
        visited += 1;

        let expected = match winner_by_triples(&state) {
            Some(mark) => Outcome::Win(mark.seat()),
            None if board_is_full(&state) => Outcome::Draw,
            None => Outcome::Undecided,
        };
        assert_eq!(Grid::outcome(&state), expected, "at\n{}", state.board().display());

        let moves = Grid::legal_moves(&state);
        assert_eq!(
            moves.is_empty(),
            expected.is_terminal(),
            "legal moves must be empty exactly at terminal states"
        );

        for mv in moves {
            stack.push(Grid::apply(&state, &mv).expect("enumerated move must apply"));
        }
    }

    // Reachable positions of tic-tac-toe counted as tree nodes; sanity check
    // that the walk actually covered the tree rather than exiting early.
    assert!(visited > 100_000, "walked only {visited} nodes");
}

#[test]
fn legal_moves_enumerate_in_row_major_order() {
    let state = Grid::initial();
    let state = Grid::apply(&state, &Cell::Center).unwrap();
    let moves = Grid::legal_moves(&state);
    let indices: Vec<usize> = moves.iter().map(|c| c.index()).collect();
    assert_eq!(indices, vec![0, 1, 2, 3, 5, 6, 7, 8]);
}

#[test]
fn full_game_to_draw() {
    // X O X / X O O / O X X leaves no winner.
    let sequence = [4, 0, 2, 6, 3, 5, 7, 1, 8];
    let mut state = Grid::initial();
    for index in sequence {
        let cell = Cell::from_index(index).unwrap();
        state = Grid::apply(&state, &cell).unwrap();
    }
    assert_eq!(Grid::outcome(&state), Outcome::Draw);
    assert_eq!(Grid::score(&state), 0);
}

#[test]
fn win_reports_the_seat_not_the_mark() {
    // O wins: X wastes moves while O takes the left column.
    let sequence = [4, 0, 2, 3, 8, 6]; // O occupies 0, 3, 6
    let mut state = Grid::initial();
    for index in sequence {
        let cell = Cell::from_index(index).unwrap();
        state = Grid::apply(&state, &cell).unwrap();
    }
    assert_eq!(Grid::outcome(&state), Outcome::Win(Seat::Second));
}
