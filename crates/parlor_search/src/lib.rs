//! Depth-bounded adversarial search for the automated opponent.
//!
//! Negamax with alpha-beta pruning over any [`Rules`] implementation. The
//! search is a pure function of `(state, depth)`: bounds are passed and
//! returned by value, nothing is shared, and the result is deterministic —
//! ties resolve to the first move in the rule engine's enumeration order.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

use parlor_core::{Rules, Seat};
use tracing::instrument;

/// Search depth used by the bot. Fixed; regression tests pin its output.
pub const BOT_DEPTH: u8 = 2;

const INFINITY: i32 = i32::MAX;

/// Selects the best move in the position, or `None` at a terminal state.
///
/// Each root move is searched with a full `(−∞, +∞)` window; a later move
/// replaces the running best only on a strictly greater score, which keeps
/// the first-enumerated move on ties.
#[instrument(skip(state))]
pub fn select_move<R: Rules>(state: &R::State, depth: u8) -> Option<R::Move> {
    let moves = R::legal_moves(state);
    let mut best_move = moves.first()?.clone();
    let mut best_score = -INFINITY;

    for mv in &moves {
        let Ok(next) = R::apply(state, mv) else {
            continue;
        };
        let value = -negamax::<R>(&next, depth.saturating_sub(1), -INFINITY, INFINITY);
        if value > best_score {
            best_score = value;
            best_move = mv.clone();
        }
    }

    Some(best_move)
}

/// Negamax over the game tree, maximizing from the current mover's side.
///
/// The static score is oriented toward [`Seat::First`], so it is negated at
/// leaves where `Second` is to move. Siblings stop being explored once
/// `alpha` meets `beta`.
fn negamax<R: Rules>(state: &R::State, depth: u8, mut alpha: i32, beta: i32) -> i32 {
    if depth == 0 || R::outcome(state).is_terminal() {
        let score = R::score(state);
        return match R::to_move(state) {
            Seat::First => score,
            Seat::Second => -score,
        };
    }

    let mut best = -INFINITY;
    for mv in R::legal_moves(state) {
        let Ok(next) = R::apply(state, &mv) else {
            continue;
        };
        let value = -negamax::<R>(&next, depth - 1, -beta, -alpha);
        if value > best {
            best = value;
        }
        if value > alpha {
            alpha = value;
        }
        if alpha >= beta {
            break;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use parlor_core::{IllegalMove, Outcome};

    /// Two-ply toy game: pick a branch, opponent picks a leaf.
    #[derive(Debug, Clone, PartialEq)]
    struct Toy {
        ply: u8,
        branch: usize,
    }

    struct ToyRules;

    // Leaf payoffs for First, by (branch, reply).
    const PAYOFF: [[i32; 2]; 2] = [[3, 7], [5, 2]];

    impl Rules for ToyRules {
        type State = Toy;
        type Move = usize;

        fn initial() -> Toy {
            Toy { ply: 0, branch: 0 }
        }

        fn legal_moves(state: &Toy) -> Vec<usize> {
            if state.ply < 2 { vec![0, 1] } else { Vec::new() }
        }

        fn apply(state: &Toy, mv: &usize) -> Result<Toy, IllegalMove> {
            Ok(Toy {
                ply: state.ply + 1,
                branch: if state.ply == 0 { *mv } else { state.branch * 2 + *mv },
            })
        }

        fn outcome(state: &Toy) -> Outcome {
            if state.ply < 2 { Outcome::Undecided } else { Outcome::Draw }
        }

        fn to_move(state: &Toy) -> Seat {
            if state.ply % 2 == 0 { Seat::First } else { Seat::Second }
        }

        fn score(state: &Toy) -> i32 {
            if state.ply == 2 {
                PAYOFF[state.branch / 2][state.branch % 2]
            } else {
                0
            }
        }
    }

    #[test]
    fn picks_the_maximin_branch() {
        // Branch 0 guarantees min(3, 7) = 3; branch 1 only min(5, 2) = 2.
        let chosen = select_move::<ToyRules>(&ToyRules::initial(), 2).unwrap();
        assert_eq!(chosen, 0);
    }

    #[test]
    fn terminal_state_yields_none() {
        let terminal = Toy { ply: 2, branch: 0 };
        assert_eq!(select_move::<ToyRules>(&terminal, 2), None);
    }
}
