//! Shared game vocabulary for the parlor session server.
//!
//! A game is described to the rest of the system through the [`Rules`]
//! trait: a pure, stateless contract over some state type. Rule engines own
//! no mutable state; everything here is a function of its inputs.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

/// One of the two fixed participant slots in a room.
///
/// `First` moves first in a fresh game (X in the grid game, white in chess).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Seat {
    /// The seat that moves first.
    First,
    /// The seat that moves second.
    Second,
}

impl Seat {
    /// Returns the other seat.
    pub fn opponent(self) -> Self {
        match self {
            Seat::First => Seat::Second,
            Seat::Second => Seat::First,
        }
    }
}

/// Terminal result of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "seat")]
pub enum Outcome {
    /// The game is still being played.
    Undecided,
    /// The given seat has won.
    Win(Seat),
    /// Neither seat can win.
    Draw,
}

impl Outcome {
    /// True for `Win` and `Draw`, false for `Undecided`.
    pub fn is_terminal(self) -> bool {
        !matches!(self, Outcome::Undecided)
    }
}

/// Error returned when a move is rejected by a rule engine.
///
/// Rejection never mutates state; callers keep the state they passed in.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum IllegalMove {
    /// The target cell already holds a mark.
    #[display("Cell {} is already occupied", _0)]
    CellOccupied(u8),
    /// The cell index is outside the board.
    #[display("Cell {} is out of range", _0)]
    CellOutOfRange(u8),
    /// The move is not in the legal move set for this position.
    #[display("Move is not legal in the current position")]
    NotInLegalSet,
    /// The game already has a terminal result.
    #[display("Game is already decided")]
    GameOver,
}

impl std::error::Error for IllegalMove {}

/// Pure rule engine contract.
///
/// Implementations are zero-sized marker types; all methods are functions of
/// the state they are given. [`legal_moves`](Rules::legal_moves) must
/// enumerate in a deterministic order — that order is the documented
/// tie-break for the search engine.
pub trait Rules {
    /// Full position of one game, cheap to clone.
    type State: Clone + std::fmt::Debug + Send + Sync + 'static;
    /// A single move, cheap to clone and comparable.
    type Move: Clone + PartialEq + std::fmt::Debug + Send + Sync + 'static;

    /// The starting position. `First` is to move.
    fn initial() -> Self::State;

    /// Every legal move in the position, in enumeration order.
    ///
    /// Empty exactly when [`outcome`](Rules::outcome) is terminal.
    fn legal_moves(state: &Self::State) -> Vec<Self::Move>;

    /// Applies a move, returning the successor position.
    ///
    /// # Errors
    ///
    /// Returns [`IllegalMove`] when the move is not a member of
    /// [`legal_moves`](Rules::legal_moves); the input state is untouched.
    fn apply(state: &Self::State, mv: &Self::Move) -> Result<Self::State, IllegalMove>;

    /// Terminal result of the position.
    fn outcome(state: &Self::State) -> Outcome;

    /// Which seat moves next.
    fn to_move(state: &Self::State) -> Seat;

    /// Static evaluation from `First`'s perspective.
    ///
    /// Positive favors `First`. Used as the leaf score by the search engine,
    /// which applies the negamax sign convention itself.
    fn score(state: &Self::State) -> i32;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seats_are_each_others_opponent() {
        assert_eq!(Seat::First.opponent(), Seat::Second);
        assert_eq!(Seat::Second.opponent(), Seat::First);
        assert_eq!(Seat::First.opponent().opponent(), Seat::First);
    }

    #[test]
    fn only_undecided_is_non_terminal() {
        assert!(!Outcome::Undecided.is_terminal());
        assert!(Outcome::Win(Seat::First).is_terminal());
        assert!(Outcome::Draw.is_terminal());
    }

    #[test]
    fn seat_serializes_lowercase() {
        let json = serde_json::to_string(&Seat::First).unwrap();
        assert_eq!(json, "\"first\"");
    }
}
