//! Display-only score tally.
//!
//! Accumulated by clients from game-over events; never part of the
//! authoritative room state, and free to reset when a room is left.

use parlor_core::{Outcome, Seat};

/// Running tally of consecutive-session results for one participant.
///
/// A win scores 1 point, a draw half a point, a loss nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, derive_new::new)]
pub struct Scoreboard {
    #[new(default)]
    wins: u32,
    #[new(default)]
    draws: u32,
    #[new(default)]
    losses: u32,
}

impl Scoreboard {
    /// Records a finished game as seen from the given seat.
    ///
    /// An `Undecided` outcome records nothing.
    pub fn record(&mut self, result: Outcome, seat: Seat) {
        match result {
            Outcome::Win(winner) if winner == seat => self.wins += 1,
            Outcome::Win(_) => self.losses += 1,
            Outcome::Draw => self.draws += 1,
            Outcome::Undecided => {}
        }
    }

    /// Points scored so far.
    pub fn points(&self) -> f64 {
        f64::from(self.wins) + 0.5 * f64::from(self.draws)
    }

    /// Games recorded so far.
    pub fn games(&self) -> u32 {
        self.wins + self.draws + self.losses
    }

    /// Clears the tally.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wins_draws_and_losses_score_correctly() {
        let mut tally = Scoreboard::new();
        tally.record(Outcome::Win(Seat::First), Seat::First);
        tally.record(Outcome::Draw, Seat::First);
        tally.record(Outcome::Win(Seat::Second), Seat::First);
        assert_eq!(tally.points(), 1.5);
        assert_eq!(tally.games(), 3);
    }

    #[test]
    fn undecided_records_nothing() {
        let mut tally = Scoreboard::new();
        tally.record(Outcome::Undecided, Seat::First);
        assert_eq!(tally.games(), 0);
    }

    #[test]
    fn reset_clears_the_tally() {
        let mut tally = Scoreboard::new();
        tally.record(Outcome::Draw, Seat::Second);
        tally.reset();
        assert_eq!(tally, Scoreboard::new());
    }
}
