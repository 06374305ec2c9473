//! Chess rule engine for the parlor session server.
//!
//! Move legality, check, checkmate, stalemate, and promotion are delegated
//! to the `chess` crate; this crate adapts that library to the [`Rules`]
//! contract the session layer and search engine consume. Chess legality is a
//! large, separately-verified subsystem — it is sourced, not reimplemented.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

use chess::{Board, BoardStatus, ChessMove, Color, MoveGen, Piece, Rank, Square};
use parlor_core::{IllegalMove, Outcome, Rules, Seat};
use tracing::instrument;

/// Material weight of a piece, in centipawns.
fn piece_value(piece: Piece) -> i32 {
    match piece {
        Piece::Pawn => 100,
        Piece::Knight => 320,
        Piece::Bishop => 330,
        Piece::Rook => 500,
        Piece::Queen => 900,
        Piece::King => 20_000,
    }
}

/// Maps a board color to its seat. White always sits first.
pub fn seat_of(color: Color) -> Seat {
    match color {
        Color::White => Seat::First,
        Color::Black => Seat::Second,
    }
}

/// Maps a seat to its board color.
pub fn color_of(seat: Seat) -> Color {
    match seat {
        Seat::First => Color::White,
        Seat::Second => Color::Black,
    }
}

/// Full position of one chess game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChessState {
    board: Board,
}

impl ChessState {
    /// The starting position, white to move.
    pub fn new() -> Self {
        Self {
            board: Board::default(),
        }
    }

    /// Parses a position from FEN.
    ///
    /// # Errors
    ///
    /// Returns the library's parse error for malformed FEN.
    pub fn from_fen(fen: &str) -> Result<Self, chess::Error> {
        Ok(Self {
            board: fen.parse::<Board>()?,
        })
    }

    /// The position as a FEN string, the wire encoding for chess boards.
    pub fn fen(&self) -> String {
        self.board.to_string()
    }

    /// The underlying board.
    pub fn board(&self) -> &Board {
        &self.board
    }
}

impl Default for ChessState {
    fn default() -> Self {
        Self::new()
    }
}

/// Rule engine marker for chess.
#[derive(Debug, Clone, Copy)]
pub struct ChessRules;

impl ChessRules {
    /// Builds a library move from wire coordinates, validating legality.
    ///
    /// A pawn move onto the back rank with no promotion tag is normalized to
    /// a queen promotion before the legality check, matching the client
    /// default.
    ///
    /// # Errors
    ///
    /// Returns [`IllegalMove::NotInLegalSet`] when the coordinates do not
    /// name a legal move in this position.
    #[instrument(skip(state), fields(%from, %to))]
    pub fn move_from_coords(
        state: &ChessState,
        from: Square,
        to: Square,
        promotion: Option<Piece>,
    ) -> Result<ChessMove, IllegalMove> {
        let promotion = promotion.or_else(|| {
            let is_pawn = state.board.piece_on(from) == Some(Piece::Pawn);
            let back_rank = to.get_rank() == Rank::First || to.get_rank() == Rank::Eighth;
            (is_pawn && back_rank).then_some(Piece::Queen)
        });
        let mv = ChessMove::new(from, to, promotion);
        if !state.board.legal(mv) {
            return Err(IllegalMove::NotInLegalSet);
        }
        Ok(mv)
    }
}

impl Rules for ChessRules {
    type State = ChessState;
    type Move = ChessMove;

    fn initial() -> ChessState {
        ChessState::new()
    }

    fn legal_moves(state: &ChessState) -> Vec<ChessMove> {
        MoveGen::new_legal(&state.board).collect()
    }

    #[instrument(skip(state), fields(mv = %mv))]
    fn apply(state: &ChessState, mv: &ChessMove) -> Result<ChessState, IllegalMove> {
        if state.board.status() != BoardStatus::Ongoing {
            return Err(IllegalMove::GameOver);
        }
        if !state.board.legal(*mv) {
            return Err(IllegalMove::NotInLegalSet);
        }
        Ok(ChessState {
            board: state.board.make_move_new(*mv),
        })
    }

    fn outcome(state: &ChessState) -> Outcome {
        match state.board.status() {
            BoardStatus::Ongoing => Outcome::Undecided,
            // The side to move is the side that has been mated.
            BoardStatus::Checkmate => Outcome::Win(seat_of(!state.board.side_to_move())),
            BoardStatus::Stalemate => Outcome::Draw,
        }
    }

    fn to_move(state: &ChessState) -> Seat {
        seat_of(state.board.side_to_move())
    }

    fn score(state: &ChessState) -> i32 {
        let mut score = 0;
        for color in [Color::White, Color::Black] {
            let sign = if color == Color::White { 1 } else { -1 };
            for square in *state.board.color_combined(color) {
                if let Some(piece) = state.board.piece_on(square) {
                    score += sign * piece_value(piece);
                }
            }
        }
        score
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_position_is_balanced() {
        let state = ChessRules::initial();
        assert_eq!(ChessRules::score(&state), 0);
        assert_eq!(ChessRules::to_move(&state), Seat::First);
        assert_eq!(ChessRules::legal_moves(&state).len(), 20);
    }

    #[test]
    fn color_seat_mapping_round_trips() {
        assert_eq!(seat_of(color_of(Seat::First)), Seat::First);
        assert_eq!(seat_of(color_of(Seat::Second)), Seat::Second);
        assert_eq!(seat_of(Color::White), Seat::First);
    }
}
