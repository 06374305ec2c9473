//! Unified per-room game state.
//!
//! A room plays exactly one game kind; this enum dispatches session-level
//! operations to the right rule engine and translates between wire payloads
//! and engine move types. Payload decoding happens here, at the boundary —
//! the rule engines only ever see their own typed moves.

use crate::error::SessionError;
use crate::wire::{BoardView, GameKind, MovePayload, Promotion, StateView};
use parlor_chess::{ChessRules, ChessState};
use parlor_core::{IllegalMove, Outcome, Rules, Seat};
use parlor_grid::{Cell, Grid as GridRules, GridState, Mark, Square as GridSquare};
use parlor_search::{BOT_DEPTH, select_move};

/// One room's game.
#[derive(Debug, Clone)]
pub enum AnyGame {
    /// A grid-game position.
    Grid(GridState),
    /// A chess position.
    Chess(ChessState),
}

impl AnyGame {
    /// The starting position for the given kind.
    pub fn new(kind: GameKind) -> Self {
        match kind {
            GameKind::Grid => AnyGame::Grid(GridRules::initial()),
            GameKind::Chess => AnyGame::Chess(ChessRules::initial()),
        }
    }

    /// The game kind.
    pub fn kind(&self) -> GameKind {
        match self {
            AnyGame::Grid(_) => GameKind::Grid,
            AnyGame::Chess(_) => GameKind::Chess,
        }
    }

    /// Terminal result of the position.
    pub fn outcome(&self) -> Outcome {
        match self {
            AnyGame::Grid(state) => GridRules::outcome(state),
            AnyGame::Chess(state) => ChessRules::outcome(state),
        }
    }

    /// Seat to move.
    pub fn to_move(&self) -> Seat {
        match self {
            AnyGame::Grid(state) => GridRules::to_move(state),
            AnyGame::Chess(state) => ChessRules::to_move(state),
        }
    }

    /// Decodes a wire payload and applies it through the rule engine.
    ///
    /// # Errors
    ///
    /// A payload of the wrong shape for this game, an unparseable square
    /// name, or a move the rule engine refuses is a rejection; the current
    /// position is untouched.
    pub fn apply(&self, payload: &MovePayload) -> Result<AnyGame, SessionError> {
        match (self, payload) {
            (AnyGame::Grid(state), MovePayload::Cell { cell }) => {
                let cell = Cell::try_from(*cell)?;
                Ok(AnyGame::Grid(GridRules::apply(state, &cell)?))
            }
            (AnyGame::Chess(state), MovePayload::Piece {
                from,
                to,
                promotion,
            }) => {
                let from = parse_square(from)?;
                let to = parse_square(to)?;
                let mv =
                    ChessRules::move_from_coords(state, from, to, promotion.map(Promotion::piece))?;
                Ok(AnyGame::Chess(ChessRules::apply(state, &mv)?))
            }
            _ => Err(SessionError::IllegalMove(IllegalMove::NotInLegalSet)),
        }
    }

    /// Selects the automated opponent's move and encodes it for the wire.
    ///
    /// The result re-enters the normal submission path, so every session
    /// invariant is re-checked before it commits.
    ///
    /// # Errors
    ///
    /// [`SessionError::SearchExhausted`] when the position is terminal.
    pub fn select_bot_move(&self) -> Result<MovePayload, SessionError> {
        match self {
            AnyGame::Grid(state) => select_move::<GridRules>(state, BOT_DEPTH)
                .map(|cell| MovePayload::Cell {
                    cell: cell.index() as u8,
                })
                .ok_or(SessionError::SearchExhausted),
            AnyGame::Chess(state) => select_move::<ChessRules>(state, BOT_DEPTH)
                .map(|mv| MovePayload::Piece {
                    from: mv.get_source().to_string(),
                    to: mv.get_dest().to_string(),
                    promotion: mv.get_promotion().map(Promotion::from_piece),
                })
                .ok_or(SessionError::SearchExhausted),
        }
    }

    /// The wire view of this position at the given store version.
    pub fn view(&self, version: u64) -> StateView {
        let board = match self {
            AnyGame::Grid(state) => BoardView::Grid {
                cells: state.board().squares().map(|square| match square {
                    GridSquare::Empty => String::new(),
                    GridSquare::Occupied(Mark::X) => "X".to_string(),
                    GridSquare::Occupied(Mark::O) => "O".to_string(),
                }),
            },
            AnyGame::Chess(state) => BoardView::Chess { fen: state.fen() },
        };
        StateView {
            game: self.kind(),
            board,
            turn: self.to_move(),
            result: self.outcome(),
            version,
        }
    }
}

fn parse_square(name: &str) -> Result<chess::Square, SessionError> {
    name.parse::<chess::Square>()
        .map_err(|_| SessionError::IllegalMove(IllegalMove::NotInLegalSet))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_shape_must_match_the_game_kind() {
        let game = AnyGame::new(GameKind::Grid);
        let err = game
            .apply(&MovePayload::Piece {
                from: "e2".to_string(),
                to: "e4".to_string(),
                promotion: None,
            })
            .unwrap_err();
        assert_eq!(err, SessionError::IllegalMove(IllegalMove::NotInLegalSet));
    }

    #[test]
    fn out_of_range_cell_is_rejected() {
        let game = AnyGame::new(GameKind::Grid);
        let err = game.apply(&MovePayload::Cell { cell: 9 }).unwrap_err();
        assert_eq!(err, SessionError::IllegalMove(IllegalMove::CellOutOfRange(9)));
    }

    #[test]
    fn malformed_square_names_are_rejected() {
        let game = AnyGame::new(GameKind::Chess);
        let err = game
            .apply(&MovePayload::Piece {
                from: "z9".to_string(),
                to: "e4".to_string(),
                promotion: None,
            })
            .unwrap_err();
        assert_eq!(err, SessionError::IllegalMove(IllegalMove::NotInLegalSet));
    }

    #[test]
    fn grid_view_renders_marks() {
        let game = AnyGame::new(GameKind::Grid);
        let game = game.apply(&MovePayload::Cell { cell: 4 }).unwrap();
        let view = game.view(1);
        let BoardView::Grid { cells } = view.board else {
            panic!("grid game must render a grid board");
        };
        assert_eq!(cells[4], "X");
        assert_eq!(cells[0], "");
        assert_eq!(view.turn, Seat::Second);
    }

    #[test]
    fn chess_opening_round_trips_through_the_payload() {
        let game = AnyGame::new(GameKind::Chess);
        let game = game
            .apply(&MovePayload::Piece {
                from: "e2".to_string(),
                to: "e4".to_string(),
                promotion: None,
            })
            .unwrap();
        let BoardView::Chess { fen } = game.view(1).board else {
            panic!("chess game must render FEN");
        };
        assert!(fen.starts_with("rnbqkbnr/pppppppp/8/8/4P3/8/PPPPPPPP/RNBQKBNR b"));
    }

    #[test]
    fn fresh_terminal_search_is_exhausted() {
        // Mated position: no move for the bot to pick.
        let state = parlor_chess::ChessState::from_fen(
            "rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3",
        )
        .unwrap();
        let game = AnyGame::Chess(state);
        assert_eq!(
            game.select_bot_move().unwrap_err(),
            SessionError::SearchExhausted
        );
    }
}
