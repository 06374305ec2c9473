//! Wire protocol for the session server.
//!
//! Every boundary message is a closed tagged enum, decoded and validated
//! here before anything reaches the room core. The core never operates on
//! untyped data.

use parlor_core::{Outcome, Seat};
use serde::{Deserialize, Serialize};

/// Which game a room plays.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum GameKind {
    /// The 3×3 grid game.
    #[default]
    Grid,
    /// Chess.
    Chess,
}

/// Promotion piece tag for a chess move, single-letter as sent by clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Promotion {
    /// Promote to a queen.
    #[serde(rename = "q")]
    Queen,
    /// Promote to a rook.
    #[serde(rename = "r")]
    Rook,
    /// Promote to a bishop.
    #[serde(rename = "b")]
    Bishop,
    /// Promote to a knight.
    #[serde(rename = "n")]
    Knight,
}

impl Promotion {
    /// The library piece this tag names.
    pub fn piece(self) -> chess::Piece {
        match self {
            Promotion::Queen => chess::Piece::Queen,
            Promotion::Rook => chess::Piece::Rook,
            Promotion::Bishop => chess::Piece::Bishop,
            Promotion::Knight => chess::Piece::Knight,
        }
    }

    /// Tag for a promotion piece chosen by the engine.
    ///
    /// Only the four promotion pieces are representable on the wire; anything
    /// else collapses to a queen.
    pub fn from_piece(piece: chess::Piece) -> Self {
        match piece {
            chess::Piece::Rook => Promotion::Rook,
            chess::Piece::Bishop => Promotion::Bishop,
            chess::Piece::Knight => Promotion::Knight,
            _ => Promotion::Queen,
        }
    }
}

/// Move payload as submitted by a client.
///
/// The two shapes are disjoint in their fields, so no tag is needed: a cell
/// index for the grid game, origin/destination squares for chess.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MovePayload {
    /// Grid move: a cell index, 0–8 row-major.
    Cell {
        /// Target cell.
        cell: u8,
    },
    /// Chess move in coordinate form.
    Piece {
        /// Origin square, e.g. `"e2"`.
        from: String,
        /// Destination square, e.g. `"e4"`.
        to: String,
        /// Optional promotion tag; a bare pawn push to the back rank
        /// defaults to a queen.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        promotion: Option<Promotion>,
    },
}

/// A participant's standing in a room after a join.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Standing {
    /// Bound to the first seat.
    First,
    /// Bound to the second seat.
    Second,
    /// Observe-only; never mutates the game.
    Spectator,
}

impl Standing {
    /// The bound seat, if any.
    pub fn seat(self) -> Option<Seat> {
        match self {
            Standing::First => Some(Seat::First),
            Standing::Second => Some(Seat::Second),
            Standing::Spectator => None,
        }
    }
}

impl From<Seat> for Standing {
    fn from(seat: Seat) -> Self {
        match seat {
            Seat::First => Standing::First,
            Seat::Second => Standing::Second,
        }
    }
}

/// Board portion of a state view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BoardView {
    /// Grid cells in row-major order: `""`, `"X"` or `"O"`.
    Grid {
        /// The nine cells.
        cells: [String; 9],
    },
    /// Chess position as FEN.
    Chess {
        /// The position.
        fen: String,
    },
}

/// Authoritative game state as pushed to every participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateView {
    /// The room's game kind.
    pub game: GameKind,
    /// The board.
    pub board: BoardView,
    /// Seat to move.
    pub turn: Seat,
    /// Terminal result, if any.
    pub result: Outcome,
    /// Committed move count; increases by one per move.
    pub version: u64,
}

/// Why a request was rejected. Delivered only to the requester.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RejectReason {
    /// Both seats are bound and spectators are refused.
    RoomFull,
    /// No such room.
    RoomNotFound,
    /// The acting identity does not hold the seat whose turn it is.
    NotYourTurn,
    /// The rule engine refused the move.
    IllegalMove,
    /// The game already has a terminal result.
    GameAlreadyFinished,
    /// A move was requested from a terminal position.
    SearchExhausted,
    /// A concurrent update won the commit race.
    Conflict,
}

/// Messages from clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum ClientEvent {
    /// Bind a seat, creating the room if it does not exist.
    CreateOrJoin {
        /// Raw room identifier; sanitized before lookup.
        room: String,
        /// Display name shown to the opponent.
        name: String,
        /// Game kind used when the room is created.
        #[serde(default)]
        game: GameKind,
        /// Stable identity for rejoin. Assigned by the server when absent.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        identity: Option<String>,
        /// Play against the automated opponent.
        #[serde(default, rename = "vs-bot")]
        vs_bot: bool,
    },
    /// Submit a move for validation.
    SubmitMove {
        /// Room identifier.
        room: String,
        /// The move.
        #[serde(rename = "move")]
        mv: MovePayload,
    },
    /// Release the held seat.
    LeaveRoom {
        /// Room identifier.
        room: String,
    },
    /// Clear the game and swap seats.
    Reset {
        /// Room identifier.
        room: String,
    },
}

/// Messages to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum ServerEvent {
    /// Seat assignment result for the requester.
    Joined {
        /// Assigned standing.
        standing: Standing,
        /// The identity this connection is known by.
        identity: String,
        /// Opponent's display name, when a seat opposite is bound.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        opponent: Option<String>,
    },
    /// The second seat was filled.
    OpponentJoined {
        /// The joiner's display name.
        name: String,
    },
    /// The room now has one occupant.
    OpponentLeft,
    /// Authoritative game state.
    State {
        /// The view.
        #[serde(flatten)]
        view: StateView,
    },
    /// Join refused: both seats bound, spectators refused.
    RoomFull,
    /// The room does not exist.
    RoomNotFound,
    /// The game reached a terminal result.
    GameOver {
        /// The result.
        result: Outcome,
    },
    /// The game was cleared and seats swapped.
    Reset,
    /// A request was rejected; requester-only.
    Rejected {
        /// The reason.
        reason: RejectReason,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_or_join_decodes_with_defaults() {
        let event: ClientEvent =
            serde_json::from_str(r#"{"event":"create-or-join","room":"ABCD","name":"Alice"}"#)
                .unwrap();
        assert_eq!(
            event,
            ClientEvent::CreateOrJoin {
                room: "ABCD".to_string(),
                name: "Alice".to_string(),
                game: GameKind::Grid,
                identity: None,
                vs_bot: false,
            }
        );
    }

    #[test]
    fn submit_move_decodes_both_payload_shapes() {
        let grid: ClientEvent =
            serde_json::from_str(r#"{"event":"submit-move","room":"r","move":{"cell":4}}"#)
                .unwrap();
        assert_eq!(
            grid,
            ClientEvent::SubmitMove {
                room: "r".to_string(),
                mv: MovePayload::Cell { cell: 4 },
            }
        );

        let chess: ClientEvent = serde_json::from_str(
            r#"{"event":"submit-move","room":"r","move":{"from":"e7","to":"e8","promotion":"n"}}"#,
        )
        .unwrap();
        assert_eq!(
            chess,
            ClientEvent::SubmitMove {
                room: "r".to_string(),
                mv: MovePayload::Piece {
                    from: "e7".to_string(),
                    to: "e8".to_string(),
                    promotion: Some(Promotion::Knight),
                },
            }
        );
    }

    #[test]
    fn state_event_flattens_the_view() {
        let view = StateView {
            game: GameKind::Chess,
            board: BoardView::Chess {
                fen: "8/8/8/8/8/8/8/8 w - - 0 1".to_string(),
            },
            turn: Seat::First,
            result: Outcome::Undecided,
            version: 3,
        };
        let json = serde_json::to_value(ServerEvent::State { view }).unwrap();
        assert_eq!(json["event"], "state");
        assert_eq!(json["game"], "chess");
        assert_eq!(json["version"], 3);
        assert_eq!(json["board"]["fen"], "8/8/8/8/8/8/8/8 w - - 0 1");
    }

    #[test]
    fn unknown_event_tags_are_refused() {
        assert!(serde_json::from_str::<ClientEvent>(r#"{"event":"drop-table","room":"r"}"#).is_err());
    }
}
