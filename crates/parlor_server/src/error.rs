//! Error taxonomy for the session subsystem.
//!
//! Everything here is recoverable and reported to the requesting participant
//! only; no error crosses rooms or ends the process.

use crate::store::CommitConflict;
use crate::wire::RejectReason;
use parlor_core::IllegalMove;

/// A rejected session operation.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum SessionError {
    /// Both seats are bound and the room refuses spectators.
    #[display("Room is full")]
    RoomFull,
    /// The room does not exist (or was torn down mid-request).
    #[display("Room not found")]
    RoomNotFound,
    /// The acting identity does not hold the seat whose turn it is.
    #[display("Not your turn")]
    NotYourTurn,
    /// The rule engine refused the move.
    #[display("Illegal move: {}", _0)]
    IllegalMove(IllegalMove),
    /// The game already has a terminal result.
    #[display("Game is already finished")]
    GameAlreadyFinished,
    /// A bot move was requested from a terminal position.
    #[display("No legal moves to search")]
    SearchExhausted,
    /// A concurrent writer committed first.
    #[display("Concurrent update conflict")]
    Conflict,
}

impl std::error::Error for SessionError {}

impl SessionError {
    /// The wire-level reject reason for this error.
    pub fn reject_reason(&self) -> RejectReason {
        match self {
            SessionError::RoomFull => RejectReason::RoomFull,
            SessionError::RoomNotFound => RejectReason::RoomNotFound,
            SessionError::NotYourTurn => RejectReason::NotYourTurn,
            SessionError::IllegalMove(_) => RejectReason::IllegalMove,
            SessionError::GameAlreadyFinished => RejectReason::GameAlreadyFinished,
            SessionError::SearchExhausted => RejectReason::SearchExhausted,
            SessionError::Conflict => RejectReason::Conflict,
        }
    }
}

impl From<IllegalMove> for SessionError {
    fn from(err: IllegalMove) -> Self {
        match err {
            IllegalMove::GameOver => SessionError::GameAlreadyFinished,
            other => SessionError::IllegalMove(other),
        }
    }
}

impl From<CommitConflict> for SessionError {
    fn from(_: CommitConflict) -> Self {
        SessionError::Conflict
    }
}
