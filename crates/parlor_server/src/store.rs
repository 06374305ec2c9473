//! Authoritative game store for one room.
//!
//! Owns the committed game state, a monotonically increasing version equal
//! to the number of committed moves, and the append-only move history.
//! Commits are compare-and-set against the expected version: a writer that
//! read a stale state is detected at commit time instead of silently
//! overwriting. The room task serializes writers, so a conflict here means a
//! caller skipped the serialization point.

use crate::game::AnyGame;
use crate::wire::{GameKind, MovePayload, StateView};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, instrument};

/// A committed move. Write-once; records are never edited or deleted.
#[derive(Debug, Clone, Serialize, derive_getters::Getters)]
pub struct MoveRecord {
    /// Identity that made the move.
    actor: String,
    /// The move as submitted.
    payload: MovePayload,
    /// When the move committed.
    at: DateTime<Utc>,
    /// Version of the state this move produced.
    version: u64,
}

/// A commit raced with another writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
#[display("Stale commit: expected version {}, store is at {}", expected, found)]
pub struct CommitConflict {
    /// Version the writer read before computing its update.
    pub expected: u64,
    /// Version actually in the store.
    pub found: u64,
}

impl std::error::Error for CommitConflict {}

/// Versioned authoritative state of one room's game.
#[derive(Debug)]
pub struct GameStore {
    game: AnyGame,
    version: u64,
    history: Vec<MoveRecord>,
}

impl GameStore {
    /// Creates a store holding the starting position for the kind.
    pub fn new(kind: GameKind) -> Self {
        Self {
            game: AnyGame::new(kind),
            version: 0,
            history: Vec::new(),
        }
    }

    /// The committed game state.
    pub fn game(&self) -> &AnyGame {
        &self.game
    }

    /// The committed version (move count).
    pub fn version(&self) -> u64 {
        self.version
    }

    /// All committed moves, oldest first.
    pub fn history(&self) -> &[MoveRecord] {
        &self.history
    }

    /// The wire view of the committed state.
    pub fn view(&self) -> StateView {
        self.game.view(self.version)
    }

    /// Commits a successor state computed against `expected`.
    ///
    /// # Errors
    ///
    /// [`CommitConflict`] when `expected` is not the current version; the
    /// store is unchanged and the caller must re-read and retry.
    #[instrument(skip(self, next, payload), fields(expected))]
    pub fn commit(
        &mut self,
        expected: u64,
        next: AnyGame,
        actor: String,
        payload: MovePayload,
    ) -> Result<StateView, CommitConflict> {
        if expected != self.version {
            return Err(CommitConflict {
                expected,
                found: self.version,
            });
        }
        self.version += 1;
        self.history.push(MoveRecord {
            actor,
            payload,
            at: Utc::now(),
            version: self.version,
        });
        self.game = next;
        debug!(version = self.version, "State committed");
        Ok(self.view())
    }

    /// Clears back to the starting position and empties the history.
    pub fn reset(&mut self) {
        self.game = AnyGame::new(self.game.kind());
        self.version = 0;
        self.history.clear();
    }
}
