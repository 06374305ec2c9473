//! Session directory: sanitized room identifiers → live room handles.
//!
//! The registry is an injected object, passed by handle to whatever needs
//! it — never ambient global state. Its mutex guards map membership only and
//! is never held across a room operation; everything per-room goes through
//! that room's own task.

use crate::error::SessionError;
use crate::room::{JoinReply, Room, RoomCmd, RoomHandle, SpectatorPolicy};
use crate::wire::{GameKind, MovePayload, StateView};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, instrument};

/// Room identifier, sanitized before use as a lookup key.
pub type RoomId = String;

/// Stable participant identity.
pub type Identity = String;

/// Longest accepted room identifier.
const MAX_ROOM_ID_LEN: usize = 64;
/// Key used when sanitization leaves nothing.
const FALLBACK_ROOM_ID: &str = "default";
/// Attempts to land a join while rooms may be tearing down underneath it.
const JOIN_ATTEMPTS: usize = 3;

/// Restricts a raw identifier to `[A-Za-z0-9_-]`, truncated to
/// [`MAX_ROOM_ID_LEN`], falling back to [`FALLBACK_ROOM_ID`] when empty.
///
/// Mandatory before any lookup so malformed or oversized keys never enter
/// the directory.
pub fn sanitize_room_id(raw: &str) -> RoomId {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .take(MAX_ROOM_ID_LEN)
        .collect();
    if cleaned.is_empty() {
        FALLBACK_ROOM_ID.to_string()
    } else {
        cleaned
    }
}

/// The session directory. Cheap to clone; clones share the directory.
#[derive(Clone)]
pub struct Registry {
    inner: Arc<Inner>,
}

struct Inner {
    rooms: Mutex<HashMap<RoomId, RoomHandle>>,
    policy: SpectatorPolicy,
    guests: AtomicU64,
}

impl Registry {
    /// Creates an empty directory with the given spectator policy.
    pub fn new(policy: SpectatorPolicy) -> Self {
        info!(?policy, "Creating session registry");
        Self {
            inner: Arc::new(Inner {
                rooms: Mutex::new(HashMap::new()),
                policy,
                guests: AtomicU64::new(0),
            }),
        }
    }

    /// Binds a seat in the room, creating it on first join.
    ///
    /// When `identity` is absent a fresh guest identity is assigned and
    /// returned in the reply.
    ///
    /// # Errors
    ///
    /// [`SessionError::RoomFull`] under the rejecting spectator policy, or
    /// [`SessionError::RoomNotFound`] if the room keeps vanishing mid-join.
    #[instrument(skip(self, name))]
    pub async fn create_or_join(
        &self,
        raw_room: &str,
        name: &str,
        game: GameKind,
        identity: Option<Identity>,
        vs_bot: bool,
    ) -> Result<JoinReply, SessionError> {
        let room_id = sanitize_room_id(raw_room);
        let identity = identity.unwrap_or_else(|| self.assign_identity());

        // A room can tear down between lookup and send; retry against a
        // fresh handle a bounded number of times.
        for _ in 0..JOIN_ATTEMPTS {
            let handle = self.get_or_spawn(&room_id, game);
            let (tx, rx) = oneshot::channel();
            let cmd = RoomCmd::Join {
                identity: identity.clone(),
                name: name.to_string(),
                vs_bot,
                reply: tx,
            };
            if handle.cmd.send(cmd).await.is_err() {
                debug!(%room_id, "Room closed mid-join; retrying");
                continue;
            }
            match rx.await {
                Ok(result) => return result,
                Err(_) => {
                    debug!(%room_id, "Room dropped the join reply; retrying");
                    continue;
                }
            }
        }
        Err(SessionError::RoomNotFound)
    }

    /// Submits a move to the room's validation path.
    ///
    /// # Errors
    ///
    /// Any [`SessionError`] reject reason; committed state is unchanged on
    /// rejection.
    #[instrument(skip(self, payload))]
    pub async fn submit_move(
        &self,
        raw_room: &str,
        identity: Identity,
        payload: MovePayload,
    ) -> Result<StateView, SessionError> {
        let (tx, rx) = oneshot::channel();
        self.send_to_room(raw_room, RoomCmd::Move {
            identity,
            payload,
            reply: tx,
        })
        .await?;
        rx.await.map_err(|_| SessionError::RoomNotFound)?
    }

    /// Clears the room's game and swaps its seats.
    ///
    /// # Errors
    ///
    /// [`SessionError::NotYourTurn`] when the requester holds no seat, or
    /// [`SessionError::RoomNotFound`].
    #[instrument(skip(self))]
    pub async fn reset(
        &self,
        raw_room: &str,
        identity: Identity,
    ) -> Result<StateView, SessionError> {
        let (tx, rx) = oneshot::channel();
        self.send_to_room(raw_room, RoomCmd::Reset {
            identity,
            reply: tx,
        })
        .await?;
        rx.await.map_err(|_| SessionError::RoomNotFound)?
    }

    /// Releases the identity's seat. A seat holder leaving closes the room.
    #[instrument(skip(self))]
    pub async fn leave(&self, raw_room: &str, identity: Identity) {
        // The room may already be gone; leaving is best-effort.
        let _ = self
            .send_to_room(raw_room, RoomCmd::Leave { identity })
            .await;
    }

    /// Number of live rooms.
    pub fn room_count(&self) -> usize {
        self.lock_rooms().len()
    }

    async fn send_to_room(&self, raw_room: &str, cmd: RoomCmd) -> Result<(), SessionError> {
        let room_id = sanitize_room_id(raw_room);
        let handle = self
            .lookup(&room_id)
            .ok_or(SessionError::RoomNotFound)?;
        handle
            .cmd
            .send(cmd)
            .await
            .map_err(|_| SessionError::RoomNotFound)
    }

    fn lookup(&self, room_id: &str) -> Option<RoomHandle> {
        self.lock_rooms().get(room_id).cloned()
    }

    fn get_or_spawn(&self, room_id: &str, game: GameKind) -> RoomHandle {
        let mut rooms = self.lock_rooms();
        if let Some(handle) = rooms.get(room_id) {
            if !handle.cmd.is_closed() {
                return handle.clone();
            }
        }
        let handle = Room::spawn(
            room_id.to_string(),
            game,
            self.inner.policy,
            self.clone(),
        );
        rooms.insert(room_id.to_string(), handle.clone());
        handle
    }

    /// Removes a room's entry, but only if it still maps to that room's
    /// channel — a replacement spawned under the same identifier stays.
    pub(crate) fn remove(&self, room_id: &str, cmd: &mpsc::Sender<RoomCmd>) {
        let mut rooms = self.lock_rooms();
        if let Some(handle) = rooms.get(room_id) {
            if handle.cmd.same_channel(cmd) {
                rooms.remove(room_id);
            }
        }
    }

    fn assign_identity(&self) -> Identity {
        let n = self.inner.guests.fetch_add(1, Ordering::Relaxed) + 1;
        format!("guest-{n}")
    }

    fn lock_rooms(&self) -> std::sync::MutexGuard<'_, HashMap<RoomId, RoomHandle>> {
        self.inner.rooms.lock().unwrap()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new(SpectatorPolicy::Allow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitization_strips_truncates_and_falls_back() {
        assert_eq!(sanitize_room_id("AB CD!!"), "ABCD");
        assert_eq!(sanitize_room_id("room-1_x"), "room-1_x");
        assert_eq!(sanitize_room_id(""), "default");
        assert_eq!(sanitize_room_id("é+&"), "default");

        let long = "a".repeat(80);
        assert_eq!(sanitize_room_id(&long).len(), 64);
    }
}
