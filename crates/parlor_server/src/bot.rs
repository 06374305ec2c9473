//! Automated-opponent scheduling.
//!
//! The bot's reply is delayed by a fixed short interval after the human
//! move commits, so it reads as a thinking pause. The delay task is
//! cancellable (aborting a finished or already-aborted task is a no-op) and
//! the room keeps at most one pending. The search itself runs here, off the
//! room task's queue; only the chosen move is sent back, through the same
//! validation path as any client move.

use crate::game::AnyGame;
use crate::registry::RoomId;
use crate::room::RoomCmd;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Pause between the human commit and the bot's reply.
pub const THINKING_DELAY: Duration = Duration::from_millis(350);

/// Sleeps out the thinking pause, searches, and feeds the move back.
///
/// `epoch` is the room's reset epoch at scheduling time; the room drops the
/// move if a reset has happened since.
pub(crate) async fn reply_after_delay(
    room_id: RoomId,
    game: AnyGame,
    epoch: u64,
    commands: mpsc::Sender<RoomCmd>,
) {
    tokio::time::sleep(THINKING_DELAY).await;
    match game.select_bot_move() {
        Ok(payload) => {
            debug!(%room_id, ?payload, "Bot reply ready");
            if commands.send(RoomCmd::BotMove { payload, epoch }).await.is_err() {
                debug!(%room_id, "Room closed before the bot reply was delivered");
            }
        }
        Err(err) => warn!(%room_id, %err, "Bot had no move to play"),
    }
}
