//! Per-room session actor.
//!
//! Each room is one tokio task consuming a command queue strictly in
//! arrival order. The task exclusively owns the seats and the game store,
//! which makes the read-occupancy-then-bind and read-state-then-commit
//! sequences atomic per room without any lock. Nothing is shared between
//! rooms.

use crate::bot;
use crate::error::SessionError;
use crate::registry::{Identity, Registry, RoomId};
use crate::store::GameStore;
use crate::wire::{GameKind, MovePayload, ServerEvent, Standing, StateView};
use parlor_core::{Outcome, Seat};
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, info, instrument, warn};

/// Queue depth of a room's command channel.
const CMD_BUFFER: usize = 64;
/// Buffer of a room's event fan-out channel.
const EVENT_BUFFER: usize = 256;
/// Display name of the automated opponent.
const BOT_NAME: &str = "Bot";

/// Whether a third participant is admitted as a spectator or refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpectatorPolicy {
    /// Extra participants observe; they can never mutate.
    Allow,
    /// Extra participants are rejected with a full-room error.
    Reject,
}

/// What kind of participant is bound to a seat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticipantKind {
    /// A connected client.
    Human,
    /// The automated opponent.
    Bot,
}

/// A participant bound to a seat.
#[derive(Debug, Clone)]
pub struct Participant {
    /// Stable identity, unique within the room.
    pub identity: Identity,
    /// Display name shown to the opponent.
    pub name: String,
    /// Human or bot.
    pub kind: ParticipantKind,
}

/// Session phase. Seat bindings only exist in the phases that allow them,
/// so illegal combinations are unrepresentable.
#[derive(Debug, Clone)]
enum Phase {
    /// Room spawned, no join processed yet.
    Empty,
    /// One seat bound, waiting for an opponent.
    Waiting {
        /// Occupant of the first seat.
        first: Participant,
    },
    /// Both seats bound, game live.
    Active {
        /// Occupant of the first seat.
        first: Participant,
        /// Occupant of the second seat.
        second: Participant,
    },
    /// Game over; seats stay bound until reset or leave.
    Finished {
        /// Occupant of the first seat.
        first: Participant,
        /// Occupant of the second seat.
        second: Participant,
        /// The immutable result.
        result: Outcome,
    },
}

/// Addressing for one fan-out event.
#[derive(Debug, Clone)]
pub enum Audience {
    /// Every subscriber.
    All,
    /// Every subscriber except the named identity.
    Exclude(Identity),
    /// Only the named identity.
    Only(Identity),
}

/// A fan-out event with its audience.
#[derive(Debug, Clone)]
pub struct Envelope {
    /// Who should see the event.
    pub audience: Audience,
    /// The event itself.
    pub event: ServerEvent,
}

impl Envelope {
    /// Whether the event should be delivered to the given identity.
    pub fn is_for(&self, identity: &str) -> bool {
        match &self.audience {
            Audience::All => true,
            Audience::Exclude(excluded) => excluded != identity,
            Audience::Only(only) => only == identity,
        }
    }
}

/// Successful join outcome.
#[derive(Debug)]
pub struct JoinReply {
    /// The sanitized room identifier actually joined.
    pub room: RoomId,
    /// Assigned standing.
    pub standing: Standing,
    /// The identity the participant is known by.
    pub identity: Identity,
    /// Opponent's display name, when the opposite seat is bound.
    pub opponent: Option<String>,
    /// The committed state at join time.
    pub view: StateView,
    /// Subscription to the room's event fan-out.
    pub events: broadcast::Receiver<Envelope>,
}

/// Commands processed by a room task, strictly in arrival order.
pub(crate) enum RoomCmd {
    Join {
        identity: Identity,
        name: String,
        vs_bot: bool,
        reply: oneshot::Sender<Result<JoinReply, SessionError>>,
    },
    Move {
        identity: Identity,
        payload: MovePayload,
        reply: oneshot::Sender<Result<StateView, SessionError>>,
    },
    BotMove {
        payload: MovePayload,
        epoch: u64,
    },
    Reset {
        identity: Identity,
        reply: oneshot::Sender<Result<StateView, SessionError>>,
    },
    Leave {
        identity: Identity,
    },
}

/// Handle to a live room task.
#[derive(Clone)]
pub(crate) struct RoomHandle {
    pub(crate) cmd: mpsc::Sender<RoomCmd>,
}

pub(crate) struct Room {
    id: RoomId,
    policy: SpectatorPolicy,
    store: GameStore,
    phase: Phase,
    /// Bumped on every reset; stale bot moves carry an older epoch.
    epoch: u64,
    events: broadcast::Sender<Envelope>,
    cmd_tx: mpsc::Sender<RoomCmd>,
    pending_bot: Option<tokio::task::JoinHandle<()>>,
    registry: Registry,
}

impl Room {
    /// Spawns the owning task for a new room and returns its handle.
    pub(crate) fn spawn(
        id: RoomId,
        kind: GameKind,
        policy: SpectatorPolicy,
        registry: Registry,
    ) -> RoomHandle {
        let (cmd_tx, cmd_rx) = mpsc::channel(CMD_BUFFER);
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        info!(room_id = %id, game = %kind, "Opening room");
        let room = Room {
            id,
            policy,
            store: GameStore::new(kind),
            phase: Phase::Empty,
            epoch: 0,
            events,
            cmd_tx: cmd_tx.clone(),
            pending_bot: None,
            registry,
        };
        tokio::spawn(room.run(cmd_rx));
        RoomHandle { cmd: cmd_tx }
    }

    async fn run(mut self, mut commands: mpsc::Receiver<RoomCmd>) {
        while let Some(cmd) = commands.recv().await {
            match cmd {
                RoomCmd::Join {
                    identity,
                    name,
                    vs_bot,
                    reply,
                } => {
                    let _ = reply.send(self.join(identity, name, vs_bot));
                }
                RoomCmd::Move {
                    identity,
                    payload,
                    reply,
                } => {
                    let result = self.submit(&identity, payload);
                    if let Err(err) = &result {
                        if matches!(
                            err,
                            SessionError::NotYourTurn | SessionError::IllegalMove(_)
                        ) {
                            // Resynchronize the rejected party to the last
                            // committed state; nothing was applied.
                            self.broadcast(
                                Audience::Only(identity.clone()),
                                ServerEvent::State {
                                    view: self.store.view(),
                                },
                            );
                        }
                    }
                    let _ = reply.send(result);
                }
                RoomCmd::BotMove { payload, epoch } => self.bot_move(payload, epoch),
                RoomCmd::Reset { identity, reply } => {
                    let _ = reply.send(self.reset(&identity));
                }
                RoomCmd::Leave { identity } => {
                    if self.leave(&identity) {
                        break;
                    }
                }
            }
        }
        self.teardown();
    }

    #[instrument(skip(self, name), fields(room_id = %self.id))]
    fn join(
        &mut self,
        identity: Identity,
        name: String,
        vs_bot: bool,
    ) -> Result<JoinReply, SessionError> {
        match self.phase.clone() {
            Phase::Empty => {
                let first = Participant {
                    identity: identity.clone(),
                    name,
                    kind: ParticipantKind::Human,
                };
                if vs_bot {
                    let second = Participant {
                        identity: format!("{}#bot", self.id),
                        name: BOT_NAME.to_string(),
                        kind: ParticipantKind::Bot,
                    };
                    info!(%identity, "Seat first bound; bot takes the second seat");
                    self.phase = Phase::Active {
                        first,
                        second: second.clone(),
                    };
                    Ok(self.join_reply(Standing::First, identity, Some(second.name)))
                } else {
                    info!(%identity, "Seat first bound; waiting for an opponent");
                    self.phase = Phase::Waiting { first };
                    Ok(self.join_reply(Standing::First, identity, None))
                }
            }
            Phase::Waiting { first } => {
                if first.identity == identity {
                    debug!(%identity, "Rejoin onto seat first");
                    return Ok(self.join_reply(Standing::First, identity, None));
                }
                let second = Participant {
                    identity: identity.clone(),
                    name: name.clone(),
                    kind: ParticipantKind::Human,
                };
                info!(%identity, opponent = %first.name, "Seat second bound; game starts");
                self.phase = Phase::Active {
                    first: first.clone(),
                    second,
                };
                self.broadcast(
                    Audience::Exclude(identity.clone()),
                    ServerEvent::OpponentJoined { name },
                );
                self.broadcast(
                    Audience::All,
                    ServerEvent::State {
                        view: self.store.view(),
                    },
                );
                Ok(self.join_reply(Standing::Second, identity, Some(first.name)))
            }
            Phase::Active { first, second } => {
                self.occupied_join(identity, first, second)
            }
            Phase::Finished {
                first,
                second,
                result,
            } => {
                let reply = self.occupied_join(identity, first, second)?;
                // A participant arriving after the fact still learns how the
                // game ended.
                self.broadcast(
                    Audience::Only(reply.identity.clone()),
                    ServerEvent::GameOver { result },
                );
                Ok(reply)
            }
        }
    }

    fn occupied_join(
        &mut self,
        identity: Identity,
        first: Participant,
        second: Participant,
    ) -> Result<JoinReply, SessionError> {
        if first.identity == identity {
            debug!(%identity, "Rejoin onto seat first");
            Ok(self.join_reply(Standing::First, identity, Some(second.name)))
        } else if second.identity == identity {
            debug!(%identity, "Rejoin onto seat second");
            Ok(self.join_reply(Standing::Second, identity, Some(first.name)))
        } else {
            match self.policy {
                SpectatorPolicy::Allow => {
                    debug!(%identity, "Admitted as spectator");
                    Ok(self.join_reply(Standing::Spectator, identity, None))
                }
                SpectatorPolicy::Reject => {
                    warn!(%identity, "Join refused, room is full");
                    Err(SessionError::RoomFull)
                }
            }
        }
    }

    fn join_reply(
        &self,
        standing: Standing,
        identity: Identity,
        opponent: Option<String>,
    ) -> JoinReply {
        JoinReply {
            room: self.id.clone(),
            standing,
            identity,
            opponent,
            view: self.store.view(),
            events: self.events.subscribe(),
        }
    }

    #[instrument(skip(self, payload), fields(room_id = %self.id))]
    fn submit(&mut self, identity: &str, payload: MovePayload) -> Result<StateView, SessionError> {
        let seat = self.seat_of(identity)?;
        if self.store.game().to_move() != seat {
            warn!(identity, "Move out of turn");
            return Err(SessionError::NotYourTurn);
        }

        let expected = self.store.version();
        let next = self.store.game().apply(&payload)?;
        let view = self
            .store
            .commit(expected, next, identity.to_string(), payload)?;

        self.broadcast(
            Audience::All,
            ServerEvent::State { view: view.clone() },
        );
        if view.result.is_terminal() {
            self.finish(view.result);
        } else {
            self.maybe_schedule_bot();
        }
        info!(identity, version = view.version, "Move committed");
        Ok(view)
    }

    fn seat_of(&self, identity: &str) -> Result<Seat, SessionError> {
        match &self.phase {
            Phase::Empty | Phase::Waiting { .. } => Err(SessionError::NotYourTurn),
            Phase::Finished { .. } => Err(SessionError::GameAlreadyFinished),
            Phase::Active { first, second } => {
                if first.identity == identity {
                    Ok(Seat::First)
                } else if second.identity == identity {
                    Ok(Seat::Second)
                } else {
                    // Spectators and strangers never hold a turn.
                    Err(SessionError::NotYourTurn)
                }
            }
        }
    }

    fn finish(&mut self, result: Outcome) {
        if let Some(pending) = self.pending_bot.take() {
            pending.abort();
        }
        if let Phase::Active { first, second } = self.phase.clone() {
            self.phase = Phase::Finished {
                first,
                second,
                result,
            };
        }
        info!(room_id = %self.id, ?result, "Game over");
        self.broadcast(Audience::All, ServerEvent::GameOver { result });
    }

    fn bot_move(&mut self, payload: MovePayload, epoch: u64) {
        if epoch != self.epoch {
            debug!(room_id = %self.id, epoch, current = self.epoch, "Stale bot move dropped");
            return;
        }
        let Some(bot) = self.bot_participant() else {
            return;
        };
        if let Err(err) = self.submit(&bot.identity, payload) {
            warn!(room_id = %self.id, %err, "Bot move rejected");
        }
    }

    fn bot_participant(&self) -> Option<Participant> {
        if let Phase::Active { first, second } = &self.phase {
            [first, second]
                .into_iter()
                .find(|p| p.kind == ParticipantKind::Bot)
                .cloned()
        } else {
            None
        }
    }

    /// Schedules the bot's reply when the active seat is bot-controlled.
    /// Any previously pending reply is cancelled first, so at most one is
    /// ever outstanding per room.
    fn maybe_schedule_bot(&mut self) {
        let Phase::Active { first, second } = &self.phase else {
            return;
        };
        let mover = match self.store.game().to_move() {
            Seat::First => first,
            Seat::Second => second,
        };
        if mover.kind != ParticipantKind::Bot {
            return;
        }
        if let Some(pending) = self.pending_bot.take() {
            pending.abort();
        }
        debug!(room_id = %self.id, "Scheduling bot reply");
        self.pending_bot = Some(tokio::spawn(bot::reply_after_delay(
            self.id.clone(),
            self.store.game().clone(),
            self.epoch,
            self.cmd_tx.clone(),
        )));
    }

    #[instrument(skip(self), fields(room_id = %self.id))]
    fn reset(&mut self, identity: &str) -> Result<StateView, SessionError> {
        match self.phase.clone() {
            Phase::Empty => Err(SessionError::NotYourTurn),
            Phase::Waiting { first } => {
                if first.identity != identity {
                    return Err(SessionError::NotYourTurn);
                }
                self.begin_new_game();
                Ok(self.store.view())
            }
            Phase::Active { first, second } | Phase::Finished { first, second, .. } => {
                if first.identity != identity && second.identity != identity {
                    return Err(SessionError::NotYourTurn);
                }
                // Seats swap so first-move advantage alternates across
                // rematches in the same room.
                self.phase = Phase::Active {
                    first: second,
                    second: first,
                };
                self.begin_new_game();
                self.maybe_schedule_bot();
                Ok(self.store.view())
            }
        }
    }

    fn begin_new_game(&mut self) {
        if let Some(pending) = self.pending_bot.take() {
            pending.abort();
        }
        self.epoch += 1;
        self.store.reset();
        info!(room_id = %self.id, epoch = self.epoch, "Board reset");
        self.broadcast(Audience::All, ServerEvent::Reset);
        self.broadcast(
            Audience::All,
            ServerEvent::State {
                view: self.store.view(),
            },
        );
    }

    /// Returns true when the room should shut down.
    fn leave(&mut self, identity: &str) -> bool {
        match &self.phase {
            Phase::Empty => false,
            Phase::Waiting { first } => {
                if first.identity == identity {
                    info!(room_id = %self.id, identity, "Creator left before the game started");
                    true
                } else {
                    false
                }
            }
            Phase::Active { first, second } | Phase::Finished { first, second, .. } => {
                if first.identity == identity || second.identity == identity {
                    info!(room_id = %self.id, identity, "Seat holder left; closing room");
                    self.broadcast(
                        Audience::Exclude(identity.to_string()),
                        ServerEvent::OpponentLeft,
                    );
                    true
                } else {
                    debug!(room_id = %self.id, identity, "Spectator left");
                    false
                }
            }
        }
    }

    fn teardown(&mut self) {
        if let Some(pending) = self.pending_bot.take() {
            pending.abort();
        }
        self.registry.remove(&self.id, &self.cmd_tx);
        info!(room_id = %self.id, "Room closed");
    }

    fn broadcast(&self, audience: Audience, event: ServerEvent) {
        // A send error only means nobody is subscribed right now.
        let _ = self.events.send(Envelope { audience, event });
    }
}
