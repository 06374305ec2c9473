//! WebSocket transport.
//!
//! One socket per participant. Client messages are decoded into the closed
//! [`ClientEvent`] set at this boundary; room events are filtered by
//! audience and forwarded in commit order. A dropped socket releases the
//! participant's seat as if it had sent leave-room.

use crate::error::SessionError;
use crate::registry::{Identity, Registry, RoomId};
use crate::room::Envelope;
use crate::wire::{ClientEvent, ServerEvent};
use axum::Router;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use axum::routing::get;
use futures::{SinkExt, StreamExt};
use futures::stream::SplitSink;
use tokio::sync::broadcast;
use tracing::{debug, info, instrument, warn};

/// Builds the server's router around an injected registry.
pub fn router(registry: Registry) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .with_state(registry)
}

async fn ws_handler(
    upgrade: WebSocketUpgrade,
    State(registry): State<Registry>,
) -> impl IntoResponse {
    upgrade.on_upgrade(move |socket| handle_socket(socket, registry))
}

/// Room membership of one connection.
struct Membership {
    room: RoomId,
    identity: Identity,
    events: broadcast::Receiver<Envelope>,
}

#[instrument(skip(socket, registry))]
async fn handle_socket(socket: WebSocket, registry: Registry) {
    let (mut sink, mut stream) = socket.split();
    let mut membership: Option<Membership> = None;
    info!("Client connected");

    loop {
        let step = match &mut membership {
            Some(live) => {
                tokio::select! {
                    message = stream.next() => Step::Client(message),
                    event = live.events.recv() => Step::Room(event),
                }
            }
            None => Step::Client(stream.next().await),
        };

        match step {
            Step::Client(None) => break,
            Step::Client(Some(Err(err))) => {
                debug!(%err, "Socket error");
                break;
            }
            Step::Client(Some(Ok(message))) => {
                match handle_message(message, &registry, &mut membership, &mut sink).await {
                    Flow::Continue => {}
                    Flow::Close => break,
                }
            }
            Step::Room(Ok(envelope)) => {
                let deliver = membership
                    .as_ref()
                    .is_some_and(|live| envelope.is_for(&live.identity));
                if deliver && send_event(&mut sink, &envelope.event).await.is_err() {
                    break;
                }
            }
            Step::Room(Err(broadcast::error::RecvError::Closed)) => {
                // The room tore down; any opponent-left notice already
                // arrived ahead of the close.
                debug!("Room event channel closed");
                membership = None;
            }
            Step::Room(Err(broadcast::error::RecvError::Lagged(skipped))) => {
                warn!(skipped, "Client fell behind on room events");
            }
        }
    }

    // Disconnect releases the seat like an explicit leave.
    if let Some(live) = membership {
        registry.leave(&live.room, live.identity).await;
    }
    info!("Client disconnected");
}

enum Step {
    Client(Option<Result<Message, axum::Error>>),
    Room(Result<Envelope, broadcast::error::RecvError>),
}

enum Flow {
    Continue,
    Close,
}

async fn handle_message(
    message: Message,
    registry: &Registry,
    membership: &mut Option<Membership>,
    sink: &mut SplitSink<WebSocket, Message>,
) -> Flow {
    let text = match message {
        Message::Text(text) => text,
        Message::Close(_) => return Flow::Close,
        // Pings are answered by the transport; anything else is ignored.
        _ => return Flow::Continue,
    };

    let event = match serde_json::from_str::<ClientEvent>(&text) {
        Ok(event) => event,
        Err(err) => {
            warn!(%err, "Undecodable client message dropped");
            return Flow::Continue;
        }
    };

    match event {
        ClientEvent::CreateOrJoin {
            room,
            name,
            game,
            identity,
            vs_bot,
        } => {
            // Joining somewhere else first releases the current seat.
            if let Some(live) = membership.take() {
                registry.leave(&live.room, live.identity).await;
            }
            match registry
                .create_or_join(&room, &name, game, identity, vs_bot)
                .await
            {
                Ok(reply) => {
                    let joined = ServerEvent::Joined {
                        standing: reply.standing,
                        identity: reply.identity.clone(),
                        opponent: reply.opponent,
                    };
                    let state = ServerEvent::State { view: reply.view };
                    *membership = Some(Membership {
                        room: reply.room,
                        identity: reply.identity,
                        events: reply.events,
                    });
                    if send_event(sink, &joined).await.is_err()
                        || send_event(sink, &state).await.is_err()
                    {
                        return Flow::Close;
                    }
                }
                Err(err) => {
                    if send_event(sink, &event_for_error(&err)).await.is_err() {
                        return Flow::Close;
                    }
                }
            }
        }
        ClientEvent::SubmitMove { room, mv } => {
            let Some(live) = membership.as_ref() else {
                return respond(sink, ServerEvent::RoomNotFound).await;
            };
            if let Err(err) = registry.submit_move(&room, live.identity.clone(), mv).await {
                // The accepted state arrives through the room fan-out; only
                // rejections are answered directly.
                return respond(sink, event_for_error(&err)).await;
            }
        }
        ClientEvent::LeaveRoom { room } => {
            let leaving = membership
                .as_ref()
                .is_some_and(|live| live.room == crate::registry::sanitize_room_id(&room));
            if leaving {
                if let Some(live) = membership.take() {
                    registry.leave(&live.room, live.identity).await;
                }
            }
        }
        ClientEvent::Reset { room } => {
            let Some(live) = membership.as_ref() else {
                return respond(sink, ServerEvent::RoomNotFound).await;
            };
            if let Err(err) = registry.reset(&room, live.identity.clone()).await {
                return respond(sink, event_for_error(&err)).await;
            }
        }
    }
    Flow::Continue
}

async fn respond(sink: &mut SplitSink<WebSocket, Message>, event: ServerEvent) -> Flow {
    if send_event(sink, &event).await.is_err() {
        Flow::Close
    } else {
        Flow::Continue
    }
}

async fn send_event(
    sink: &mut SplitSink<WebSocket, Message>,
    event: &ServerEvent,
) -> Result<(), axum::Error> {
    let json = serde_json::to_string(event).map_err(axum::Error::new)?;
    sink.send(Message::Text(json.into())).await
}

/// Rejections map to their dedicated events where the contract has one.
fn event_for_error(err: &SessionError) -> ServerEvent {
    match err {
        SessionError::RoomFull => ServerEvent::RoomFull,
        SessionError::RoomNotFound => ServerEvent::RoomNotFound,
        other => ServerEvent::Rejected {
            reason: other.reject_reason(),
        },
    }
}
