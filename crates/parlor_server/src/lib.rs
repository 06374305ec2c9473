//! Parlor session server — turn-based two-player game rooms.
//!
//! # Architecture
//!
//! - **Registry**: session directory mapping sanitized room identifiers to
//!   live rooms, injected wherever it is needed
//! - **Room**: one owning tokio task per room serializing joins, moves and
//!   resets, fanning committed state out to every participant
//! - **Store**: versioned authoritative game state with compare-and-set
//!   commits and an append-only move history
//! - **Bot**: fixed-depth search scheduled on a cancellable timer after each
//!   human commit
//! - **Transport**: axum WebSocket endpoint speaking the tagged event
//!   protocol in [`wire`]
//!
//! # Example
//!
//! ```no_run
//! use parlor_server::{Registry, SpectatorPolicy};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let registry = Registry::new(SpectatorPolicy::Allow);
//! let app = parlor_server::router(registry);
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod bot;
mod config;
mod error;
mod game;
mod registry;
mod room;
mod score;
mod store;
mod ws;

pub mod wire;

// Crate-level exports - configuration
pub use config::Config;

// Crate-level exports - error taxonomy
pub use error::SessionError;

// Crate-level exports - game dispatch
pub use game::AnyGame;

// Crate-level exports - session directory
pub use registry::{Identity, Registry, RoomId, sanitize_room_id};

// Crate-level exports - room types
pub use room::{Audience, Envelope, JoinReply, Participant, ParticipantKind, SpectatorPolicy};

// Crate-level exports - score tally
pub use score::Scoreboard;

// Crate-level exports - state store
pub use store::{CommitConflict, GameStore, MoveRecord};

// Crate-level exports - bot timing
pub use bot::THINKING_DELAY;

// Crate-level exports - transport
pub use ws::router;
