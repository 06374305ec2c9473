//! Server configuration.

use crate::room::SpectatorPolicy;
use clap::Parser;
use std::net::SocketAddr;

/// Command-line configuration for the session server.
#[derive(Debug, Clone, Parser)]
#[command(name = "parlor_server", about = "Turn-based two-player game session server")]
pub struct Config {
    /// Address to listen on.
    #[arg(long, default_value = "127.0.0.1:3000")]
    pub bind: SocketAddr,

    /// Refuse a third participant instead of admitting them as a spectator.
    #[arg(long)]
    pub reject_spectators: bool,
}

impl Config {
    /// The spectator policy implied by the flags.
    pub fn spectator_policy(&self) -> SpectatorPolicy {
        if self.reject_spectators {
            SpectatorPolicy::Reject
        } else {
            SpectatorPolicy::Allow
        }
    }
}
