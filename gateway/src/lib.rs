//! A client for the Discord gateway: connection lifecycle, heartbeating,
//! session resumption and dispatch fan-out.

#[macro_use]
extern crate log;

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::sync::Arc;

use accord_model::gateway::ReceivePacket;
use accord_model::presence::ClientPresence;

pub use errors::{Error, Result};
pub use limiter::{
    connect_cooldown,
    identify_limiter,
    send_limiter,
    status_limiter,
    Cooldown,
    SlidingWindow,
};
pub use shard::{close_policy, ClosePolicy, Shard};

mod constants;
mod errors;
mod limiter;
mod session;
mod shard;

/// The frame encoding negotiated with the gateway at connect time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Json,
    Etf,
}

impl Display for Encoding {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        match self {
            Encoding::Json => f.write_str("json"),
            Encoding::Etf => f.write_str("etf"),
        }
    }
}

/// Options for creating a new shard.
#[derive(Debug, Clone)]
pub struct ShardOptions {
    /// The wire encoding to negotiate.
    pub encoding: Encoding,
    /// The shard's ID and the total number of shards.
    pub shard: [u64; 2],
    /// The presence to identify with.
    pub presence: Option<ClientPresence>,
    /// A gateway URL to use instead of asking the API for one.
    pub gateway_url: Option<String>,
}

impl Default for ShardOptions {
    fn default() -> Self {
        ShardOptions {
            encoding: Encoding::Json,
            shard: [0, 1],
            presence: None,
            gateway_url: None,
        }
    }
}

/// The event handler trait, used for receiving packets from the gateway.
///
/// Dispatches are delivered from freshly spawned tasks, so a handler may
/// take its time without stalling the receive loop.
pub trait EventHandler: Send + Sync {
    /// Executed whenever a dispatch packet is received.
    fn on_packet(&self, _shard: &Arc<Shard>, _packet: ReceivePacket) {}
}
