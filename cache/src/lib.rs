//! In-memory stores for Discord objects, fed by gateway dispatches and read
//! by anything holding the cache.

#[macro_use]
extern crate log;

use parking_lot::Mutex;

use accord_model::{
    channel::Channel,
    gateway::ReadyPacket,
    guild::Guild,
    message::Message,
    voice::VoiceState,
    Snowflake,
    User,
};

pub use errors::{Error, Result};
pub use records::{ChannelUserEntry, GuildUserEntry, VoiceStateKey};
pub use store::{Patch, Record, Store};

pub mod dispatch;
mod errors;
mod records;
mod store;

/// The bound on the message store, standing in for a soft memory ceiling of
/// roughly sixteen mebibytes of cached messages.
pub const MESSAGE_CACHE_LIMIT: usize = 4096;

/// The session snapshot taken from a READY dispatch.
#[derive(Clone, Debug, Default)]
pub struct ReadySnapshot {
    /// The gateway protocol version the session negotiated.
    pub version: i32,
    /// The user this session is authenticated as.
    pub user: User,
    /// The IDs of the guilds visible to this session.
    pub guild_ids: Vec<Snowflake>,
    /// The IDs of the private channels visible to this session.
    pub private_channel_ids: Vec<Snowflake>,
    /// The session ID, used for resuming.
    pub session_id: String,
}

impl ReadySnapshot {
    fn from_packet(ready: &ReadyPacket) -> Self {
        ReadySnapshot {
            version: ready.v,
            user: ready.user.clone(),
            guild_ids: ready.guilds.iter().map(|g| g.id).collect(),
            private_channel_ids: ready.private_channels.iter().map(|c| c.id).collect(),
            session_id: ready.session_id.clone(),
        }
    }
}

/// The main cache client: one store per cached entity kind.
///
/// Instances are independent, so tests can build disposable caches; a real
/// client holds exactly one for the lifetime of the program.
pub struct CacheClient {
    /// A store for caching Discord users.
    pub users: Store<User>,
    /// A store for caching Discord channels.
    pub channels: Store<Channel>,
    /// A store for caching Discord guilds.
    pub guilds: Store<Guild>,
    /// A bounded store for caching recent messages.
    pub messages: Store<Message>,
    /// Per-guild member state, keyed by guild and user.
    pub guild_users: Store<GuildUserEntry>,
    /// Per-channel member state, keyed by channel and user.
    pub channel_users: Store<ChannelUserEntry>,
    /// Voice states, keyed by guild, channel and user.
    pub voice_states: Store<VoiceState>,
    /// The snapshot taken from the most recent READY dispatch.
    pub ready: Mutex<Option<ReadySnapshot>>,
}

impl CacheClient {
    /// Creates a cache with the default message bound.
    pub fn new() -> Self {
        Self::with_message_limit(MESSAGE_CACHE_LIMIT)
    }

    /// Creates a cache bounding the message store to `limit` entries.
    pub fn with_message_limit(limit: usize) -> Self {
        CacheClient {
            users: Store::new(),
            channels: Store::new(),
            guilds: Store::new(),
            messages: Store::bounded(limit),
            guild_users: Store::new(),
            channel_users: Store::new(),
            voice_states: Store::new(),
            ready: Mutex::new(None),
        }
    }
}

impl Default for CacheClient {
    fn default() -> Self {
        CacheClient::new()
    }
}
