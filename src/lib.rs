//! A Discord real-time client library.
//!
//! The [`Client`] binds the three engines together: the REST client for
//! issuing API calls, a gateway shard for the event stream, and the entity
//! cache that gateway dispatches keep warm. Per-resource handles are
//! exposed through [`Client::channel`] and [`Client::guild`].

#[macro_use]
extern crate log;

use std::sync::Arc;

pub use accord_cache as cache;
pub use accord_etf as etf;
pub use accord_gateway as gateway;
pub use accord_model as model;
pub use accord_rest as rest;

use accord_cache::CacheClient;
use accord_gateway::{EventHandler, Shard, ShardOptions};
use accord_model::gateway::ReceivePacket;
use accord_model::Snowflake;
use accord_rest::{ChannelView, GuildView, RestClient};

pub use errors::{Error, Result};
pub use expr::process_expr;

mod errors;
pub mod expr;

/// The main entry point: a REST client, a gateway shard and the cache they
/// share, bound together.
pub struct Client {
    /// The REST client used for API calls.
    pub rest: RestClient,
    /// The gateway shard owned by this client.
    pub shard: Arc<Shard>,
    /// The entity cache fed by gateway dispatches.
    pub cache: Arc<CacheClient>,
}

impl Client {
    /// Creates a client with default shard options.
    pub fn new(token: &str) -> Client {
        Client::with_options(token, ShardOptions::default())
    }

    /// Creates a client with the provided shard options.
    pub fn with_options(token: &str, options: ShardOptions) -> Client {
        Client {
            rest: RestClient::new(token.to_string(), true),
            shard: Arc::new(Shard::new(token.to_string(), options)),
            cache: Arc::new(CacheClient::new()),
        }
    }

    /// Opens a view onto a channel.
    pub fn channel(&self, id: Snowflake) -> ChannelView {
        self.rest.channel(id)
    }

    /// Opens a view onto a guild.
    pub fn guild(&self, id: Snowflake) -> GuildView {
        self.rest.guild(id)
    }

    /// Connects the gateway and runs until disconnected or failed.
    ///
    /// Every dispatch is applied to the cache before the handler sees it,
    /// so handlers observe a cache that already includes their event.
    pub async fn start<H>(&self, handler: H) -> Result<()>
    where
        H: EventHandler + 'static,
    {
        let dispatcher = Arc::new(Dispatcher {
            cache: Arc::clone(&self.cache),
            inner: handler,
        });
        Arc::clone(&self.shard).run(dispatcher).await.map_err(Error::from)
    }
}

struct Dispatcher<H: EventHandler> {
    cache: Arc<CacheClient>,
    inner: H,
}

impl<H: EventHandler> EventHandler for Dispatcher<H> {
    fn on_packet(&self, shard: &Arc<Shard>, packet: ReceivePacket) {
        if let Some(event) = packet.t {
            trace!("Applying {} to the cache.", event);
            accord_cache::dispatch::apply(&self.cache, event, &packet.d);
        }
        self.inner.on_packet(shard, packet);
    }
}
