//! Per-resource views over the REST client.

pub use self::channel::ChannelView;
pub use self::guild::GuildView;

mod channel;
mod guild;

/// Percent-encodes an emoji (or any other path segment) for use in a route.
pub(crate) fn encode_segment(raw: &str) -> String {
    url::form_urlencoded::byte_serialize(raw.as_bytes()).collect()
}
