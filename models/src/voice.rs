//! Structures for interfacing with Discord's voice related features.
use serde::{Deserialize, Serialize};

use crate::Snowflake;

/// Represents a user's voice connection status.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct VoiceState {
    /// The guild ID of the guild this voice state belongs to.
    #[serde(default)]
    pub guild_id: Snowflake,
    /// The channel ID of the channel the user is connected to, if any.
    #[serde(default)]
    pub channel_id: Option<Snowflake>,
    /// The user ID of the user this voice state belongs to.
    #[serde(default)]
    pub user_id: Snowflake,
    /// The session ID of this voice state.
    #[serde(default)]
    pub session_id: String,
    /// Whether or not the user is deafened on the server.
    #[serde(default)]
    pub deaf: bool,
    /// Whether or not the user is muted on the server.
    #[serde(default)]
    pub mute: bool,
    /// Whether or not the user is locally deafened.
    #[serde(default)]
    pub self_deaf: bool,
    /// Whether or not the user is locally muted.
    #[serde(default)]
    pub self_mute: bool,
    /// Whether or not the user was muted by the current user.
    #[serde(default)]
    pub suppress: bool,
}

/// Represents a Discord voice region.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct VoiceRegion {
    /// The ID of this voice region.
    #[serde(default)]
    pub id: String,
    /// The name of this voice region.
    #[serde(default)]
    pub name: String,
    /// Whether or not this server is a VIP-only server.
    #[serde(default)]
    pub vip: bool,
    /// Whether or not this region is the closest to the user's client.
    #[serde(default)]
    pub optimal: bool,
    /// Whether or not this voice region has been deprecated.
    #[serde(default)]
    pub deprecated: bool,
    /// Whether or not this is a custom voice region.
    #[serde(default)]
    pub custom: bool,
}
