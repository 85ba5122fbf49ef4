//! Structures related to a Channel on Discord.
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};

use crate::{Snowflake, User};

/// A guild or DM channel on Discord.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Channel {
    /// The channel ID of this channel.
    #[serde(default)]
    pub id: Snowflake,
    /// The type of channel.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<ChannelType>,
    /// The guild ID of this channel, if it belongs to a guild.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guild_id: Option<Snowflake>,
    /// The sorting position of this channel.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<i32>,
    /// The explicit permission overwrites for members and roles.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub permission_overwrites: Vec<PermissionOverwrite>,
    /// The name of the channel.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// The topic of this channel.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    /// Whether or not this channel is an NSFW channel.
    #[serde(default)]
    pub nsfw: bool,
    /// The ID of the last message sent in this channel.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_message_id: Option<Snowflake>,
    /// The bitrate of this channel, if it is a voice channel.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bitrate: Option<i32>,
    /// The user limit, if it is a voice channel.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_limit: Option<i32>,
    /// The cooldown between sending messages in this channel, in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_limit_per_user: Option<i32>,
    /// The recipients, if this is a DM channel.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recipients: Vec<User>,
    /// The channel's icon hash, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// The ID of the creator, if this is a DM channel.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<Snowflake>,
    /// The application ID, if the channel was created by a bot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_id: Option<Snowflake>,
    /// The ID of the parent category.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<Snowflake>,
    /// When the last message was pinned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_pin_timestamp: Option<DateTime<FixedOffset>>,
}

/// A channel permission overwrite.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct PermissionOverwrite {
    /// The ID of the role or user.
    #[serde(default)]
    pub id: Snowflake,
    /// What this ID is for.
    #[serde(default, rename = "type")]
    pub kind: String,
    /// The allowed permissions bitfield.
    #[serde(default)]
    pub allow: i64,
    /// The denied permissions bitfield.
    #[serde(default)]
    pub deny: i64,
}

/// Represents the possible channel types.
#[derive(Serialize_repr, Deserialize_repr, Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ChannelType {
    Text,
    DM,
    Voice,
    GroupDM,
    Category,
}

/// Options for modifying a channel.
#[derive(Clone, Debug, Deserialize, Serialize, Default)]
pub struct ModifyChannelOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    position: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    topic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    nsfw: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    rate_limit_per_user: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    bitrate: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_limit: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent_id: Option<Snowflake>,
}

impl ModifyChannelOptions {
    /// Sets a new name for the channel.
    pub fn name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    /// Sets a new sorting position for the channel.
    pub fn position(mut self, pos: i32) -> Self {
        self.position = Some(pos);
        self
    }

    /// Sets a new topic for the channel.
    pub fn topic(mut self, topic: &str) -> Self {
        self.topic = Some(topic.to_string());
        self
    }

    /// Marks the channel as NSFW.
    pub fn nsfw(mut self, opt: bool) -> Self {
        self.nsfw = Some(opt);
        self
    }

    /// Sets the slowmode cooldown, in seconds.
    pub fn rate_limit_per_user(mut self, secs: i32) -> Self {
        self.rate_limit_per_user = Some(secs);
        self
    }

    /// Sets the bitrate of the voice channel.
    pub fn bitrate(mut self, rate: i32) -> Self {
        self.bitrate = Some(rate);
        self
    }

    /// Sets the user limit of the voice channel.
    pub fn user_limit(mut self, limit: i32) -> Self {
        self.user_limit = Some(limit);
        self
    }

    /// Moves the channel under a parent category.
    pub fn parent_id(mut self, id: Snowflake) -> Self {
        self.parent_id = Some(id);
        self
    }
}

/// Options for fetching a page of channel messages.
///
/// At most one of `around`, `before` and `after` may be set.
#[derive(Clone, Debug, Deserialize, Serialize, Default)]
pub struct GetMessagesOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub around: Option<Snowflake>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub before: Option<Snowflake>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after: Option<Snowflake>,
}

impl GetMessagesOptions {
    /// Sets the maximum number of messages to return, between 1 and 100.
    pub fn limit(mut self, num: i32) -> Self {
        self.limit = Some(num);
        self
    }

    /// Fetches messages around the given message ID.
    pub fn around(mut self, id: Snowflake) -> Self {
        self.around = Some(id);
        self
    }

    /// Fetches messages before the given message ID.
    pub fn before(mut self, id: Snowflake) -> Self {
        self.before = Some(id);
        self
    }

    /// Fetches messages after the given message ID.
    pub fn after(mut self, id: Snowflake) -> Self {
        self.after = Some(id);
        self
    }

    /// The number of anchors (around/before/after) that have been set.
    pub fn anchors(&self) -> usize {
        [self.around.is_some(), self.before.is_some(), self.after.is_some()]
            .iter()
            .filter(|set| **set)
            .count()
    }
}
