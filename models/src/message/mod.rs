//! Structures related to Discord messages in a guild channel.
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};

use crate::guild::GuildMember;
use crate::{Snowflake, User};

pub use self::embed::*;
pub use self::emoji::{Emoji, Reaction};

mod embed;
mod emoji;

/// A message sent in a channel on Discord.
#[derive(Deserialize, Serialize, Clone, Debug, Default)]
pub struct Message {
    /// The message ID of the message.
    #[serde(default)]
    pub id: Snowflake,
    /// The ID of the channel that the message was sent in.
    #[serde(default)]
    pub channel_id: Snowflake,
    /// The ID of the guild that the message was sent in, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guild_id: Option<Snowflake>,
    /// The author of the message.
    #[serde(default)]
    pub author: User,
    /// The guild member form of the message author, if sent in a guild.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member: Option<GuildMember>,
    /// The contents of this message.
    #[serde(default)]
    pub content: String,
    /// The time that this message was sent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<FixedOffset>>,
    /// When this message was edited, if applicable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edited_timestamp: Option<DateTime<FixedOffset>>,
    /// Whether or not this was a TTS message.
    #[serde(default)]
    pub tts: bool,
    /// Whether or not this message mentioned everyone.
    #[serde(default)]
    pub mention_everyone: bool,
    /// Users that were mentioned in this message.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mentions: Vec<User>,
    /// Roles that were mentioned in this message.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mention_roles: Vec<Snowflake>,
    /// The message's attached files, if any.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
    /// Any embeds sent with this message.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<Embed>,
    /// The message's reactions.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reactions: Vec<Reaction>,
    /// Whether or not the message is pinned.
    #[serde(default)]
    pub pinned: bool,
    /// The ID of the webhook if the message was sent by a webhook.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_id: Option<Snowflake>,
    /// The type of message sent.
    #[serde(default, rename = "type")]
    pub kind: MessageType,
}

/// Represents an attachment sent by a user.
#[derive(Deserialize, Serialize, Clone, Debug, Default)]
pub struct Attachment {
    /// The attachment ID.
    #[serde(default)]
    pub id: Snowflake,
    /// The name of the file attached.
    #[serde(default)]
    pub filename: String,
    /// The size of the file in bytes.
    #[serde(default)]
    pub size: i32,
    /// The source URL of the file.
    #[serde(default)]
    pub url: String,
    /// A proxied URL of the file.
    #[serde(default)]
    pub proxy_url: String,
    /// The height of the file, if it is an image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<i32>,
    /// The width of the file, if it is an image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<i32>,
}

/// A list of possible message types.
#[derive(Serialize_repr, Deserialize_repr, Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MessageType {
    Default,
    RecipientAdd,
    RecipientRemove,
    Call,
    ChannelNameChange,
    ChannelIconChange,
    ChannelPinnedMessage,
    GuildMemberJoin,
}

impl Default for MessageType {
    fn default() -> Self {
        MessageType::Default
    }
}

/// Options for creating a message in a channel.
#[derive(Clone, Debug, Deserialize, Serialize, Default)]
pub struct CreateMessageOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    nonce: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tts: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    embed: Option<Embed>,
}

impl CreateMessageOptions {
    /// Sets the text content of the message.
    pub fn content(mut self, text: &str) -> Self {
        self.content = Some(text.to_string());
        self
    }

    /// Attaches a nonce used to verify that the message was sent.
    pub fn nonce(mut self, nonce: &str) -> Self {
        self.nonce = Some(nonce.to_string());
        self
    }

    /// Marks the message as a TTS message.
    pub fn tts(mut self, opt: bool) -> Self {
        self.tts = Some(opt);
        self
    }

    /// Attaches a rich embed to the message.
    pub fn embed(mut self, embed: Embed) -> Self {
        self.embed = Some(embed);
        self
    }
}

/// The payload sent by the gateway when a message is deleted.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct MessageDelete {
    /// The ID of the deleted message.
    pub id: Snowflake,
    /// The channel the message was deleted from.
    pub channel_id: Snowflake,
}

/// The payload sent by the gateway when messages are bulk-deleted.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct MessageDeleteBulk {
    /// The IDs of the deleted messages.
    pub ids: Vec<Snowflake>,
    /// The channel the messages were deleted from.
    pub channel_id: Snowflake,
}

/// The payload sent by the gateway when a reaction is added or removed.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct MessageReactionEvent {
    /// The user who added or removed the reaction.
    pub user_id: Snowflake,
    /// The channel the message belongs to.
    pub channel_id: Snowflake,
    /// The message that was reacted to.
    pub message_id: Snowflake,
    /// The emoji that was used.
    pub emoji: Emoji,
}

/// The payload sent by the gateway when all reactions are removed from a message.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct MessageReactionRemoveAll {
    /// The channel the message belongs to.
    pub channel_id: Snowflake,
    /// The message whose reactions were cleared.
    pub message_id: Snowflake,
}

/// The payload sent by the gateway when a user starts typing.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct TypingStart {
    /// The channel the user is typing in.
    pub channel_id: Snowflake,
    /// The guild the channel belongs to, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guild_id: Option<Snowflake>,
    /// The typing user.
    pub user_id: Snowflake,
    /// When the user started typing, in unix seconds.
    #[serde(default)]
    pub timestamp: u64,
}
