//! Structures related to Discord guilds.
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};

use crate::{
    channel::Channel,
    message::Emoji,
    presence::PresenceUpdate,
    voice::VoiceState,
    Snowflake,
    User,
};

pub use self::member::{GuildMember, GuildMemberRemove, GuildMembersChunk};
pub use self::role::Role;

mod member;
mod role;

/// A Discord Guild, commonly referred to as a "server".
#[derive(Deserialize, Debug, Serialize, Clone, Default)]
pub struct Guild {
    /// The snowflake ID of this guild.
    #[serde(default)]
    pub id: Snowflake,
    /// The name of the guild.
    #[serde(default)]
    pub name: String,
    /// The guild's icon hash, if one is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// The guild's splash hash, if one is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub splash: Option<String>,
    /// The ID of the guild owner.
    #[serde(default)]
    pub owner_id: Snowflake,
    /// The voice region in which this guild is located.
    #[serde(default)]
    pub region: String,
    /// The AFK channel ID for this guild.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub afk_channel_id: Option<Snowflake>,
    /// The AFK channel timeout, in seconds.
    #[serde(default)]
    pub afk_timeout: u64,
    /// Whether or not the guild can be embedded in a widget.
    #[serde(default)]
    pub embed_enabled: bool,
    /// The channel ID that an embed widget will be generated for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embed_channel_id: Option<Snowflake>,
    /// The verification level, which determines which users can chat in a guild.
    #[serde(default)]
    pub verification_level: VerificationLevel,
    /// The MFA authentication level for this guild.
    #[serde(default)]
    pub mfa_level: MfaLevel,
    /// A collection of roles that belong to this guild.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<Role>,
    /// A collection of emojis that belong to this guild.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub emojis: Vec<Emoji>,
    /// A list of features that this guild currently has.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub features: Vec<String>,
    /// The ID of the application which created the guild, if applicable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_id: Option<Snowflake>,
    /// The ID of the channel in which system messages are sent to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_channel_id: Option<Snowflake>,
    /// The time that this guild was joined.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub joined_at: Option<DateTime<FixedOffset>>,
    /// Whether this guild is considered a large guild by Discord.
    #[serde(default)]
    pub large: bool,
    /// Whether or not this guild is available.
    #[serde(default)]
    pub unavailable: bool,
    /// The total number of members in this guild.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member_count: Option<i32>,
    /// The voice states of users currently in voice channels.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub voice_states: Vec<VoiceState>,
    /// The members of this guild, sent with GUILD_CREATE.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<GuildMember>,
    /// The channels of this guild, sent with GUILD_CREATE.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub channels: Vec<Channel>,
    /// The presences of guild members, sent with GUILD_CREATE.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub presences: Vec<PresenceUpdate>,
}

/// A guild which may not yet be available, as sent in the READY payload.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct UnavailableGuild {
    /// The snowflake ID of the guild.
    pub id: Snowflake,
    /// Whether or not the guild is unavailable.
    #[serde(default)]
    pub unavailable: bool,
}

/// The guild verification level.
#[derive(Serialize_repr, Deserialize_repr, Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum VerificationLevel {
    None,
    Low,
    Medium,
    High,
    VeryHigh,
}

impl Default for VerificationLevel {
    fn default() -> Self {
        VerificationLevel::None
    }
}

/// The guild MFA requirement level for moderation actions.
#[derive(Serialize_repr, Deserialize_repr, Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MfaLevel {
    None,
    Elevated,
}

impl Default for MfaLevel {
    fn default() -> Self {
        MfaLevel::None
    }
}

/// A ban on a guild member.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct Ban {
    /// The reason for the ban, if one was given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// The banned user.
    pub user: User,
}

/// A guild integration with an external service.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct Integration {
    /// The snowflake ID of this integration.
    #[serde(default)]
    pub id: Snowflake,
    /// The name of this integration.
    #[serde(default)]
    pub name: String,
    /// The integration type, e.g. "twitch" or "youtube".
    #[serde(default, rename = "type")]
    pub kind: String,
    /// Whether or not this integration is enabled.
    #[serde(default)]
    pub enabled: bool,
    /// Whether or not this integration is syncing.
    #[serde(default)]
    pub syncing: bool,
    /// The ID of the role that this integration uses for subscribers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_id: Option<Snowflake>,
    /// The user for this integration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    /// When this integration was last synced.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synced_at: Option<DateTime<FixedOffset>>,
}

/// The result of a prune count or a started prune.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct GuildPrune {
    /// The number of members pruned, or that a prune would remove.
    /// Absent when a started prune was told not to compute it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pruned: Option<i32>,
}

/// A guild's embed (widget) settings.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct GuildEmbed {
    /// Whether or not the embed is enabled.
    #[serde(default)]
    pub enabled: bool,
    /// The channel ID that the embed points at, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<Snowflake>,
}

/// The payload sent by the gateway when a guild's emojis change.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct GuildEmojisUpdate {
    /// The guild whose emojis were updated.
    pub guild_id: Snowflake,
    /// The new, complete set of emojis.
    #[serde(default)]
    pub emojis: Vec<Emoji>,
}

/// The payload sent by the gateway when a role is created or updated.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct GuildRoleEvent {
    /// The guild the role belongs to.
    pub guild_id: Snowflake,
    /// The role that was created or updated.
    pub role: Role,
}

/// The payload sent by the gateway when a role is deleted.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct GuildRoleDelete {
    /// The guild the role belonged to.
    pub guild_id: Snowflake,
    /// The ID of the deleted role.
    pub role_id: Snowflake,
}

/// The payload sent by the gateway when a member's guild profile changes.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct GuildMemberUpdate {
    /// The guild the member belongs to.
    pub guild_id: Snowflake,
    /// The member's new role set.
    #[serde(default)]
    pub roles: Vec<Snowflake>,
    /// The member's user.
    pub user: User,
    /// The member's new nickname, if any.
    #[serde(default)]
    pub nick: Option<String>,
}

/// Options for banning a guild member.
#[derive(Clone, Debug, Default)]
pub struct BanOptions {
    /// The number of days of messages to delete, between 0 and 7.
    pub delete_message_days: Option<i32>,
    /// The audit log reason for the ban.
    pub reason: Option<String>,
}

impl BanOptions {
    /// Deletes the given number of days of the user's messages.
    pub fn delete_message_days(mut self, days: i32) -> Self {
        self.delete_message_days = Some(days);
        self
    }

    /// Attaches an audit log reason to the ban.
    pub fn reason(mut self, reason: &str) -> Self {
        self.reason = Some(reason.to_string());
        self
    }
}
