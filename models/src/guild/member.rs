use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::{Snowflake, User};

/// A User that is part of a guild.
#[derive(Clone, Debug, Deserialize, Serialize, Default)]
pub struct GuildMember {
    /// The guild ID of this guild member, present on GUILD_MEMBER_ADD.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guild_id: Option<Snowflake>,
    /// The Discord user of this guild member.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    /// The member's nickname, if applicable.
    #[serde(default, rename = "nick", skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    /// The date that they joined the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub joined_at: Option<DateTime<FixedOffset>>,
    /// Whether or not the member is muted.
    #[serde(default)]
    pub mute: bool,
    /// Whether or not the member has been deafened.
    #[serde(default)]
    pub deaf: bool,
    /// A collection of roles that this member has.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<Snowflake>,
}

/// A payload sent by the gateway when a guild member is removed from a guild.
#[derive(Clone, Debug, Deserialize, Serialize, Default)]
pub struct GuildMemberRemove {
    /// The guild ID of the guild that this member belonged to.
    pub guild_id: Snowflake,
    /// The Discord user of this guild member.
    pub user: User,
}

/// A payload sent by the gateway in response to a RequestGuildMembers packet.
#[derive(Clone, Debug, Deserialize, Serialize, Default)]
pub struct GuildMembersChunk {
    /// The guild ID of the guild that the members belong to.
    pub guild_id: Snowflake,
    /// The chunk of guild members.
    #[serde(default)]
    pub members: Vec<GuildMember>,
}
