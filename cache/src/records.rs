//! [`Record`] and [`Patch`] wiring for the cached entity types, plus the
//! composite-keyed entries that only exist inside the cache.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use accord_model::{
    channel::Channel,
    guild::{Guild, GuildMember},
    message::Message,
    presence::{Activity, Status},
    voice::VoiceState,
    Snowflake,
    User,
};

use crate::store::{Patch, Record};

// Merge helpers: a populated incoming field replaces the stored one, an
// empty or absent incoming field leaves it alone.

fn patch_str(dst: &mut String, src: &str) {
    if !src.is_empty() {
        *dst = src.to_string();
    }
}

fn patch_vec<T: Clone>(dst: &mut Vec<T>, src: &[T]) {
    if !src.is_empty() {
        *dst = src.to_vec();
    }
}

fn patch_opt<T: Clone>(dst: &mut Option<T>, src: &Option<T>) {
    if src.is_some() {
        *dst = src.clone();
    }
}

impl Record for User {
    type Key = Snowflake;

    fn key(&self) -> Snowflake {
        self.id
    }

    fn with_key(key: Snowflake) -> Self {
        User { id: key, ..Default::default() }
    }
}

impl Patch for User {
    fn merge(&mut self, newer: &Self) {
        patch_str(&mut self.username, &newer.username);
        patch_str(&mut self.discriminator, &newer.discriminator);
        patch_opt(&mut self.avatar, &newer.avatar);
        patch_opt(&mut self.email, &newer.email);
        self.bot = newer.bot;
        self.mfa_enabled = newer.mfa_enabled;
    }
}

impl Record for Channel {
    type Key = Snowflake;

    fn key(&self) -> Snowflake {
        self.id
    }

    fn with_key(key: Snowflake) -> Self {
        Channel { id: key, ..Default::default() }
    }
}

impl Patch for Channel {
    fn merge(&mut self, newer: &Self) {
        patch_opt(&mut self.kind, &newer.kind);
        patch_opt(&mut self.guild_id, &newer.guild_id);
        patch_opt(&mut self.position, &newer.position);
        patch_vec(&mut self.permission_overwrites, &newer.permission_overwrites);
        patch_opt(&mut self.name, &newer.name);
        patch_opt(&mut self.topic, &newer.topic);
        patch_opt(&mut self.last_message_id, &newer.last_message_id);
        patch_opt(&mut self.bitrate, &newer.bitrate);
        patch_opt(&mut self.user_limit, &newer.user_limit);
        patch_opt(&mut self.rate_limit_per_user, &newer.rate_limit_per_user);
        patch_vec(&mut self.recipients, &newer.recipients);
        patch_opt(&mut self.icon, &newer.icon);
        patch_opt(&mut self.owner_id, &newer.owner_id);
        patch_opt(&mut self.application_id, &newer.application_id);
        patch_opt(&mut self.parent_id, &newer.parent_id);
        patch_opt(&mut self.last_pin_timestamp, &newer.last_pin_timestamp);
        self.nsfw = newer.nsfw;
    }
}

impl Record for Guild {
    type Key = Snowflake;

    fn key(&self) -> Snowflake {
        self.id
    }

    fn with_key(key: Snowflake) -> Self {
        Guild { id: key, ..Default::default() }
    }
}

impl Patch for Guild {
    fn merge(&mut self, newer: &Self) {
        patch_str(&mut self.name, &newer.name);
        patch_opt(&mut self.icon, &newer.icon);
        patch_opt(&mut self.splash, &newer.splash);
        if newer.owner_id != Snowflake::default() {
            self.owner_id = newer.owner_id;
        }
        patch_str(&mut self.region, &newer.region);
        patch_opt(&mut self.afk_channel_id, &newer.afk_channel_id);
        patch_vec(&mut self.roles, &newer.roles);
        patch_vec(&mut self.emojis, &newer.emojis);
        patch_vec(&mut self.features, &newer.features);
        patch_opt(&mut self.application_id, &newer.application_id);
        patch_opt(&mut self.system_channel_id, &newer.system_channel_id);
        patch_opt(&mut self.joined_at, &newer.joined_at);
        patch_opt(&mut self.member_count, &newer.member_count);
        patch_opt(&mut self.embed_channel_id, &newer.embed_channel_id);
        self.afk_timeout = newer.afk_timeout;
        self.embed_enabled = newer.embed_enabled;
        self.verification_level = newer.verification_level;
        self.mfa_level = newer.mfa_level;
        self.large = newer.large;
        self.unavailable = newer.unavailable;
    }
}

impl Record for Message {
    type Key = Snowflake;

    fn key(&self) -> Snowflake {
        self.id
    }

    fn with_key(key: Snowflake) -> Self {
        Message { id: key, ..Default::default() }
    }
}

impl Patch for Message {
    fn merge(&mut self, newer: &Self) {
        if newer.channel_id != Snowflake::default() {
            self.channel_id = newer.channel_id;
        }
        patch_opt(&mut self.guild_id, &newer.guild_id);
        if newer.author.id != Snowflake::default() {
            self.author = newer.author.clone();
        }
        patch_opt(&mut self.member, &newer.member);
        patch_str(&mut self.content, &newer.content);
        patch_opt(&mut self.timestamp, &newer.timestamp);
        patch_opt(&mut self.edited_timestamp, &newer.edited_timestamp);
        patch_vec(&mut self.mentions, &newer.mentions);
        patch_vec(&mut self.mention_roles, &newer.mention_roles);
        patch_vec(&mut self.attachments, &newer.attachments);
        patch_vec(&mut self.embeds, &newer.embeds);
        patch_vec(&mut self.reactions, &newer.reactions);
        patch_opt(&mut self.webhook_id, &newer.webhook_id);
        self.tts = newer.tts;
        self.mention_everyone = newer.mention_everyone;
        self.pinned = newer.pinned;
        self.kind = newer.kind;
    }
}

/// Per-guild member state, keyed by `(guild_id, user_id)`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct GuildUserEntry {
    /// The guild this entry belongs to.
    pub guild_id: Snowflake,
    /// The member's user ID.
    pub user_id: Snowflake,
    /// When the member joined the guild.
    pub joined_at: Option<DateTime<FixedOffset>>,
    /// The member's roles.
    pub roles: Vec<Snowflake>,
    /// The member's nickname, if any.
    pub nickname: Option<String>,
    /// The member's presence status.
    pub status: Status,
    /// The activity the member is playing, if any.
    pub game: Option<Activity>,
    /// Whether the member is deafened on the server.
    pub deaf: bool,
    /// Whether the member is muted on the server.
    pub mute: bool,
}

impl GuildUserEntry {
    /// Builds an entry from a gateway member payload.
    pub fn from_member(guild_id: Snowflake, member: &GuildMember) -> Self {
        GuildUserEntry {
            guild_id,
            user_id: member.user.as_ref().map(|u| u.id).unwrap_or_default(),
            joined_at: member.joined_at,
            roles: member.roles.clone(),
            nickname: member.nickname.clone(),
            deaf: member.deaf,
            mute: member.mute,
            ..Default::default()
        }
    }
}

impl Record for GuildUserEntry {
    type Key = (Snowflake, Snowflake);

    fn key(&self) -> Self::Key {
        (self.guild_id, self.user_id)
    }

    fn with_key((guild_id, user_id): Self::Key) -> Self {
        GuildUserEntry { guild_id, user_id, ..Default::default() }
    }
}

/// Per-channel member state, keyed by `(channel_id, user_id)`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ChannelUserEntry {
    /// The channel this entry belongs to.
    pub channel_id: Snowflake,
    /// The user ID.
    pub user_id: Snowflake,
    /// When the user last started typing, in unix seconds.
    pub last_typing: Option<u64>,
}

impl Record for ChannelUserEntry {
    type Key = (Snowflake, Snowflake);

    fn key(&self) -> Self::Key {
        (self.channel_id, self.user_id)
    }

    fn with_key((channel_id, user_id): Self::Key) -> Self {
        ChannelUserEntry { channel_id, user_id, last_typing: None }
    }
}

/// The composite key a voice state is stored under.
pub type VoiceStateKey = (Snowflake, Option<Snowflake>, Snowflake);

impl Record for VoiceState {
    type Key = VoiceStateKey;

    fn key(&self) -> VoiceStateKey {
        (self.guild_id, self.channel_id, self.user_id)
    }

    fn with_key((guild_id, channel_id, user_id): VoiceStateKey) -> Self {
        VoiceState { guild_id, channel_id, user_id, ..Default::default() }
    }
}
