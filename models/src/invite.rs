//! Structures related to a Discord invite.
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::channel::Channel;
use crate::guild::Guild;
use crate::User;

/// Represents a code that, when used, adds a user to a guild or group DM channel.
#[derive(Deserialize, Serialize, Clone, Debug, Default)]
pub struct Invite {
    /// The invite code.
    #[serde(default)]
    pub code: String,
    /// The guild that the invite belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guild: Option<Guild>,
    /// The channel that the invite belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<Channel>,
    /// The user who created the invite.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inviter: Option<User>,
    /// The amount of times that this invite has been used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uses: Option<i32>,
    /// The maximum amount of uses allowed for this invite.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_uses: Option<i32>,
    /// The duration after which the invite expires, in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_age: Option<i32>,
    /// Whether or not this invite grants temporary membership.
    #[serde(default)]
    pub temporary: bool,
    /// The date that this invite was created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<FixedOffset>>,
    /// The approximate count of online members.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approximate_presence_count: Option<i32>,
    /// The approximate count of total members.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approximate_member_count: Option<i32>,
}

/// Options for creating a channel invite.
///
/// Only fields that differ from the server defaults are serialized.
#[derive(Clone, Debug, Deserialize, Serialize, Default)]
pub struct CreateInviteOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    max_age: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_uses: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temporary: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    unique: Option<bool>,
}

impl CreateInviteOptions {
    /// Sets the duration in seconds after which the invite expires.
    pub fn max_age(mut self, secs: i32) -> Self {
        self.max_age = Some(secs);
        self
    }

    /// Sets the maximum number of uses for this invite.
    pub fn max_uses(mut self, uses: i32) -> Self {
        self.max_uses = Some(uses);
        self
    }

    /// Makes the invite grant temporary membership.
    pub fn temporary(mut self, opt: bool) -> Self {
        self.temporary = Some(opt);
        self
    }

    /// Forces the creation of a new invite instead of reusing an existing one.
    pub fn unique(mut self, opt: bool) -> Self {
        self.unique = Some(opt);
        self
    }
}
