use serde::{Deserialize, Serialize};

use crate::{Snowflake, User};

/// A Discord emote that can be used to react to messages.
///
/// Unicode emoji have no snowflake ID; only custom guild emoji do.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Emoji {
    /// The ID of the emoji, if it is a custom emoji.
    #[serde(default)]
    pub id: Option<Snowflake>,
    /// The name of the emoji, or the unicode codepoints.
    #[serde(default)]
    pub name: String,
    /// The roles that the emoji is whitelisted to.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<Snowflake>,
    /// The user who created this emoji.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    /// Whether or not this emoji must be wrapped in colons.
    #[serde(default)]
    pub require_colons: bool,
    /// Whether or not this emoji is managed.
    #[serde(default)]
    pub managed: bool,
    /// Whether or not this emoji is animated.
    #[serde(default)]
    pub animated: bool,
}

impl Emoji {
    /// Whether this emoji refers to the same emote as `other`.
    ///
    /// Custom emoji compare by ID, unicode emoji by name.
    pub fn same_as(&self, other: &Emoji) -> bool {
        match (self.id, other.id) {
            (Some(a), Some(b)) => a == b,
            (None, None) => self.name == other.name,
            _ => false,
        }
    }
}

/// A reaction on a message.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Reaction {
    /// The number of times that this reaction has been added.
    #[serde(default)]
    pub count: i32,
    /// Whether or not the current user has reacted on this message.
    #[serde(default)]
    pub me: bool,
    /// Emoji information.
    #[serde(default)]
    pub emoji: Emoji,
    /// The users known to have added this reaction, tracked by the cache.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub users: Vec<Snowflake>,
}
