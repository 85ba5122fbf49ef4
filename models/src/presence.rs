//! Structures related to a user's presence on Discord.
use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};

use crate::{Snowflake, User};

/// Data about an activity that the user is participating in.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct Activity {
    /// The name of the activity.
    #[serde(default)]
    pub name: String,
    /// The type of activity.
    #[serde(default, rename = "type")]
    pub kind: ActivityType,
    /// If the activity is a stream, the stream URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// What the player is currently doing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// The user's current party status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

/// A presence update received over the gateway.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct PresenceUpdate {
    /// The user this presence belongs to. Only the ID is guaranteed to be present.
    #[serde(default)]
    pub user: User,
    /// The guild this presence update applies to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guild_id: Option<Snowflake>,
    /// The user's new status.
    #[serde(default)]
    pub status: Status,
    /// The activity the user is playing, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game: Option<Activity>,
    /// The user's roles in the guild.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<Snowflake>,
}

/// The presence sent by the client when identifying or updating status.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ClientPresence {
    /// Milliseconds since the client went idle, if it is idle.
    #[serde(default)]
    pub since: Option<u64>,
    /// The activity to display, if any.
    #[serde(default)]
    pub game: Option<Activity>,
    /// The status to display.
    pub status: Status,
    /// Whether or not the client is AFK.
    #[serde(default)]
    pub afk: bool,
}

impl Default for ClientPresence {
    fn default() -> Self {
        ClientPresence {
            since: None,
            game: None,
            status: Status::Online,
            afk: false,
        }
    }
}

/// A list of possible activity types.
#[derive(Serialize_repr, Deserialize_repr, Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ActivityType {
    Game,
    Streaming,
    Listening,
}

impl Default for ActivityType {
    fn default() -> Self {
        ActivityType::Game
    }
}

/// A list of possible user statuses.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Online,
    #[serde(rename = "dnd")]
    DnD,
    Idle,
    Invisible,
    Offline,
}

impl Default for Status {
    fn default() -> Self {
        Status::Offline
    }
}

impl Display for Status {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        match self {
            Status::Online => write!(f, "online"),
            Status::DnD => write!(f, "dnd"),
            Status::Idle => write!(f, "idle"),
            Status::Invisible => write!(f, "invisible"),
            Status::Offline => write!(f, "offline"),
        }
    }
}
