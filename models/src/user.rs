use serde::{Deserialize, Serialize};

use crate::Snowflake;

/// Represents a User on Discord.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct User {
    /// The Snowflake ID of this user.
    #[serde(default)]
    pub id: Snowflake,
    /// The username of this user.
    #[serde(default)]
    pub username: String,
    /// The four-digit number following the user's username.
    #[serde(default)]
    pub discriminator: String,
    /// The user's avatar hash, if they have one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    /// Whether or not this user is a bot.
    #[serde(default)]
    pub bot: bool,
    /// Whether or not this user has two factor authentication on their account.
    #[serde(default)]
    pub mfa_enabled: bool,
    /// The user's email. Only available on user accounts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}
