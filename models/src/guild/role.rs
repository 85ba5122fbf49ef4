use serde::{Deserialize, Serialize};

use crate::Snowflake;

/// Represents a Discord Role.
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Role {
    /// The snowflake ID of this role.
    #[serde(default)]
    pub id: Snowflake,
    /// The name of this role.
    #[serde(default)]
    pub name: String,
    /// The hexadecimal color code for this role.
    #[serde(default)]
    pub color: i32,
    /// Whether or not this role is hoisted in the member list.
    #[serde(default, rename = "hoist")]
    pub hoisted: bool,
    /// The sorting position of this role.
    #[serde(default)]
    pub position: i32,
    /// The permissions bitfield for this role.
    #[serde(default)]
    pub permissions: i64,
    /// Whether or not this role is managed by an integration.
    #[serde(default)]
    pub managed: bool,
    /// Whether or not this role is mentionable.
    #[serde(default)]
    pub mentionable: bool,
}
