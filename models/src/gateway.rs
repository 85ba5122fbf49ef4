//! Structs representing the various elements of the Discord gateway.
use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use serde_repr::{Deserialize_repr, Serialize_repr};

use crate::{
    channel::Channel,
    guild::UnavailableGuild,
    presence::ClientPresence,
    Snowflake,
    User,
};

/// A packet that the client can serialize and send over the Discord gateway.
///
/// Payloads serialize through their gateway envelope in either negotiated
/// encoding; the wire format is chosen by the shard at send time.
pub trait SendablePacket: Serialize + Sized {
    /// The opcode that this payload is sent under.
    fn opcode(&self) -> Opcodes;

    /// Serializes this payload, wrapped in its envelope, to a JSON string.
    fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&SendPacket { op: self.opcode(), d: self })
    }

    /// Serializes this payload, wrapped in its envelope, to an ETF binary blob.
    fn to_etf(&self) -> accord_etf::Result<Vec<u8>> {
        accord_etf::to_bytes(&SendPacket { op: self.opcode(), d: self })
    }
}

/// The envelope for a packet sent over the Discord gateway.
#[derive(Serialize, Debug)]
pub struct SendPacket<T: Serialize> {
    /// The opcode for this payload.
    pub op: Opcodes,
    /// The payload itself.
    pub d: T,
}

/// A packet that the client receives over the Discord gateway.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ReceivePacket {
    /// The opcode for this payload.
    pub op: Opcodes,
    /// The data for this payload.
    #[serde(default)]
    pub d: Value,
    /// The sequence number, present on dispatches.
    #[serde(default)]
    pub s: Option<u64>,
    /// The name of the event that was fired, if applicable.
    #[serde(default)]
    pub t: Option<GatewayEvent>,
}

impl ReceivePacket {
    /// Deserializes the data portion of this packet into a concrete payload type.
    pub fn payload<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.d.clone())
    }
}

/// Connection information returned by the `GET /gateway` endpoint.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct GatewayInfo {
    /// The websocket URL that can be used to begin connecting to the gateway.
    pub url: String,
}

/// Used for identifying a shard with the gateway.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct IdentifyPacket {
    /// The token this shard will use.
    pub token: String,
    /// The properties of the client.
    pub properties: IdentifyProperties,
    /// Whether or not to use payload compression.
    pub compress: bool,
    /// The member count at which the gateway will stop sending offline members.
    pub large_threshold: i32,
    /// Holds the sharding information for this shard.
    pub shard: [u64; 2],
    /// The initial presence of this shard.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence: Option<ClientPresence>,
}

impl SendablePacket for IdentifyPacket {
    fn opcode(&self) -> Opcodes {
        Opcodes::Identify
    }
}

/// The connection properties sent with an identify payload.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct IdentifyProperties {
    /// The client's operating system.
    #[serde(rename = "$os")]
    pub os: String,
    /// The name of the library.
    #[serde(rename = "$browser")]
    pub browser: String,
    /// The device the library runs on.
    #[serde(rename = "$device")]
    pub device: String,
}

impl Default for IdentifyProperties {
    fn default() -> Self {
        IdentifyProperties {
            os: std::env::consts::OS.to_string(),
            browser: String::from("vibe-like-transport"),
            device: std::env::consts::ARCH.to_string(),
        }
    }
}

/// A packet used to resume a gateway connection.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ResumePacket {
    /// The token of the client.
    pub token: String,
    /// The client's previous session ID.
    pub session_id: String,
    /// The last sequence number that was received.
    pub seq: Option<u64>,
}

impl SendablePacket for ResumePacket {
    fn opcode(&self) -> Opcodes {
        Opcodes::Resume
    }
}

/// A heartbeat, carrying the last received sequence (or null).
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct HeartbeatPacket(pub Option<u64>);

impl SendablePacket for HeartbeatPacket {
    fn opcode(&self) -> Opcodes {
        Opcodes::Heartbeat
    }
}

impl SendablePacket for ClientPresence {
    fn opcode(&self) -> Opcodes {
        Opcodes::StatusUpdate
    }
}

/// A packet which defines the heartbeat contract the client should adhere to.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct HelloPacket {
    /// The interval at which the shard should heartbeat, in milliseconds.
    pub heartbeat_interval: u64,
    /// Debug information about the connected gateway servers.
    #[serde(default, rename = "_trace")]
    pub trace: Vec<String>,
}

/// A request for offline members of a guild.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RequestGuildMembers {
    /// The guild ID to request members for.
    pub guild_id: Snowflake,
    /// A prefix that returned usernames must start with. Empty returns all.
    pub query: String,
    /// The maximum number of members to send. Zero requests all members.
    pub limit: i32,
}

impl SendablePacket for RequestGuildMembers {
    fn opcode(&self) -> Opcodes {
        Opcodes::RequestGuildMembers
    }
}

/// A request to join, move or leave a voice channel.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct UpdateVoiceState {
    /// The guild ID of the guild.
    pub guild_id: Snowflake,
    /// The voice channel to join, or null to disconnect.
    pub channel_id: Option<Snowflake>,
    /// Whether or not to mute the current user.
    pub self_mute: bool,
    /// Whether or not to deafen the current user.
    pub self_deaf: bool,
}

impl SendablePacket for UpdateVoiceState {
    fn opcode(&self) -> Opcodes {
        Opcodes::VoiceStatusUpdate
    }
}

/// The packet received when a client completes a handshake with the gateway.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ReadyPacket {
    /// The gateway protocol version.
    pub v: i32,
    /// Information about the current user.
    pub user: User,
    /// The private channels visible to this session.
    #[serde(default)]
    pub private_channels: Vec<Channel>,
    /// The guilds that the user is in, as unavailable stubs.
    #[serde(default)]
    pub guilds: Vec<UnavailableGuild>,
    /// The session ID that is used to resume a gateway connection.
    pub session_id: String,
    /// Information about the current shard, if applicable.
    #[serde(default)]
    pub shard: [u64; 2],
    /// Debug information about the connected gateway servers.
    #[serde(default, rename = "_trace")]
    pub trace: Vec<String>,
}

/// The packet received when the client resumes an existing session.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ResumedPacket {
    /// Debug information about the connected gateway servers.
    #[serde(default, rename = "_trace")]
    pub trace: Vec<String>,
}

/// An organized list of Discord gateway events.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[allow(non_camel_case_types)]
pub enum GatewayEvent {
    HELLO,
    READY,
    RESUMED,
    INVALID_SESSION,
    CHANNEL_CREATE,
    CHANNEL_UPDATE,
    CHANNEL_DELETE,
    CHANNEL_PINS_UPDATE,
    GUILD_CREATE,
    GUILD_UPDATE,
    GUILD_DELETE,
    GUILD_BAN_ADD,
    GUILD_BAN_REMOVE,
    GUILD_EMOJIS_UPDATE,
    GUILD_INTEGRATIONS_UPDATE,
    GUILD_MEMBER_ADD,
    GUILD_MEMBER_REMOVE,
    GUILD_MEMBER_UPDATE,
    GUILD_MEMBERS_CHUNK,
    GUILD_ROLE_CREATE,
    GUILD_ROLE_UPDATE,
    GUILD_ROLE_DELETE,
    MESSAGE_CREATE,
    MESSAGE_UPDATE,
    MESSAGE_DELETE,
    MESSAGE_DELETE_BULK,
    MESSAGE_REACTION_ADD,
    MESSAGE_REACTION_REMOVE,
    MESSAGE_REACTION_REMOVE_ALL,
    PRESENCE_UPDATE,
    TYPING_START,
    USER_UPDATE,
    VOICE_STATE_UPDATE,
    VOICE_SERVER_UPDATE,
    WEBHOOKS_UPDATE,
    /// Any event kind this library does not know about.
    #[serde(other)]
    UNKNOWN,
}

impl Display for GatewayEvent {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        write!(f, "{:?}", self)
    }
}

/// A set of possible Discord gateway opcodes.
#[derive(Serialize_repr, Deserialize_repr, Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Opcodes {
    /// Dispatches a gateway event.
    Dispatch,
    /// Used for sending ping and heartbeats.
    Heartbeat,
    /// Used for obtaining a client handshake.
    Identify,
    /// Used to update the shard's status.
    StatusUpdate,
    /// Used to join and leave voice channels.
    VoiceStatusUpdate,
    /// Used to ping voice servers.
    VoiceServerPing,
    /// Used to resume a closed connection.
    Resume,
    /// Tells clients to reconnect to the gateway.
    Reconnect,
    /// Used to request guild members.
    RequestGuildMembers,
    /// Used to notify the client of an invalid session.
    InvalidSession,
    /// Sent immediately after connecting, contains heartbeat information.
    Hello,
    /// Sent immediately after receiving a heartbeat.
    HeartbeatAck,
}

/// Codes that denote the cause of the gateway closing.
#[derive(Debug, Copy, Deserialize_repr, Serialize_repr, Clone, PartialEq, Eq)]
#[repr(u16)]
pub enum CloseCodes {
    /// The cause of the error is unknown.
    UnknownError = 4000,
    /// The opcode or the payload for an opcode sent was invalid.
    UnknownOpcode,
    /// An invalid payload was sent.
    DecodeError,
    /// A payload was sent prior to identifying.
    NotAuthenticated,
    /// The token sent with the payload was invalid.
    AuthenticationFailed,
    /// More than one identify payload was sent.
    AlreadyAuthenticated,
    /// The sequence sent when resuming the session was invalid.
    InvalidSeq = 4007,
    /// A ratelimit caused by sending payloads too quickly.
    Ratelimited,
    /// The session timed out, and a fresh one is required.
    SessionTimeout,
    /// An invalid shard was sent when identifying.
    InvalidShard,
    /// The session would have had too many guilds; sharding is required.
    ShardingRequired,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opcodes_round_trip_through_their_integer_values() {
        let json = serde_json::to_string(&Opcodes::Resume).unwrap();
        assert_eq!(json, "6");
        let op: Opcodes = serde_json::from_str("11").unwrap();
        assert_eq!(op, Opcodes::HeartbeatAck);
    }

    #[test]
    fn unknown_events_fall_back_to_the_catch_all() {
        let pkt: ReceivePacket =
            serde_json::from_str(r#"{"op":0,"d":{},"s":1,"t":"SOME_FUTURE_EVENT"}"#).unwrap();
        assert_eq!(pkt.t, Some(GatewayEvent::UNKNOWN));
    }

    #[test]
    fn heartbeats_carry_the_sequence_or_null() {
        assert_eq!(HeartbeatPacket(Some(41)).to_json().unwrap(), r#"{"op":1,"d":41}"#);
        assert_eq!(HeartbeatPacket(None).to_json().unwrap(), r#"{"op":1,"d":null}"#);
    }
}
