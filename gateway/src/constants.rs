/// The REST base used to fetch the gateway URL.
pub const API_BASE: &str = "https://discordapp.com/api/v6";

/// The gateway protocol version spoken by this client.
pub const GATEWAY_VERSION: u8 = 6;

/// The maximum size of an outbound gateway frame, in bytes.
pub const MAX_PAYLOAD_BYTES: usize = 4096;

/// How long to pause after a failed socket connect before trying again.
pub const CONNECT_RETRY_SECS: u64 = 10;
