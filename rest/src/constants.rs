/// The base URL that all API requests are made against.
pub const BASE_URL: &str = "https://discordapp.com/api/v6";

/// The path component of the API base, used to validate server-relative redirects.
pub const API_BASE_PATH: &str = "/api/v6";

/// The User-Agent header attached to every request.
pub const USER_AGENT: &str = concat!(
    "DiscordBot (https://github.com/accord-rs/accord, v",
    env!("CARGO_PKG_VERSION"),
    ")"
);

/// The maximum number of attempts for a single logical request.
pub const MAX_ATTEMPTS: u32 = 5;

/// How long an in-flight attempt may run before the watchdog interrupts it.
pub const REQUEST_TIMEOUT_SECS: u64 = 12;
