//! Discord entity records and gateway packet types used across the accord crates.

pub use snowflake::Snowflake;
pub use user::User;

pub mod channel;
pub mod gateway;
pub mod guild;
pub mod invite;
pub mod message;
pub mod presence;
pub mod voice;
mod snowflake;
mod user;
