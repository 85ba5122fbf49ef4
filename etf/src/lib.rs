//! A codec for the external term format spoken by the Discord gateway when
//! ETF encoding is negotiated.
//!
//! The crate exposes three layers:
//!
//! - [`Encoder`] / [`EtfBuffer`]: typed term writers over a resizable or
//!   fixed-capacity buffer.
//! - [`Term`]: a parsed term tree that defers value interpretation, useful
//!   for logging and selective decoding of nested frames.
//! - [`to_bytes`] / [`from_bytes`]: serde entry points which bridge terms
//!   through `serde_json::Value`, so any `Serialize`/`Deserialize` record
//!   rides the wire without a dedicated encoder.

pub use buffer::EtfBuffer;
pub use decode::{Decoder, Term};
pub use encode::{Encoder, IntoTerm};
pub use errors::{Error, Result};
pub use value::{from_bytes, term_to_value, to_bytes};

mod buffer;
mod decode;
mod encode;
mod errors;
mod value;

/// The version byte which leads every encoded term.
pub const FORMAT_VERSION: u8 = 131;

/// Type tags of the external term format, as used on the wire.
pub mod tag {
    pub const NEW_FLOAT: u8 = 70;
    pub const SMALL_INTEGER: u8 = 97;
    pub const INTEGER: u8 = 98;
    pub const ATOM: u8 = 100;
    pub const SMALL_TUPLE: u8 = 104;
    pub const LARGE_TUPLE: u8 = 105;
    pub const NIL: u8 = 106;
    pub const STRING: u8 = 107;
    pub const LIST: u8 = 108;
    pub const BINARY: u8 = 109;
    pub const MAP: u8 = 116;
    pub const SMALL_BIG: u8 = 110;
    pub const LARGE_BIG: u8 = 111;
    pub const SMALL_ATOM: u8 = 115;
    pub const ATOM_UTF8: u8 = 118;
    pub const SMALL_ATOM_UTF8: u8 = 119;
}
