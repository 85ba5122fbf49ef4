use std::{
    error::Error as StdError,
    fmt::{Display, Formatter, Result as FmtResult},
    result::Result as StdResult,
};

use serde_json::Error as JsonError;

/// A modified result type which encompasses the codec error type.
pub type Result<T> = StdResult<T, Error>;

/// Errors that can occur while encoding or decoding terms.
#[derive(Debug)]
pub enum Error {
    /// The leading byte was not the expected format version.
    BadVersion(u8),
    /// An unknown type tag was encountered.
    BadTag(u8),
    /// The input ended before the current term was complete.
    ShortBuffer,
    /// A value does not fit the width of its target type.
    OutOfRange,
    /// A write would exceed the capacity of a fixed buffer.
    BufferFull {
        /// The length the buffer would have needed to grow to.
        needed: usize,
        /// The fixed capacity of the buffer.
        capacity: usize,
    },
    /// A record failed to pass through the serde bridge.
    Json(JsonError),
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        match self {
            Error::BadVersion(byte) => write!(f, "unsupported term format version {}", byte),
            Error::BadTag(tag) => write!(f, "unknown term tag {}", tag),
            Error::ShortBuffer => f.write_str("input ended inside a term"),
            Error::OutOfRange => f.write_str("value does not fit the target integer width"),
            Error::BufferFull { needed, capacity } => {
                write!(f, "term needs {} bytes but the buffer is fixed at {}", needed, capacity)
            }
            Error::Json(e) => write!(f, "{}", e),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<JsonError> for Error {
    fn from(err: JsonError) -> Self {
        Error::Json(err)
    }
}
