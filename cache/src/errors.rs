use std::{
    error::Error as StdError,
    fmt::{Display, Formatter, Result as FmtResult},
    result::Result as StdResult,
};

pub type Result<T> = StdResult<T, Error>;

/// Errors that may be encountered while using the cache stores.
#[derive(Debug, PartialEq, Eq)]
pub enum Error {
    /// An entry with the same key already exists.
    DuplicateKey,
    /// No entry exists under the given key.
    NotFound,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        match self {
            Error::DuplicateKey => f.write_str("an entry with this key already exists"),
            Error::NotFound => f.write_str("no entry exists under this key"),
        }
    }
}

impl StdError for Error {}
