use std::{
    error::Error as StdError,
    fmt::{Display, Formatter, Result as FmtResult},
    result::Result as StdResult,
};

/// A modified result type which encompasses the global error type.
pub type Result<T> = StdResult<T, Error>;

/// Represents a global error which can occur throughout the library.
#[derive(Debug)]
pub enum Error {
    Rest(accord_rest::Error),
    Gateway(accord_gateway::Error),
    Cache(accord_cache::Error),
    Etf(accord_etf::Error),
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        match self {
            Error::Rest(e) => write!(f, "{}", e),
            Error::Gateway(e) => write!(f, "{}", e),
            Error::Cache(e) => write!(f, "{}", e),
            Error::Etf(e) => write!(f, "{}", e),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::Rest(e) => Some(e),
            Error::Gateway(e) => Some(e),
            Error::Cache(e) => Some(e),
            Error::Etf(e) => Some(e),
        }
    }
}

impl From<accord_rest::Error> for Error {
    fn from(err: accord_rest::Error) -> Self {
        Error::Rest(err)
    }
}

impl From<accord_gateway::Error> for Error {
    fn from(err: accord_gateway::Error) -> Self {
        Error::Gateway(err)
    }
}

impl From<accord_cache::Error> for Error {
    fn from(err: accord_cache::Error) -> Self {
        Error::Cache(err)
    }
}

impl From<accord_etf::Error> for Error {
    fn from(err: accord_etf::Error) -> Self {
        Error::Etf(err)
    }
}
