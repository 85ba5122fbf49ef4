use std::{
    error::Error as StdError,
    fmt::{Display, Formatter, Result as FmtResult},
    result::Result as StdResult,
};

use reqwest::Error as ReqwestError;
use serde_json::Error as JsonError;
use url::ParseError as UrlError;

use accord_etf::Error as EtfError;

/// A modified result type which encompasses the global error type.
pub type Result<T> = StdResult<T, Error>;

/// Represents a global error which can occur throughout the REST client.
#[derive(Debug)]
pub enum Error {
    Reqwest(ReqwestError),
    Json(JsonError),
    Etf(EtfError),
    Url(UrlError),
    /// The API answered with a failing status code.
    Http {
        status: u16,
        body: String,
    },
    /// The API redirected somewhere this client refuses to follow.
    BadRedirect(String),
    /// A request failed on every attempt.
    RetryExhausted,
    /// Every attempt of a request was interrupted by the watchdog.
    RequestTimeout,
    /// The caller supplied arguments the API would reject.
    BadRequest(String),
    /// The token provided was not accepted by Discord.
    InvalidToken,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        match self {
            Error::Reqwest(e) => write!(f, "{}", e),
            Error::Json(e) => write!(f, "{}", e),
            Error::Etf(e) => write!(f, "{}", e),
            Error::Url(e) => write!(f, "{}", e),
            Error::Http { status, body } => write!(f, "API responded with status {}: {}", status, body),
            Error::BadRedirect(location) => write!(f, "refusing to follow redirect to {}", location),
            Error::RetryExhausted => f.write_str("request failed after exhausting all retries"),
            Error::RequestTimeout => f.write_str("request timed out on every attempt"),
            Error::BadRequest(msg) => write!(f, "{}", msg),
            Error::InvalidToken =>
                f.write_str("The token provided was not accepted by Discord. Please check that your token is correct and try again."),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::Reqwest(e) => Some(e),
            Error::Json(e) => Some(e),
            Error::Etf(e) => Some(e),
            Error::Url(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ReqwestError> for Error {
    fn from(err: ReqwestError) -> Self {
        if let Some(status) = err.status() {
            if status.as_u16() == 401 {
                return Error::InvalidToken;
            }
        }
        Error::Reqwest(err)
    }
}

impl From<JsonError> for Error {
    fn from(err: JsonError) -> Self {
        Error::Json(err)
    }
}

impl From<EtfError> for Error {
    fn from(err: EtfError) -> Self {
        Error::Etf(err)
    }
}

impl From<UrlError> for Error {
    fn from(err: UrlError) -> Self {
        Error::Url(err)
    }
}
