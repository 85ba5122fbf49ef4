use std::{
    error::Error as StdError,
    fmt::{Display, Formatter, Result as FmtResult},
    result::Result as StdResult,
};

use reqwest::Error as ReqwestError;
use serde_json::Error as JsonError;
use tokio_tungstenite::tungstenite::Error as TungsteniteError;

use accord_etf::Error as EtfError;

/// A modified result type which encompasses the global error type.
pub type Result<T> = StdResult<T, Error>;

/// Represents a global error which can occur throughout the gateway client.
#[derive(Debug)]
pub enum Error {
    Tungstenite(TungsteniteError),
    Json(JsonError),
    Etf(EtfError),
    Reqwest(ReqwestError),
    /// The gateway violated the protocol, e.g. an unexpected first frame.
    Protocol(String),
    /// An outbound frame exceeded the maximum payload size.
    PacketTooLarge(usize),
    /// The gateway closed with a code that forbids reconnecting.
    GatewayClosed { code: u16, reason: String },
    /// A send was attempted while no socket is open.
    NotConnected,
    /// The token provided was not accepted by Discord.
    InvalidToken,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        match self {
            Error::Tungstenite(e) => write!(f, "{}", e),
            Error::Json(e) => write!(f, "{}", e),
            Error::Etf(e) => write!(f, "{}", e),
            Error::Reqwest(e) => write!(f, "{}", e),
            Error::Protocol(msg) => write!(f, "gateway protocol violation: {}", msg),
            Error::PacketTooLarge(size) => {
                write!(f, "outbound packet of {} bytes exceeds the frame limit", size)
            }
            Error::GatewayClosed { code, reason } => {
                write!(f, "gateway closed with code {}: {}", code, reason)
            }
            Error::NotConnected => f.write_str("no gateway connection is open"),
            Error::InvalidToken =>
                f.write_str("The token provided was not accepted by Discord. Please check that your token is correct and try again."),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::Tungstenite(e) => Some(e),
            Error::Json(e) => Some(e),
            Error::Etf(e) => Some(e),
            Error::Reqwest(e) => Some(e),
            _ => None,
        }
    }
}

impl From<TungsteniteError> for Error {
    fn from(err: TungsteniteError) -> Self {
        Error::Tungstenite(err)
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
