//! Error types for elastinet-transport.
//!
//! Failures are split along the line the public surface cares about:
//! [`TransportFailure`] is a value that ends up inside a failed
//! [`Response`](crate::Response), while [`ContractFault`] is a caller or
//! programming defect that is returned as an `Err`.

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Classification of a transport-class failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// No admission slot became free within the configured timeout.
    /// No network attempt was made.
    AdmissionTimeout,

    /// Connection, DNS, TLS, protocol or response-stream failure.
    Transport,

    /// The transport's own connect/read/write timeout fired.
    ProtocolTimeout,

    /// The exchange completed but the server answered with a non-2xx status.
    Status,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::AdmissionTimeout => write!(f, "admission timeout"),
            FailureKind::Transport => write!(f, "transport failure"),
            FailureKind::ProtocolTimeout => write!(f, "protocol timeout"),
            FailureKind::Status => write!(f, "unsuccessful status"),
        }
    }
}

/// A recovered transport-class failure, captured in a failed response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct TransportFailure {
    kind: FailureKind,
    message: String,
}

impl TransportFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn admission_timeout(timeout: Duration) -> Self {
        Self::new(
            FailureKind::AdmissionTimeout,
            format!(
                "could not start the operation before the timeout of {}ms completed while waiting for a connection slot",
                timeout.as_millis()
            ),
        )
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Transport, message)
    }

    pub fn protocol_timeout(message: impl Into<String>) -> Self {
        Self::new(FailureKind::ProtocolTimeout, message)
    }

    pub fn status(code: u16) -> Self {
        Self::new(FailureKind::Status, format!("server responded with status {code}"))
    }

    pub fn kind(&self) -> FailureKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<io::Error> for TransportFailure {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => {
                Self::protocol_timeout(e.to_string())
            }
            _ => Self::transport(e.to_string()),
        }
    }
}

/// A defect in how the transport layer was driven. Never turned into a
/// response.
#[derive(Debug, Error)]
pub enum ContractFault {
    #[error("invalid request path '{path}': {source}")]
    InvalidPath {
        path: String,
        #[source]
        source: url::ParseError,
    },

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("exchange step repeated after it completed")]
    ExchangeReused,
}

/// What a single transport step can fail with.
#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error(transparent)]
    Failure(#[from] TransportFailure),

    #[error(transparent)]
    Fault(#[from] ContractFault),
}

impl From<io::Error> for ExchangeError {
    fn from(e: io::Error) -> Self {
        ExchangeError::Failure(e.into())
    }
}

/// Errors raised while assembling connection settings or clients.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid endpoint URI '{uri}': {source}")]
    InvalidUri {
        uri: String,
        #[source]
        source: url::ParseError,
    },

    #[error("endpoint URI '{0}' cannot be used as a base address")]
    NotABase(String),

    #[error("invalid proxy address '{address}': {source}")]
    InvalidProxy {
        address: String,
        #[source]
        source: url::ParseError,
    },

    #[error("failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid settings file: {0}")]
    Toml(#[from] toml::de::Error),

    #[cfg(feature = "reqwest")]
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, ContractFault>;
