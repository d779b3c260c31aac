//! Error types for exchange outcomes.

use std::fmt;
use std::io;

use thiserror::Error;

/// A classified failure delivered to the failure sink of an exchange.
///
/// Transport errors take precedence over every HTTP-level classification;
/// see [`Exchange::on_complete`](crate::Exchange::on_complete).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExchangeError {
    /// The transport handed over something that is not an HTTP response.
    #[error("invalid response: {metadata}")]
    InvalidResponse { metadata: String },

    /// Status outside `[200, 300)` with no usable error payload.
    #[error("bad response status code: {status_code}")]
    BadResponseStatusCode { status_code: u16 },

    /// Status outside `[200, 300)` whose body carried an `error` field.
    #[error("bad response status code {status_code}: {message}")]
    BadResponseStatusCodeWithMessage { status_code: u16, message: String },

    /// Failure reported by the transport, passed through unchanged.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl ExchangeError {
    /// Returns `true` if this error is a transport-level cancellation.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Transport(err) if err.is_cancellation())
    }

    /// HTTP status code behind a status classification, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::BadResponseStatusCode { status_code }
            | Self::BadResponseStatusCodeWithMessage { status_code, .. } => Some(*status_code),
            Self::InvalidResponse { .. } | Self::Transport(_) => None,
        }
    }
}

/// Broad category of a transport-level failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportErrorKind {
    /// The exchange was cancelled by its owner.
    Cancelled,
    /// The host name could not be resolved.
    NameResolution,
    ConnectionRefused,
    ConnectionReset,
    TimedOut,
    Other,
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Cancelled => "cancelled",
            Self::NameResolution => "name resolution failed",
            Self::ConnectionRefused => "connection refused",
            Self::ConnectionReset => "connection reset",
            Self::TimedOut => "timed out",
            Self::Other => "transport error",
        };
        f.write_str(name)
    }
}

/// Failure reported out-of-band by the transport at completion.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct TransportError {
    kind: TransportErrorKind,
    message: String,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn cancelled() -> Self {
        Self::new(TransportErrorKind::Cancelled, "exchange cancelled")
    }

    pub fn name_resolution(host: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::NameResolution, host)
    }

    pub fn connection_refused(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::ConnectionRefused, message)
    }

    pub fn connection_reset(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::ConnectionReset, message)
    }

    pub fn timed_out(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::TimedOut, message)
    }

    pub fn kind(&self) -> TransportErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_cancellation(&self) -> bool {
        self.kind == TransportErrorKind::Cancelled
    }
}

impl From<io::Error> for TransportError {
    fn from(err: io::Error) -> Self {
        let kind = match err.kind() {
            io::ErrorKind::ConnectionRefused => TransportErrorKind::ConnectionRefused,
            io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::UnexpectedEof => TransportErrorKind::ConnectionReset,
            io::ErrorKind::TimedOut => TransportErrorKind::TimedOut,
            _ => TransportErrorKind::Other,
        };
        Self::new(kind, err.to_string())
    }
}
