//! Error types for SMTP operations.

use std::io;

/// Result type alias for SMTP operations.
pub type Result<T> = std::result::Result<T, Error>;

/// SMTP error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Transport failure (open, read, write, close or timeout).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// TLS negotiation failed, for example on a rejected certificate.
    #[error("TLS error: {0}")]
    Tls(#[from] rustls::Error),

    /// Invalid caller input, detected before any network activity.
    #[error("Invalid argument: {0}")]
    Argument(String),

    /// Malformed dialogue (bad framing, missing confirmation token).
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Server answered a command with a code other than the expected one.
    #[error("Invalid {step} response: {code}")]
    UnexpectedReply {
        /// Command or session step that failed (e.g. `MAIL FROM`).
        step: String,
        /// Reply code received.
        code: u16,
        /// Reply text received.
        message: String,
    },

    /// Server rejected the credentials (reply 535).
    #[error("Authentication failed at {step}: {message}")]
    Authentication {
        /// Authentication step that was rejected.
        step: String,
        /// Reply text received.
        message: String,
    },

    /// Invalid state for operation.
    #[error("Invalid state for operation: {0}")]
    InvalidState(String),
}

impl Error {
    /// Creates an unexpected-reply error for a step.
    #[must_use]
    pub fn unexpected_reply(step: impl Into<String>, code: u16, message: impl Into<String>) -> Self {
        Self::UnexpectedReply {
            step: step.into(),
            code,
            message: message.into(),
        }
    }

    /// Returns true for protocol errors (unexpected replies and bad framing).
    #[must_use]
    pub const fn is_protocol(&self) -> bool {
        matches!(self, Self::Protocol(_) | Self::UnexpectedReply { .. })
    }

    /// Returns true if the server rejected the credentials.
    #[must_use]
    pub const fn is_authentication(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }

    /// Returns true for transport-level failures.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Tls(_))
    }

    /// Returns the reply code carried by an unexpected reply.
    #[must_use]
    pub const fn reply_code(&self) -> Option<u16> {
        match self {
            Self::UnexpectedReply { code, .. } => Some(*code),
            Self::Authentication { .. } => Some(535),
            _ => None,
        }
    }

    /// Returns true if this is a permanent error (5xx).
    #[must_use]
    pub const fn is_permanent(&self) -> bool {
        matches!(self.reply_code(), Some(code) if code >= 500 && code < 600)
    }

    /// Returns true if this is a transient error (4xx).
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self.reply_code(), Some(code) if code >= 400 && code < 500)
    }
}
