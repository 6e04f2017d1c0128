//! Error types for sending mail.

/// Result type alias for mailer operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Envelope or credential field that failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    /// Subject is empty.
    EmptySubject,
    /// Body is empty.
    EmptyBody,
    /// No `to` recipients.
    NoRecipients,
    /// SMTP host is empty.
    EmptyHost,
    /// Username is empty.
    EmptyUsername,
    /// Password is empty in a password auth mode.
    EmptyPassword,
    /// Token is empty in token auth mode.
    EmptyToken,
    /// More than one `from` entry.
    TooManySenders,
    /// A CR or LF in text that is written into a header line.
    LineBreak(&'static str),
}

impl ValidationError {
    /// Get human-readable error message.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::EmptySubject => "Message subject is empty",
            Self::EmptyBody => "Message body is empty",
            Self::NoRecipients => "No message recipients",
            Self::EmptyHost => "Hostname is empty",
            Self::EmptyUsername => "Username is empty",
            Self::EmptyPassword => "Password is empty",
            Self::EmptyToken => "Auth token is empty",
            Self::TooManySenders => "Too many sender",
            Self::LineBreak(_) => "Header text contains a line break",
        }
    }

    /// Get the field name this error relates to.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::EmptySubject => "subject",
            Self::EmptyBody => "body",
            Self::NoRecipients => "to",
            Self::EmptyHost => "host",
            Self::EmptyUsername => "username",
            Self::EmptyPassword => "password",
            Self::EmptyToken => "token",
            Self::TooManySenders => "from",
            Self::LineBreak(field) => field,
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ValidationError {}

/// Errors returned by [`Mailer::send`](crate::Mailer::send).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid envelope or credential, detected before any I/O.
    #[error(transparent)]
    Argument(#[from] ValidationError),

    /// Transport, protocol or authentication failure.
    #[error(transparent)]
    Smtp(#[from] ezmail_smtp::Error),

    /// Message rendering failure.
    #[error(transparent)]
    Mime(#[from] ezmail_mime::Error),

    /// The server confirmed a different id than the one generated.
    ///
    /// The message was accepted; `actual` is the id the server reported.
    #[error("Mail id mismatch: expected {expected}, server confirmed {actual}")]
    Integrity {
        /// Locally generated id.
        expected: String,
        /// Id from the server confirmation.
        actual: String,
    },

    /// Message data written with no SMTP session bound.
    #[error("SMTP session not initialized")]
    NotConnected,
}

impl Error {
    /// Returns the server-confirmed id carried by an integrity error.
    #[must_use]
    pub fn server_id(&self) -> Option<&str> {
        match self {
            Self::Integrity { actual, .. } => Some(actual),
            _ => None,
        }
    }

    /// Returns true if the message was accepted by the server despite the error.
    #[must_use]
    pub const fn is_delivered(&self) -> bool {
        matches!(self, Self::Integrity { .. })
    }

    /// Returns the validation failure, if this is an argument error.
    #[must_use]
    pub const fn validation(&self) -> Option<ValidationError> {
        match self {
            Self::Argument(err) => Some(*err),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_messages() {
        assert_eq!(
            Error::from(ValidationError::EmptySubject).to_string(),
            "Message subject is empty"
        );
        assert_eq!(ValidationError::TooManySenders.to_string(), "Too many sender");
        assert_eq!(ValidationError::EmptyToken.field(), "token");
        assert_eq!(ValidationError::LineBreak("cc").field(), "cc");
    }

    #[test]
    fn test_integrity_carries_server_id() {
        let err = Error::Integrity {
            expected: "111".into(),
            actual: "112".into(),
        };
        assert_eq!(err.server_id(), Some("112"));
        assert!(err.is_delivered());
        assert!(err.to_string().contains("111"));
        assert!(err.to_string().contains("112"));
        assert_eq!(Error::NotConnected.server_id(), None);
    }

    #[test]
    fn test_validation_accessor() {
        let err = Error::from(ValidationError::NoRecipients);
        assert_eq!(err.validation(), Some(ValidationError::NoRecipients));
        assert_eq!(Error::NotConnected.validation(), None);
    }
}
