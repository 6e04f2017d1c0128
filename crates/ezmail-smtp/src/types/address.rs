//! Envelope address type.

use crate::error::{Error, Result};

/// Address used in `MAIL FROM` / `RCPT TO`.
///
/// Only the characters that would break command framing are rejected; the
/// server remains the authority on what a valid mailbox is.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address(String);

impl Address {
    /// Creates a new address from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is empty or contains characters that
    /// cannot appear inside `<...>` on a command line.
    pub fn new(addr: impl Into<String>) -> Result<Self> {
        let addr = addr.into();
        Self::validate(&addr)?;
        Ok(Self(addr))
    }

    /// Returns the address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(addr: &str) -> Result<()> {
        if addr.is_empty() {
            return Err(Error::Argument("Address cannot be empty".into()));
        }

        if addr
            .chars()
            .any(|c| c == '<' || c == '>' || c.is_whitespace() || c.is_control())
        {
            return Err(Error::Argument(format!(
                "Address contains forbidden characters: {addr:?}"
            )));
        }

        Ok(())
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
