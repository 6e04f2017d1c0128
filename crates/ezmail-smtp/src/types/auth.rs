//! Authentication modes.

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// How the client authenticates after the handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum AuthMode {
    /// `AUTH LOGIN` challenge/response with a password.
    #[default]
    Standard,
    /// `AUTH PLAIN` with a password.
    Plain,
    /// `AUTH XOAUTH2` with a bearer token.
    #[cfg_attr(feature = "serde", serde(rename = "oauth2"))]
    OAuth2,
}

impl AuthMode {
    /// Returns the SASL mechanism name sent after `AUTH`.
    #[must_use]
    pub const fn mechanism(self) -> &'static str {
        match self {
            Self::Standard => "LOGIN",
            Self::Plain => "PLAIN",
            Self::OAuth2 => "XOAUTH2",
        }
    }

    /// Returns true if the secret for this mode is a bearer token.
    #[must_use]
    pub const fn uses_token(self) -> bool {
        matches!(self, Self::OAuth2)
    }
}

impl fmt::Display for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mechanism())
    }
}

impl FromStr for AuthMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" | "login" => Ok(Self::Standard),
            "plain" => Ok(Self::Plain),
            "oauth2" | "xoauth2" => Ok(Self::OAuth2),
            other => Err(Error::Argument(format!("Unsupported auth mode: {other}"))),
        }
    }
}

/// Numeric codes used by older configuration files.
impl TryFrom<u8> for AuthMode {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            1 => Ok(Self::Standard),
            2 => Ok(Self::Plain),
            3 => Ok(Self::OAuth2),
            other => Err(Error::Argument(format!("Unsupported auth mode: {other}"))),
        }
    }
}
