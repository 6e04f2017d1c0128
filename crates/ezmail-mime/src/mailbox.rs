//! Mailbox (display name + address) rendering.

use std::fmt;
use std::str::FromStr;

/// An address with an optional display name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Mailbox {
    /// Display name; `None` for an anonymous entry.
    pub name: Option<String>,
    /// Email address.
    pub address: String,
}

impl Mailbox {
    /// Creates an anonymous mailbox.
    #[must_use]
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            name: None,
            address: address.into(),
        }
    }

    /// Creates a mailbox with a display name.
    #[must_use]
    pub fn named(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            address: address.into(),
        }
    }

    /// Returns "Name <address>" when named, otherwise the bare address.
    #[must_use]
    pub fn display(&self) -> String {
        match &self.name {
            Some(name) => format!("{name} <{}>", self.address),
            None => self.address.clone(),
        }
    }
}

/// Renders "Name <address>" or "<address>".
impl fmt::Display for Mailbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{name} <{}>", self.address),
            None => write!(f, "<{}>", self.address),
        }
    }
}

/// Parses `Name <address>`, `<address>` or a bare `address`.
impl FromStr for Mailbox {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let parsed = match (s.rfind('<'), s.ends_with('>')) {
            (Some(open), true) => {
                let address = s[open + 1..s.len() - 1].trim();
                let name = s[..open].trim().trim_matches('"').trim();
                if name.is_empty() {
                    Self::new(address)
                } else {
                    Self::named(name, address)
                }
            }
            _ => Self::new(s),
        };
        Ok(parsed)
    }
}

impl From<&str> for Mailbox {
    fn from(address: &str) -> Self {
        Self::new(address)
    }
}

impl From<String> for Mailbox {
    fn from(address: String) -> Self {
        Self::new(address)
    }
}

/// Joins mailboxes for an address header: `Name <a>,<b>`.
///
/// An empty list renders as an empty string.
#[must_use]
pub fn render_list(mailboxes: &[Mailbox]) -> String {
    mailboxes
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}
