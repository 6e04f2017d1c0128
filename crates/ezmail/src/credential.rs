//! SMTP server and account settings.

use ezmail_smtp::{AuthMode, DEFAULT_TIMEOUT};
use std::fmt;
use std::time::Duration;

/// Submission port used when none is given.
pub const DEFAULT_PORT: u16 = 587;

/// Where to connect and how to authenticate.
#[derive(Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Credential {
    /// Server hostname, optionally with an `ssl://` or `tcp://` prefix.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Connect and read timeout.
    pub timeout: Duration,
    /// Authentication mechanism.
    pub auth_mode: AuthMode,
    /// Account name.
    pub username: String,
    /// Password for LOGIN and PLAIN.
    pub password: String,
    /// Bearer token for XOAUTH2.
    pub token: String,
    /// EHLO/HELO argument; the server host when unset.
    pub hello_name: Option<String>,
}

impl Credential {
    /// Creates a credential for `host` with default port, timeout and mode.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            timeout: DEFAULT_TIMEOUT,
            auth_mode: AuthMode::default(),
            username: String::new(),
            password: String::new(),
            token: String::new(),
            hello_name: None,
        }
    }

    /// Creates a credential builder.
    #[must_use]
    pub fn builder(host: impl Into<String>) -> CredentialBuilder {
        CredentialBuilder::new(host)
    }

    /// Returns the token in token mode, otherwise the password.
    #[must_use]
    pub fn secret(&self) -> &str {
        if self.auth_mode.uses_token() {
            &self.token
        } else {
            &self.password
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("timeout", &self.timeout)
            .field("auth_mode", &self.auth_mode)
            .field("username", &self.username)
            .field("password", &redact(&self.password))
            .field("token", &redact(&self.token))
            .field("hello_name", &self.hello_name)
            .finish()
    }
}

fn redact(secret: &str) -> &'static str {
    if secret.is_empty() { "" } else { "****" }
}

/// Builder for [`Credential`].
#[derive(Debug, Clone)]
pub struct CredentialBuilder {
    credential: Credential,
}

impl CredentialBuilder {
    /// Creates a new builder with the given hostname.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            credential: Credential::new(host),
        }
    }

    /// Sets the port.
    #[must_use]
    pub const fn port(mut self, port: u16) -> Self {
        self.credential.port = port;
        self
    }

    /// Sets the connect and read timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.credential.timeout = timeout;
        self
    }

    /// Sets the authentication mechanism.
    #[must_use]
    pub const fn auth_mode(mut self, mode: AuthMode) -> Self {
        self.credential.auth_mode = mode;
        self
    }

    /// Sets the account name.
    #[must_use]
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.credential.username = username.into();
        self
    }

    /// Sets the password.
    #[must_use]
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.credential.password = password.into();
        self
    }

    /// Sets the bearer token.
    #[must_use]
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.credential.token = token.into();
        self
    }

    /// Overrides the EHLO/HELO argument.
    #[must_use]
    pub fn hello_name(mut self, name: impl Into<String>) -> Self {
        self.credential.hello_name = Some(name.into());
        self
    }

    /// Builds the credential.
    #[must_use]
    pub fn build(self) -> Credential {
        self.credential
    }
}
