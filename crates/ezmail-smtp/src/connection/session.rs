//! Session interface consumed by callers that drive a whole send.

use super::client::Client;
use super::transport::Transport;
use crate::error::Result;
use crate::types::AuthMode;

/// The operations one send needs from an SMTP session, in call order.
///
/// [`Client`] is the production implementation; tests substitute recording
/// fakes.
#[allow(async_fn_in_trait)]
pub trait SmtpSession {
    /// Opens the connection and returns the announcement lines.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection fails or the greeting is not 220.
    async fn connect(&mut self) -> Result<Vec<String>>;

    /// EHLO/HELO negotiation and STARTTLS upgrade.
    ///
    /// # Errors
    ///
    /// Returns an error if negotiation or the upgrade fails.
    async fn handshake(&mut self) -> Result<()>;

    /// Authenticates with `mode`; `secret` is a password or a bearer token.
    ///
    /// # Errors
    ///
    /// Returns an error if the server rejects the credentials or the dialogue.
    async fn authenticate(&mut self, username: &str, secret: &str, mode: AuthMode) -> Result<()>;

    /// `MAIL FROM`, `RCPT TO` for each recipient, then `DATA`.
    ///
    /// # Errors
    ///
    /// Returns an error naming the command that was refused.
    async fn start_transaction(&mut self, from: &str, to: &[String]) -> Result<()>;

    /// Writes one message line.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    async fn write_data(&mut self, line: &str) -> Result<()>;

    /// Ends DATA and returns the confirmed delivery id.
    ///
    /// # Errors
    ///
    /// Returns an error if the message is refused or no id is confirmed.
    async fn end_transaction(&mut self) -> Result<String>;

    /// Best-effort QUIT, then close. Safe in any state.
    ///
    /// # Errors
    ///
    /// Returns an error only if closing the transport fails.
    async fn quit(&mut self) -> Result<()>;
}

impl<T: Transport> SmtpSession for Client<T> {
    async fn connect(&mut self) -> Result<Vec<String>> {
        Self::connect(self).await
    }

    async fn handshake(&mut self) -> Result<()> {
        Self::handshake(self).await
    }

    async fn authenticate(&mut self, username: &str, secret: &str, mode: AuthMode) -> Result<()> {
        Self::authenticate(self, username, secret, mode).await
    }

    async fn start_transaction(&mut self, from: &str, to: &[String]) -> Result<()> {
        Self::start_transaction(self, from, to).await
    }

    async fn write_data(&mut self, line: &str) -> Result<()> {
        Self::write_data(self, line).await
    }

    async fn end_transaction(&mut self) -> Result<String> {
        Self::end_transaction(self).await
    }

    async fn quit(&mut self) -> Result<()> {
        Self::quit(self).await
    }
}
