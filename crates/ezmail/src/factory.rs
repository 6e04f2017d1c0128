//! SMTP session construction.

use crate::credential::Credential;
use ezmail_smtp::{Client, SmtpSession};

/// Creates one unconnected SMTP session per send.
pub trait ClientFactory {
    /// Session type produced.
    type Session: SmtpSession;

    /// Returns a session bound to the credential's host, port and timeout.
    fn create(&self, credential: &Credential) -> Self::Session;
}

/// Produces TCP/TLS [`Client`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpClientFactory;

impl ClientFactory for TcpClientFactory {
    type Session = Client;

    fn create(&self, credential: &Credential) -> Client {
        let client = Client::new(&credential.host, credential.port, credential.timeout);
        match &credential.hello_name {
            Some(name) => client.hello_name(name.as_str()),
            None => client,
        }
    }
}
