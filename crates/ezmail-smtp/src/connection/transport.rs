//! Byte-stream contract the session engine runs over.

use crate::error::Result;
use std::fmt;
use std::time::Duration;

/// Well-known submission port that speaks TLS from the first byte.
pub const IMPLICIT_TLS_PORT: u16 = 465;

/// Where to connect and whether TLS starts immediately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Bare hostname, scheme stripped.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// TLS from the first byte (no STARTTLS).
    pub implicit_tls: bool,
}

impl Endpoint {
    /// Builds an endpoint from a host that may carry a scheme prefix.
    ///
    /// `ssl://` and `tls://` select implicit TLS, `tcp://` forces plaintext.
    /// Without a scheme, port 465 selects implicit TLS.
    #[must_use]
    pub fn new(host: &str, port: u16) -> Self {
        let (host, scheme_tls) = split_scheme(host.trim());
        Self {
            host: host.to_string(),
            port,
            implicit_tls: scheme_tls.unwrap_or(port == IMPLICIT_TLS_PORT),
        }
    }

    /// Returns `host:port`.
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scheme = if self.implicit_tls { "ssl" } else { "tcp" };
        write!(f, "{scheme}://{}:{}", self.host, self.port)
    }
}

fn split_scheme(host: &str) -> (&str, Option<bool>) {
    let Some((scheme, rest)) = host.split_once("://") else {
        return (host, None);
    };
    match scheme.to_ascii_lowercase().as_str() {
        "ssl" | "tls" => (rest, Some(true)),
        "tcp" => (rest, Some(false)),
        _ => (host, None),
    }
}

/// Bidirectional byte stream owned by one SMTP client.
///
/// Implementations carry no protocol knowledge.
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// Opens the stream, performing the TLS handshake if the endpoint asks for it.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection or handshake fails or times out.
    async fn open(&mut self, endpoint: &Endpoint, timeout: Duration) -> Result<()>;

    /// Reads up to `max_len` bytes.
    ///
    /// An empty chunk means nothing more is available right now.
    ///
    /// # Errors
    ///
    /// Returns an error on end-of-file, timeout or read failure.
    async fn read_chunk(&mut self, max_len: usize) -> Result<Vec<u8>>;

    /// Writes raw bytes, line terminators included.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    async fn write_bytes(&mut self, data: &[u8]) -> Result<()>;

    /// Switches the open stream to TLS in place.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream is not open or negotiation is rejected.
    async fn upgrade_to_encrypted(&mut self) -> Result<()>;

    /// Releases the stream. Safe to call when closed or never opened.
    ///
    /// # Errors
    ///
    /// Returns an error if shutting the stream down fails.
    async fn close(&mut self) -> Result<()>;
}
