//! TCP/TLS transport.

use super::transport::{Endpoint, Transport};
use crate::error::{Error, Result};
use rustls::pki_types::ServerName;
use std::future::Future;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_rustls::{
    TlsConnector,
    client::TlsStream,
    rustls::{ClientConfig, RootCertStore},
};

/// SMTP stream (TCP or TLS).
#[derive(Debug)]
pub enum SmtpStream {
    /// Plain TCP connection.
    Tcp(TcpStream),
    /// TLS-encrypted connection.
    Tls(Box<TlsStream<TcpStream>>),
}

impl SmtpStream {
    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Tcp(stream) => stream.read(buf).await,
            Self::Tls(stream) => stream.read(buf).await,
        }
    }

    async fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        match self {
            Self::Tcp(stream) => {
                stream.write_all(data).await?;
                stream.flush().await
            }
            Self::Tls(stream) => {
                stream.write_all(data).await?;
                stream.flush().await
            }
        }
    }

    async fn shutdown(&mut self) -> io::Result<()> {
        match self {
            Self::Tcp(stream) => stream.shutdown().await,
            Self::Tls(stream) => stream.shutdown().await,
        }
    }
}

/// Transport over a real socket, with rustls for encryption.
#[derive(Debug, Default)]
pub struct TcpTransport {
    stream: Option<SmtpStream>,
    server_name: String,
    timeout: Duration,
}

impl TcpTransport {
    /// Creates a transport with no open stream.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the stream is currently TLS-encrypted.
    #[must_use]
    pub const fn is_encrypted(&self) -> bool {
        matches!(self.stream, Some(SmtpStream::Tls(_)))
    }

    fn stream_mut(&mut self) -> Result<&mut SmtpStream> {
        self.stream
            .as_mut()
            .ok_or_else(|| Error::InvalidState("Transport is not open".into()))
    }
}

impl Transport for TcpTransport {
    async fn open(&mut self, endpoint: &Endpoint, timeout: Duration) -> Result<()> {
        self.timeout = timeout;
        self.server_name.clone_from(&endpoint.host);

        let address = endpoint.address();
        let tcp_stream = with_timeout(timeout, "connect", TcpStream::connect(address)).await?;

        self.stream = Some(if endpoint.implicit_tls {
            let handshake = tls_handshake(&endpoint.host, tcp_stream);
            let tls = with_timeout(timeout, "TLS handshake", handshake)
                .await
                .map_err(tls_error)?;
            SmtpStream::Tls(Box::new(tls))
        } else {
            SmtpStream::Tcp(tcp_stream)
        });

        Ok(())
    }

    async fn read_chunk(&mut self, max_len: usize) -> Result<Vec<u8>> {
        let timeout = self.timeout;
        let stream = self.stream_mut()?;

        let mut buf = vec![0u8; max_len];
        let read = with_timeout(timeout, "read", stream.read(&mut buf)).await?;
        if read == 0 {
            let err = io::Error::new(io::ErrorKind::UnexpectedEof, "Connection closed");
            return Err(err.into());
        }

        buf.truncate(read);
        Ok(buf)
    }

    async fn write_bytes(&mut self, data: &[u8]) -> Result<()> {
        let timeout = self.timeout;
        let stream = self.stream_mut()?;
        with_timeout(timeout, "write", stream.write_all(data)).await?;
        Ok(())
    }

    async fn upgrade_to_encrypted(&mut self) -> Result<()> {
        let tcp_stream = match self.stream.take() {
            Some(SmtpStream::Tcp(stream)) => stream,
            Some(tls @ SmtpStream::Tls(_)) => {
                self.stream = Some(tls);
                return Err(Error::Protocol("Already using TLS".into()));
            }
            None => return Err(Error::InvalidState("Transport is not open".into())),
        };

        let handshake = tls_handshake(&self.server_name, tcp_stream);
        let tls = with_timeout(self.timeout, "TLS handshake", handshake)
            .await
            .map_err(tls_error)?;
        self.stream = Some(SmtpStream::Tls(Box::new(tls)));
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(mut stream) = self.stream.take() {
            stream.shutdown().await?;
        }
        Ok(())
    }
}

/// Runs an I/O future under the transport timeout.
async fn with_timeout<T>(
    timeout: Duration,
    what: &str,
    fut: impl Future<Output = io::Result<T>>,
) -> Result<T> {
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result.map_err(Error::from),
        Err(_) => {
            let err = io::Error::new(io::ErrorKind::TimedOut, format!("{what} timed out"));
            Err(err.into())
        }
    }
}

/// Unwraps a rustls failure that tokio-rustls reported as an I/O error.
fn tls_error(err: Error) -> Error {
    let Error::Io(io_err) = err else {
        return err;
    };
    let tls = io_err
        .get_ref()
        .and_then(|inner| inner.downcast_ref::<rustls::Error>())
        .cloned();
    match tls {
        Some(tls) => Error::Tls(tls),
        None => Error::Io(io_err),
    }
}

async fn tls_handshake(
    hostname: &str,
    tcp_stream: TcpStream,
) -> io::Result<TlsStream<TcpStream>> {
    let server_name = ServerName::try_from(hostname.to_string()).map_err(|_| {
        io::Error::new(io::ErrorKind::InvalidInput, format!("Invalid hostname: {hostname}"))
    })?;

    create_tls_connector().connect(server_name, tcp_stream).await
}

/// Creates a TLS connector with the webpki root certificates.
fn create_tls_connector() -> TlsConnector {
    let root_store = RootCertStore {
        roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
    };

    let config = ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();

    TlsConnector::from(Arc::new(config))
}
