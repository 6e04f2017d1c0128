//! SMTP connection management.

mod client;
mod session;
mod stream;
mod transport;

pub use client::{
    BUFFER_SIZE, Client, DEFAULT_TIMEOUT, GreetingVerb, SessionState, parse_delivery_id,
};
pub use session::SmtpSession;
pub use stream::{SmtpStream, TcpTransport};
pub use transport::{Endpoint, IMPLICIT_TLS_PORT, Transport};
