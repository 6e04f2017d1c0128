//! # ezmail-smtp
//!
//! SMTP client session engine over an abstract byte stream.
//!
//! ## Features
//!
//! - **Session state machine**: greeting, EHLO with HELO fallback, STARTTLS,
//!   AUTH, mail transaction and QUIT, each checked against the current state
//! - **TLS support**: Both implicit TLS (port 465 or an `ssl://` host) and STARTTLS
//! - **Authentication**: LOGIN, PLAIN, XOAUTH2
//! - **Pluggable transport**: anything implementing [`Transport`] can carry a
//!   session; [`TcpTransport`] is the tokio/rustls implementation
//!
//! ## Quick Start
//!
//! ```ignore
//! use ezmail_smtp::{AuthMode, Client, DEFAULT_TIMEOUT};
//!
//! #[tokio::main]
//! async fn main() -> ezmail_smtp::Result<()> {
//!     let mut client = Client::new("smtp.example.com", 587, DEFAULT_TIMEOUT);
//!
//!     client.connect().await?;
//!     client.handshake().await?;
//!     client.authenticate("user@example.com", "password", AuthMode::Plain).await?;
//!
//!     let to = vec!["recipient@example.com".to_string()];
//!     client.start_transaction("user@example.com", &to).await?;
//!     client.write_data("Subject: Test").await?;
//!     client.write_data("").await?;
//!     client.write_data("Hello, World!").await?;
//!     let id = client.end_transaction().await?;
//!
//!     client.quit().await?;
//!     println!("delivered as {id}");
//!     Ok(())
//! }
//! ```
//!
//! ## Connection States
//!
//! ```text
//! Disconnected ─ connect() → Connected ─ handshake() → Greeted [→ Secured]
//!     ─ authenticate() → Authenticated ─ start_transaction() → InTransaction
//!     ─ end_transaction() → Authenticated ─ quit() → Closed
//! ```
//!
//! ## Modules
//!
//! - [`command`]: SMTP command builders
//! - [`connection`]: Transport contract, TCP/TLS transport, session client
//! - [`parser`]: Reply parser and line framing
//! - [`sasl`]: Authentication payloads
//! - [`types`]: Core SMTP types (addresses, auth modes, replies)

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod command;
pub mod connection;
mod error;
pub mod parser;
pub mod sasl;
pub mod types;

pub use connection::{
    BUFFER_SIZE, Client, DEFAULT_TIMEOUT, Endpoint, GreetingVerb, SessionState, SmtpSession,
    TcpTransport, Transport,
};
pub use error::{Error, Result};
pub use types::{Address, AuthMode, Reply, ReplyCode};
