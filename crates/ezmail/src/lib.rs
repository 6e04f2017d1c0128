//! # ezmail
//!
//! Send a MIME email over SMTP with a single call.
//!
//! [`Mailer::send`] validates the envelope, opens an SMTP session, upgrades it
//! to TLS, authenticates, streams a multipart message into the DATA command
//! and returns the delivery id the server confirmed. The session is quit on
//! every exit path.
//!
//! ## Quick Start
//!
//! ```ignore
//! use ezmail::{Credential, Envelope, Mailbox, Mailer};
//!
//! #[tokio::main]
//! async fn main() -> ezmail::Result<()> {
//!     let credential = Credential::builder("smtp.example.com")
//!         .port(587)
//!         .username("user@example.com")
//!         .password("password")
//!         .build();
//!
//!     let envelope = Envelope::new("Hello", "<p>Hello, World!</p>")
//!         .to(Mailbox::named("Recipient", "recipient@example.com"))
//!         .app_name("My App");
//!
//!     let id = Mailer::new().send(&envelope, &credential).await?;
//!     println!("delivered as {id}");
//!     Ok(())
//! }
//! ```
//!
//! ## Collaborators
//!
//! Each send goes through three replaceable pieces, passed to
//! [`Mailer::with_components`]:
//!
//! - [`ClientFactory`]: creates the SMTP session ([`TcpClientFactory`])
//! - [`MessageBuilder`]: renders the message ([`MimeBuilder`])
//! - [`MailIdGenerator`]: produces the message id ([`RandomMailId`])

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod credential;
mod envelope;
mod error;
mod factory;
mod id;
mod mailer;

pub use credential::{Credential, CredentialBuilder, DEFAULT_PORT};
pub use envelope::{DEFAULT_APP_NAME, Envelope};
pub use error::{Error, Result, ValidationError};
pub use factory::{ClientFactory, TcpClientFactory};
pub use id::{ID_RANDOM_LEN, MailIdGenerator, RandomMailId};
pub use mailer::{Mailer, validate};

pub use ezmail_mime::{Attachment, FileReader, Mailbox, MessageBuilder, MimeBuilder};
pub use ezmail_smtp::{AuthMode, SmtpSession};
