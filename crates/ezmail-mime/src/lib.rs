//! # ezmail-mime
//!
//! Streaming multipart MIME encoder for outbound email.
//!
//! ## Features
//!
//! - **Streaming output**: the message is written line by line into a
//!   [`MailWriter`], never assembled in memory
//! - **Multipart layout**: one base64 HTML part followed by base64 attachments,
//!   framed by a boundary derived from the message id
//! - **Header encoding**: RFC 2047 encoded-word subjects
//! - **Pluggable file access**: attachments are read through a [`FileReader`]
//!
//! ## Quick Start
//!
//! ```ignore
//! use ezmail_mime::{LineCollector, Mailbox, MessageBuilder, MessageParts, MimeBuilder};
//!
//! let to = [Mailbox::named("Recipient", "recipient@example.com")];
//! let from = [Mailbox::new("sender@example.com")];
//! let parts = MessageParts {
//!     id: "1234@example.com",
//!     subject: "Test Message",
//!     message: "<p>Hello, World!</p>",
//!     from: &from,
//!     to: &to,
//!     cc: &[],
//!     bcc: &[],
//!     reply_to: &from,
//!     attachments: &[],
//!     bounce_address: "sender@example.com",
//!     app_name: "ezmail",
//! };
//!
//! let mut lines = LineCollector::new();
//! MimeBuilder::new().build(&parts, &mut lines).await?;
//! print!("{}", lines.to_message());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod attachment;
mod builder;
mod error;
mod mailbox;
mod writer;

pub mod encoding;

pub use attachment::{Attachment, FileReader, FsFileReader};
pub use builder::{BOUNDARY_PREFIX, MessageBuilder, MessageParts, MimeBuilder, boundary};
pub use error::{Error, Result};
pub use mailbox::{Mailbox, render_list};
pub use writer::{LineCollector, MailWriter};
