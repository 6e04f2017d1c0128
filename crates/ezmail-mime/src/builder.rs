//! Multipart message rendering.

use crate::attachment::{Attachment, FileReader, FsFileReader};
use crate::encoding::{encode_base64_lines, encode_header_word};
use crate::error::Error;
use crate::mailbox::{Mailbox, render_list};
use crate::writer::MailWriter;

/// Prefix of every boundary token; the message id follows it.
pub const BOUNDARY_PREFIX: &str = "boundary";

/// Returns the boundary token for a message id.
#[must_use]
pub fn boundary(id: &str) -> String {
    format!("{BOUNDARY_PREFIX}{id}")
}

/// Everything one rendering needs, borrowed from the caller.
#[derive(Debug, Clone, Copy)]
pub struct MessageParts<'a> {
    /// Message id; also the source of the boundary token.
    pub id: &'a str,
    /// Subject text, encoded on output.
    pub subject: &'a str,
    /// HTML or plain text body.
    pub message: &'a str,
    /// Sender; only the first entry is rendered.
    pub from: &'a [Mailbox],
    /// Primary recipients.
    pub to: &'a [Mailbox],
    /// Carbon-copy recipients; header omitted when empty.
    pub cc: &'a [Mailbox],
    /// Blind carbon-copy recipients; header omitted when empty.
    pub bcc: &'a [Mailbox],
    /// Reply address; only the first entry is rendered.
    pub reply_to: &'a [Mailbox],
    /// Files attached after the body part, in order.
    pub attachments: &'a [Attachment],
    /// Return-Path address.
    pub bounce_address: &'a str,
    /// Value of the `X-Mailer` header.
    pub app_name: &'a str,
}

/// Renders a message into a [`MailWriter`].
#[allow(async_fn_in_trait)]
pub trait MessageBuilder {
    /// Writes header lines, then body lines, to `writer`.
    ///
    /// # Errors
    ///
    /// Returns the writer's error, or an attachment read failure converted
    /// into it.
    async fn build<W: MailWriter>(
        &self,
        parts: &MessageParts<'_>,
        writer: &mut W,
    ) -> Result<(), W::Error>;
}

/// Default builder: multipart MIME with a base64 HTML part and base64
/// attachments.
#[derive(Debug, Clone, Default)]
pub struct MimeBuilder<R = FsFileReader> {
    reader: R,
}

impl MimeBuilder<FsFileReader> {
    /// Creates a builder that reads attachments from the filesystem.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            reader: FsFileReader,
        }
    }
}

impl<R: FileReader> MimeBuilder<R> {
    /// Creates a builder that reads attachments through `reader`.
    #[must_use]
    pub const fn with_reader(reader: R) -> Self {
        Self { reader }
    }

    async fn write_header<W: MailWriter>(
        parts: &MessageParts<'_>,
        writer: &mut W,
    ) -> Result<(), W::Error> {
        let date = chrono::Local::now().to_rfc2822();
        let content_type = if parts.attachments.is_empty() {
            "multipart/alternative"
        } else {
            "multipart/mixed"
        };

        writer.write_header("MIME-Version: 1.0").await?;
        writer
            .write_header(&format!("X-Mailer: {}", parts.app_name))
            .await?;
        writer.write_header(&format!("Date: {date}")).await?;
        writer.write_header("Priority: 3").await?;
        writer
            .write_header(&format!("Subject: {}", encode_header_word(parts.subject)))
            .await?;
        writer
            .write_header(&format!("Return-Path: {}", parts.bounce_address))
            .await?;
        if let Some(from) = parts.from.first() {
            writer.write_header(&format!("From: {from}")).await?;
        }
        writer
            .write_header(&format!("Message-ID: {}", parts.id))
            .await?;
        writer
            .write_header(&format!("To: {}", render_list(parts.to)))
            .await?;
        if !parts.cc.is_empty() {
            writer
                .write_header(&format!("Cc: {}", render_list(parts.cc)))
                .await?;
        }
        if !parts.bcc.is_empty() {
            writer
                .write_header(&format!("Bcc: {}", render_list(parts.bcc)))
                .await?;
        }
        if let Some(reply_to) = parts.reply_to.first() {
            writer
                .write_header(&format!("Reply-To: {}", reply_to.display()))
                .await?;
        }
        writer
            .write_header(&format!(
                "Content-Type: {content_type}; boundary=\"{}\"",
                boundary(parts.id)
            ))
            .await?;
        writer.write_header("").await
    }

    async fn write_content<W: MailWriter>(
        parts: &MessageParts<'_>,
        writer: &mut W,
    ) -> Result<(), W::Error> {
        writer
            .write_body(&format!("--{}", boundary(parts.id)))
            .await?;
        writer
            .write_body("Content-Type: text/html; charset=\"UTF-8\"")
            .await?;
        writer.write_body("Content-Transfer-Encoding: base64").await?;
        writer.write_body("").await?;
        for line in encode_base64_lines(parts.message.as_bytes()) {
            writer.write_body(&line).await?;
        }
        Ok(())
    }

    async fn write_attachment<W: MailWriter>(
        &self,
        id: &str,
        attachment: &Attachment,
        writer: &mut W,
    ) -> Result<(), W::Error> {
        let content = self.reader.read(&attachment.path).await?;
        let name = attachment.display_name();
        tracing::debug!(name = %name, bytes = content.len(), "Encoding attachment");

        writer.write_body(&format!("--{}", boundary(id))).await?;
        writer
            .write_body(&format!(
                "Content-Type: application/octet-stream; name=\"{name}\""
            ))
            .await?;
        writer.write_body("Content-Transfer-Encoding: base64").await?;
        writer
            .write_body(&format!(
                "Content-Disposition: attachment; filename=\"{name}\""
            ))
            .await?;
        writer.write_body("").await?;
        for line in encode_base64_lines(&content) {
            writer.write_body(&line).await?;
        }
        Ok(())
    }
}

/// Rejects header text that would break the line it is written on.
fn check_line(field: &'static str, text: &str) -> crate::Result<()> {
    if text.contains(['\r', '\n']) {
        return Err(Error::LineBreak { field });
    }
    Ok(())
}

fn check_mailboxes(field: &'static str, mailboxes: &[Mailbox]) -> crate::Result<()> {
    for mailbox in mailboxes {
        if let Some(name) = &mailbox.name {
            check_line(field, name)?;
        }
        check_line(field, &mailbox.address)?;
    }
    Ok(())
}

impl MessageParts<'_> {
    /// Checks every value copied verbatim into a header line.
    ///
    /// The subject and message are encoded on output and need no check.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LineBreak`] naming the first offending part.
    pub fn check(&self) -> crate::Result<()> {
        check_line("id", self.id)?;
        check_line("app_name", self.app_name)?;
        check_line("bounce_address", self.bounce_address)?;
        check_mailboxes("from", self.from)?;
        check_mailboxes("to", self.to)?;
        check_mailboxes("cc", self.cc)?;
        check_mailboxes("bcc", self.bcc)?;
        check_mailboxes("reply_to", self.reply_to)?;
        for attachment in self.attachments {
            check_line("attachments", &attachment.display_name())?;
        }
        Ok(())
    }
}

impl<R: FileReader> MessageBuilder for MimeBuilder<R> {
    async fn build<W: MailWriter>(
        &self,
        parts: &MessageParts<'_>,
        writer: &mut W,
    ) -> Result<(), W::Error> {
        parts.check()?;
        Self::write_header(parts, writer).await?;
        Self::write_content(parts, writer).await?;
        for attachment in parts.attachments {
            self.write_attachment(parts.id, attachment, writer).await?;
        }
        writer
            .write_body(&format!("--{}--", boundary(parts.id)))
            .await
    }
}
