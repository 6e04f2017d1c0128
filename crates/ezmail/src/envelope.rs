//! The message handed to the mailer.

use ezmail_mime::{Attachment, Mailbox};

/// Application name used for `X-Mailer` when none is set.
pub const DEFAULT_APP_NAME: &str = "ezmail";

/// An email message to send.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Envelope {
    /// Subject line.
    pub subject: String,
    /// HTML or plain text body.
    pub body: String,
    /// Sender; at most one entry. Defaults to the account name.
    pub from: Vec<Mailbox>,
    /// Recipient addresses.
    pub to: Vec<Mailbox>,
    /// CC addresses.
    pub cc: Vec<Mailbox>,
    /// BCC addresses.
    pub bcc: Vec<Mailbox>,
    /// Reply address. Defaults to the account name.
    pub reply_to: Option<Mailbox>,
    /// Attached files, in order.
    pub attachments: Vec<Attachment>,
    /// Return-Path address. Defaults to the account name.
    pub bounce_address: Option<String>,
    /// Value of the `X-Mailer` header.
    pub app_name: String,
}

impl Envelope {
    /// Creates a new envelope.
    #[must_use]
    pub fn new(subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
            from: Vec::new(),
            to: Vec::new(),
            cc: Vec::new(),
            bcc: Vec::new(),
            reply_to: None,
            attachments: Vec::new(),
            bounce_address: None,
            app_name: DEFAULT_APP_NAME.to_string(),
        }
    }

    /// Adds a sender.
    #[must_use]
    pub fn from(mut self, sender: impl Into<Mailbox>) -> Self {
        self.from.push(sender.into());
        self
    }

    /// Adds a recipient.
    #[must_use]
    pub fn to(mut self, recipient: impl Into<Mailbox>) -> Self {
        self.to.push(recipient.into());
        self
    }

    /// Adds a CC recipient.
    #[must_use]
    pub fn cc(mut self, recipient: impl Into<Mailbox>) -> Self {
        self.cc.push(recipient.into());
        self
    }

    /// Adds a BCC recipient.
    #[must_use]
    pub fn bcc(mut self, recipient: impl Into<Mailbox>) -> Self {
        self.bcc.push(recipient.into());
        self
    }

    /// Sets the reply address.
    #[must_use]
    pub fn reply_to(mut self, mailbox: impl Into<Mailbox>) -> Self {
        self.reply_to = Some(mailbox.into());
        self
    }

    /// Adds an attachment.
    #[must_use]
    pub fn attach(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    /// Sets the Return-Path address.
    #[must_use]
    pub fn bounce_address(mut self, address: impl Into<String>) -> Self {
        self.bounce_address = Some(address.into());
        self
    }

    /// Sets the `X-Mailer` value.
    #[must_use]
    pub fn app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = name.into();
        self
    }

    /// Returns the RCPT TO addresses: to, cc, then bcc, without duplicates.
    #[must_use]
    pub fn recipients(&self) -> Vec<String> {
        let mut recipients: Vec<String> = Vec::new();
        for mailbox in self.to.iter().chain(&self.cc).chain(&self.bcc) {
            if !recipients.contains(&mailbox.address) {
                recipients.push(mailbox.address.clone());
            }
        }
        recipients
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_chain() {
        let envelope = Envelope::new("this is subject", "this is message")
            .from(Mailbox::named("Mr From", "from@mail.com"))
            .to(Mailbox::named("Mr Recv", "recv@mail.com"))
            .cc("cc@mail.com")
            .bcc("bcc@mail.com")
            .reply_to("reply@mail.com")
            .attach(Attachment::new("/tmp/file.txt"))
            .bounce_address("bounce@mail.com")
            .app_name("Test App");

        assert_eq!(envelope.from, vec![Mailbox::named("Mr From", "from@mail.com")]);
        assert_eq!(envelope.reply_to, Some(Mailbox::new("reply@mail.com")));
        assert_eq!(envelope.attachments.len(), 1);
        assert_eq!(envelope.bounce_address.as_deref(), Some("bounce@mail.com"));
        assert_eq!(envelope.app_name, "Test App");
    }

    #[test]
    fn test_default_app_name() {
        assert_eq!(Envelope::new("s", "b").app_name, "ezmail");
    }

    #[test]
    fn test_recipients_order_and_dedup() {
        let envelope = Envelope::new("s", "b")
            .to("a@mail.com")
            .to(Mailbox::named("B", "b@mail.com"))
            .cc("c@mail.com")
            .cc("a@mail.com")
            .bcc("d@mail.com")
            .bcc("b@mail.com");

        assert_eq!(
            envelope.recipients(),
            vec!["a@mail.com", "b@mail.com", "c@mail.com", "d@mail.com"]
        );
    }
}
