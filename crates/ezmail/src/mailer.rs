//! Send pipeline: validate, connect, authenticate, stream the message, quit.

use crate::credential::Credential;
use crate::envelope::Envelope;
use crate::error::{Error, Result, ValidationError};
use crate::factory::{ClientFactory, TcpClientFactory};
use crate::id::{MailIdGenerator, RandomMailId};
use ezmail_mime::{MailWriter, Mailbox, MessageBuilder, MessageParts, MimeBuilder};
use ezmail_smtp::SmtpSession;

/// Sends envelopes, one SMTP session per call.
///
/// The collaborators default to a TCP/TLS client, the MIME builder and a
/// random id generator; [`Mailer::with_components`] swaps any of them.
#[derive(Debug, Clone, Default)]
pub struct Mailer<F = TcpClientFactory, B = MimeBuilder, G = RandomMailId> {
    factory: F,
    builder: B,
    ids: G,
    skip_id_validation: bool,
}

impl Mailer {
    /// Creates a mailer with the default collaborators.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl<F, B, G> Mailer<F, B, G> {
    /// Creates a mailer from explicit collaborators.
    #[must_use]
    pub const fn with_components(factory: F, builder: B, ids: G) -> Self {
        Self {
            factory,
            builder,
            ids,
            skip_id_validation: false,
        }
    }

    /// Returns whatever id the server confirms instead of failing with
    /// [`Error::Integrity`] when it differs from the generated one.
    #[must_use]
    pub const fn skip_id_validation(mut self, skip: bool) -> Self {
        self.skip_id_validation = skip;
        self
    }

    /// Returns the session factory.
    #[must_use]
    pub const fn factory(&self) -> &F {
        &self.factory
    }

    /// Returns the message builder.
    #[must_use]
    pub const fn builder(&self) -> &B {
        &self.builder
    }

    /// Returns the id generator.
    #[must_use]
    pub const fn id_generator(&self) -> &G {
        &self.ids
    }
}

impl<F, B, G> Mailer<F, B, G>
where
    F: ClientFactory,
    B: MessageBuilder,
    G: MailIdGenerator,
{
    /// Sends `envelope` and returns the delivery id the server confirmed.
    ///
    /// The session is always quit before returning, whatever the outcome. A
    /// failing QUIT is logged and never replaces the error being returned.
    ///
    /// # Errors
    ///
    /// - [`Error::Argument`] if validation fails; nothing is sent.
    /// - [`Error::Smtp`] on transport, protocol or authentication failure.
    /// - [`Error::Mime`] if an attachment cannot be read.
    /// - [`Error::Integrity`] if the server confirms an id other than the one
    ///   generated, unless [`Mailer::skip_id_validation`] is set. The message
    ///   has been accepted at that point.
    pub async fn send(&self, envelope: &Envelope, credential: &Credential) -> Result<String> {
        validate(envelope, credential)?;

        tracing::info!(
            host = %credential.host,
            port = credential.port,
            recipients = envelope.to.len() + envelope.cc.len() + envelope.bcc.len(),
            "Sending mail"
        );

        let mut writer = SessionWriter::bind(self.factory.create(credential));
        let result = self.deliver(&mut writer, envelope, credential).await;
        writer.release().await;

        match &result {
            Ok(id) => tracing::info!(id = %id, "Mail sent"),
            Err(e) => tracing::warn!(error = %e, "Mail not sent"),
        }
        result
    }

    async fn deliver<S: SmtpSession>(
        &self,
        writer: &mut SessionWriter<S>,
        envelope: &Envelope,
        credential: &Credential,
    ) -> Result<String> {
        let username = credential.username.as_str();

        let session = writer.session_mut()?;
        session.connect().await?;
        session.handshake().await?;
        session
            .authenticate(username, credential.secret(), credential.auth_mode)
            .await?;
        let sender = envelope
            .from
            .first()
            .map_or(username, |mailbox| mailbox.address.as_str());
        session
            .start_transaction(sender, &envelope.recipients())
            .await?;

        let id = self.ids.generate();
        let account = [Mailbox::new(username)];
        let from = if envelope.from.is_empty() {
            &account[..]
        } else {
            &envelope.from
        };
        let reply_to = envelope
            .reply_to
            .as_ref()
            .map_or(&account[..], std::slice::from_ref);
        let bounce_address = envelope
            .bounce_address
            .as_deref()
            .filter(|address| !address.is_empty())
            .unwrap_or(username);

        let parts = MessageParts {
            id: &id,
            subject: &envelope.subject,
            message: &envelope.body,
            from,
            to: &envelope.to,
            cc: &envelope.cc,
            bcc: &envelope.bcc,
            reply_to,
            attachments: &envelope.attachments,
            bounce_address,
            app_name: &envelope.app_name,
        };
        self.builder.build(&parts, writer).await?;

        let confirmed = writer.session_mut()?.end_transaction().await?;
        if confirmed != id {
            if self.skip_id_validation {
                tracing::debug!(generated = %id, confirmed = %confirmed, "Using server mail id");
                return Ok(confirmed);
            }
            tracing::warn!(
                expected = %id,
                actual = %confirmed,
                "Server confirmed a different mail id"
            );
            return Err(Error::Integrity {
                expected: id,
                actual: confirmed,
            });
        }
        Ok(confirmed)
    }
}

/// Checks the envelope and credential in a fixed order, reporting the first
/// failure.
///
/// # Errors
///
/// Returns the first [`ValidationError`] found.
pub fn validate(
    envelope: &Envelope,
    credential: &Credential,
) -> std::result::Result<(), ValidationError> {
    if envelope.subject.is_empty() {
        return Err(ValidationError::EmptySubject);
    }
    if envelope.body.is_empty() {
        return Err(ValidationError::EmptyBody);
    }
    if envelope.to.is_empty() {
        return Err(ValidationError::NoRecipients);
    }
    if credential.host.is_empty() {
        return Err(ValidationError::EmptyHost);
    }
    if credential.username.is_empty() {
        return Err(ValidationError::EmptyUsername);
    }
    if credential.auth_mode.uses_token() {
        if credential.token.is_empty() {
            return Err(ValidationError::EmptyToken);
        }
    } else if credential.password.is_empty() {
        return Err(ValidationError::EmptyPassword);
    }
    if envelope.from.len() > 1 {
        return Err(ValidationError::TooManySenders);
    }

    check_line("username", &credential.username)?;
    check_line("app_name", &envelope.app_name)?;
    if let Some(bounce_address) = &envelope.bounce_address {
        check_line("bounce_address", bounce_address)?;
    }
    check_mailboxes("from", &envelope.from)?;
    check_mailboxes("to", &envelope.to)?;
    check_mailboxes("cc", &envelope.cc)?;
    check_mailboxes("bcc", &envelope.bcc)?;
    check_mailboxes("reply_to", envelope.reply_to.as_slice())?;
    for attachment in &envelope.attachments {
        check_line("attachments", &attachment.display_name())?;
    }
    Ok(())
}

/// Header lines are written verbatim, so a CR or LF would end them early.
fn check_line(field: &'static str, text: &str) -> std::result::Result<(), ValidationError> {
    if text.contains(['\r', '\n']) {
        return Err(ValidationError::LineBreak(field));
    }
    Ok(())
}

fn check_mailboxes(
    field: &'static str,
    mailboxes: &[Mailbox],
) -> std::result::Result<(), ValidationError> {
    for mailbox in mailboxes {
        if let Some(name) = &mailbox.name {
            check_line(field, name)?;
        }
        check_line(field, &mailbox.address)?;
    }
    Ok(())
}

/// Relays builder output into the bound session's DATA stream.
struct SessionWriter<S> {
    session: Option<S>,
}

impl<S: SmtpSession> SessionWriter<S> {
    const fn bind(session: S) -> Self {
        Self {
            session: Some(session),
        }
    }

    fn session_mut(&mut self) -> Result<&mut S> {
        self.session.as_mut().ok_or(Error::NotConnected)
    }

    /// Quits and drops the session.
    async fn release(&mut self) {
        if let Some(mut session) = self.session.take()
            && let Err(e) = session.quit().await
        {
            tracing::warn!(error = %e, "QUIT failed");
        }
    }
}

impl<S: SmtpSession> MailWriter for SessionWriter<S> {
    type Error = Error;

    async fn write_header(&mut self, line: &str) -> Result<()> {
        self.session_mut()?.write_data(line).await.map_err(Into::into)
    }

    async fn write_body(&mut self, line: &str) -> Result<()> {
        self.session_mut()?.write_data(line).await.map_err(Into::into)
    }
}
