//! Sends one message using settings from the environment.
//!
//! ```text
//! EZMAIL_HOST=smtp.example.com EZMAIL_USERNAME=me@example.com EZMAIL_PASSWORD=secret \
//! EZMAIL_TO="Friend <friend@example.com>" cargo run -p ezmail --example send_mail
//! ```
//!
//! Optional: `EZMAIL_PORT`, `EZMAIL_AUTH_MODE` (`login`, `plain`, `oauth2`),
//! `EZMAIL_TOKEN`, `EZMAIL_FROM`, `EZMAIL_SUBJECT`, `EZMAIL_BODY`,
//! `EZMAIL_ATTACH` (comma-separated paths), `EZMAIL_TIMEOUT_SECS`.
//! Set `EZMAIL_DRY_RUN=1` to print the rendered message instead of sending.

use std::env;
use std::time::Duration;

use anyhow::{Context, Result};
use ezmail::{Attachment, AuthMode, Credential, Envelope, Mailbox, Mailer, MessageBuilder};
use ezmail_mime::{LineCollector, MessageParts, MimeBuilder};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn credential() -> Result<Credential> {
    let host = var("EZMAIL_HOST").context("EZMAIL_HOST is not set")?;
    let mut builder = Credential::builder(host)
        .username(var("EZMAIL_USERNAME").unwrap_or_default())
        .password(var("EZMAIL_PASSWORD").unwrap_or_default())
        .token(var("EZMAIL_TOKEN").unwrap_or_default());

    if let Some(port) = var("EZMAIL_PORT") {
        builder = builder.port(port.parse().context("EZMAIL_PORT is not a port number")?);
    }
    if let Some(secs) = var("EZMAIL_TIMEOUT_SECS") {
        let secs: u64 = secs.parse().context("EZMAIL_TIMEOUT_SECS is not a number")?;
        builder = builder.timeout(Duration::from_secs(secs));
    }
    if let Some(mode) = var("EZMAIL_AUTH_MODE") {
        builder = builder.auth_mode(mode.parse::<AuthMode>()?);
    }
    Ok(builder.build())
}

fn envelope() -> Envelope {
    let mut envelope = Envelope::new(
        var("EZMAIL_SUBJECT").unwrap_or_else(|| "Hello from ezmail".into()),
        var("EZMAIL_BODY").unwrap_or_else(|| "<p>Hello, World!</p>".into()),
    )
    .app_name("ezmail send_mail");

    for to in var("EZMAIL_TO").unwrap_or_default().split(',') {
        if !to.trim().is_empty() {
            envelope = envelope.to(to.parse::<Mailbox>().unwrap_or_else(|e| match e {}));
        }
    }
    if let Some(from) = var("EZMAIL_FROM") {
        envelope = envelope.from(from.parse::<Mailbox>().unwrap_or_else(|e| match e {}));
    }
    for path in var("EZMAIL_ATTACH").unwrap_or_default().split(',') {
        if !path.trim().is_empty() {
            envelope = envelope.attach(Attachment::new(path.trim()));
        }
    }
    envelope
}

async fn dry_run(envelope: &Envelope, credential: &Credential) -> Result<()> {
    ezmail::validate(envelope, credential)?;

    let account = [Mailbox::new(credential.username.as_str())];
    let from = if envelope.from.is_empty() {
        &account[..]
    } else {
        &envelope.from
    };
    let parts = MessageParts {
        id: "dry-run@localhost",
        subject: &envelope.subject,
        message: &envelope.body,
        from,
        to: &envelope.to,
        cc: &envelope.cc,
        bcc: &envelope.bcc,
        reply_to: &account,
        attachments: &envelope.attachments,
        bounce_address: &credential.username,
        app_name: &envelope.app_name,
    };

    let mut lines = LineCollector::new();
    MimeBuilder::new().build(&parts, &mut lines).await?;
    print!("{}", lines.to_message());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ezmail=info,ezmail_smtp=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let credential = credential()?;
    let envelope = envelope();
    info!(?credential, "Loaded settings");

    if var("EZMAIL_DRY_RUN").is_some() {
        return dry_run(&envelope, &credential).await;
    }

    match Mailer::new().send(&envelope, &credential).await {
        Ok(id) => {
            info!(id = %id, "Delivered");
            Ok(())
        }
        Err(err) if err.is_delivered() => {
            info!(server_id = err.server_id().unwrap_or_default(), "Delivered under a server id");
            Ok(())
        }
        Err(err) => Err(err).context("Sending failed"),
    }
}
