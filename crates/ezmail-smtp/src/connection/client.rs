//! SMTP session state machine.

use super::stream::TcpTransport;
use super::transport::{Endpoint, Transport};
use crate::command::Command;
use crate::error::{Error, Result};
use crate::parser::{LineBuffer, MIN_REPLY_LINE_LEN, is_last_reply_line, parse_reply};
use crate::sasl;
use crate::types::{Address, AuthMode, Reply, ReplyCode};
use std::time::Duration;

/// Maximum number of bytes requested from the transport per read.
pub const BUFFER_SIZE: usize = 512;

/// Default connect/read timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Protocol state of one session.
///
/// ```text
/// Disconnected → Connected → Greeted → [Secured] → Authenticated ⇄ InTransaction
///       └──────────────── quit() from any state ────────────────→ Closed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Transport not opened yet.
    Disconnected,
    /// Greeting accepted.
    Connected,
    /// EHLO or HELO accepted.
    Greeted,
    /// STARTTLS done and greeting verb replayed.
    Secured,
    /// AUTH accepted.
    Authenticated,
    /// DATA accepted, message lines may be written.
    InTransaction,
    /// QUIT sent and transport closed.
    Closed,
}

/// Greeting verb the server accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GreetingVerb {
    /// Extended greeting.
    Ehlo,
    /// Legacy greeting.
    Helo,
}

impl GreetingVerb {
    /// Returns the verb as sent on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ehlo => "EHLO",
            Self::Helo => "HELO",
        }
    }
}

/// SMTP client owning one transport for the lifetime of a session.
#[derive(Debug)]
pub struct Client<T = TcpTransport> {
    transport: T,
    endpoint: Endpoint,
    hello_name: String,
    timeout: Duration,
    state: SessionState,
    secure: bool,
    greeting_verb: Option<GreetingVerb>,
    capabilities: Vec<String>,
    buffer: LineBuffer,
}

impl Client<TcpTransport> {
    /// Creates a client that will connect over TCP.
    ///
    /// `host` may carry an `ssl://`, `tls://` or `tcp://` prefix; see [`Endpoint::new`].
    #[must_use]
    pub fn new(host: &str, port: u16, timeout: Duration) -> Self {
        Self::with_transport(host, port, timeout, TcpTransport::new())
    }
}

impl<T: Transport> Client<T> {
    /// Creates a client over the given transport.
    #[must_use]
    pub fn with_transport(host: &str, port: u16, timeout: Duration, transport: T) -> Self {
        let endpoint = Endpoint::new(host, port);
        Self {
            transport,
            hello_name: endpoint.host.clone(),
            endpoint,
            timeout,
            state: SessionState::Disconnected,
            secure: false,
            greeting_verb: None,
            capabilities: Vec::new(),
            buffer: LineBuffer::new(),
        }
    }

    /// Overrides the name sent with EHLO/HELO (defaults to the server host).
    #[must_use]
    pub fn hello_name(mut self, name: impl Into<String>) -> Self {
        self.hello_name = name.into();
        self
    }

    /// Returns the endpoint this client connects to.
    #[must_use]
    pub const fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Returns the current protocol state.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Returns true once the stream is encrypted.
    #[must_use]
    pub const fn is_secure(&self) -> bool {
        self.secure
    }

    /// Returns the greeting verb the server accepted, if any.
    #[must_use]
    pub const fn greeting_verb(&self) -> Option<GreetingVerb> {
        self.greeting_verb
    }

    /// Returns the capability lines from the last EHLO reply.
    #[must_use]
    pub fn capabilities(&self) -> &[String] {
        &self.capabilities
    }

    /// Returns the underlying transport.
    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Opens the transport and reads the server announcement.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the stream cannot be opened, or a protocol
    /// error unless the greeting code is 220.
    pub async fn connect(&mut self) -> Result<Vec<String>> {
        self.expect_state("connect", &[SessionState::Disconnected])?;

        tracing::debug!(endpoint = %self.endpoint, "Opening SMTP connection");
        self.transport.open(&self.endpoint, self.timeout).await?;
        self.secure = self.endpoint.implicit_tls;
        self.state = SessionState::Connected;

        let reply = self.read_reply().await?;
        if !reply.is(ReplyCode::SERVICE_READY) {
            return Err(Error::unexpected_reply(
                "announcement",
                reply.code.as_u16(),
                reply.message_text(),
            ));
        }

        Ok(reply.message)
    }

    /// Negotiates the greeting verb and upgrades to TLS when not already secure.
    ///
    /// EHLO is tried first, HELO on refusal. After STARTTLS the same verb is
    /// replayed.
    ///
    /// # Errors
    ///
    /// Returns a protocol error if HELO is refused, STARTTLS is not answered
    /// with 220, or the post-upgrade greeting is refused.
    pub async fn handshake(&mut self) -> Result<()> {
        self.expect_state("handshake", &[SessionState::Connected])?;

        let verb = if self.ehlo().await?.is(ReplyCode::OK) {
            GreetingVerb::Ehlo
        } else {
            tracing::debug!("EHLO refused, falling back to HELO");
            self.helo("HELO").await?;
            GreetingVerb::Helo
        };
        tracing::debug!(verb = verb.as_str(), "Greeting accepted");
        self.greeting_verb = Some(verb);
        self.state = SessionState::Greeted;

        if self.secure {
            return Ok(());
        }

        let reply = self.send_command(Command::StartTls).await?;
        if !reply.is(ReplyCode::SERVICE_READY) {
            return Err(Error::unexpected_reply(
                "STARTTLS",
                reply.code.as_u16(),
                reply.message_text(),
            ));
        }

        self.transport.upgrade_to_encrypted().await?;
        self.buffer.clear();
        self.secure = true;

        match verb {
            GreetingVerb::Ehlo => {
                let reply = self.ehlo().await?;
                if !reply.is(ReplyCode::OK) {
                    return Err(Error::unexpected_reply(
                        "EHLO after STARTTLS",
                        reply.code.as_u16(),
                        reply.message_text(),
                    ));
                }
            }
            GreetingVerb::Helo => self.helo("HELO after STARTTLS").await?,
        }

        self.state = SessionState::Secured;
        Ok(())
    }

    /// Authenticates with the given mode.
    ///
    /// # Errors
    ///
    /// Returns an authentication error on reply 535, a protocol error naming
    /// the step on any other unexpected reply, or an argument error for an
    /// empty username.
    pub async fn authenticate(
        &mut self,
        username: &str,
        secret: &str,
        mode: AuthMode,
    ) -> Result<()> {
        if username.is_empty() {
            return Err(Error::Argument("Username is empty".into()));
        }
        self.expect_state("authenticate", &[SessionState::Greeted, SessionState::Secured])?;

        match mode {
            AuthMode::Standard => self.auth_login(username, secret).await?,
            AuthMode::Plain => self.auth_plain(username, secret).await?,
            AuthMode::OAuth2 => self.auth_xoauth2(username, secret).await?,
        }

        tracing::debug!(mechanism = mode.mechanism(), "Authenticated");
        self.state = SessionState::Authenticated;
        Ok(())
    }

    async fn auth_login(&mut self, username: &str, password: &str) -> Result<()> {
        let reply = self
            .send_command(Command::Auth {
                mode: AuthMode::Standard,
                initial_response: None,
            })
            .await?;
        expect_auth_reply(&reply, ReplyCode::AUTH_CONTINUE, "AUTH LOGIN")?;
        expect_prompt(&reply, sasl::LOGIN_USERNAME_PROMPT, "AUTH LOGIN")?;

        let reply = self
            .send_command(Command::AuthResponse(sasl::login_response(username)))
            .await?;
        expect_auth_reply(&reply, ReplyCode::AUTH_CONTINUE, "AUTH LOGIN username")?;
        expect_prompt(&reply, sasl::LOGIN_PASSWORD_PROMPT, "AUTH LOGIN username")?;

        let reply = self
            .send_command(Command::AuthResponse(sasl::login_response(password)))
            .await?;
        expect_auth_reply(&reply, ReplyCode::AUTH_SUCCESS, "AUTH LOGIN password")
    }

    async fn auth_plain(&mut self, username: &str, password: &str) -> Result<()> {
        let reply = self
            .send_command(Command::Auth {
                mode: AuthMode::Plain,
                initial_response: None,
            })
            .await?;
        expect_auth_reply(&reply, ReplyCode::AUTH_CONTINUE, "AUTH PLAIN")?;

        let reply = self
            .send_command(Command::AuthResponse(sasl::plain_response(username, password)))
            .await?;
        expect_auth_reply(&reply, ReplyCode::AUTH_SUCCESS, "AUTH PLAIN credentials")
    }

    async fn auth_xoauth2(&mut self, username: &str, token: &str) -> Result<()> {
        let reply = self
            .send_command(Command::Auth {
                mode: AuthMode::OAuth2,
                initial_response: Some(sasl::xoauth2_response(username, token)),
            })
            .await?;

        if !reply.is(ReplyCode::AUTH_CONTINUE) {
            return expect_auth_reply(&reply, ReplyCode::AUTH_SUCCESS, "AUTH XOAUTH2");
        }

        // The server sent a JSON error challenge and waits for an empty line
        // before the final reply.
        let detail = sasl::decode_challenge(reply.first_line()).unwrap_or_default();
        let reply = self.send_command(Command::AuthResponse(String::new())).await?;
        if reply.is(ReplyCode::AUTH_FAILED) {
            return Err(Error::Authentication {
                step: "AUTH XOAUTH2".into(),
                message: if detail.is_empty() {
                    reply.message_text()
                } else {
                    detail
                },
            });
        }
        expect_auth_reply(&reply, ReplyCode::AUTH_SUCCESS, "AUTH XOAUTH2")
    }

    /// Opens a mail transaction: `MAIL FROM`, one `RCPT TO` per recipient, `DATA`.
    ///
    /// # Errors
    ///
    /// Returns an argument error for invalid addresses or no recipients, and a
    /// protocol error naming the command whose reply was not the expected one.
    pub async fn start_transaction(&mut self, from: &str, to: &[String]) -> Result<()> {
        let from = Address::new(from)?;
        let recipients = to
            .iter()
            .map(|addr| Address::new(addr.as_str()))
            .collect::<Result<Vec<_>>>()?;
        if recipients.is_empty() {
            return Err(Error::Argument("No message recipients".into()));
        }
        self.expect_state("start_transaction", &[SessionState::Authenticated])?;

        let reply = self.send_command(Command::MailFrom { from }).await?;
        expect_reply(&reply, ReplyCode::OK, "MAIL FROM")?;

        for to in recipients {
            let reply = self.send_command(Command::RcptTo { to }).await?;
            expect_reply(&reply, ReplyCode::OK, "RCPT TO")?;
        }

        let reply = self.send_command(Command::Data).await?;
        expect_reply(&reply, ReplyCode::START_DATA, "DATA")?;

        self.state = SessionState::InTransaction;
        Ok(())
    }

    /// Writes one message line into the open DATA stream.
    ///
    /// The CRLF terminator is appended. A leading `.` is doubled so the line
    /// cannot end the DATA stream.
    ///
    /// # Errors
    ///
    /// Returns an error if no transaction is open, the line carries a CR or
    /// LF of its own, or the write fails.
    pub async fn write_data(&mut self, line: &str) -> Result<()> {
        self.expect_state("write_data", &[SessionState::InTransaction])?;
        if line.contains(['\r', '\n']) {
            return Err(Error::Argument("Data line contains a line break".into()));
        }

        let mut data = Vec::with_capacity(line.len() + 3);
        if line.starts_with('.') {
            data.push(b'.');
        }
        data.extend_from_slice(line.as_bytes());
        data.extend_from_slice(b"\r\n");
        self.transport.write_bytes(&data).await
    }

    /// Terminates DATA and returns the delivery id the server confirmed.
    ///
    /// # Errors
    ///
    /// Returns a protocol error if the reply is not 250 or carries no
    /// `OK` marker followed by an id.
    pub async fn end_transaction(&mut self) -> Result<String> {
        self.expect_state("end_transaction", &[SessionState::InTransaction])?;

        let reply = self.send_command(Command::EndData).await?;
        self.state = SessionState::Authenticated;
        expect_reply(&reply, ReplyCode::OK, "end of DATA")?;

        let text = reply.message_text();
        parse_delivery_id(&text).ok_or_else(|| {
            Error::Protocol(format!("Unable to find message id in server response: {text}"))
        })
    }

    /// Sends QUIT (best effort) and closes the transport.
    ///
    /// Safe to call in any state, including after a failure or a previous quit.
    ///
    /// # Errors
    ///
    /// Returns an error only if closing the transport fails.
    pub async fn quit(&mut self) -> Result<()> {
        match self.state {
            SessionState::Closed => return Ok(()),
            SessionState::Disconnected => {}
            SessionState::InTransaction => {
                // The server is reading message data and will not answer.
                if let Err(e) = self.write_command(&Command::Quit).await {
                    tracing::debug!(error = %e, "QUIT failed");
                }
            }
            _ => {
                if let Err(e) = self.send_command(Command::Quit).await {
                    tracing::debug!(error = %e, "QUIT failed");
                }
            }
        }

        self.state = SessionState::Closed;
        self.buffer.clear();
        self.transport.close().await
    }

    async fn ehlo(&mut self) -> Result<Reply> {
        let reply = self
            .send_command(Command::Ehlo {
                hostname: self.hello_name.clone(),
            })
            .await?;

        if reply.is(ReplyCode::OK) {
            self.capabilities = reply.message.iter().skip(1).cloned().collect();
        }
        Ok(reply)
    }

    async fn helo(&mut self, step: &str) -> Result<()> {
        let reply = self
            .send_command(Command::Helo {
                hostname: self.hello_name.clone(),
            })
            .await?;
        self.capabilities.clear();
        expect_reply(&reply, ReplyCode::OK, step)
    }

    fn expect_state(&self, operation: &str, allowed: &[SessionState]) -> Result<()> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(Error::InvalidState(format!(
                "{operation} is not allowed in state {:?}",
                self.state
            )))
        }
    }

    async fn send_command(&mut self, cmd: Command) -> Result<Reply> {
        self.write_command(&cmd).await?;
        self.read_reply().await
    }

    async fn write_command(&mut self, cmd: &Command) -> Result<()> {
        tracing::debug!(command = %cmd.log_line(), "smtp >");
        self.transport.write_bytes(&cmd.serialize()).await
    }

    async fn read_reply(&mut self) -> Result<Reply> {
        let mut lines = Vec::new();
        loop {
            let line = if let Some(line) = self.buffer.next_line() {
                line
            } else {
                let chunk = self.transport.read_chunk(BUFFER_SIZE).await?;
                if !chunk.is_empty() {
                    self.buffer.extend(&chunk)?;
                    continue;
                }
                // Nothing more available: whatever is buffered is the line.
                match self.buffer.take_partial() {
                    Some(line) => line,
                    None if lines.is_empty() => {
                        return Err(Error::Protocol("Empty server response".into()));
                    }
                    None => {
                        return Err(Error::Protocol("Truncated multi-line response".into()));
                    }
                }
            };

            tracing::trace!(line = %line, "smtp <");
            if line.is_empty() {
                continue;
            }
            if line.len() < MIN_REPLY_LINE_LEN {
                return Err(Error::Protocol(format!(
                    "Invalid server response length: {line:?}"
                )));
            }

            let is_last = is_last_reply_line(&line);
            lines.push(line);
            if is_last {
                break;
            }
        }

        parse_reply(&lines)
    }
}

fn expect_reply(reply: &Reply, expected: ReplyCode, step: &str) -> Result<()> {
    if reply.is(expected) {
        Ok(())
    } else {
        Err(Error::unexpected_reply(
            step,
            reply.code.as_u16(),
            reply.message_text(),
        ))
    }
}

fn expect_auth_reply(reply: &Reply, expected: ReplyCode, step: &str) -> Result<()> {
    if reply.is(ReplyCode::AUTH_FAILED) {
        return Err(Error::Authentication {
            step: step.into(),
            message: reply.message_text(),
        });
    }
    expect_reply(reply, expected, step)
}

fn expect_prompt(reply: &Reply, prompt: &str, step: &str) -> Result<()> {
    match sasl::decode_challenge(reply.first_line()) {
        Some(decoded) if sasl::is_prompt(&decoded, prompt) => Ok(()),
        Some(decoded) => Err(Error::Protocol(format!(
            "Invalid {step} challenge: expected {prompt:?}, got {decoded:?}"
        ))),
        None => Err(Error::Protocol(format!(
            "Invalid {step} challenge: {:?}",
            reply.first_line()
        ))),
    }
}

/// Extracts the delivery id from the reply to the end of DATA.
///
/// The id follows an `OK` marker, either bracketed (`<id>` or `[id]`) or
/// prefixed with `id=`; whichever form appears first wins.
#[must_use]
pub fn parse_delivery_id(text: &str) -> Option<String> {
    let marker = text.find("OK")?;
    let rest = &text[marker + 2..];

    let bracket = rest
        .find(['<', '['])
        .map(|start| (start, Form::Bracketed));
    let prefixed = rest.find("id=").map(|start| (start, Form::Prefixed));

    let (start, form) = match (bracket, prefixed) {
        (Some(b), Some(p)) => {
            if b.0 < p.0 {
                b
            } else {
                p
            }
        }
        (Some(found), None) | (None, Some(found)) => found,
        (None, None) => return None,
    };

    let token = match form {
        Form::Bracketed => {
            let close = if rest.as_bytes()[start] == b'<' { '>' } else { ']' };
            let inner = &rest[start + 1..];
            &inner[..inner.find(close)?]
        }
        Form::Prefixed => {
            let value = &rest[start + 3..];
            let end = value.find(char::is_whitespace).unwrap_or(value.len());
            value[..end].trim_matches(|c| matches!(c, '<' | '>' | '[' | ']'))
        }
    };

    let token = token.trim();
    (!token.is_empty()).then(|| token.to_string())
}

#[derive(Clone, Copy)]
enum Form {
    Bracketed,
    Prefixed,
}
