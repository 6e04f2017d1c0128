//! Session tests for the SMTP client.
//!
//! These tests run the client over a scripted transport that replays canned
//! server chunks and records everything the client writes.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::collections::VecDeque;
use std::io;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use ezmail_smtp::parser::MAX_REPLY_LINE_LENGTH;
use ezmail_smtp::{AuthMode, BUFFER_SIZE, Client, Endpoint, Error, SessionState, Transport};

/// Transport that returns queued chunks and records writes.
#[derive(Debug, Default)]
struct ScriptedTransport {
    chunks: VecDeque<Vec<u8>>,
    written: Vec<String>,
    opened: Option<(Endpoint, Duration)>,
    upgrades: usize,
    closes: usize,
    fail_open: bool,
}

impl ScriptedTransport {
    fn new(chunks: &[&str]) -> Self {
        Self {
            chunks: chunks.iter().map(|c| c.as_bytes().to_vec()).collect(),
            ..Self::default()
        }
    }

    fn failing_open() -> Self {
        Self {
            fail_open: true,
            ..Self::default()
        }
    }
}

impl Transport for ScriptedTransport {
    async fn open(&mut self, endpoint: &Endpoint, timeout: Duration) -> ezmail_smtp::Result<()> {
        if self.fail_open {
            return Err(io::Error::new(io::ErrorKind::ConnectionRefused, "refused").into());
        }
        self.opened = Some((endpoint.clone(), timeout));
        Ok(())
    }

    async fn read_chunk(&mut self, max_len: usize) -> ezmail_smtp::Result<Vec<u8>> {
        let chunk = self
            .chunks
            .pop_front()
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "No more read result"))?;
        assert!(chunk.len() <= max_len);
        Ok(chunk)
    }

    async fn write_bytes(&mut self, data: &[u8]) -> ezmail_smtp::Result<()> {
        self.written.push(String::from_utf8(data.to_vec()).unwrap());
        Ok(())
    }

    async fn upgrade_to_encrypted(&mut self) -> ezmail_smtp::Result<()> {
        self.upgrades += 1;
        Ok(())
    }

    async fn close(&mut self) -> ezmail_smtp::Result<()> {
        self.closes += 1;
        Ok(())
    }
}

const TIMEOUT: Duration = Duration::from_secs(30);

fn client(host: &str, port: u16, chunks: &[&str]) -> Client<ScriptedTransport> {
    Client::with_transport(host, port, TIMEOUT, ScriptedTransport::new(chunks))
}

fn written(client: &Client<ScriptedTransport>) -> Vec<&str> {
    client
        .transport()
        .written
        .iter()
        .map(String::as_str)
        .collect()
}

fn b64(text: &str) -> String {
    STANDARD.encode(text)
}

/// Replies that carry a plaintext session up to a secured handshake.
const SECURED: [&str; 4] = [
    "220 smtp.mail.com ESMTP ready\r\n",
    "250-smtp.mail.com\r\n250 STARTTLS\r\n",
    "220 Go ahead\r\n",
    "250-smtp.mail.com\r\n250 AUTH LOGIN PLAIN XOAUTH2\r\n",
];

async fn secured(extra: &[&str]) -> Client<ScriptedTransport> {
    let mut chunks: Vec<&str> = SECURED.to_vec();
    chunks.extend_from_slice(extra);
    let mut client = client("smtp.mail.com", 587, &chunks);
    client.connect().await.unwrap();
    client.handshake().await.unwrap();
    client
}

async fn authenticated(extra: &[&str]) -> Client<ScriptedTransport> {
    let mut chunks = vec!["334 \r\n", "235 Authenticated\r\n"];
    chunks.extend_from_slice(extra);
    let mut client = secured(&chunks).await;
    client
        .authenticate("user@mail.com", "password123", AuthMode::Plain)
        .await
        .unwrap();
    client
}

mod connect {
    use super::*;

    #[tokio::test]
    async fn reads_announcement_across_chunks() {
        let mut client = client("localhost", 587, &["220 server rea", "dy ", ""]);

        let announcement = client.connect().await.unwrap();

        assert_eq!(announcement, vec!["server ready"]);
        let (endpoint, timeout) = client.transport().opened.clone().unwrap();
        assert_eq!(endpoint.host, "localhost");
        assert_eq!(endpoint.port, 587);
        assert!(!endpoint.implicit_tls);
        assert_eq!(timeout, TIMEOUT);
        assert!(client.transport().chunks.is_empty());
        assert!(written(&client).is_empty());
        assert_eq!(client.state(), SessionState::Connected);
    }

    #[tokio::test]
    async fn rejects_non_220_announcement() {
        let mut client = client("localhost", 587, &["420 server not ready\r\n"]);

        let err = client.connect().await.unwrap_err();

        assert!(err.is_protocol());
        assert_eq!(err.to_string(), "Invalid announcement response: 420");
        assert!(written(&client).is_empty());
    }

    #[tokio::test]
    async fn implicit_tls_on_port_465() {
        let mut client = client("smtp.mail.com", 465, &["220 ready\r\n"]);
        client.connect().await.unwrap();

        let (endpoint, _) = client.transport().opened.clone().unwrap();
        assert!(endpoint.implicit_tls);
        assert_eq!(endpoint.host, "smtp.mail.com");
        assert!(client.is_secure());
    }

    #[tokio::test]
    async fn open_failure_is_transport_error() {
        let transport = ScriptedTransport::failing_open();
        let mut client = Client::with_transport("smtp.mail.com", 587, TIMEOUT, transport);

        let err = client.connect().await.unwrap_err();

        assert!(err.is_transport());
        assert_eq!(client.state(), SessionState::Disconnected);
    }

    #[tokio::test]
    async fn short_line_is_framing_error() {
        let mut client = client("localhost", 587, &["22\r\n"]);
        let err = client.connect().await.unwrap_err();
        assert!(matches!(err, Error::Protocol(_)));
    }

    #[tokio::test]
    async fn empty_response_is_framing_error() {
        let mut client = client("localhost", 587, &[""]);
        let err = client.connect().await.unwrap_err();
        assert!(matches!(err, Error::Protocol(_)));
    }

    #[tokio::test]
    async fn endless_announcement_line_is_rejected() {
        let filler = "A".repeat(BUFFER_SIZE);
        let fills = MAX_REPLY_LINE_LENGTH / BUFFER_SIZE + 1;
        let mut chunks = vec!["220 "];
        chunks.extend(std::iter::repeat_n(filler.as_str(), fills));
        let mut client = client("localhost", 587, &chunks);

        let err = client.connect().await.unwrap_err();

        assert!(matches!(err, Error::Protocol(ref msg) if msg.contains("Reply line exceeds")));
        assert!(written(&client).is_empty());
    }

    #[tokio::test]
    async fn connect_twice_is_invalid_state() {
        let mut client = client("localhost", 587, &["220 ready\r\n"]);
        client.connect().await.unwrap();
        assert!(matches!(
            client.connect().await,
            Err(Error::InvalidState(_))
        ));
    }
}

mod handshake {
    use super::*;
    use ezmail_smtp::GreetingVerb;

    #[tokio::test]
    async fn ehlo_then_starttls_then_ehlo() {
        let client = secured(&[]).await;

        assert_eq!(
            written(&client),
            vec![
                "EHLO smtp.mail.com\r\n",
                "STARTTLS\r\n",
                "EHLO smtp.mail.com\r\n"
            ]
        );
        assert_eq!(client.transport().upgrades, 1);
        assert_eq!(client.state(), SessionState::Secured);
        assert!(client.is_secure());
        assert_eq!(client.greeting_verb(), Some(GreetingVerb::Ehlo));
        assert_eq!(client.capabilities(), ["AUTH LOGIN PLAIN XOAUTH2"]);
    }

    #[tokio::test]
    async fn helo_fallback_is_replayed_after_starttls() {
        let mut client = client(
            "smtp.mail.com",
            587,
            &[
                "220 ready\r\n",
                "502 Command not implemented\r\n",
                "250 smtp.mail.com\r\n",
                "220 Go ahead\r\n",
                "250 smtp.mail.com\r\n",
            ],
        );
        client.connect().await.unwrap();
        client.handshake().await.unwrap();

        assert_eq!(
            written(&client),
            vec![
                "EHLO smtp.mail.com\r\n",
                "HELO smtp.mail.com\r\n",
                "STARTTLS\r\n",
                "HELO smtp.mail.com\r\n"
            ]
        );
        assert_eq!(client.greeting_verb(), Some(GreetingVerb::Helo));
        assert!(client.capabilities().is_empty());
    }

    #[tokio::test]
    async fn already_secure_skips_starttls() {
        let mut client = client(
            "ssl://smtp.mail.com",
            2465,
            &["220 ready\r\n", "250 smtp.mail.com\r\n"],
        );
        client.connect().await.unwrap();
        client.handshake().await.unwrap();

        assert_eq!(written(&client), vec!["EHLO smtp.mail.com\r\n"]);
        assert_eq!(client.transport().upgrades, 0);
        assert_eq!(client.state(), SessionState::Greeted);
    }

    #[tokio::test]
    async fn custom_hello_name() {
        let mut client = client(
            "ssl://smtp.mail.com",
            465,
            &["220 ready\r\n", "250 ok\r\n"],
        )
        .hello_name("client.example.org");
        client.connect().await.unwrap();
        client.handshake().await.unwrap();

        assert_eq!(written(&client), vec!["EHLO client.example.org\r\n"]);
    }

    #[tokio::test]
    async fn helo_refused() {
        let mut client = client(
            "smtp.mail.com",
            587,
            &["220 ready\r\n", "502 no\r\n", "501 no\r\n"],
        );
        client.connect().await.unwrap();
        let err = client.handshake().await.unwrap_err();

        assert_eq!(err.to_string(), "Invalid HELO response: 501");
    }

    #[tokio::test]
    async fn starttls_refused() {
        let mut client = client(
            "smtp.mail.com",
            587,
            &["220 ready\r\n", "250 ok\r\n", "454 TLS not available\r\n"],
        );
        client.connect().await.unwrap();
        let err = client.handshake().await.unwrap_err();

        assert_eq!(err.to_string(), "Invalid STARTTLS response: 454");
        assert_eq!(client.transport().upgrades, 0);
    }

    #[tokio::test]
    async fn ehlo_replay_refused() {
        let mut client = client(
            "smtp.mail.com",
            587,
            &["220 ready\r\n", "250 ok\r\n", "220 go\r\n", "500 what\r\n"],
        );
        client.connect().await.unwrap();
        let err = client.handshake().await.unwrap_err();

        assert!(err.is_protocol());
        assert!(err.to_string().contains("after STARTTLS"));
        assert_eq!(err.reply_code(), Some(500));
    }

    #[tokio::test]
    async fn helo_replay_refused() {
        let mut client = client(
            "smtp.mail.com",
            587,
            &[
                "220 ready\r\n",
                "502 no\r\n",
                "250 ok\r\n",
                "220 go\r\n",
                "503 what\r\n",
            ],
        );
        client.connect().await.unwrap();
        let err = client.handshake().await.unwrap_err();

        assert_eq!(err.to_string(), "Invalid HELO after STARTTLS response: 503");
    }
}

mod authenticate {
    use super::*;

    #[tokio::test]
    async fn login_sequence() {
        let username_prompt = format!("334 {}\r\n", b64("Username:"));
        let password_prompt = format!("334 {}\r\n", b64("Password:"));
        let mut client = secured(&[
            &username_prompt,
            &password_prompt,
            "235 2.7.0 Authentication successful\r\n",
        ])
        .await;

        client
            .authenticate("user@mail.com", "password123", AuthMode::Standard)
            .await
            .unwrap();

        assert_eq!(
            written(&client)[3..],
            [
                "AUTH LOGIN\r\n".to_string(),
                format!("{}\r\n", b64("user@mail.com")),
                format!("{}\r\n", b64("password123")),
            ]
        );
        assert_eq!(client.state(), SessionState::Authenticated);
    }

    #[tokio::test]
    async fn login_rejected_password() {
        let username_prompt = format!("334 {}\r\n", b64("Username:"));
        let password_prompt = format!("334 {}\r\n", b64("Password:"));
        let mut client = secured(&[
            &username_prompt,
            &password_prompt,
            "535 5.7.8 Authentication credentials invalid\r\n",
        ])
        .await;

        let err = client
            .authenticate("user@mail.com", "wrong", AuthMode::Standard)
            .await
            .unwrap_err();

        assert!(err.is_authentication());
        assert!(!err.is_protocol());
    }

    #[tokio::test]
    async fn login_unexpected_code_names_step() {
        let username_prompt = format!("334 {}\r\n", b64("Username:"));
        let mut client = secured(&[&username_prompt, "501 syntax\r\n"]).await;

        let err = client
            .authenticate("user@mail.com", "password123", AuthMode::Standard)
            .await
            .unwrap_err();

        assert!(err.is_protocol());
        assert_eq!(err.to_string(), "Invalid AUTH LOGIN username response: 501");
    }

    #[tokio::test]
    async fn login_wrong_challenge() {
        let mut client = secured(&[&format!("334 {}\r\n", b64("Password:"))]).await;

        let err = client
            .authenticate("user@mail.com", "password123", AuthMode::Standard)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Protocol(_)));
    }

    #[tokio::test]
    async fn plain_sequence() {
        let client = authenticated(&[]).await;

        assert_eq!(
            written(&client)[3..],
            [
                "AUTH PLAIN\r\n".to_string(),
                format!("{}\r\n", b64("\0user@mail.com\0password123")),
            ]
        );
        assert_eq!(client.state(), SessionState::Authenticated);
    }

    #[tokio::test]
    async fn plain_rejected() {
        let mut client = secured(&["334 \r\n", "535 rejected\r\n"]).await;

        let err = client
            .authenticate("user@mail.com", "wrong", AuthMode::Plain)
            .await
            .unwrap_err();

        assert!(err.is_authentication());
    }

    #[tokio::test]
    async fn plain_refused_mechanism() {
        let mut client = secured(&["504 Unrecognized authentication type\r\n"]).await;

        let err = client
            .authenticate("user@mail.com", "password123", AuthMode::Plain)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Invalid AUTH PLAIN response: 504");
    }

    #[tokio::test]
    async fn xoauth2_single_verb() {
        let mut client = secured(&["235 Accepted\r\n"]).await;

        client
            .authenticate("user@mail.com", "token123", AuthMode::OAuth2)
            .await
            .unwrap();

        let expected = b64("user=user@mail.com\x01auth=Bearer token123\x01\x01");
        assert_eq!(
            written(&client)[3..],
            [format!("AUTH XOAUTH2 {expected}\r\n")]
        );
    }

    #[tokio::test]
    async fn xoauth2_rejected() {
        let mut client = secured(&["535 Invalid token\r\n"]).await;

        let err = client
            .authenticate("user@mail.com", "expired", AuthMode::OAuth2)
            .await
            .unwrap_err();

        assert!(err.is_authentication());
    }

    #[tokio::test]
    async fn xoauth2_error_challenge() {
        let detail = r#"{"status":"401","schemes":"bearer"}"#;
        let challenge = format!("334 {}\r\n", b64(detail));
        let mut client = secured(&[&challenge, "535 5.7.8 Username and Password not accepted\r\n"])
            .await;

        let err = client
            .authenticate("user@mail.com", "expired", AuthMode::OAuth2)
            .await
            .unwrap_err();

        match err {
            Error::Authentication { step, message } => {
                assert_eq!(step, "AUTH XOAUTH2");
                assert_eq!(message, detail);
            }
            other => panic!("expected authentication error, got {other:?}"),
        }
        assert_eq!(written(&client).last(), Some(&"\r\n"));
    }

    #[tokio::test]
    async fn empty_username_fails_before_io() {
        let mut client = secured(&[]).await;
        let before = written(&client).len();

        let err = client
            .authenticate("", "password123", AuthMode::Plain)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Argument(_)));
        assert_eq!(written(&client).len(), before);
    }

    #[tokio::test]
    async fn before_handshake_is_invalid_state() {
        let mut client = client("smtp.mail.com", 587, &["220 ready\r\n"]);
        client.connect().await.unwrap();

        let err = client
            .authenticate("user@mail.com", "password123", AuthMode::Plain)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::InvalidState(_)));
    }
}

mod transaction {
    use super::*;

    fn recipients() -> Vec<String> {
        vec!["recv@mail.com".to_string(), "cc@mail.com".to_string()]
    }

    #[tokio::test]
    async fn full_transaction() {
        let mut client = authenticated(&[
            "250 2.1.0 Sender OK\r\n",
            "250 2.1.5 Recipient OK\r\n",
            "250\r\n",
            "354 Start mail input; end with <CRLF>.<CRLF>\r\n",
            "250 2.0.0 OK <111>\r\n",
        ])
        .await;

        client
            .start_transaction("user@mail.com", &recipients())
            .await
            .unwrap();
        assert_eq!(client.state(), SessionState::InTransaction);

        client.write_data("Subject: hi").await.unwrap();
        client.write_data("").await.unwrap();
        client.write_data(".hidden").await.unwrap();
        let id = client.end_transaction().await.unwrap();

        assert_eq!(id, "111");
        assert_eq!(client.state(), SessionState::Authenticated);
        assert_eq!(
            written(&client)[5..],
            [
                "MAIL FROM:<user@mail.com>\r\n",
                "RCPT TO:<recv@mail.com>\r\n",
                "RCPT TO:<cc@mail.com>\r\n",
                "DATA\r\n",
                "Subject: hi\r\n",
                "\r\n",
                "..hidden\r\n",
                ".\r\n",
            ]
        );
    }

    #[tokio::test]
    async fn mail_from_refused() {
        let mut client = authenticated(&["550 Sender rejected\r\n"]).await;

        let err = client
            .start_transaction("user@mail.com", &recipients())
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Invalid MAIL FROM response: 550");
    }

    #[tokio::test]
    async fn rcpt_to_refused() {
        let mut client =
            authenticated(&["250 OK\r\n", "250 OK\r\n", "550 No such user\r\n"]).await;

        let err = client
            .start_transaction("user@mail.com", &recipients())
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Invalid RCPT TO response: 550");
        assert_eq!(client.state(), SessionState::Authenticated);
    }

    #[tokio::test]
    async fn data_refused() {
        let mut client = authenticated(&[
            "250 OK\r\n",
            "250 OK\r\n",
            "250 OK\r\n",
            "554 Transaction failed\r\n",
        ])
        .await;

        let err = client
            .start_transaction("user@mail.com", &recipients())
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Invalid DATA response: 554");
    }

    #[tokio::test]
    async fn no_recipients() {
        let mut client = authenticated(&[]).await;
        let err = client
            .start_transaction("user@mail.com", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Argument(_)));
    }

    #[tokio::test]
    async fn confirmation_without_id() {
        let mut client = authenticated(&[
            "250 OK\r\n",
            "250 OK\r\n",
            "250 OK\r\n",
            "354 go\r\n",
            "250 Queued\r\n",
        ])
        .await;
        client
            .start_transaction("user@mail.com", &recipients())
            .await
            .unwrap();

        let err = client.end_transaction().await.unwrap_err();

        assert!(matches!(err, Error::Protocol(_)));
    }

    #[tokio::test]
    async fn message_refused() {
        let mut client = authenticated(&[
            "250 OK\r\n",
            "250 OK\r\n",
            "250 OK\r\n",
            "354 go\r\n",
            "552 Message too big\r\n",
        ])
        .await;
        client
            .start_transaction("user@mail.com", &recipients())
            .await
            .unwrap();

        let err = client.end_transaction().await.unwrap_err();

        assert_eq!(err.reply_code(), Some(552));
    }

    #[tokio::test]
    async fn data_line_with_line_break_is_refused() {
        let mut client = authenticated(&[
            "250 OK\r\n",
            "250 OK\r\n",
            "250 OK\r\n",
            "354 go\r\n",
        ])
        .await;
        client
            .start_transaction("user@mail.com", &recipients())
            .await
            .unwrap();
        let before = written(&client).len();

        for line in ["To: Mr\r\n.\r\nRSET <recv@mail.com>", "a\nb", "a\rb"] {
            let err = client.write_data(line).await.unwrap_err();
            assert!(matches!(err, Error::Argument(_)));
        }

        assert_eq!(written(&client).len(), before);
        assert_eq!(client.state(), SessionState::InTransaction);
    }

    #[tokio::test]
    async fn write_outside_transaction() {
        let mut client = authenticated(&[]).await;
        assert!(matches!(
            client.write_data("stray").await,
            Err(Error::InvalidState(_))
        ));
    }
}

mod quit {
    use super::*;

    #[tokio::test]
    async fn sends_quit_and_closes() {
        let mut client = authenticated(&["221 Bye\r\n"]).await;

        client.quit().await.unwrap();

        assert_eq!(written(&client).last(), Some(&"QUIT\r\n"));
        assert_eq!(client.transport().closes, 1);
        assert_eq!(client.state(), SessionState::Closed);
    }

    #[tokio::test]
    async fn failed_quit_reply_still_closes() {
        // No reply queued: reading the QUIT reply fails.
        let mut client = authenticated(&[]).await;

        client.quit().await.unwrap();

        assert_eq!(client.transport().closes, 1);
    }

    #[tokio::test]
    async fn quit_is_idempotent() {
        let mut client = authenticated(&["221 Bye\r\n"]).await;

        client.quit().await.unwrap();
        client.quit().await.unwrap();

        assert_eq!(client.transport().closes, 1);
        assert_eq!(
            written(&client).iter().filter(|l| **l == "QUIT\r\n").count(),
            1
        );
    }

    #[tokio::test]
    async fn quit_without_connection() {
        let transport = ScriptedTransport::failing_open();
        let mut client = Client::with_transport("smtp.mail.com", 587, TIMEOUT, transport);
        assert!(client.connect().await.is_err());

        client.quit().await.unwrap();

        assert!(written(&client).is_empty());
        assert_eq!(client.transport().closes, 1);
    }

    #[tokio::test]
    async fn quit_mid_transaction_does_not_wait_for_reply() {
        let mut client = authenticated(&["250 OK\r\n", "250 OK\r\n", "354 go\r\n"]).await;
        client
            .start_transaction("user@mail.com", &["recv@mail.com".to_string()])
            .await
            .unwrap();

        client.quit().await.unwrap();

        assert_eq!(written(&client).last(), Some(&"QUIT\r\n"));
        assert_eq!(client.transport().closes, 1);
    }
}
