//! SMTP response parser.

use crate::error::{Error, Result};
use crate::types::{Reply, ReplyCode};

/// Shortest acceptable reply line: a bare three-digit code.
pub const MIN_REPLY_LINE_LEN: usize = 3;

/// Longest unterminated reply line buffered before the reply is rejected.
pub const MAX_REPLY_LINE_LENGTH: usize = 64 * 1024;

/// Parses an SMTP reply from response lines.
///
/// SMTP replies can be single-line or multi-line:
/// - Single: `250 OK\r\n`
/// - Multi: `250-First line\r\n250-Second line\r\n250 Last line\r\n`
/// - Bare: `250\r\n` (accepted, empty message)
///
/// The code is taken from the first line; continuation lines are trusted to
/// carry the same code.
///
/// # Errors
///
/// Returns an error if the reply is malformed.
pub fn parse_reply(lines: &[String]) -> Result<Reply> {
    let Some(first) = lines.first() else {
        return Err(Error::Protocol("Empty reply".into()));
    };

    let code = parse_code(first)?;

    let mut message = Vec::with_capacity(lines.len());
    for line in lines {
        if line.len() < MIN_REPLY_LINE_LEN {
            return Err(Error::Protocol(format!(
                "Invalid server response length: {line:?}"
            )));
        }
        message.push(line.get(4..).unwrap_or_default().to_string());
    }

    Ok(Reply::new(code, message))
}

fn parse_code(line: &str) -> Result<ReplyCode> {
    let code_str = line
        .get(0..3)
        .ok_or_else(|| Error::Protocol(format!("Invalid server response length: {line:?}")))?;

    if !code_str.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::Protocol(format!("Invalid reply code: {code_str}")));
    }

    code_str
        .parse::<u16>()
        .map(ReplyCode::new)
        .map_err(|_| Error::Protocol(format!("Invalid reply code: {code_str}")))
}

/// Checks if a line is the last line of a reply.
///
/// Multi-line replies use `-` separator for continuation and ` ` for the last
/// line. A bare code with no text is also final.
#[must_use]
pub fn is_last_reply_line(line: &str) -> bool {
    line.len() == MIN_REPLY_LINE_LEN || (line.len() >= 4 && line.as_bytes()[3] == b' ')
}

/// Accumulates raw chunks from the transport and splits them into lines.
#[derive(Debug, Default)]
pub struct LineBuffer {
    buf: Vec<u8>,
}

impl LineBuffer {
    /// Creates an empty buffer.
    #[must_use]
    pub const fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Appends a chunk read from the transport.
    ///
    /// # Errors
    ///
    /// Returns a protocol error, and drops the buffered bytes, if the pending
    /// line grows past [`MAX_REPLY_LINE_LENGTH`].
    pub fn extend(&mut self, chunk: &[u8]) -> Result<()> {
        self.buf.extend_from_slice(chunk);

        let line_start = self
            .buf
            .iter()
            .rposition(|&b| b == b'\n')
            .map_or(0, |pos| pos + 1);
        if self.buf.len() - line_start > MAX_REPLY_LINE_LENGTH {
            self.buf.clear();
            return Err(Error::Protocol(format!(
                "Reply line exceeds {MAX_REPLY_LINE_LENGTH} bytes"
            )));
        }
        Ok(())
    }

    /// Removes and returns the next complete (LF-terminated) line.
    ///
    /// Trailing whitespace, including the CRLF, is stripped.
    pub fn next_line(&mut self) -> Option<String> {
        let end = self.buf.iter().position(|&b| b == b'\n')?;
        let raw: Vec<u8> = self.buf.drain(..=end).collect();
        Some(String::from_utf8_lossy(&raw).trim_end().to_string())
    }

    /// Removes and returns whatever unterminated text remains.
    pub fn take_partial(&mut self) -> Option<String> {
        if self.buf.is_empty() {
            return None;
        }
        let raw = std::mem::take(&mut self.buf);
        Some(String::from_utf8_lossy(&raw).trim_end().to_string())
    }

    /// Returns true if nothing is buffered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Drops any buffered bytes.
    pub fn clear(&mut self) {
        self.buf.clear();
    }
}
