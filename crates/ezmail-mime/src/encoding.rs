//! Base64 body encoding and RFC 2047 header encoding.

use crate::error::{Error, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Line width for base64 content (RFC 2045).
pub const BASE64_LINE_WIDTH: usize = 76;

/// Encodes data as Base64.
#[must_use]
pub fn encode_base64(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Decodes Base64 data.
///
/// # Errors
///
/// Returns an error if the input is not valid Base64.
pub fn decode_base64(data: &str) -> Result<Vec<u8>> {
    STANDARD.decode(data).map_err(Into::into)
}

/// Base64-encodes `data` and hard-wraps it into lines of [`BASE64_LINE_WIDTH`].
///
/// Empty input produces no lines. Concatenating the lines gives back the
/// unwrapped encoding.
#[must_use]
pub fn encode_base64_lines(data: &[u8]) -> Vec<String> {
    wrap(&encode_base64(data), BASE64_LINE_WIDTH)
}

/// Splits ASCII text into lines of at most `width` characters.
#[must_use]
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    text.as_bytes()
        .chunks(width.max(1))
        .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
        .collect()
}

/// Encodes a header value as a UTF-8 base64 encoded word.
///
/// Unlike a minimal RFC 2047 encoder this always encodes, so plain ASCII
/// subjects come out encoded too.
#[must_use]
pub fn encode_header_word(text: &str) -> String {
    format!("=?utf-8?B?{}?=", encode_base64(text.as_bytes()))
}

/// Decodes an RFC 2047 encoded word.
///
/// Text that is not an encoded word is returned unchanged. Only the `B`
/// encoding is supported.
///
/// # Errors
///
/// Returns an error if the word is malformed or its payload is not valid
/// base64 UTF-8.
pub fn decode_rfc2047(text: &str) -> Result<String> {
    let Some(inner) = text
        .strip_prefix("=?")
        .and_then(|rest| rest.strip_suffix("?="))
    else {
        return Ok(text.to_string());
    };

    let parts: Vec<&str> = inner.split('?').collect();
    let [_charset, encoding, encoded_text] = parts.as_slice() else {
        return Err(Error::InvalidEncoding(
            "Invalid RFC 2047 format".to_string(),
        ));
    };

    if !encoding.eq_ignore_ascii_case("B") {
        return Err(Error::InvalidEncoding(format!(
            "Unsupported encoding: {encoding}"
        )));
    }

    let decoded = decode_base64(encoded_text)?;
    String::from_utf8(decoded).map_err(Into::into)
}
