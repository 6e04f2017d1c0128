//! SASL payloads for the supported authentication modes.
//!
//! Implements:
//! - LOGIN - base64 username and password answered to server prompts
//! - PLAIN (RFC 4616) - `\0<username>\0<password>`
//! - XOAUTH2 (Google/Microsoft) - `user=<user>\x01auth=Bearer <token>\x01\x01`

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Prompt the server sends (base64) before the LOGIN username.
pub const LOGIN_USERNAME_PROMPT: &str = "Username:";

/// Prompt the server sends (base64) before the LOGIN password.
pub const LOGIN_PASSWORD_PROMPT: &str = "Password:";

/// Base64-encodes a single LOGIN answer.
#[must_use]
pub fn login_response(value: &str) -> String {
    STANDARD.encode(value.as_bytes())
}

/// Generates PLAIN initial response (RFC 4616).
///
/// The first NUL is for the authorization identity (empty = same as auth identity).
#[must_use]
pub fn plain_response(username: &str, password: &str) -> String {
    let auth_string = format!("\0{username}\0{password}");
    STANDARD.encode(auth_string.as_bytes())
}

/// Generates XOAUTH2 initial response.
#[must_use]
pub fn xoauth2_response(user: &str, token: &str) -> String {
    let auth_string = format!("user={user}\x01auth=Bearer {token}\x01\x01");
    STANDARD.encode(auth_string.as_bytes())
}

/// Decodes a base64 server challenge into text.
///
/// Returns `None` if the challenge is not valid base64 or not UTF-8.
#[must_use]
pub fn decode_challenge(challenge: &str) -> Option<String> {
    let bytes = STANDARD.decode(challenge.trim()).ok()?;
    String::from_utf8(bytes).ok()
}

/// Returns true if a decoded LOGIN challenge matches the expected prompt.
#[must_use]
pub fn is_prompt(decoded: &str, prompt: &str) -> bool {
    decoded.trim().eq_ignore_ascii_case(prompt)
}
