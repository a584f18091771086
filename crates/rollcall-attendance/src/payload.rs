//! Transport payload format for session tokens.
//!
//! The image codec that carries payloads between presenter and
//! participant is external; this module only owns the string it encodes:
//! `SESSION_TOKEN:<token>`.

use crate::error::AttendanceError;
use crate::token;

pub const SESSION_TOKEN_PREFIX: &str = "SESSION_TOKEN:";

/// Wrap a token in its transport payload.
pub fn encode_session_payload(token: &str) -> String {
    format!("{SESSION_TOKEN_PREFIX}{token}")
}

/// Extract the token from a decoded transport payload.
///
/// Surrounding whitespace is ignored and hex digits are normalized to
/// lowercase. Anything else that does not look like a session payload
/// is a [`AttendanceError::DecodeFailure`].
pub fn decode_session_payload(payload: &str) -> Result<String, AttendanceError> {
    let token = payload
        .trim()
        .strip_prefix(SESSION_TOKEN_PREFIX)
        .ok_or_else(|| AttendanceError::DecodeFailure("not a session payload".into()))?;

    if !token::is_well_formed(token) {
        return Err(AttendanceError::DecodeFailure(
            "malformed session token".into(),
        ));
    }

    Ok(token.to_ascii_lowercase())
}
