//! Attendance error types.

use rollcall_core::error::RollcallError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AttendanceError {
    #[error("token does not match any session")]
    TokenNotFound,

    #[error("session has been closed by the presenter")]
    SessionInactive,

    #[error("session has expired")]
    SessionExpired,

    #[error("attendance already recorded for this session")]
    DuplicateClaim,

    #[error("transport payload could not be decoded: {0}")]
    DecodeFailure(String),

    #[error("session not found")]
    SessionNotFound,

    #[error("session belongs to another presenter")]
    NotOwner,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Store(#[from] RollcallError),
}

impl AttendanceError {
    /// Remediation text suitable for showing to the person who made the
    /// request.
    pub fn user_message(&self) -> &'static str {
        match self {
            AttendanceError::TokenNotFound => "Invalid session code.",
            AttendanceError::SessionInactive => "This session has ended.",
            AttendanceError::SessionExpired => {
                "This session code has expired. Ask the presenter for a fresh code."
            }
            AttendanceError::DuplicateClaim => "Attendance already recorded for this session.",
            AttendanceError::DecodeFailure(_) => "Could not read the code. Please scan again.",
            AttendanceError::SessionNotFound => "Session not found.",
            AttendanceError::NotOwner => "You do not own this session.",
            AttendanceError::InvalidInput(_) => "The request was invalid.",
            AttendanceError::Store(_) => "Something went wrong. Please try again later.",
        }
    }

    /// Only a failed decode is worth retrying as-is (by capturing again).
    pub fn is_retryable(&self) -> bool {
        matches!(self, AttendanceError::DecodeFailure(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_decode_failure_is_retryable() {
        assert!(AttendanceError::DecodeFailure("blurry".into()).is_retryable());
        assert!(!AttendanceError::TokenNotFound.is_retryable());
        assert!(!AttendanceError::DuplicateClaim.is_retryable());
        assert!(!AttendanceError::SessionExpired.is_retryable());
    }

    #[test]
    fn token_errors_have_distinct_messages() {
        let messages = [
            AttendanceError::TokenNotFound.user_message(),
            AttendanceError::SessionInactive.user_message(),
            AttendanceError::SessionExpired.user_message(),
        ];
        assert_ne!(messages[0], messages[1]);
        assert_ne!(messages[1], messages[2]);
        assert_ne!(messages[0], messages[2]);
    }

    #[test]
    fn store_errors_convert() {
        let err: AttendanceError = RollcallError::Database("down".into()).into();
        assert!(matches!(err, AttendanceError::Store(_)));
        assert_eq!(err.to_string(), "Database error: down");
    }
}
