//! Attendance service configuration.

use serde::Deserialize;

/// Configuration for the session registry and attendance ledger.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AttendanceConfig {
    /// Random bytes per session token (default: 16 = 128 bits).
    /// Values below 16 are raised to 16.
    pub token_bytes: usize,
    /// Issuance attempts before giving up on token collisions (default: 5).
    pub max_token_attempts: u32,
    /// Optional upper bound on a session's lifetime in seconds
    /// (default: none).
    pub max_session_duration_secs: Option<u64>,
    /// Number of claims returned by the recent-activity view (default: 10).
    pub recent_claims_limit: u64,
}

/// Tokens never carry fewer random bytes than this.
pub const MIN_TOKEN_BYTES: usize = 16;

impl AttendanceConfig {
    pub(crate) fn effective_token_bytes(&self) -> usize {
        self.token_bytes.max(MIN_TOKEN_BYTES)
    }
}

impl Default for AttendanceConfig {
    fn default() -> Self {
        Self {
            token_bytes: MIN_TOKEN_BYTES,
            max_token_attempts: 5,
            max_session_duration_secs: None,
            recent_claims_limit: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_tokens_are_raised_to_minimum() {
        let config = AttendanceConfig {
            token_bytes: 4,
            ..Default::default()
        };
        assert_eq!(config.effective_token_bytes(), MIN_TOKEN_BYTES);

        let config = AttendanceConfig {
            token_bytes: 32,
            ..Default::default()
        };
        assert_eq!(config.effective_token_bytes(), 32);
    }
}
