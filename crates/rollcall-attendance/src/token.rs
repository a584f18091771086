//! Session token generation.

use rand::RngCore;

use crate::config::MIN_TOKEN_BYTES;

/// Generate an unguessable session token: `len` bytes from the
/// thread-local CSPRNG, hex-encoded (`2 * len` lowercase chars).
pub fn generate_session_token(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Whether `token` has the shape produced by [`generate_session_token`]:
/// whole hex-encoded bytes, at least the minimum token length.
pub fn is_well_formed(token: &str) -> bool {
    token.len() >= 2 * MIN_TOKEN_BYTES
        && token.len() % 2 == 0
        && token.bytes().all(|b| b.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn token_is_fixed_length_lowercase_hex() {
        let token = generate_session_token(16);
        assert_eq!(token.len(), 32);
        assert!(
            token
                .chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
        );
        assert!(is_well_formed(&token));
    }

    #[test]
    fn ten_thousand_tokens_are_distinct() {
        let tokens: HashSet<String> = (0..10_000).map(|_| generate_session_token(16)).collect();
        assert_eq!(tokens.len(), 10_000);
    }

    #[test]
    fn malformed_tokens_are_detected() {
        assert!(!is_well_formed(""));
        assert!(!is_well_formed("xyz"));
        assert!(!is_well_formed(&"g".repeat(32)));
        assert!(!is_well_formed(&"a".repeat(33)));
        assert!(is_well_formed(&generate_session_token(32)));
    }
}
