//! Hashing and identifier helpers.

use rand::{distributions::Alphanumeric, Rng};
use sha2::{Digest, Sha256};

/// Length of the random part of a portal handshake id.
const HANDSHAKE_RANDOM_LEN: usize = 24;

/// Computes SHA-256 of the input and returns it as lowercase hex.
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// Compares two byte strings without short-circuiting on the first mismatch.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Verifies a presented client secret against its configured SHA-256 digest.
pub fn verify_client_secret(presented: &str, expected_sha256_hex: &str) -> bool {
    let digest = sha256_hex(presented);
    constant_time_eq(
        digest.as_bytes(),
        expected_sha256_hex.trim().to_ascii_lowercase().as_bytes(),
    )
}

/// Generates a handshake id for a new external portal connection.
///
/// Format: `hs_` followed by 24 alphanumeric characters.
pub fn generate_handshake_id() -> String {
    let random: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(HANDSHAKE_RANDOM_LEN)
        .map(char::from)
        .collect();
    format!("hs_{}", random)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_hex_known_vector() {
        assert_eq!(
            sha256_hex("test"),
            "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08"
        );
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"abcd"));
    }

    #[test]
    fn test_verify_client_secret() {
        let digest = sha256_hex("REGISTRY_CLIENT_SECRET");
        assert!(verify_client_secret("REGISTRY_CLIENT_SECRET", &digest));
        assert!(verify_client_secret(
            "REGISTRY_CLIENT_SECRET",
            &digest.to_uppercase()
        ));
        assert!(!verify_client_secret("wrong", &digest));
    }

    #[test]
    fn test_handshake_id_shape() {
        let id = generate_handshake_id();
        assert!(id.starts_with("hs_"));
        assert_eq!(id.len(), 3 + HANDSHAKE_RANDOM_LEN);
        assert!(id[3..].chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(id, generate_handshake_id());
    }
}
