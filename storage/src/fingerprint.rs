use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 of the raw body, byte for byte. Whitespace is significant.
pub fn fingerprint(raw_text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw_text.as_bytes());
    hex::encode(hasher.finalize())
}
