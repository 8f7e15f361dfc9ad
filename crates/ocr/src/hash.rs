use sha2::{Digest, Sha256};

/// SHA-256 of an in-memory byte slice.
pub fn sha256_bytes(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// Lowercase hex digest (64 chars) identifying a source image's content.
pub fn content_digest(data: &[u8]) -> String {
    sha256_bytes(data).iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_vector() {
        assert_eq!(
            content_digest(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn deterministic_and_distinct() {
        assert_eq!(content_digest(b"scan"), content_digest(b"scan"));
        assert_ne!(content_digest(b"scan-a"), content_digest(b"scan-b"));
        assert_eq!(content_digest(b"scan").len(), 64);
    }
}
