//! Content fingerprints and checksums

use std::fmt;

use crc32fast::Hasher;
use sha2::{Digest, Sha256};

/// SHA-256 of a replay buffer
///
/// Two models with equal fingerprints were decoded from identical bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReplayFingerprint([u8; 32]);

impl ReplayFingerprint {
    /// Hash a buffer
    #[must_use]
    pub fn of(bytes: &[u8]) -> Self {
        Self(Sha256::digest(bytes).into())
    }

    /// Raw digest
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Full lowercase hex
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// First 8 bytes in hex, enough for log lines
    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..8])
    }
}

impl fmt::Display for ReplayFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ReplayFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ReplayFingerprint({})", self.short())
    }
}

/// CRC32 (IEEE) of a byte range, as stored in V3 trailers
#[must_use]
pub fn section_checksum(bytes: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(bytes);
    hasher.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_deterministic() {
        let a = ReplayFingerprint::of(b"RCV\0replay");
        let b = ReplayFingerprint::of(b"RCV\0replay");
        let c = ReplayFingerprint::of(b"RCV\0replaz");

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_known_digest() {
        let empty = ReplayFingerprint::of(&[]);
        assert_eq!(
            empty.to_hex(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(empty.short(), "e3b0c44298fc1c14");
        assert_eq!(empty.to_string().len(), 64);
    }

    #[test]
    fn test_section_checksum() {
        assert_eq!(section_checksum(b"123456789"), 0xCBF4_3926);
        assert_eq!(section_checksum(&[]), 0);
    }
}
