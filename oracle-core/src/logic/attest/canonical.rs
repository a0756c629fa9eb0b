//! Canonical attestation encoding, version 1.
//!
//! ```text
//! offset  size  field
//! 0       8     domain tag "REPUTEv1"
//! 8       1     score (0..=100)
//! 9       20    wallet address, raw bytes
//! 29      8     timestamp_ms, u64 big-endian
//! ```
//!
//! The verifying contract rebuilds exactly these bytes; any change here is a
//! new version with a new tag.

use super::signer::SigningError;

pub const DOMAIN_TAG: &[u8; 8] = b"REPUTEv1";
pub const ENCODING_VERSION: u8 = 1;
pub const CANONICAL_LEN: usize = 37;

/// Bytes the enclave key signs.
pub fn encode(score: u8, address: &[u8; 20], timestamp_ms: u64) -> Result<[u8; CANONICAL_LEN], SigningError> {
    if score > 100 {
        return Err(SigningError::InvalidPayload(format!("score {} out of range", score)));
    }

    let mut out = [0u8; CANONICAL_LEN];
    out[..8].copy_from_slice(DOMAIN_TAG);
    out[8] = score;
    out[9..29].copy_from_slice(address);
    out[29..].copy_from_slice(&timestamp_ms.to_be_bytes());
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout() {
        let mut address = [0u8; 20];
        address[19] = 0xaa;
        let bytes = encode(62, &address, 0x0102_0304_0506_0708).unwrap();

        assert_eq!(&bytes[..8], b"REPUTEv1");
        assert_eq!(bytes[8], 62);
        assert_eq!(bytes[28], 0xaa);
        assert_eq!(&bytes[29..], &[1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn test_rejects_out_of_range_score() {
        assert!(encode(101, &[0u8; 20], 1).is_err());
    }
}
