//! # Hashing Utilities
//!
//! Two hash functions, each with one job:
//!
//! - **SHA-256** -- transaction ids, signing messages and the cb58
//!   checksum. These are fixed by the wire format.
//! - **BLAKE3** -- deriving 20-byte addresses from Ed25519 public keys.

use sha2::{Digest, Sha256};

use crate::config::ADDRESS_LENGTH;

/// SHA-256 of `data` as a `Vec<u8>`.
pub fn sha256(data: &[u8]) -> Vec<u8> {
    sha256_array(data).to_vec()
}

/// SHA-256 of `data` as a fixed-size array.
pub fn sha256_array(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

/// BLAKE3 of `data`.
pub fn blake3_hash(data: &[u8]) -> [u8; 32] {
    *blake3::hash(data).as_bytes()
}

/// Address bytes for a public key: the first 20 bytes of its BLAKE3 hash.
pub fn address_hash(public_key: &[u8]) -> [u8; ADDRESS_LENGTH] {
    let digest = blake3_hash(public_key);
    let mut out = [0u8; ADDRESS_LENGTH];
    out.copy_from_slice(&digest[..ADDRESS_LENGTH]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_known_vector() {
        let hash = sha256(b"");
        let expected =
            hex::decode("e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855")
                .unwrap();
        assert_eq!(hash, expected);
    }

    #[test]
    fn test_sha256_array_matches_vec() {
        let vec_result = sha256(b"test data");
        let arr_result = sha256_array(b"test data");
        assert_eq!(vec_result.as_slice(), arr_result.as_slice());
    }

    #[test]
    fn blake3_deterministic() {
        assert_eq!(blake3_hash(b"axvm"), blake3_hash(b"axvm"));
        assert_ne!(blake3_hash(b"axvm"), blake3_hash(b"axvn"));
    }

    #[test]
    fn address_hash_is_blake3_prefix() {
        let pk = [7u8; 32];
        let full = blake3_hash(&pk);
        assert_eq!(address_hash(&pk), full[..20]);
    }
}
