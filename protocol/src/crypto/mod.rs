//! # Cryptographic Primitives
//!
//! Thin wrappers around audited implementations:
//!
//! - **SHA-256** for transaction ids, signing messages and cb58 checksums.
//! - **BLAKE3** for deriving addresses from public keys.
//! - **Ed25519** as the shipped [`KeyPair`] implementation.

pub mod hash;
pub mod keychain;
pub mod keys;

pub use hash::{address_hash, blake3_hash, sha256, sha256_array};
pub use keychain::KeyChain;
pub use keys::{Ed25519KeyPair, KeyPair, Signature};
