//! # Key Management
//!
//! The signing primitive behind AXVM credentials.
//!
//! The wire format only fixes the signature *width* (64 bytes) and how an
//! address is derived from a public key (first 20 bytes of its BLAKE3
//! hash). Anything that can produce those two things can sign AXVM
//! transactions, which is what the [`KeyPair`] trait captures. The crate
//! ships one implementation, [`Ed25519KeyPair`].
//!
//! Key bytes are never logged. Debug output shows the address only.

use std::fmt;

use bytes::{BufMut, BytesMut};
use ed25519_dalek::{Signature as DalekSignature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;

use crate::codec::encoding::{cb58_decode, cb58_encode};
use crate::codec::{Packable, Reader};
use crate::config::{PRIVATE_KEY_PREFIX, SECRET_KEY_LENGTH, SIGNATURE_LENGTH};
use crate::crypto::hash::address_hash;
use crate::error::{AxvmError, Result};
use crate::types::Address;

// ---------------------------------------------------------------------------
// Signature
// ---------------------------------------------------------------------------

/// A fixed-width 64-byte signature as it appears inside a credential.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signature([u8; SIGNATURE_LENGTH]);

impl Signature {
    pub const fn from_bytes(bytes: [u8; SIGNATURE_LENGTH]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; SIGNATURE_LENGTH] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s.strip_prefix("0x").unwrap_or(s)).map_err(|e| {
            AxvmError::Encoding {
                encoding: "hex",
                reason: e.to_string(),
            }
        })?;
        let arr: [u8; SIGNATURE_LENGTH] =
            bytes
                .as_slice()
                .try_into()
                .map_err(|_| AxvmError::InvalidLength {
                    what: "signature",
                    expected: SIGNATURE_LENGTH,
                    got: bytes.len(),
                })?;
        Ok(Self(arr))
    }
}

impl Default for Signature {
    fn default() -> Self {
        Self([0u8; SIGNATURE_LENGTH])
    }
}

impl Packable for Signature {
    fn pack(&self, buf: &mut BytesMut) {
        buf.put_slice(&self.0);
    }

    fn unpack(reader: &mut Reader<'_>) -> Result<Self> {
        Ok(Self(reader.read_array()?))
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({}...)", &self.to_hex()[..16])
    }
}

// ---------------------------------------------------------------------------
// KeyPair
// ---------------------------------------------------------------------------

/// Anything that can sign AXVM transactions.
///
/// `Send + Sync` so a keychain can be shared across threads.
pub trait KeyPair: Send + Sync {
    /// Owner address of this key.
    fn address(&self) -> Address;

    fn public_key_bytes(&self) -> Vec<u8>;

    /// Signs a 32-byte message digest (or any message).
    fn sign(&self, message: &[u8]) -> Signature;

    fn verify(&self, message: &[u8], signature: &Signature) -> bool;
}

// ---------------------------------------------------------------------------
// Ed25519KeyPair
// ---------------------------------------------------------------------------

/// Ed25519 key pair. Intentionally not `Serialize`; export goes through
/// [`Ed25519KeyPair::to_private_key_string`] so it is always deliberate.
pub struct Ed25519KeyPair {
    signing_key: SigningKey,
}

impl Ed25519KeyPair {
    /// Fresh key from the OS RNG.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Deterministic key from a 32-byte seed.
    pub fn from_seed(seed: &[u8; SECRET_KEY_LENGTH]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    pub fn from_slice(secret: &[u8]) -> Result<Self> {
        let seed: [u8; SECRET_KEY_LENGTH] = secret.try_into().map_err(|_| AxvmError::InvalidKey)?;
        Ok(Self::from_seed(&seed))
    }

    pub fn from_hex(hex_str: &str) -> Result<Self> {
        let bytes = hex::decode(hex_str).map_err(|_| AxvmError::InvalidKey)?;
        Self::from_slice(&bytes)
    }

    /// Parses `"PrivateKey-<cb58>"`.
    pub fn from_private_key_string(s: &str) -> Result<Self> {
        let encoded = s.strip_prefix(PRIVATE_KEY_PREFIX).ok_or(AxvmError::InvalidKey)?;
        let bytes = cb58_decode(encoded)?;
        Self::from_slice(&bytes)
    }

    /// Renders the secret as `"PrivateKey-<cb58>"`. Handle with care.
    pub fn to_private_key_string(&self) -> String {
        format!(
            "{}{}",
            PRIVATE_KEY_PREFIX,
            cb58_encode(&self.signing_key.to_bytes())
        )
    }

    pub fn secret_key_bytes(&self) -> [u8; SECRET_KEY_LENGTH] {
        self.signing_key.to_bytes()
    }

    fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }
}

impl KeyPair for Ed25519KeyPair {
    fn address(&self) -> Address {
        Address::from_bytes(address_hash(self.verifying_key().as_bytes()))
    }

    fn public_key_bytes(&self) -> Vec<u8> {
        self.verifying_key().to_bytes().to_vec()
    }

    fn sign(&self, message: &[u8]) -> Signature {
        Signature(self.signing_key.sign(message).to_bytes())
    }

    fn verify(&self, message: &[u8], signature: &Signature) -> bool {
        let sig = DalekSignature::from_bytes(signature.as_bytes());
        self.verifying_key().verify(message, &sig).is_ok()
    }
}

impl Clone for Ed25519KeyPair {
    fn clone(&self) -> Self {
        Self::from_seed(&self.signing_key.to_bytes())
    }
}

impl fmt::Debug for Ed25519KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ed25519KeyPair")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}

/// Verifies a signature against raw Ed25519 public key bytes.
pub fn verify_with_public_key(public_key: &[u8], message: &[u8], signature: &Signature) -> bool {
    let Ok(bytes) = <[u8; 32]>::try_from(public_key) else {
        return false;
    };
    let Ok(key) = VerifyingKey::from_bytes(&bytes) else {
        return false;
    };
    key.verify(message, &DalekSignature::from_bytes(signature.as_bytes()))
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_verify_roundtrip() {
        let kp = Ed25519KeyPair::generate();
        let msg = b"send 100 AXC to alice";
        let sig = kp.sign(msg);
        assert!(kp.verify(msg, &sig));
        assert!(verify_with_public_key(&kp.public_key_bytes(), msg, &sig));
    }

    #[test]
    fn wrong_key_fails_verification() {
        let kp1 = Ed25519KeyPair::generate();
        let kp2 = Ed25519KeyPair::generate();
        let sig = kp1.sign(b"hello");
        assert!(!kp2.verify(b"hello", &sig));
    }

    #[test]
    fn tampered_message_fails_verification() {
        let kp = Ed25519KeyPair::from_seed(&[3u8; 32]);
        let sig = kp.sign(b"amount=5");
        assert!(!kp.verify(b"amount=6", &sig));
    }

    #[test]
    fn deterministic_from_seed() {
        let a = Ed25519KeyPair::from_seed(&[42u8; 32]);
        let b = Ed25519KeyPair::from_seed(&[42u8; 32]);
        assert_eq!(a.address(), b.address());
        assert_eq!(a.sign(b"x"), b.sign(b"x"));
    }

    #[test]
    fn address_is_blake3_prefix_of_public_key() {
        let kp = Ed25519KeyPair::from_seed(&[1u8; 32]);
        let expected = address_hash(&kp.public_key_bytes());
        assert_eq!(kp.address().as_bytes(), &expected);
    }

    #[test]
    fn hex_roundtrip() {
        let kp = Ed25519KeyPair::generate();
        let restored = Ed25519KeyPair::from_hex(&hex::encode(kp.secret_key_bytes())).unwrap();
        assert_eq!(kp.address(), restored.address());
        assert_eq!(
            Ed25519KeyPair::from_hex("abcd").unwrap_err(),
            AxvmError::InvalidKey
        );
    }

    #[test]
    fn private_key_string_roundtrip() {
        let kp = Ed25519KeyPair::from_seed(&[9u8; 32]);
        let s = kp.to_private_key_string();
        assert!(s.starts_with("PrivateKey-"));
        let back = Ed25519KeyPair::from_private_key_string(&s).unwrap();
        assert_eq!(back.address(), kp.address());
        assert_eq!(
            Ed25519KeyPair::from_private_key_string("Secret-abc").unwrap_err(),
            AxvmError::InvalidKey
        );
    }

    #[test]
    fn debug_does_not_leak_secret() {
        let kp = Ed25519KeyPair::from_seed(&[0xaa; 32]);
        let debug = format!("{:?}", kp);
        assert!(!debug.contains(&hex::encode(kp.secret_key_bytes())));
        assert!(debug.contains("address"));
    }

    #[test]
    fn signature_is_64_bytes_on_the_wire() {
        let kp = Ed25519KeyPair::generate();
        let sig = kp.sign(b"");
        assert_eq!(sig.to_bytes().len(), 64);
        assert_eq!(<Signature as Packable>::from_bytes(&sig.to_bytes()).unwrap(), sig);
        assert_eq!(Signature::from_hex(&sig.to_hex()).unwrap(), sig);
    }
}
