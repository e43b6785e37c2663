//! Address-indexed collection of signing keys.
//!
//! Signing a transaction looks up one key per signature slot, by the
//! slot's source address. Keys are stored behind the [`KeyPair`] trait so a
//! wallet can mix implementations.

use std::collections::BTreeMap;
use std::fmt;

use tracing::debug;

use crate::config::PRIVATE_KEY_PREFIX;
use crate::crypto::keys::{Ed25519KeyPair, KeyPair, Signature};
use crate::error::{AxvmError, Result};
use crate::types::Address;

#[derive(Default)]
pub struct KeyChain {
    keys: BTreeMap<Address, Box<dyn KeyPair>>,
}

impl KeyChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generates a fresh Ed25519 key, stores it and returns its address.
    pub fn make_key(&mut self) -> Address {
        self.add_key(Ed25519KeyPair::generate())
    }

    /// Stores `key`, replacing any key with the same address.
    pub fn add_key(&mut self, key: impl KeyPair + 'static) -> Address {
        let address = key.address();
        self.keys.insert(address, Box::new(key));
        debug!(%address, "key added to keychain");
        address
    }

    /// Imports a `"PrivateKey-<cb58>"` string or a hex-encoded secret.
    pub fn import_key(&mut self, private_key: &str) -> Result<Address> {
        let key = if private_key.starts_with(PRIVATE_KEY_PREFIX) {
            Ed25519KeyPair::from_private_key_string(private_key)?
        } else {
            Ed25519KeyPair::from_hex(private_key)?
        };
        Ok(self.add_key(key))
    }

    /// Imports a raw 32-byte secret.
    pub fn import_secret(&mut self, secret: &[u8]) -> Result<Address> {
        Ok(self.add_key(Ed25519KeyPair::from_slice(secret)?))
    }

    pub fn get(&self, address: &Address) -> Option<&dyn KeyPair> {
        self.keys.get(address).map(|k| k.as_ref())
    }

    pub fn has_key(&self, address: &Address) -> bool {
        self.keys.contains_key(address)
    }

    pub fn remove_key(&mut self, address: &Address) -> bool {
        self.keys.remove(address).is_some()
    }

    /// All addresses, in ascending byte order.
    pub fn addresses(&self) -> Vec<Address> {
        self.keys.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Signs `message` with the key for `address`.
    pub fn sign_for(&self, address: &Address, message: &[u8]) -> Result<Signature> {
        self.get(address)
            .map(|key| key.sign(message))
            .ok_or(AxvmError::MissingKey(*address))
    }
}

impl fmt::Debug for KeyChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyChain")
            .field("addresses", &self.addresses())
            .finish()
    }
}
