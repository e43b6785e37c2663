//! Transaction signing.
//!
//! Signing is separate from building because the key material may not be
//! available when the transaction is assembled. The message is SHA-256 of
//! the unsigned bytes. One credential is produced per signing slot, with
//! signatures in `SigIdx` order, so `credential[i].signatures[j]` always
//! answers `slot[i].sig_idxs[j]`.

use tracing::{debug, info};

use super::{SignedTx, UnsignedTx};
use crate::credential::Credential;
use crate::crypto::keychain::KeyChain;
use crate::error::{AxvmError, Result};

impl UnsignedTx {
    /// Signs every input and operation with keys from `keychain`.
    ///
    /// Fails with [`AxvmError::MissingKey`] if a slot's source address has
    /// no key in the chain.
    pub fn sign(self, keychain: &KeyChain) -> Result<SignedTx> {
        let message = self.message()?;
        let mut credentials = Vec::new();
        for (tag, sig_idxs) in self.transaction().signing_slots() {
            let mut credential = Credential::select(tag, self.codec())?;
            for sig in sig_idxs {
                credential.add_signature(keychain.sign_for(&sig.source, &message)?);
            }
            credentials.push(credential);
        }
        debug!(credentials = credentials.len(), "transaction signed");
        let signed = SignedTx::new(self, credentials);
        let tx_id = signed.id()?;
        info!(%tx_id, "signed transaction ready");
        Ok(signed)
    }
}

impl SignedTx {
    /// Checks credential alignment and every signature against the keys in
    /// `keychain`.
    pub fn verify_with(&self, keychain: &KeyChain) -> Result<()> {
        let message = self.unsigned().message()?;
        let slots = self.unsigned().transaction().signing_slots();
        if slots.len() != self.credentials().len() {
            return Err(AxvmError::InvalidLength {
                what: "credentials",
                expected: slots.len(),
                got: self.credentials().len(),
            });
        }
        for ((tag, sig_idxs), credential) in slots.iter().zip(self.credentials()) {
            if credential.tag() != *tag {
                return Err(AxvmError::WrongType {
                    expected: tag.to_string(),
                    got: credential.tag(),
                });
            }
            if credential.signatures().len() != sig_idxs.len() {
                return Err(AxvmError::InvalidLength {
                    what: "signatures",
                    expected: sig_idxs.len(),
                    got: credential.signatures().len(),
                });
            }
            for (sig_idx, signature) in sig_idxs.iter().zip(credential.signatures()) {
                let key = keychain
                    .get(&sig_idx.source)
                    .ok_or(AxvmError::MissingKey(sig_idx.source))?;
                if !key.verify(&message, signature) {
                    return Err(AxvmError::AddressNotOwner(sig_idx.source));
                }
            }
        }
        Ok(())
    }
}
