//! Transport boundary.
//!
//! The core never performs I/O. Wallets plug in a [`Transport`] (an RPC
//! client, a test double) and use [`sync_utxos`] and [`issue`] to move
//! bytes between it and the local [`UtxoSet`].

use tracing::{debug, info, warn};

use crate::error::{AxvmError, Result};
use crate::transaction::SignedTx;
use crate::types::{Address, BlockchainId, TxId};
use crate::utxo::UtxoSet;

/// A connection to a node.
pub trait Transport {
    /// Submits signed transaction bytes; returns the id the node assigned.
    fn issue_tx(&self, tx: &[u8]) -> Result<TxId>;

    /// Serialized UTXOs owned by `addresses`. With `source_chain`, the
    /// atomic UTXOs exported from that chain to this one.
    fn fetch_utxos(&self, addresses: &[Address], source_chain: Option<BlockchainId>) -> Result<Vec<Vec<u8>>>;
}

/// Fetches UTXOs for `addresses` and adds them to `set`. Nothing is added
/// if any of the fetched UTXOs fails to parse. Returns how many were new.
pub fn sync_utxos(
    transport: &dyn Transport,
    set: &mut UtxoSet,
    addresses: &[Address],
    source_chain: Option<BlockchainId>,
) -> Result<usize> {
    let raw = transport.fetch_utxos(addresses, source_chain)?;
    let added = set.add_array_bytes(&raw, false)?;
    debug!(fetched = raw.len(), added, "utxos synced");
    Ok(added)
}

/// Serializes and submits `tx`. Fails if the node reports an id other than
/// the locally computed one.
pub fn issue(transport: &dyn Transport, tx: &SignedTx) -> Result<TxId> {
    let expected = tx.id()?;
    let issued = transport.issue_tx(&tx.to_bytes()?)?;
    if issued != expected {
        warn!(%issued, %expected, "node returned an unexpected transaction id");
        return Err(AxvmError::Transport(format!(
            "node returned id {issued}, expected {expected}"
        )));
    }
    info!(tx_id = %issued, "transaction issued");
    Ok(issued)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::codec::Packable;
    use crate::crypto::hash::sha256_array;
    use crate::crypto::keychain::KeyChain;
    use crate::crypto::keys::{Ed25519KeyPair, KeyPair};
    use crate::output::{OutputOwners, SecpTransferOutput};
    use crate::types::{AssetId, Utxoid};
    use crate::utxo::Utxo;
    use crate::config::TxParams;

    #[derive(Default)]
    struct MemoryTransport {
        utxos: Vec<Vec<u8>>,
        issued: RefCell<Vec<Vec<u8>>>,
    }

    impl Transport for MemoryTransport {
        fn issue_tx(&self, tx: &[u8]) -> Result<TxId> {
            self.issued.borrow_mut().push(tx.to_vec());
            Ok(TxId::from_bytes(sha256_array(tx)))
        }

        fn fetch_utxos(&self, _addresses: &[Address], source_chain: Option<BlockchainId>) -> Result<Vec<Vec<u8>>> {
            match source_chain {
                Some(_) => Err(AxvmError::Transport("no shared memory".to_string())),
                None => Ok(self.utxos.clone()),
            }
        }
    }

    #[test]
    fn sync_then_issue() {
        let key = Ed25519KeyPair::from_seed(&[1u8; 32]);
        let owner = key.address();
        let asset = AssetId::from_bytes([4u8; 32]);
        let utxo = Utxo::new(
            Utxoid::new(TxId::from_bytes([9u8; 32]), 1),
            asset,
            SecpTransferOutput::new(50, OutputOwners::new(vec![owner], 0, 1).unwrap()),
        );
        let transport = MemoryTransport {
            utxos: vec![utxo.to_bytes()],
            ..Default::default()
        };

        let mut set = UtxoSet::new();
        assert_eq!(sync_utxos(&transport, &mut set, &[owner], None).unwrap(), 1);
        assert_eq!(sync_utxos(&transport, &mut set, &[owner], None).unwrap(), 0);
        assert!(matches!(
            sync_utxos(&transport, &mut set, &[owner], Some(BlockchainId::default())),
            Err(AxvmError::Transport(_))
        ));

        let mut keychain = KeyChain::new();
        keychain.add_key(key);
        let params = TxParams::new(1, BlockchainId::default()).as_of(0);
        let signed = set
            .build_base_tx(&params, 20, asset, &[Address::from_bytes([2u8; 20])], &[owner], &[])
            .unwrap()
            .sign(&keychain)
            .unwrap();
        let id = issue(&transport, &signed).unwrap();
        assert_eq!(id, signed.id().unwrap());
        assert_eq!(transport.issued.borrow().len(), 1);
    }

    #[test]
    fn corrupt_fetch_adds_nothing() {
        let transport = MemoryTransport {
            utxos: vec![vec![0, 0, 1, 2]],
            ..Default::default()
        };
        let mut set = UtxoSet::new();
        assert!(sync_utxos(&transport, &mut set, &[], None).is_err());
        assert!(set.is_empty());
    }
}
