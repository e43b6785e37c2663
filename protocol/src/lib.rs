// Copyright (c) 2026 AXVM Contributors. MIT License.
// See LICENSE for details.

//! # AXVM Protocol — Client Core
//!
//! Everything a wallet needs to produce byte-exact, validly signed
//! transactions for an AXVM asset chain: the wire codec, the transaction
//! model, signing, and a local UTXO set with greedy coin selection.
//!
//! The crate performs no I/O. Nodes are reached through the
//! [`transport::Transport`] trait supplied by the caller.
//!
//! ## Architecture
//!
//! Leaves first:
//!
//! - **codec** — codec versions, numeric type ids, binary reader/writer and
//!   the JSON field encodings (hex, cb58, decimal).
//! - **types** — fixed-length ids, addresses, UTXO ids and signature slots.
//! - **output / input / operation** — the leaf wire structures and their
//!   ownership rules.
//! - **transaction** — base, create-asset, operation, import, export and
//!   genesis variants, plus the unsigned/signed envelopes and signing.
//! - **credential** — signature bundles, one per input or operation.
//! - **crypto** — hashing, Ed25519 key pairs and the keychain.
//! - **utxo** — the UTXO set, coin selection and the `build_*` operations.
//! - **config** — protocol constants and per-transaction parameters.
//!
//! ## Flow
//!
//! ```text
//! UtxoSet::build_*  ->  UnsignedTx  --sign(KeyChain)-->  SignedTx  -->  Transport
//! ```
//!
//! ## Guarantees
//!
//! 1. Serialization is canonical: collections are sorted when built, so
//!    equal transactions produce equal bytes and ids.
//! 2. Credential `i` always signs for the `i`-th input or operation.
//! 3. Library code never panics on malformed input; every failure is an
//!    [`AxvmError`].

pub mod codec;
pub mod config;
pub mod credential;
pub mod crypto;
pub mod error;
pub mod input;
pub mod logging;
pub mod operation;
pub mod output;
pub mod transaction;
pub mod transport;
pub mod types;
pub mod utxo;

pub use codec::{CodecVersion, HumanReadable, Packable, TypeTag};
pub use config::{NetworkConfig, TxParams};
pub use credential::Credential;
pub use crypto::{Ed25519KeyPair, KeyChain, KeyPair, Signature};
pub use error::{AxvmError, ErrorKind, Result};
pub use input::{Input, SecpTransferInput, TransferableInput};
pub use operation::{NftMintOperation, NftTransferOperation, Operation, SecpMintOperation, TransferableOperation};
pub use output::{
    NftMintOutput, NftTransferOutput, Output, OutputOwners, SecpMintOutput, SecpTransferOutput,
    TransferableOutput,
};
pub use transaction::{
    BaseTx, CreateAssetTx, ExportTx, GenesisAsset, GenesisData, ImportTx, InitialStates, OperationTx,
    SignedTx, Transaction, UnsignedTx,
};
pub use transport::Transport;
pub use types::{Address, AssetId, BlockchainId, SigIdx, TxId, Utxoid};
pub use utxo::{AssetAmount, AssetAmountDestination, MergeRule, MinterSet, Utxo, UtxoSet};
