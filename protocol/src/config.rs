//! # Protocol Configuration & Constants
//!
//! Every magic number of the AXVM wire format lives here. If you're
//! hardcoding a length or a limit somewhere else, move it here instead.
//!
//! Besides raw constants this module carries the two explicitly-passed
//! configuration values used by the rest of the crate:
//!
//! - [`NetworkConfig`] -- static facts about a network and chain (ids, HRP,
//!   fee asset, default fees). Serializable so it can live in a JSON file.
//! - [`TxParams`] -- per-call parameters for the `build_*` operations on
//!   [`crate::utxo::UtxoSet`]. There is no global state: every builder
//!   receives its parameters by reference.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::{AxvmError, Result};
use crate::types::{AssetId, BlockchainId};

// ---------------------------------------------------------------------------
// Network Identifiers
// ---------------------------------------------------------------------------

/// Mainnet network id.
pub const NETWORK_ID_MAINNET: u32 = 1;

/// Public testnet network id.
pub const NETWORK_ID_TESTNET: u32 = 5;

/// Local development network id.
pub const NETWORK_ID_LOCAL: u32 = 12345;

/// Bech32 human-readable prefixes for addresses on each network.
pub const MAINNET_HRP: &str = "axc";
pub const TESTNET_HRP: &str = "taxc";
pub const LOCAL_HRP: &str = "local";

/// Prefix used for any network id we don't recognise.
pub const FALLBACK_HRP: &str = "custom";

/// Alias of the asset-transfer chain, as it appears in `X-axc1...` addresses.
pub const DEFAULT_CHAIN_ALIAS: &str = "X";

// ---------------------------------------------------------------------------
// Genesis
// ---------------------------------------------------------------------------

/// Network id stamped on genesis assets before a real network is assigned.
pub const GENESIS_NETWORK_ID: u32 = NETWORK_ID_MAINNET;

/// Genesis assets reference the all-zero blockchain id.
pub const GENESIS_BLOCKCHAIN_ID: [u8; 32] = [0u8; 32];

// ---------------------------------------------------------------------------
// Feature Extensions
// ---------------------------------------------------------------------------

/// Fx id of the SECP transfer/mint family.
pub const SECP_FX_ID: u32 = 0;

/// Fx id of the NFT family.
pub const NFT_FX_ID: u32 = 1;

// ---------------------------------------------------------------------------
// Fixed Lengths
// ---------------------------------------------------------------------------

/// Address length in bytes.
pub const ADDRESS_LENGTH: usize = 20;

/// Asset, transaction and blockchain ids are all 32-byte hashes.
pub const ID_LENGTH: usize = 32;

/// A UTXO id is a transaction id followed by a big-endian `u32` index.
pub const UTXO_ID_LENGTH: usize = ID_LENGTH + 4;

/// Signature length. Ed25519 signatures are always 64 bytes.
pub const SIGNATURE_LENGTH: usize = 64;

/// Secret key length for the Ed25519 key-pair primitive.
pub const SECRET_KEY_LENGTH: usize = 32;

/// Number of SHA-256 bytes appended to a payload before base58 encoding.
pub const CB58_CHECKSUM_LENGTH: usize = 4;

/// Prefix of the human-readable private key form.
pub const PRIVATE_KEY_PREFIX: &str = "PrivateKey-";

// ---------------------------------------------------------------------------
// Field Limits
// ---------------------------------------------------------------------------

/// Maximum memo length in bytes.
pub const MAX_MEMO_LENGTH: usize = 256;

/// Maximum asset name length in bytes.
pub const MAX_NAME_LENGTH: usize = 128;

/// Maximum asset symbol length in bytes.
pub const MAX_SYMBOL_LENGTH: usize = 4;

/// Maximum NFT payload length in bytes.
pub const MAX_PAYLOAD_LENGTH: usize = 1024;

/// Maximum genesis alias length in bytes: the widest `u16` prefix.
pub const MAX_ALIAS_LENGTH: usize = u16::MAX as usize;

/// Maximum number of decimal places an asset may declare.
pub const MAX_DENOMINATION: u8 = 32;

// ---------------------------------------------------------------------------
// Fees
// ---------------------------------------------------------------------------

/// Default flat fee for base, operation, import and export transactions.
pub const DEFAULT_TX_FEE: u64 = 1_000_000;

/// Default fee for creating a new asset.
pub const DEFAULT_CREATION_TX_FEE: u64 = 10_000_000;

// ---------------------------------------------------------------------------
// Utility
// ---------------------------------------------------------------------------

/// Returns the bech32 prefix for a given network id, or `None` for
/// networks we don't know.
pub fn hrp_for_network(network_id: u32) -> Option<&'static str> {
    match network_id {
        NETWORK_ID_MAINNET => Some(MAINNET_HRP),
        NETWORK_ID_TESTNET => Some(TESTNET_HRP),
        NETWORK_ID_LOCAL => Some(LOCAL_HRP),
        _ => None,
    }
}

/// Returns a friendly name for a network id, mainly for logging.
pub fn network_name(network_id: u32) -> String {
    match network_id {
        NETWORK_ID_MAINNET => "mainnet".to_string(),
        NETWORK_ID_TESTNET => "testnet".to_string(),
        NETWORK_ID_LOCAL => "local".to_string(),
        other => format!("unknown({})", other),
    }
}

/// Current Unix time in seconds. Default `as_of` for locktime checks.
pub fn unix_now() -> u64 {
    Utc::now().timestamp().max(0) as u64
}

// ---------------------------------------------------------------------------
// NetworkConfig
// ---------------------------------------------------------------------------

/// Static description of the chain a wallet talks to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub network_id: u32,
    pub hrp: String,
    pub chain_alias: String,
    pub blockchain_id: BlockchainId,
    /// Asset that transaction fees are paid in.
    pub fee_asset_id: AssetId,
    pub tx_fee: u64,
    pub creation_tx_fee: u64,
}

impl NetworkConfig {
    /// Builds a config with the default HRP, alias and fees for `network_id`.
    pub fn new(network_id: u32, blockchain_id: BlockchainId, fee_asset_id: AssetId) -> Self {
        Self {
            network_id,
            hrp: hrp_for_network(network_id)
                .unwrap_or(FALLBACK_HRP)
                .to_string(),
            chain_alias: DEFAULT_CHAIN_ALIAS.to_string(),
            blockchain_id,
            fee_asset_id,
            tx_fee: DEFAULT_TX_FEE,
            creation_tx_fee: DEFAULT_CREATION_TX_FEE,
        }
    }

    /// Parses a config from JSON. Ids are cb58 strings.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| AxvmError::Encoding {
            encoding: "json",
            reason: e.to_string(),
        })
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| AxvmError::Encoding {
            encoding: "json",
            reason: e.to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// TxParams
// ---------------------------------------------------------------------------

/// Parameters shared by every `build_*` operation.
///
/// `as_of` is a logical timestamp used only to decide whether locktimes
/// have expired. `locktime` and `threshold` apply to the destination
/// outputs a builder creates; change outputs are always unlocked with a
/// threshold of one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxParams {
    pub network_id: u32,
    pub blockchain_id: BlockchainId,
    pub fee: u64,
    pub fee_asset_id: Option<AssetId>,
    pub memo: Vec<u8>,
    pub as_of: u64,
    pub locktime: u64,
    pub threshold: u32,
}

impl TxParams {
    /// Zero fee, empty memo, `as_of` = now, unlocked outputs, threshold 1.
    pub fn new(network_id: u32, blockchain_id: BlockchainId) -> Self {
        Self {
            network_id,
            blockchain_id,
            fee: 0,
            fee_asset_id: None,
            memo: Vec::new(),
            as_of: unix_now(),
            locktime: 0,
            threshold: 1,
        }
    }

    /// Pre-fills network, chain, fee asset and the flat transaction fee.
    pub fn from_config(config: &NetworkConfig) -> Self {
        Self::new(config.network_id, config.blockchain_id)
            .fee(config.tx_fee)
            .fee_asset(config.fee_asset_id)
    }

    pub fn fee(mut self, fee: u64) -> Self {
        self.fee = fee;
        self
    }

    pub fn fee_asset(mut self, asset_id: AssetId) -> Self {
        self.fee_asset_id = Some(asset_id);
        self
    }

    pub fn memo(mut self, memo: impl Into<Vec<u8>>) -> Self {
        self.memo = memo.into();
        self
    }

    pub fn as_of(mut self, as_of: u64) -> Self {
        self.as_of = as_of;
        self
    }

    pub fn locktime(mut self, locktime: u64) -> Self {
        self.locktime = locktime;
        self
    }

    pub fn threshold(mut self, threshold: u32) -> Self {
        self.threshold = threshold;
        self
    }

    /// True when a fee has to be sourced: positive amount and a known asset.
    pub(crate) fn charges_fee(&self) -> bool {
        self.fee > 0 && self.fee_asset_id.is_some()
    }
}
