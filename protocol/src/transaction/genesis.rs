//! Genesis assets.
//!
//! A genesis asset is an asset-creation transaction that exists before
//! any network is assigned. Its header is always the genesis network id
//! and the all-zero blockchain id with no outputs or inputs, and it is
//! prefixed with a `u16`-length alias:
//!
//! ```text
//! alias, networkID, 32 zero bytes, 0 outs, 0 ins, memo,
//! name, symbol, denomination, InitialStates
//! ```
//!
//! The network id is supplied at serialization time. `GenesisData` bundles
//! several assets behind a codec version.

use bytes::{BufMut, BytesMut};

use crate::codec::wire::{check_len, put_count, put_u16_prefixed, put_u32_prefixed};
use crate::codec::{CodecVersion, Packable, Reader};
use crate::config::{GENESIS_BLOCKCHAIN_ID, GENESIS_NETWORK_ID, MAX_ALIAS_LENGTH};
use crate::crypto::hash::sha256_array;
use crate::error::{AxvmError, Result};
use crate::transaction::base::BaseTx;
use crate::transaction::create_asset::{CreateAssetTx, InitialStates};
use crate::types::{AssetId, BlockchainId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenesisAsset {
    alias: String,
    asset: CreateAssetTx,
}

impl GenesisAsset {
    pub fn new(
        alias: impl Into<String>,
        name: impl Into<String>,
        symbol: impl Into<String>,
        denomination: u8,
        initial_states: InitialStates,
        memo: Vec<u8>,
    ) -> Result<Self> {
        let alias = alias.into();
        check_len("alias", alias.len(), MAX_ALIAS_LENGTH)?;
        let base = BaseTx::new(
            GENESIS_NETWORK_ID,
            BlockchainId::from_bytes(GENESIS_BLOCKCHAIN_ID),
            Vec::new(),
            Vec::new(),
            memo,
        )?;
        Ok(Self {
            alias,
            asset: CreateAssetTx::new(base, name, symbol, denomination, initial_states)?,
        })
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn name(&self) -> &str {
        self.asset.name()
    }

    pub fn symbol(&self) -> &str {
        self.asset.symbol()
    }

    pub fn denomination(&self) -> u8 {
        self.asset.denomination()
    }

    pub fn initial_states(&self) -> &InitialStates {
        self.asset.initial_states()
    }

    pub fn memo(&self) -> &[u8] {
        self.asset.base.memo()
    }

    /// Network id stamped on the asset, [`GENESIS_NETWORK_ID`] until parsed
    /// from bytes written for another network.
    pub fn network_id(&self) -> u32 {
        self.asset.base.network_id
    }

    pub(crate) fn set_codec(&mut self, codec: CodecVersion) {
        self.asset.set_codec(codec);
    }

    pub fn pack(&self, buf: &mut BytesMut, network_id: u32) {
        put_u16_prefixed(buf, self.alias.as_bytes());
        buf.put_u32(network_id);
        buf.put_slice(&GENESIS_BLOCKCHAIN_ID);
        buf.put_u32(0);
        buf.put_u32(0);
        put_u32_prefixed(buf, self.memo());
        self.asset.pack_asset_fields(buf);
    }

    pub fn to_bytes(&self, network_id: u32) -> Vec<u8> {
        let mut buf = BytesMut::new();
        self.pack(&mut buf, network_id);
        buf.to_vec()
    }

    /// Id the asset will have on `network_id`: SHA-256 of its genesis bytes.
    pub fn asset_id(&self, network_id: u32) -> AssetId {
        AssetId::from_bytes(sha256_array(&self.to_bytes(network_id)))
    }

    pub fn unpack(reader: &mut Reader<'_>) -> Result<Self> {
        let alias = reader.read_string("alias")?;
        let base = BaseTx::unpack(reader)?;
        if base.blockchain_id != BlockchainId::from_bytes(GENESIS_BLOCKCHAIN_ID) {
            return Err(AxvmError::Encoding {
                encoding: "genesis",
                reason: format!("genesis asset {alias} names blockchain {}", base.blockchain_id),
            });
        }
        if !base.outs().is_empty() || !base.ins().is_empty() {
            return Err(AxvmError::Encoding {
                encoding: "genesis",
                reason: format!(
                    "genesis asset {alias} carries {} outputs and {} inputs",
                    base.outs().len(),
                    base.ins().len()
                ),
            });
        }
        let asset = CreateAssetTx::unpack_asset_fields(base, reader)?;
        Ok(Self { alias, asset })
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut reader = Reader::new(bytes);
        let asset = Self::unpack(&mut reader)?;
        reader.finish()?;
        Ok(asset)
    }
}

/// `codec:u16, numAssets:u32, GenesisAsset*`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GenesisData {
    codec: CodecVersion,
    assets: Vec<GenesisAsset>,
}

impl GenesisData {
    pub fn new(codec: CodecVersion, mut assets: Vec<GenesisAsset>) -> Self {
        for asset in &mut assets {
            asset.set_codec(codec);
        }
        Self { codec, assets }
    }

    pub fn codec(&self) -> CodecVersion {
        self.codec
    }

    pub fn assets(&self) -> &[GenesisAsset] {
        &self.assets
    }

    pub fn to_bytes(&self, network_id: u32) -> Vec<u8> {
        let mut buf = BytesMut::new();
        buf.put_u16(self.codec.as_u16());
        let count = put_count(&mut buf, self.assets.len());
        for asset in &self.assets[..count] {
            asset.pack(&mut buf, network_id);
        }
        buf.to_vec()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut reader = Reader::new(bytes);
        let codec = CodecVersion::try_from(reader.read_u16()?)?;
        let assets = reader.read_vec(GenesisAsset::unpack)?;
        reader.finish()?;
        Ok(Self { codec, assets })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{NFT_FX_ID, SECP_FX_ID};
    use crate::output::{NftMintOutput, OutputOwners, SecpMintOutput, SecpTransferOutput};
    use crate::types::Address;

    fn states() -> InitialStates {
        let owners = OutputOwners::new(vec![Address::from_bytes([3u8; 20])], 0, 1).unwrap();
        let mut states = InitialStates::new();
        states
            .add_output(SECP_FX_ID, SecpTransferOutput::new(360_000_000, owners.clone()))
            .unwrap();
        states.add_output(SECP_FX_ID, SecpMintOutput::new(owners.clone())).unwrap();
        states.add_output(NFT_FX_ID, NftMintOutput::new(1, owners)).unwrap();
        states
    }

    #[test]
    fn genesis_asset_roundtrip() {
        let asset = GenesisAsset::new("AXC", "AXC", "AXC", 9, states(), b"genesis".to_vec()).unwrap();
        let bytes = asset.to_bytes(12345);
        let back = GenesisAsset::from_bytes(&bytes).unwrap();
        assert_eq!(back.name(), "AXC");
        assert_eq!(back.symbol(), "AXC");
        assert_eq!(back.denomination(), 9);
        assert_eq!(back.initial_states(), asset.initial_states());
        assert_eq!(back.network_id(), 12345);
        assert_eq!(back.to_bytes(12345), bytes);
    }

    #[test]
    fn header_is_genesis_reserved() {
        let asset = GenesisAsset::new("X", "N", "S", 0, InitialStates::new(), vec![]).unwrap();
        let bytes = asset.to_bytes(7);
        // alias (2 + 1), network id, zero chain, 0 outs, 0 ins
        assert_eq!(&bytes[3..7], &7u32.to_be_bytes());
        assert_eq!(&bytes[7..39], &[0u8; 32]);
        assert_eq!(&bytes[39..47], &[0u8; 8]);
    }

    #[test]
    fn genesis_data_roundtrip() {
        let a = GenesisAsset::new("AXC", "AXC", "AXC", 9, states(), vec![]).unwrap();
        let b = GenesisAsset::new("NFT", "Art", "ART", 0, InitialStates::new(), vec![]).unwrap();
        let data = GenesisData::new(CodecVersion::V0, vec![a, b]);
        let bytes = data.to_bytes(1);
        assert_eq!(&bytes[..2], &[0, 0]);
        let back = GenesisData::from_bytes(&bytes).unwrap();
        assert_eq!(back.assets().len(), 2);
        assert_eq!(back.assets()[1].alias(), "NFT");
        assert_eq!(back.to_bytes(1), bytes);
    }

    #[test]
    fn asset_id_depends_on_network() {
        let asset = GenesisAsset::new("AXC", "AXC", "AXC", 9, states(), vec![]).unwrap();
        assert_ne!(asset.asset_id(1), asset.asset_id(5));
    }
}
