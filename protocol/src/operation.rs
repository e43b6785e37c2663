//! # Operations
//!
//! Operations consume UTXOs that are not plain amounts (mint authorities,
//! NFTs) and produce new outputs in their place.
//!
//! ```text
//! SecpMintOperation     sigIdx*, mint output body, transfer output body
//! NftMintOperation      sigIdx*, groupID:u32, payload:u32-prefixed, numOwners:u32, owners*
//! NftTransferOperation  sigIdx*, NFT transfer output body
//! ```
//!
//! The outputs embedded in an operation carry no type id of their own;
//! they inherit the operation's codec version.

use bytes::{BufMut, BytesMut};

use crate::codec::wire::{check_len, ensure_sorted, put_u32_prefixed, put_vec};
use crate::codec::{codec_from_id, resolve, Category, CodecVersion, Packable, Reader, TypeTag};
use crate::config::MAX_PAYLOAD_LENGTH;
use crate::error::{AxvmError, Result};
use crate::output::{NftTransferOutput, Output, OutputOwners, SecpMintOutput, SecpTransferOutput};
use crate::types::{Address, AssetId, SigIdx, Utxoid};

// ---------------------------------------------------------------------------
// SecpMintOperation
// ---------------------------------------------------------------------------

/// Spends a mint authority, re-issues it and creates new supply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecpMintOperation {
    codec: CodecVersion,
    sig_idxs: Vec<SigIdx>,
    mint_output: SecpMintOutput,
    transfer_output: SecpTransferOutput,
}

impl SecpMintOperation {
    pub fn new(mint_output: SecpMintOutput, transfer_output: SecpTransferOutput) -> Self {
        let mut op = Self {
            codec: CodecVersion::LATEST,
            sig_idxs: Vec::new(),
            mint_output,
            transfer_output,
        };
        op.set_codec(CodecVersion::LATEST);
        op
    }

    pub fn mint_output(&self) -> &SecpMintOutput {
        &self.mint_output
    }

    pub fn transfer_output(&self) -> &SecpTransferOutput {
        &self.transfer_output
    }

    fn set_codec(&mut self, codec: CodecVersion) {
        self.codec = codec;
        self.mint_output.set_codec(codec);
        self.transfer_output.set_codec(codec);
    }
}

impl Packable for SecpMintOperation {
    fn pack(&self, buf: &mut BytesMut) {
        put_vec(buf, &self.sig_idxs);
        self.mint_output.pack(buf);
        self.transfer_output.pack(buf);
    }

    fn unpack(reader: &mut Reader<'_>) -> Result<Self> {
        let sig_idxs = reader.read_vec(SigIdx::unpack)?;
        let mint_output = SecpMintOutput::unpack(reader)?;
        let transfer_output = SecpTransferOutput::unpack(reader)?;
        Ok(Self {
            codec: CodecVersion::LATEST,
            sig_idxs,
            mint_output,
            transfer_output,
        })
    }
}

// ---------------------------------------------------------------------------
// NftMintOperation
// ---------------------------------------------------------------------------

/// Spends an NFT mint authority and creates one NFT per owner set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NftMintOperation {
    codec: CodecVersion,
    sig_idxs: Vec<SigIdx>,
    group_id: u32,
    payload: Vec<u8>,
    owners: Vec<OutputOwners>,
}

impl NftMintOperation {
    pub fn new(group_id: u32, payload: Vec<u8>, owners: Vec<OutputOwners>) -> Result<Self> {
        check_len("payload", payload.len(), MAX_PAYLOAD_LENGTH)?;
        Ok(Self {
            codec: CodecVersion::LATEST,
            sig_idxs: Vec::new(),
            group_id,
            payload,
            owners,
        })
    }

    pub fn group_id(&self) -> u32 {
        self.group_id
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn owners(&self) -> &[OutputOwners] {
        &self.owners
    }
}

impl Packable for NftMintOperation {
    fn pack(&self, buf: &mut BytesMut) {
        put_vec(buf, &self.sig_idxs);
        buf.put_u32(self.group_id);
        put_u32_prefixed(buf, &self.payload);
        put_vec(buf, &self.owners);
    }

    fn unpack(reader: &mut Reader<'_>) -> Result<Self> {
        let sig_idxs = reader.read_vec(SigIdx::unpack)?;
        let group_id = reader.read_u32()?;
        let payload = reader.read_u32_prefixed()?;
        let owners = reader.read_vec(OutputOwners::unpack)?;
        let mut op = Self::new(group_id, payload, owners)?;
        op.sig_idxs = sig_idxs;
        Ok(op)
    }
}

// ---------------------------------------------------------------------------
// NftTransferOperation
// ---------------------------------------------------------------------------

/// Moves one NFT to new owners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NftTransferOperation {
    codec: CodecVersion,
    sig_idxs: Vec<SigIdx>,
    output: NftTransferOutput,
}

impl NftTransferOperation {
    pub fn new(output: NftTransferOutput) -> Self {
        let mut op = Self {
            codec: CodecVersion::LATEST,
            sig_idxs: Vec::new(),
            output,
        };
        op.set_codec(CodecVersion::LATEST);
        op
    }

    pub fn output(&self) -> &NftTransferOutput {
        &self.output
    }

    fn set_codec(&mut self, codec: CodecVersion) {
        self.codec = codec;
        self.output.set_codec(codec);
    }
}

impl Packable for NftTransferOperation {
    fn pack(&self, buf: &mut BytesMut) {
        put_vec(buf, &self.sig_idxs);
        self.output.pack(buf);
    }

    fn unpack(reader: &mut Reader<'_>) -> Result<Self> {
        let sig_idxs = reader.read_vec(SigIdx::unpack)?;
        let output = NftTransferOutput::unpack(reader)?;
        Ok(Self {
            codec: CodecVersion::LATEST,
            sig_idxs,
            output,
        })
    }
}

// ---------------------------------------------------------------------------
// Operation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    SecpMint(SecpMintOperation),
    NftMint(NftMintOperation),
    NftTransfer(NftTransferOperation),
}

impl Operation {
    pub fn tag(&self) -> TypeTag {
        match self {
            Self::SecpMint(_) => TypeTag::SecpMintOperation,
            Self::NftMint(_) => TypeTag::NftMintOperation,
            Self::NftTransfer(_) => TypeTag::NftTransferOperation,
        }
    }

    pub fn codec(&self) -> CodecVersion {
        match self {
            Self::SecpMint(op) => op.codec,
            Self::NftMint(op) => op.codec,
            Self::NftTransfer(op) => op.codec,
        }
    }

    pub fn type_id(&self) -> u32 {
        self.tag().type_id(self.codec())
    }

    pub fn set_codec(&mut self, codec: CodecVersion) {
        match self {
            Self::SecpMint(op) => op.set_codec(codec),
            Self::NftMint(op) => op.codec = codec,
            Self::NftTransfer(op) => op.set_codec(codec),
        }
    }

    pub fn set_codec_id(&mut self, codec_id: u16) -> Result<()> {
        self.set_codec(codec_from_id(codec_id)?);
        Ok(())
    }

    pub fn sig_idxs(&self) -> &[SigIdx] {
        match self {
            Self::SecpMint(op) => &op.sig_idxs,
            Self::NftMint(op) => &op.sig_idxs,
            Self::NftTransfer(op) => &op.sig_idxs,
        }
    }

    pub fn add_signature_idx(&mut self, address_index: u32, source: Address) {
        let sig = SigIdx::new(address_index, source);
        match self {
            Self::SecpMint(op) => op.sig_idxs.push(sig),
            Self::NftMint(op) => op.sig_idxs.push(sig),
            Self::NftTransfer(op) => op.sig_idxs.push(sig),
        }
    }

    /// Credential variant that must accompany this operation.
    pub fn credential_tag(&self) -> TypeTag {
        match self {
            Self::SecpMint(_) => TypeTag::SecpCredential,
            Self::NftMint(_) | Self::NftTransfer(_) => TypeTag::NftCredential,
        }
    }

    /// Outputs this operation creates once accepted.
    pub fn outputs(&self) -> Result<Vec<Output>> {
        let codec = self.codec();
        let mut outputs: Vec<Output> = match self {
            Self::SecpMint(op) => vec![
                op.mint_output.clone().into(),
                op.transfer_output.clone().into(),
            ],
            Self::NftMint(op) => op
                .owners
                .iter()
                .map(|owners| {
                    NftTransferOutput::new(op.group_id, op.payload.clone(), owners.clone())
                        .map(Output::from)
                })
                .collect::<Result<Vec<_>>>()?,
            Self::NftTransfer(op) => vec![op.output.clone().into()],
        };
        for output in &mut outputs {
            output.set_codec(codec);
        }
        Ok(outputs)
    }
}

impl Packable for Operation {
    fn pack(&self, buf: &mut BytesMut) {
        buf.put_u32(self.type_id());
        match self {
            Self::SecpMint(op) => op.pack(buf),
            Self::NftMint(op) => op.pack(buf),
            Self::NftTransfer(op) => op.pack(buf),
        }
    }

    fn unpack(reader: &mut Reader<'_>) -> Result<Self> {
        let (tag, codec) = resolve(Category::Operation, reader.read_u32()?)?;
        let mut op = match tag {
            TypeTag::SecpMintOperation => Self::SecpMint(SecpMintOperation::unpack(reader)?),
            TypeTag::NftMintOperation => Self::NftMint(NftMintOperation::unpack(reader)?),
            TypeTag::NftTransferOperation => {
                Self::NftTransfer(NftTransferOperation::unpack(reader)?)
            }
            other => {
                return Err(AxvmError::WrongType {
                    expected: "operation".to_string(),
                    got: other,
                })
            }
        };
        op.set_codec(codec);
        Ok(op)
    }
}

impl From<SecpMintOperation> for Operation {
    fn from(op: SecpMintOperation) -> Self {
        Self::SecpMint(op)
    }
}

impl From<NftMintOperation> for Operation {
    fn from(op: NftMintOperation) -> Self {
        Self::NftMint(op)
    }
}

impl From<NftTransferOperation> for Operation {
    fn from(op: NftTransferOperation) -> Self {
        Self::NftTransfer(op)
    }
}

// ---------------------------------------------------------------------------
// TransferableOperation
// ---------------------------------------------------------------------------

/// An operation with the asset and UTXOs it consumes.
///
/// `assetID, numUTXOIDs:u32, UTXOID*, opTypeID:u32, body`. UTXO ids are
/// kept sorted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferableOperation {
    pub asset_id: AssetId,
    utxo_ids: Vec<Utxoid>,
    pub operation: Operation,
}

impl TransferableOperation {
    pub fn new(asset_id: AssetId, mut utxo_ids: Vec<Utxoid>, operation: impl Into<Operation>) -> Self {
        utxo_ids.sort();
        Self {
            asset_id,
            utxo_ids,
            operation: operation.into(),
        }
    }

    pub fn utxo_ids(&self) -> &[Utxoid] {
        &self.utxo_ids
    }
}

impl Packable for TransferableOperation {
    fn pack(&self, buf: &mut BytesMut) {
        self.asset_id.pack(buf);
        put_vec(buf, &self.utxo_ids);
        self.operation.pack(buf);
    }

    fn unpack(reader: &mut Reader<'_>) -> Result<Self> {
        let asset_id = AssetId::unpack(reader)?;
        let utxo_ids = reader.read_vec(Utxoid::unpack)?;
        ensure_sorted("operation utxo ids", &utxo_ids, false, |id| *id)?;
        let operation = Operation::unpack(reader)?;
        Ok(Self::new(asset_id, utxo_ids, operation))
    }
}

/// Sorts operations into canonical order: type id, then full bytes.
pub fn sort_operations(ops: &mut [TransferableOperation]) {
    ops.sort_by_cached_key(|op| (op.operation.type_id(), op.to_bytes()));
}

pub(crate) fn ensure_operations_sorted(ops: &[TransferableOperation]) -> Result<()> {
    ensure_sorted("operations", ops, false, |op| (op.operation.type_id(), op.to_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TxId;

    fn owners(b: u8) -> OutputOwners {
        OutputOwners::new(vec![Address::from_bytes([b; 20])], 0, 1).unwrap()
    }

    fn utxo(b: u8, idx: u32) -> Utxoid {
        Utxoid::new(TxId::from_bytes([b; 32]), idx)
    }

    #[test]
    fn secp_mint_roundtrip_in_both_codecs() {
        let mut op: Operation = SecpMintOperation::new(
            SecpMintOutput::new(owners(1)),
            SecpTransferOutput::new(1000, owners(2)),
        )
        .into();
        op.add_signature_idx(0, Address::from_bytes([1u8; 20]));
        assert_eq!(op.type_id(), 8);
        assert_eq!(Operation::from_bytes(&op.to_bytes()).unwrap(), op);

        op.set_codec_id(1).unwrap();
        assert_eq!(op.type_id(), 65542);
        let back = Operation::from_bytes(&op.to_bytes()).unwrap();
        assert_eq!(back.codec(), CodecVersion::V1);
        // Embedded outputs follow the operation's codec.
        let outs = back.outputs().unwrap();
        assert_eq!(outs[0].type_id(), 65537);
        assert_eq!(outs[1].type_id(), 65538);
    }

    #[test]
    fn nft_mint_produces_one_output_per_owner_set() {
        let op: Operation =
            NftMintOperation::new(4, b"meta".to_vec(), vec![owners(1), owners(2)])
                .unwrap()
                .into();
        assert_eq!(op.credential_tag(), TypeTag::NftCredential);
        let outs = op.outputs().unwrap();
        assert_eq!(outs.len(), 2);
        assert!(outs.iter().all(|o| o.group_id() == Some(4)));
        assert_eq!(Operation::from_bytes(&op.to_bytes()).unwrap(), op);
    }

    #[test]
    fn nft_transfer_body_is_sigs_then_output() {
        let output = NftTransferOutput::new(1, vec![], owners(3)).unwrap();
        let op: Operation = NftTransferOperation::new(output.clone()).into();
        let bytes = op.to_bytes();
        assert_eq!(&bytes[..4], &13u32.to_be_bytes());
        assert_eq!(&bytes[4..8], &0u32.to_be_bytes());
        assert_eq!(&bytes[8..], output.to_bytes().as_slice());
    }

    #[test]
    fn utxo_ids_are_sorted() {
        let op = TransferableOperation::new(
            AssetId::default(),
            vec![utxo(2, 0), utxo(1, 1), utxo(1, 0)],
            NftTransferOperation::new(NftTransferOutput::new(0, vec![], owners(1)).unwrap()),
        );
        assert_eq!(op.utxo_ids(), &[utxo(1, 0), utxo(1, 1), utxo(2, 0)]);
        assert_eq!(TransferableOperation::from_bytes(&op.to_bytes()).unwrap(), op);
    }

    #[test]
    fn unknown_operation_id_is_fatal() {
        let bytes = 7u32.to_be_bytes();
        assert!(matches!(
            Operation::from_bytes(&bytes).unwrap_err(),
            AxvmError::UnknownTypeId {
                category: Category::Operation,
                ..
            }
        ));
    }
}
