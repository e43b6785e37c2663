//! # Outputs
//!
//! Four output variants exist, all sharing [`OutputOwners`]:
//!
//! | variant               | body                                         |
//! |-----------------------|----------------------------------------------|
//! | `SecpTransferOutput`  | `amount:u64, owners`                         |
//! | `SecpMintOutput`      | `owners`                                     |
//! | `NftMintOutput`       | `groupID:u32, owners`                        |
//! | `NftTransferOutput`   | `groupID:u32, payload:u32-prefixed, owners`  |
//!
//! `owners` is `locktime:u64, threshold:u32, numAddrs:u32, addr*`.
//!
//! Each variant remembers the codec version it was created or decoded
//! under; that version picks the numeric type id written in front of it.

use std::cmp::Ordering;

use bytes::{BufMut, BytesMut};
use serde_json::Value;

use crate::codec::encoding::{Encoding, FieldSpec, Fields, HumanReadable};
use crate::codec::wire::{check_len, ensure_sorted, put_u32_prefixed, put_vec};
use crate::codec::{codec_from_id, resolve, Category, CodecVersion, Packable, Reader, TypeTag};
use crate::config::MAX_PAYLOAD_LENGTH;
use crate::error::{AxvmError, Result};
use crate::types::{Address, AssetId};

// ---------------------------------------------------------------------------
// OutputOwners
// ---------------------------------------------------------------------------

/// Who may spend an output, and from when.
///
/// Addresses are a sorted set; `threshold <= addresses.len()` always holds.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OutputOwners {
    locktime: u64,
    threshold: u32,
    addresses: Vec<Address>,
}

impl OutputOwners {
    /// Sorts and deduplicates `addresses`, then checks the threshold.
    pub fn new(mut addresses: Vec<Address>, locktime: u64, threshold: u32) -> Result<Self> {
        addresses.sort();
        addresses.dedup();
        if threshold as usize > addresses.len() {
            return Err(AxvmError::Threshold {
                threshold,
                addresses: addresses.len(),
            });
        }
        Ok(Self {
            locktime,
            threshold,
            addresses,
        })
    }

    pub fn locktime(&self) -> u64 {
        self.locktime
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    pub fn addresses(&self) -> &[Address] {
        &self.addresses
    }

    /// Position of `address` in the sorted owner list.
    pub fn address_index(&self, address: &Address) -> Option<u32> {
        self.addresses
            .binary_search(address)
            .ok()
            .map(|idx| idx as u32)
    }

    /// Owners found in `candidates`, in owner order, stopping once
    /// `threshold` of them are collected. Empty while still locked.
    pub fn spenders(&self, candidates: &[Address], as_of: u64) -> Vec<Address> {
        if self.locktime > as_of {
            return Vec::new();
        }
        let mut qualified = Vec::new();
        for owner in &self.addresses {
            if qualified.len() >= self.threshold as usize {
                break;
            }
            if candidates.contains(owner) {
                qualified.push(*owner);
            }
        }
        qualified
    }

    /// True when `candidates` can authorize a spend at `as_of`.
    pub fn meets_threshold(&self, candidates: &[Address], as_of: u64) -> bool {
        if self.locktime > as_of {
            return false;
        }
        self.spenders(candidates, as_of).len() >= self.threshold as usize
    }
}

impl Packable for OutputOwners {
    fn pack(&self, buf: &mut BytesMut) {
        buf.put_u64(self.locktime);
        buf.put_u32(self.threshold);
        put_vec(buf, &self.addresses);
    }

    /// Unlike [`OutputOwners::new`], parsing does not sort: addresses must
    /// already be strictly ascending, since sigIdx values point into them.
    fn unpack(reader: &mut Reader<'_>) -> Result<Self> {
        let locktime = reader.read_u64()?;
        let threshold = reader.read_u32()?;
        let addresses = reader.read_vec(Address::unpack)?;
        ensure_sorted("owner addresses", &addresses, true, |a| *a)?;
        Self::new(addresses, locktime, threshold)
    }
}

impl HumanReadable for OutputOwners {
    const SCHEMA: &'static [FieldSpec] = &[
        ("locktime", Encoding::Decimal),
        ("threshold", Encoding::Decimal),
        ("addresses", Encoding::Hex),
    ];

    fn to_fields(&self) -> Result<Fields> {
        let mut fields = Fields::new(Self::SCHEMA);
        fields.put_u64("locktime", self.locktime)?;
        fields.put_u64("threshold", self.threshold as u64)?;
        fields.put_bytes_list("addresses", self.addresses.iter().map(|a| a.as_bytes().as_slice()))?;
        Ok(fields)
    }

    fn from_fields(fields: &Fields) -> Result<Self> {
        let addresses = fields
            .bytes_list("addresses")?
            .iter()
            .map(|raw| Address::from_slice(raw))
            .collect::<Result<Vec<_>>>()?;
        Self::new(addresses, fields.u64("locktime")?, fields.u32("threshold")?)
    }
}

// ---------------------------------------------------------------------------
// Variants
// ---------------------------------------------------------------------------

/// Fungible amount held by a set of owners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecpTransferOutput {
    codec: CodecVersion,
    amount: u64,
    owners: OutputOwners,
}

impl SecpTransferOutput {
    pub fn new(amount: u64, owners: OutputOwners) -> Self {
        Self {
            codec: CodecVersion::LATEST,
            amount,
            owners,
        }
    }

    pub fn amount(&self) -> u64 {
        self.amount
    }

    pub fn owners(&self) -> &OutputOwners {
        &self.owners
    }

    pub fn codec(&self) -> CodecVersion {
        self.codec
    }

    pub fn set_codec(&mut self, codec: CodecVersion) {
        self.codec = codec;
    }

    pub fn type_id(&self) -> u32 {
        TypeTag::SecpTransferOutput.type_id(self.codec)
    }
}

impl Packable for SecpTransferOutput {
    fn pack(&self, buf: &mut BytesMut) {
        buf.put_u64(self.amount);
        self.owners.pack(buf);
    }

    fn unpack(reader: &mut Reader<'_>) -> Result<Self> {
        let amount = reader.read_u64()?;
        Ok(Self::new(amount, OutputOwners::unpack(reader)?))
    }
}

/// Authority to mint more of a fungible asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecpMintOutput {
    codec: CodecVersion,
    owners: OutputOwners,
}

impl SecpMintOutput {
    pub fn new(owners: OutputOwners) -> Self {
        Self {
            codec: CodecVersion::LATEST,
            owners,
        }
    }

    pub fn owners(&self) -> &OutputOwners {
        &self.owners
    }

    pub fn codec(&self) -> CodecVersion {
        self.codec
    }

    pub fn set_codec(&mut self, codec: CodecVersion) {
        self.codec = codec;
    }

    pub fn type_id(&self) -> u32 {
        TypeTag::SecpMintOutput.type_id(self.codec)
    }
}

impl Packable for SecpMintOutput {
    fn pack(&self, buf: &mut BytesMut) {
        self.owners.pack(buf);
    }

    fn unpack(reader: &mut Reader<'_>) -> Result<Self> {
        Ok(Self::new(OutputOwners::unpack(reader)?))
    }
}

/// Authority to mint NFTs of one group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NftMintOutput {
    codec: CodecVersion,
    group_id: u32,
    owners: OutputOwners,
}

impl NftMintOutput {
    pub fn new(group_id: u32, owners: OutputOwners) -> Self {
        Self {
            codec: CodecVersion::LATEST,
            group_id,
            owners,
        }
    }

    pub fn group_id(&self) -> u32 {
        self.group_id
    }

    pub fn owners(&self) -> &OutputOwners {
        &self.owners
    }

    pub fn codec(&self) -> CodecVersion {
        self.codec
    }

    pub fn set_codec(&mut self, codec: CodecVersion) {
        self.codec = codec;
    }

    pub fn type_id(&self) -> u32 {
        TypeTag::NftMintOutput.type_id(self.codec)
    }
}

impl Packable for NftMintOutput {
    fn pack(&self, buf: &mut BytesMut) {
        buf.put_u32(self.group_id);
        self.owners.pack(buf);
    }

    fn unpack(reader: &mut Reader<'_>) -> Result<Self> {
        let group_id = reader.read_u32()?;
        Ok(Self::new(group_id, OutputOwners::unpack(reader)?))
    }
}

/// One NFT: a group id plus an opaque payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NftTransferOutput {
    codec: CodecVersion,
    group_id: u32,
    payload: Vec<u8>,
    owners: OutputOwners,
}

impl NftTransferOutput {
    /// Fails if `payload` exceeds 1024 bytes.
    pub fn new(group_id: u32, payload: Vec<u8>, owners: OutputOwners) -> Result<Self> {
        check_len("payload", payload.len(), MAX_PAYLOAD_LENGTH)?;
        Ok(Self {
            codec: CodecVersion::LATEST,
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

    pub fn owners(&self) -> &OutputOwners {
        &self.owners
    }

    pub fn codec(&self) -> CodecVersion {
        self.codec
    }

    pub fn set_codec(&mut self, codec: CodecVersion) {
        self.codec = codec;
    }

    pub fn type_id(&self) -> u32 {
        TypeTag::NftTransferOutput.type_id(self.codec)
    }
}

impl Packable for NftTransferOutput {
    fn pack(&self, buf: &mut BytesMut) {
        buf.put_u32(self.group_id);
        put_u32_prefixed(buf, &self.payload);
        self.owners.pack(buf);
    }

    fn unpack(reader: &mut Reader<'_>) -> Result<Self> {
        let group_id = reader.read_u32()?;
        let payload = reader.read_u32_prefixed()?;
        Self::new(group_id, payload, OutputOwners::unpack(reader)?)
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// Any output. Wire form is `typeID:u32` followed by the variant body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    SecpTransfer(SecpTransferOutput),
    SecpMint(SecpMintOutput),
    NftMint(NftMintOutput),
    NftTransfer(NftTransferOutput),
}

impl Output {
    pub fn tag(&self) -> TypeTag {
        match self {
            Self::SecpTransfer(_) => TypeTag::SecpTransferOutput,
            Self::SecpMint(_) => TypeTag::SecpMintOutput,
            Self::NftMint(_) => TypeTag::NftMintOutput,
            Self::NftTransfer(_) => TypeTag::NftTransferOutput,
        }
    }

    pub fn codec(&self) -> CodecVersion {
        match self {
            Self::SecpTransfer(o) => o.codec(),
            Self::SecpMint(o) => o.codec(),
            Self::NftMint(o) => o.codec(),
            Self::NftTransfer(o) => o.codec(),
        }
    }

    /// Active numeric type id under this output's codec version.
    pub fn type_id(&self) -> u32 {
        self.tag().type_id(self.codec())
    }

    pub fn set_codec(&mut self, codec: CodecVersion) {
        match self {
            Self::SecpTransfer(o) => o.set_codec(codec),
            Self::SecpMint(o) => o.set_codec(codec),
            Self::NftMint(o) => o.set_codec(codec),
            Self::NftTransfer(o) => o.set_codec(codec),
        }
    }

    /// Switches the type-id set. Only 0 and 1 are valid.
    pub fn set_codec_id(&mut self, codec_id: u16) -> Result<()> {
        self.set_codec(codec_from_id(codec_id)?);
        Ok(())
    }

    pub fn owners(&self) -> &OutputOwners {
        match self {
            Self::SecpTransfer(o) => o.owners(),
            Self::SecpMint(o) => o.owners(),
            Self::NftMint(o) => o.owners(),
            Self::NftTransfer(o) => o.owners(),
        }
    }

    /// Amount carried, for variants that carry one.
    pub fn amount(&self) -> Option<u64> {
        match self {
            Self::SecpTransfer(o) => Some(o.amount()),
            _ => None,
        }
    }

    pub fn group_id(&self) -> Option<u32> {
        match self {
            Self::NftMint(o) => Some(o.group_id()),
            Self::NftTransfer(o) => Some(o.group_id()),
            _ => None,
        }
    }

    pub fn spenders(&self, candidates: &[Address], as_of: u64) -> Vec<Address> {
        self.owners().spenders(candidates, as_of)
    }

    pub fn meets_threshold(&self, candidates: &[Address], as_of: u64) -> bool {
        self.owners().meets_threshold(candidates, as_of)
    }

    pub fn address_index(&self, address: &Address) -> Option<u32> {
        self.owners().address_index(address)
    }

    fn pack_body(&self, buf: &mut BytesMut) {
        match self {
            Self::SecpTransfer(o) => o.pack(buf),
            Self::SecpMint(o) => o.pack(buf),
            Self::NftMint(o) => o.pack(buf),
            Self::NftTransfer(o) => o.pack(buf),
        }
    }

    /// Body for an already-resolved tag, without a leading type id.
    pub(crate) fn unpack_body(tag: TypeTag, codec: CodecVersion, reader: &mut Reader<'_>) -> Result<Self> {
        let mut output = match tag {
            TypeTag::SecpTransferOutput => Self::SecpTransfer(SecpTransferOutput::unpack(reader)?),
            TypeTag::SecpMintOutput => Self::SecpMint(SecpMintOutput::unpack(reader)?),
            TypeTag::NftMintOutput => Self::NftMint(NftMintOutput::unpack(reader)?),
            TypeTag::NftTransferOutput => Self::NftTransfer(NftTransferOutput::unpack(reader)?),
            other => {
                return Err(AxvmError::WrongType {
                    expected: "output".to_string(),
                    got: other,
                })
            }
        };
        output.set_codec(codec);
        Ok(output)
    }
}

impl Packable for Output {
    fn pack(&self, buf: &mut BytesMut) {
        buf.put_u32(self.type_id());
        self.pack_body(buf);
    }

    fn unpack(reader: &mut Reader<'_>) -> Result<Self> {
        let (tag, codec) = resolve(Category::Output, reader.read_u32()?)?;
        Self::unpack_body(tag, codec, reader)
    }
}

impl From<SecpTransferOutput> for Output {
    fn from(o: SecpTransferOutput) -> Self {
        Self::SecpTransfer(o)
    }
}

impl From<SecpMintOutput> for Output {
    fn from(o: SecpMintOutput) -> Self {
        Self::SecpMint(o)
    }
}

impl From<NftMintOutput> for Output {
    fn from(o: NftMintOutput) -> Self {
        Self::NftMint(o)
    }
}

impl From<NftTransferOutput> for Output {
    fn from(o: NftTransferOutput) -> Self {
        Self::NftTransfer(o)
    }
}

impl HumanReadable for Output {
    const SCHEMA: &'static [FieldSpec] = &[
        ("typeID", Encoding::Decimal),
        ("amount", Encoding::Decimal),
        ("groupID", Encoding::Decimal),
        ("payload", Encoding::Hex),
    ];

    fn to_fields(&self) -> Result<Fields> {
        let mut fields = Fields::new(Self::SCHEMA);
        fields.put_u64("typeID", self.type_id() as u64)?;
        match self {
            Self::SecpTransfer(o) => fields.put_u64("amount", o.amount())?,
            Self::SecpMint(_) => {}
            Self::NftMint(o) => fields.put_u64("groupID", o.group_id() as u64)?,
            Self::NftTransfer(o) => {
                fields.put_u64("groupID", o.group_id() as u64)?;
                fields.put_bytes("payload", o.payload())?;
            }
        }
        fields.put_object("owners", self.owners())?;
        Ok(fields)
    }

    fn from_fields(fields: &Fields) -> Result<Self> {
        let (tag, codec) = resolve(Category::Output, fields.u32("typeID")?)?;
        let owners: OutputOwners = fields.object("owners")?;
        let mut output: Output = match tag {
            TypeTag::SecpTransferOutput => {
                SecpTransferOutput::new(fields.u64("amount")?, owners).into()
            }
            TypeTag::SecpMintOutput => SecpMintOutput::new(owners).into(),
            TypeTag::NftMintOutput => NftMintOutput::new(fields.u32("groupID")?, owners).into(),
            TypeTag::NftTransferOutput => {
                NftTransferOutput::new(fields.u32("groupID")?, fields.bytes("payload")?, owners)?.into()
            }
            other => {
                return Err(AxvmError::WrongType {
                    expected: "output".to_string(),
                    got: other,
                })
            }
        };
        output.set_codec(codec);
        Ok(output)
    }
}

// ---------------------------------------------------------------------------
// TransferableOutput
// ---------------------------------------------------------------------------

/// An output together with the asset it holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferableOutput {
    pub asset_id: AssetId,
    pub output: Output,
}

impl TransferableOutput {
    pub fn new(asset_id: AssetId, output: impl Into<Output>) -> Self {
        Self {
            asset_id,
            output: output.into(),
        }
    }

    /// Canonical order: output type id, then full serialized bytes.
    pub fn canonical_cmp(&self, other: &Self) -> Ordering {
        self.output
            .type_id()
            .cmp(&other.output.type_id())
            .then_with(|| self.to_bytes().cmp(&other.to_bytes()))
    }
}

impl Packable for TransferableOutput {
    fn pack(&self, buf: &mut BytesMut) {
        self.asset_id.pack(buf);
        self.output.pack(buf);
    }

    fn unpack(reader: &mut Reader<'_>) -> Result<Self> {
        Ok(Self {
            asset_id: AssetId::unpack(reader)?,
            output: Output::unpack(reader)?,
        })
    }
}

impl HumanReadable for TransferableOutput {
    const SCHEMA: &'static [FieldSpec] = &[("assetID", Encoding::Cb58)];

    fn to_fields(&self) -> Result<Fields> {
        let mut fields = Fields::new(Self::SCHEMA);
        fields.put_bytes("assetID", self.asset_id.as_bytes())?;
        fields.put_object("output", &self.output)?;
        Ok(fields)
    }

    fn from_fields(fields: &Fields) -> Result<Self> {
        Ok(Self {
            asset_id: AssetId::from_bytes(fields.array("assetID")?),
            output: fields.object("output")?,
        })
    }
}

fn canonical_key(output: &TransferableOutput) -> (u32, Vec<u8>) {
    (output.output.type_id(), output.to_bytes())
}

fn bare_canonical_key(output: &Output) -> (u32, Vec<u8>) {
    (output.type_id(), output.to_bytes())
}

/// Sorts outputs into canonical order.
pub fn sort_outputs(outputs: &mut [TransferableOutput]) {
    outputs.sort_by_cached_key(canonical_key);
}

/// Sorts bare outputs (as held in initial states) into canonical order.
pub(crate) fn sort_bare_outputs(outputs: &mut [Output]) {
    outputs.sort_by_cached_key(bare_canonical_key);
}

/// Errors with [`AxvmError::NotCanonical`] unless parsed outputs are
/// already in the order [`sort_outputs`] would give them.
pub(crate) fn ensure_outputs_sorted(outputs: &[TransferableOutput]) -> Result<()> {
    ensure_sorted("outputs", outputs, false, canonical_key)
}

pub(crate) fn ensure_bare_outputs_sorted(outputs: &[Output]) -> Result<()> {
    ensure_sorted("initial state outputs", outputs, false, bare_canonical_key)
}

/// JSON array of outputs, for callers assembling larger documents.
pub fn outputs_to_json(outputs: &[TransferableOutput]) -> Result<Value> {
    outputs
        .iter()
        .map(HumanReadable::to_json)
        .collect::<Result<Vec<_>>>()
        .map(Value::Array)
}
