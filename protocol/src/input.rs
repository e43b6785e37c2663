//! # Inputs
//!
//! An input spends one UTXO. Its only variant today is the SECP transfer
//! input: `amount:u64, numSigIdx:u32, addressIndex:u32*`. The source
//! address of each signature slot is kept in memory for signing but is
//! not part of the wire form.

use bytes::{BufMut, BytesMut};

use crate::codec::encoding::{Encoding, FieldSpec, Fields, HumanReadable};
use crate::codec::wire::{ensure_sorted, put_vec};
use crate::codec::{codec_from_id, resolve, Category, CodecVersion, Packable, Reader, TypeTag};
use crate::error::{AxvmError, Result};
use crate::types::{Address, AssetId, SigIdx, TxId, Utxoid};

/// Spends a [`crate::output::SecpTransferOutput`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecpTransferInput {
    codec: CodecVersion,
    amount: u64,
    sig_idxs: Vec<SigIdx>,
}

impl SecpTransferInput {
    pub fn new(amount: u64) -> Self {
        Self {
            codec: CodecVersion::LATEST,
            amount,
            sig_idxs: Vec::new(),
        }
    }

    pub fn amount(&self) -> u64 {
        self.amount
    }

    pub fn sig_idxs(&self) -> &[SigIdx] {
        &self.sig_idxs
    }

    /// Appends a signature slot. Slots are signed in insertion order.
    pub fn add_signature_idx(&mut self, address_index: u32, source: Address) {
        self.sig_idxs.push(SigIdx::new(address_index, source));
    }

    pub fn codec(&self) -> CodecVersion {
        self.codec
    }

    pub fn set_codec(&mut self, codec: CodecVersion) {
        self.codec = codec;
    }
}

impl Packable for SecpTransferInput {
    fn pack(&self, buf: &mut BytesMut) {
        buf.put_u64(self.amount);
        put_vec(buf, &self.sig_idxs);
    }

    fn unpack(reader: &mut Reader<'_>) -> Result<Self> {
        let amount = reader.read_u64()?;
        let sig_idxs = reader.read_vec(SigIdx::unpack)?;
        Ok(Self {
            codec: CodecVersion::LATEST,
            amount,
            sig_idxs,
        })
    }
}

/// Any input. Wire form is `typeID:u32` followed by the variant body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    SecpTransfer(SecpTransferInput),
}

impl Input {
    pub fn tag(&self) -> TypeTag {
        match self {
            Self::SecpTransfer(_) => TypeTag::SecpTransferInput,
        }
    }

    pub fn codec(&self) -> CodecVersion {
        match self {
            Self::SecpTransfer(i) => i.codec(),
        }
    }

    pub fn type_id(&self) -> u32 {
        self.tag().type_id(self.codec())
    }

    pub fn set_codec(&mut self, codec: CodecVersion) {
        match self {
            Self::SecpTransfer(i) => i.set_codec(codec),
        }
    }

    pub fn set_codec_id(&mut self, codec_id: u16) -> Result<()> {
        self.set_codec(codec_from_id(codec_id)?);
        Ok(())
    }

    pub fn amount(&self) -> u64 {
        match self {
            Self::SecpTransfer(i) => i.amount(),
        }
    }

    pub fn sig_idxs(&self) -> &[SigIdx] {
        match self {
            Self::SecpTransfer(i) => i.sig_idxs(),
        }
    }

    /// Credential variant that must accompany this input.
    pub fn credential_tag(&self) -> TypeTag {
        match self {
            Self::SecpTransfer(_) => TypeTag::SecpCredential,
        }
    }
}

impl Packable for Input {
    fn pack(&self, buf: &mut BytesMut) {
        buf.put_u32(self.type_id());
        match self {
            Self::SecpTransfer(i) => i.pack(buf),
        }
    }

    fn unpack(reader: &mut Reader<'_>) -> Result<Self> {
        let (tag, codec) = resolve(Category::Input, reader.read_u32()?)?;
        let mut input = match tag {
            TypeTag::SecpTransferInput => Self::SecpTransfer(SecpTransferInput::unpack(reader)?),
            other => {
                return Err(AxvmError::WrongType {
                    expected: "input".to_string(),
                    got: other,
                })
            }
        };
        input.set_codec(codec);
        Ok(input)
    }
}

impl From<SecpTransferInput> for Input {
    fn from(i: SecpTransferInput) -> Self {
        Self::SecpTransfer(i)
    }
}

impl HumanReadable for Input {
    const SCHEMA: &'static [FieldSpec] = &[("typeID", Encoding::Decimal), ("amount", Encoding::Decimal)];

    fn to_fields(&self) -> Result<Fields> {
        let mut fields = Fields::new(Self::SCHEMA);
        fields.put_u64("typeID", self.type_id() as u64)?;
        fields.put_u64("amount", self.amount())?;
        fields.put_list("sigIdxs", self.sig_idxs())?;
        Ok(fields)
    }

    fn from_fields(fields: &Fields) -> Result<Self> {
        let (tag, codec) = resolve(Category::Input, fields.u32("typeID")?)?;
        match tag {
            TypeTag::SecpTransferInput => {
                let mut input = SecpTransferInput::new(fields.u64("amount")?);
                input.sig_idxs = fields.list("sigIdxs")?;
                input.set_codec(codec);
                Ok(input.into())
            }
            other => Err(AxvmError::WrongType {
                expected: "input".to_string(),
                got: other,
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// TransferableInput
// ---------------------------------------------------------------------------

/// An input with the UTXO it spends: `txID, outputIndex, assetID, input`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferableInput {
    pub tx_id: TxId,
    pub output_index: u32,
    pub asset_id: AssetId,
    pub input: Input,
}

impl TransferableInput {
    pub fn new(utxo_id: Utxoid, asset_id: AssetId, input: impl Into<Input>) -> Self {
        Self {
            tx_id: utxo_id.tx_id,
            output_index: utxo_id.output_index,
            asset_id,
            input: input.into(),
        }
    }

    pub fn utxo_id(&self) -> Utxoid {
        Utxoid::new(self.tx_id, self.output_index)
    }
}

impl Packable for TransferableInput {
    fn pack(&self, buf: &mut BytesMut) {
        self.tx_id.pack(buf);
        buf.put_u32(self.output_index);
        self.asset_id.pack(buf);
        self.input.pack(buf);
    }

    fn unpack(reader: &mut Reader<'_>) -> Result<Self> {
        Ok(Self {
            tx_id: TxId::unpack(reader)?,
            output_index: reader.read_u32()?,
            asset_id: AssetId::unpack(reader)?,
            input: Input::unpack(reader)?,
        })
    }
}

impl HumanReadable for TransferableInput {
    const SCHEMA: &'static [FieldSpec] = &[
        ("txID", Encoding::Cb58),
        ("outputIdx", Encoding::Decimal),
        ("assetID", Encoding::Cb58),
    ];

    fn to_fields(&self) -> Result<Fields> {
        let mut fields = Fields::new(Self::SCHEMA);
        fields.put_bytes("txID", self.tx_id.as_bytes())?;
        fields.put_u64("outputIdx", self.output_index as u64)?;
        fields.put_bytes("assetID", self.asset_id.as_bytes())?;
        fields.put_object("input", &self.input)?;
        Ok(fields)
    }

    fn from_fields(fields: &Fields) -> Result<Self> {
        Ok(Self {
            tx_id: TxId::from_bytes(fields.array("txID")?),
            output_index: fields.u32("outputIdx")?,
            asset_id: AssetId::from_bytes(fields.array("assetID")?),
            input: fields.object("input")?,
        })
    }
}

/// Sorts inputs by the UTXO they spend (transaction id, then index).
pub fn sort_inputs(inputs: &mut [TransferableInput]) {
    inputs.sort_by_key(|i| i.utxo_id());
}

pub(crate) fn ensure_inputs_sorted(inputs: &[TransferableInput]) -> Result<()> {
    ensure_sorted("inputs", inputs, false, |i| i.utxo_id())
}
