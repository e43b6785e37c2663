//! # Transaction Module
//!
//! Wire structures for every AXVM transaction variant and the envelopes
//! that carry them.
//!
//! ## Architecture
//!
//! ```text
//! base.rs         -- BaseTx, the header every variant starts with
//! create_asset.rs -- CreateAssetTx and InitialStates
//! operation.rs    -- OperationTx
//! import.rs       -- ImportTx (inputs from another chain)
//! export.rs       -- ExportTx (outputs to another chain)
//! genesis.rs      -- GenesisAsset and GenesisData
//! signing.rs      -- UnsignedTx::sign and credential checks
//! ```
//!
//! ## Lifecycle
//!
//! 1. **Build**: a `build_*` method on [`crate::utxo::UtxoSet`] returns an
//!    [`UnsignedTx`].
//! 2. **Sign**: [`UnsignedTx::sign`] hashes the unsigned bytes with SHA-256
//!    and produces one credential per input (then per operation, then per
//!    imported input), giving a [`SignedTx`].
//! 3. **Issue**: the signed bytes go to the transport. The transaction id
//!    is SHA-256 of the signed bytes.

pub mod base;
pub mod create_asset;
pub mod export;
pub mod genesis;
pub mod import;
pub mod operation;
pub mod signing;

use bytes::{BufMut, BytesMut};

use crate::codec::wire::put_vec;
use crate::codec::{codec_from_id, resolve, Category, CodecVersion, Packable, Reader, TypeTag};
use crate::credential::Credential;
use crate::crypto::hash::sha256_array;
use crate::error::{AxvmError, Result};
use crate::input::TransferableInput;
use crate::output::TransferableOutput;
use crate::types::{SigIdx, TxId};

pub use base::BaseTx;
pub use create_asset::{CreateAssetTx, InitialStates};
pub use export::ExportTx;
pub use genesis::{GenesisAsset, GenesisData};
pub use import::ImportTx;
pub use operation::OperationTx;

// ---------------------------------------------------------------------------
// Transaction
// ---------------------------------------------------------------------------

/// Any transaction body that travels behind a transaction type id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transaction {
    Base(BaseTx),
    CreateAsset(CreateAssetTx),
    Operation(OperationTx),
    Import(ImportTx),
    Export(ExportTx),
}

impl Transaction {
    pub fn tag(&self) -> TypeTag {
        match self {
            Self::Base(_) => TypeTag::BaseTx,
            Self::CreateAsset(_) => TypeTag::CreateAssetTx,
            Self::Operation(_) => TypeTag::OperationTx,
            Self::Import(_) => TypeTag::ImportTx,
            Self::Export(_) => TypeTag::ExportTx,
        }
    }

    pub fn base(&self) -> &BaseTx {
        match self {
            Self::Base(tx) => tx,
            Self::CreateAsset(tx) => &tx.base,
            Self::Operation(tx) => &tx.base,
            Self::Import(tx) => &tx.base,
            Self::Export(tx) => &tx.base,
        }
    }

    pub fn ins(&self) -> &[TransferableInput] {
        self.base().ins()
    }

    pub fn outs(&self) -> &[TransferableOutput] {
        self.base().outs()
    }

    /// Every output this transaction creates, including exported ones.
    pub fn total_outputs(&self) -> Vec<&TransferableOutput> {
        let mut outs: Vec<&TransferableOutput> = self.outs().iter().collect();
        if let Self::Export(tx) = self {
            outs.extend(tx.export_outputs());
        }
        outs
    }

    /// Every input this transaction consumes, including imported ones.
    pub fn total_inputs(&self) -> Vec<&TransferableInput> {
        let mut ins: Vec<&TransferableInput> = self.ins().iter().collect();
        if let Self::Import(tx) = self {
            ins.extend(tx.import_inputs());
        }
        ins
    }

    /// `(credential tag, signature slots)` for every credential this
    /// transaction needs, in the order credentials are serialized.
    pub fn signing_slots(&self) -> Vec<(TypeTag, &[SigIdx])> {
        let mut slots: Vec<(TypeTag, &[SigIdx])> = self
            .ins()
            .iter()
            .map(|i| (i.input.credential_tag(), i.input.sig_idxs()))
            .collect();
        match self {
            Self::Operation(tx) => slots.extend(
                tx.operations()
                    .iter()
                    .map(|op| (op.operation.credential_tag(), op.operation.sig_idxs())),
            ),
            Self::Import(tx) => slots.extend(
                tx.import_inputs()
                    .iter()
                    .map(|i| (i.input.credential_tag(), i.input.sig_idxs())),
            ),
            _ => {}
        }
        slots
    }

    fn set_codec(&mut self, codec: CodecVersion) {
        match self {
            Self::Base(tx) => tx.set_codec(codec),
            Self::CreateAsset(tx) => tx.set_codec(codec),
            Self::Operation(tx) => tx.set_codec(codec),
            Self::Import(tx) => tx.set_codec(codec),
            Self::Export(tx) => tx.set_codec(codec),
        }
    }

    fn pack_body(&self, buf: &mut BytesMut) -> Result<()> {
        match self {
            Self::Base(tx) => tx.pack(buf),
            Self::CreateAsset(tx) => tx.pack(buf),
            Self::Operation(tx) => tx.pack(buf),
            Self::Import(tx) => tx.pack(buf),
            Self::Export(tx) => tx.pack(buf)?,
        }
        Ok(())
    }

    fn unpack_body(tag: TypeTag, reader: &mut Reader<'_>) -> Result<Self> {
        Ok(match tag {
            TypeTag::BaseTx => Self::Base(BaseTx::unpack(reader)?),
            TypeTag::CreateAssetTx => Self::CreateAsset(CreateAssetTx::unpack(reader)?),
            TypeTag::OperationTx => Self::Operation(OperationTx::unpack(reader)?),
            TypeTag::ImportTx => Self::Import(ImportTx::unpack(reader)?),
            TypeTag::ExportTx => Self::Export(ExportTx::unpack(reader)?),
            other => {
                return Err(AxvmError::WrongType {
                    expected: "transaction".to_string(),
                    got: other,
                })
            }
        })
    }
}

impl From<BaseTx> for Transaction {
    fn from(tx: BaseTx) -> Self {
        Self::Base(tx)
    }
}

impl From<CreateAssetTx> for Transaction {
    fn from(tx: CreateAssetTx) -> Self {
        Self::CreateAsset(tx)
    }
}

impl From<OperationTx> for Transaction {
    fn from(tx: OperationTx) -> Self {
        Self::Operation(tx)
    }
}

impl From<ImportTx> for Transaction {
    fn from(tx: ImportTx) -> Self {
        Self::Import(tx)
    }
}

impl From<ExportTx> for Transaction {
    fn from(tx: ExportTx) -> Self {
        Self::Export(tx)
    }
}

// ---------------------------------------------------------------------------
// UnsignedTx
// ---------------------------------------------------------------------------

/// `codec:u16, txTypeID:u32, body`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedTx {
    codec: CodecVersion,
    transaction: Transaction,
}

impl UnsignedTx {
    /// Wraps `transaction` under the latest codec version.
    pub fn new(transaction: impl Into<Transaction>) -> Self {
        Self::with_codec(transaction, CodecVersion::LATEST)
    }

    /// Wraps `transaction`, switching every nested element to `codec`.
    pub fn with_codec(transaction: impl Into<Transaction>, codec: CodecVersion) -> Self {
        let mut transaction = transaction.into();
        transaction.set_codec(codec);
        Self { codec, transaction }
    }

    pub fn codec(&self) -> CodecVersion {
        self.codec
    }

    pub fn set_codec_id(&mut self, codec_id: u16) -> Result<()> {
        self.codec = codec_from_id(codec_id)?;
        self.transaction.set_codec(self.codec);
        Ok(())
    }

    pub fn transaction(&self) -> &Transaction {
        &self.transaction
    }

    pub fn into_transaction(self) -> Transaction {
        self.transaction
    }

    pub fn pack(&self, buf: &mut BytesMut) -> Result<()> {
        // Size the body first so a failure leaves `buf` untouched.
        let mut body = BytesMut::new();
        self.transaction.pack_body(&mut body)?;
        buf.put_u16(self.codec.as_u16());
        buf.put_u32(self.transaction.tag().type_id(self.codec));
        buf.put_slice(&body);
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = BytesMut::new();
        self.pack(&mut buf)?;
        Ok(buf.to_vec())
    }

    pub fn unpack(reader: &mut Reader<'_>) -> Result<Self> {
        let codec = codec_from_id(reader.read_u16()?)?;
        let (tag, _) = resolve(Category::Transaction, reader.read_u32()?)?;
        let transaction = Transaction::unpack_body(tag, reader)?;
        Ok(Self { codec, transaction })
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut reader = Reader::new(bytes);
        let tx = Self::unpack(&mut reader)?;
        reader.finish()?;
        Ok(tx)
    }

    /// SHA-256 of the unsigned bytes; what every credential signs.
    pub fn message(&self) -> Result<[u8; 32]> {
        Ok(sha256_array(&self.to_bytes()?))
    }
}

// ---------------------------------------------------------------------------
// SignedTx
// ---------------------------------------------------------------------------

/// Unsigned bytes followed by `numCreds:u32, credential*`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTx {
    unsigned: UnsignedTx,
    credentials: Vec<Credential>,
}

impl SignedTx {
    pub fn new(unsigned: UnsignedTx, credentials: Vec<Credential>) -> Self {
        Self {
            unsigned,
            credentials,
        }
    }

    pub fn unsigned(&self) -> &UnsignedTx {
        &self.unsigned
    }

    pub fn credentials(&self) -> &[Credential] {
        &self.credentials
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = BytesMut::new();
        self.unsigned.pack(&mut buf)?;
        put_vec(&mut buf, &self.credentials);
        Ok(buf.to_vec())
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut reader = Reader::new(bytes);
        let unsigned = UnsignedTx::unpack(&mut reader)?;
        let credentials = reader.read_vec(Credential::unpack)?;
        reader.finish()?;
        Ok(Self {
            unsigned,
            credentials,
        })
    }

    /// SHA-256 of the signed bytes.
    pub fn id(&self) -> Result<TxId> {
        Ok(TxId::from_bytes(sha256_array(&self.to_bytes()?)))
    }
}
