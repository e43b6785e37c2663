//! # Codec Registry
//!
//! AXVM data carries a numeric type tag in front of every polymorphic
//! value. Two codec versions are live at the same time and each variant
//! has one tag per version, so the registry is a closed enum, [`TypeTag`], whose
//! `(v0, v1)` ids are fixed data, plus a reverse lookup.
//!
//! ```text
//! mod.rs      -- CodecVersion, Category, TypeTag and the id table
//! wire.rs     -- big-endian Reader cursor and the Packable trait
//! encoding.rs -- hex / cb58 / utf-8 / decimal string forms and Fields
//! ```
//!
//! Decoding always reads the tag first, resolves it here, then hands the
//! rest of the buffer to the selected variant. Unknown tags are fatal.

pub mod encoding;
pub mod wire;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{AxvmError, Result};

pub use encoding::{Encoding, Fields, HumanReadable};
pub use wire::{Packable, Reader};

// ---------------------------------------------------------------------------
// CodecVersion
// ---------------------------------------------------------------------------

/// Selects which set of numeric type tags is in effect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CodecVersion {
    #[default]
    V0,
    V1,
}

impl CodecVersion {
    /// The version new structures are created with.
    pub const LATEST: CodecVersion = CodecVersion::V0;

    pub fn as_u16(self) -> u16 {
        match self {
            Self::V0 => 0,
            Self::V1 => 1,
        }
    }
}

impl TryFrom<u16> for CodecVersion {
    type Error = AxvmError;

    fn try_from(value: u16) -> Result<Self> {
        match value {
            0 => Ok(Self::V0),
            1 => Ok(Self::V1),
            other => Err(AxvmError::CodecId(other)),
        }
    }
}

impl fmt::Display for CodecVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u16())
    }
}

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

/// Families of tagged values. A tag is only meaningful within its family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Output,
    Input,
    Operation,
    Credential,
    Transaction,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Output => "output",
            Self::Input => "input",
            Self::Operation => "operation",
            Self::Credential => "credential",
            Self::Transaction => "transaction",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// TypeTag
// ---------------------------------------------------------------------------

/// Every concrete variant that travels with a numeric type id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TypeTag {
    SecpMintOutput,
    SecpTransferOutput,
    NftTransferOutput,
    NftMintOutput,
    SecpTransferInput,
    SecpMintOperation,
    NftMintOperation,
    NftTransferOperation,
    SecpCredential,
    NftCredential,
    BaseTx,
    CreateAssetTx,
    OperationTx,
    ImportTx,
    ExportTx,
}

/// Every tag, in table order.
pub static ALL_TAGS: [TypeTag; 15] = [
    TypeTag::SecpMintOutput,
    TypeTag::SecpTransferOutput,
    TypeTag::NftTransferOutput,
    TypeTag::NftMintOutput,
    TypeTag::SecpTransferInput,
    TypeTag::SecpMintOperation,
    TypeTag::NftMintOperation,
    TypeTag::NftTransferOperation,
    TypeTag::SecpCredential,
    TypeTag::NftCredential,
    TypeTag::BaseTx,
    TypeTag::CreateAssetTx,
    TypeTag::OperationTx,
    TypeTag::ImportTx,
    TypeTag::ExportTx,
];

impl TypeTag {
    pub fn category(self) -> Category {
        match self {
            Self::SecpMintOutput
            | Self::SecpTransferOutput
            | Self::NftTransferOutput
            | Self::NftMintOutput => Category::Output,
            Self::SecpTransferInput => Category::Input,
            Self::SecpMintOperation | Self::NftMintOperation | Self::NftTransferOperation => {
                Category::Operation
            }
            Self::SecpCredential | Self::NftCredential => Category::Credential,
            Self::BaseTx
            | Self::CreateAssetTx
            | Self::OperationTx
            | Self::ImportTx
            | Self::ExportTx => Category::Transaction,
        }
    }

    /// `[codec 0 id, codec 1 id]`.
    pub const fn ids(self) -> [u32; 2] {
        match self {
            Self::SecpMintOutput => [6, 65537],
            Self::SecpTransferOutput => [7, 65538],
            Self::NftTransferOutput => [11, 65539],
            Self::NftMintOutput => [10, 65540],
            Self::SecpTransferInput => [5, 65541],
            Self::SecpMintOperation => [8, 65542],
            Self::NftMintOperation => [12, 65543],
            Self::NftTransferOperation => [13, 65544],
            Self::SecpCredential => [9, 65545],
            Self::NftCredential => [14, 65546],
            Self::BaseTx => [0, 0],
            Self::CreateAssetTx => [1, 1],
            Self::OperationTx => [2, 2],
            Self::ImportTx => [3, 3],
            Self::ExportTx => [4, 4],
        }
    }

    /// Numeric id of this variant under `codec`.
    pub fn type_id(self, codec: CodecVersion) -> u32 {
        let ids = self.ids();
        match codec {
            CodecVersion::V0 => ids[0],
            CodecVersion::V1 => ids[1],
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Maps a wire id back to its variant and the codec version it belongs to.
///
/// Transaction ids are shared by both versions; for those the result is
/// always [`CodecVersion::V0`] and the real version comes from the
/// enclosing transaction header.
pub fn resolve(category: Category, type_id: u32) -> Result<(TypeTag, CodecVersion)> {
    for tag in ALL_TAGS.iter() {
        if tag.category() != category {
            continue;
        }
        let ids = tag.ids();
        if ids[0] == type_id {
            return Ok((*tag, CodecVersion::V0));
        }
        if ids[1] == type_id {
            return Ok((*tag, CodecVersion::V1));
        }
    }
    Err(AxvmError::UnknownTypeId { category, type_id })
}

/// Validates a raw codec id, as taken by every `set_codec_id`.
pub fn codec_from_id(codec_id: u16) -> Result<CodecVersion> {
    CodecVersion::try_from(codec_id)
}
