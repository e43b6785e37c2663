//! Error types for the AXVM transaction core.
//!
//! Every fallible operation in the crate returns an [`AxvmError`]. Nothing
//! is retried internally. Callers that present errors to end users should
//! branch on [`AxvmError::kind`]: insufficient funds and authorization
//! failures are the user's problem, codec and structural failures are ours.

use std::fmt;

use thiserror::Error;

use crate::codec::{Category, TypeTag};
use crate::types::{Address, AssetId, Utxoid};

/// Coarse classification of an [`AxvmError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bad codec version, unknown type tag, truncated or malformed bytes.
    Codec,
    /// A required field is missing or a value breaks a structural limit.
    Structural,
    /// No usable signer, bad checksum, or missing key material.
    Authorization,
    /// Threshold or balance problems while selecting coins.
    Accounting,
    /// A referenced UTXO is absent or of the wrong kind.
    Lookup,
    /// The external transport collaborator failed.
    Transport,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Codec => "codec",
            Self::Structural => "structural",
            Self::Authorization => "authorization",
            Self::Accounting => "accounting",
            Self::Lookup => "lookup",
            Self::Transport => "transport",
        };
        f.write_str(name)
    }
}

/// Errors produced by the AXVM transaction core.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AxvmError {
    // -- codec --------------------------------------------------------------
    /// Only codec versions 0 and 1 exist.
    #[error("invalid codec version {0}: expected 0 or 1")]
    CodecId(u16),

    /// A type tag that no variant of the category claims.
    #[error("unknown {category} type id {type_id}")]
    UnknownTypeId { category: Category, type_id: u32 },

    #[error("unexpected end of buffer at offset {offset}: need {needed} bytes, {available} available")]
    UnexpectedEof {
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("{0} trailing bytes after decoding")]
    TrailingBytes(usize),

    #[error("invalid utf-8 in {field}")]
    InvalidUtf8 { field: &'static str },

    /// A human-readable string could not be decoded.
    #[error("invalid {encoding} string: {reason}")]
    Encoding {
        encoding: &'static str,
        reason: String,
    },

    /// Parsed elements that would be reordered or merged on re-encoding.
    #[error("{0} are not in canonical order")]
    NotCanonical(&'static str),

    // -- structural ---------------------------------------------------------
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("{field} too long: {len} bytes exceeds maximum of {max}")]
    FieldTooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("denomination {0} exceeds maximum of 32")]
    InvalidDenomination(u8),

    /// A collection received an element of the wrong variant.
    #[error("wrong element type: expected {expected}, got {got}")]
    WrongType { expected: String, got: TypeTag },

    #[error("invalid {what} length: expected {expected}, got {got}")]
    InvalidLength {
        what: &'static str,
        expected: usize,
        got: usize,
    },

    // -- authorization ------------------------------------------------------
    #[error("address {0} is not an owner of the referenced output")]
    AddressNotOwner(Address),

    #[error("checksum mismatch")]
    Checksum,

    #[error("no key in keychain for address {0}")]
    MissingKey(Address),

    #[error("invalid private key material")]
    InvalidKey,

    // -- accounting ---------------------------------------------------------
    #[error("threshold {threshold} is greater than the number of addresses ({addresses})")]
    Threshold { threshold: u32, addresses: usize },

    #[error("insufficient funds for asset {asset_id}: required {required}, available {available}")]
    InsufficientFunds {
        asset_id: AssetId,
        required: u64,
        available: u64,
    },

    #[error("spend amount must be greater than zero")]
    ZeroAmount,

    #[error("arithmetic overflow while summing amounts")]
    Overflow,

    // -- lookup -------------------------------------------------------------
    #[error("UTXO {0} not found")]
    UtxoNotFound(Utxoid),

    #[error("UTXO {utxo_id} holds a {got} output, expected {expected}")]
    UnexpectedOutput {
        utxo_id: Utxoid,
        expected: TypeTag,
        got: TypeTag,
    },

    // -- transport ----------------------------------------------------------
    #[error("transport error: {0}")]
    Transport(String),
}

impl AxvmError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::CodecId(_)
            | Self::UnknownTypeId { .. }
            | Self::UnexpectedEof { .. }
            | Self::TrailingBytes(_)
            | Self::InvalidUtf8 { .. }
            | Self::Encoding { .. }
            | Self::NotCanonical(_) => ErrorKind::Codec,
            Self::MissingField(_)
            | Self::FieldTooLong { .. }
            | Self::InvalidDenomination(_)
            | Self::WrongType { .. }
            | Self::InvalidLength { .. } => ErrorKind::Structural,
            Self::AddressNotOwner(_) | Self::Checksum | Self::MissingKey(_) | Self::InvalidKey => {
                ErrorKind::Authorization
            }
            Self::Threshold { .. }
            | Self::InsufficientFunds { .. }
            | Self::ZeroAmount
            | Self::Overflow => ErrorKind::Accounting,
            Self::UtxoNotFound(_) | Self::UnexpectedOutput { .. } => ErrorKind::Lookup,
            Self::Transport(_) => ErrorKind::Transport,
        }
    }

    /// True for failures a wallet should show to its user as-is.
    /// Codec and structural errors point at a library or version bug instead.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Authorization | ErrorKind::Accounting | ErrorKind::Lookup
        )
    }
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, AxvmError>;
