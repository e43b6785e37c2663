//! Primitive value types of the AXVM wire format.
//!
//! All identifiers are opaque fixed-length byte strings compared and ordered
//! as raw bytes. They are `Copy`, hash cheaply and serialize to strings:
//! ids as cb58, addresses as hex (or bech32 via [`Address::to_bech32`]).

use std::fmt;
use std::str::FromStr;

use bech32::{Bech32, Hrp};
use bytes::{BufMut, BytesMut};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::codec::encoding::{cb58_decode, cb58_encode, Encoding, FieldSpec, Fields, HumanReadable};
use crate::codec::{Packable, Reader};
use crate::config::{ADDRESS_LENGTH, ID_LENGTH, UTXO_ID_LENGTH};
use crate::error::{AxvmError, Result};

macro_rules! fixed_bytes {
    ($(#[$meta:meta])* $name:ident, $len:expr, $what:literal, $to:ident, $from:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
        pub struct $name([u8; $len]);

        impl $name {
            pub const LENGTH: usize = $len;

            pub const fn from_bytes(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }

            pub fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }

            pub fn from_slice(bytes: &[u8]) -> Result<Self> {
                let arr: [u8; $len] = bytes.try_into().map_err(|_| AxvmError::InvalidLength {
                    what: $what,
                    expected: $len,
                    got: bytes.len(),
                })?;
                Ok(Self(arr))
            }

            pub fn to_hex(&self) -> String {
                hex::encode(self.0)
            }

            pub fn from_hex(s: &str) -> Result<Self> {
                let trimmed = s.strip_prefix("0x").unwrap_or(s);
                let bytes = hex::decode(trimmed).map_err(|e| AxvmError::Encoding {
                    encoding: "hex",
                    reason: e.to_string(),
                })?;
                Self::from_slice(&bytes)
            }

            pub fn to_cb58(&self) -> String {
                cb58_encode(&self.0)
            }

            pub fn from_cb58(s: &str) -> Result<Self> {
                Self::from_slice(&cb58_decode(s)?)
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl Packable for $name {
            fn pack(&self, buf: &mut BytesMut) {
                buf.put_slice(&self.0);
            }

            fn unpack(reader: &mut Reader<'_>) -> Result<Self> {
                Ok(Self(reader.read_array()?))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.$to())
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.$to())
            }
        }

        impl FromStr for $name {
            type Err = AxvmError;

            fn from_str(s: &str) -> Result<Self> {
                Self::$from(s)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.$to())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                Self::$from(&s).map_err(serde::de::Error::custom)
            }
        }
    };
}

fixed_bytes!(
    /// Identifies an asset. Equal to the id of the transaction that created it.
    AssetId, ID_LENGTH, "asset id", to_cb58, from_cb58
);

fixed_bytes!(
    /// SHA-256 of a signed transaction's bytes.
    TxId, ID_LENGTH, "transaction id", to_cb58, from_cb58
);

fixed_bytes!(
    /// Identifies a chain. Used both as a transaction's home chain and as
    /// the source/destination of atomic imports and exports.
    BlockchainId, ID_LENGTH, "blockchain id", to_cb58, from_cb58
);

fixed_bytes!(
    /// 20-byte owner address derived from a public key.
    Address, ADDRESS_LENGTH, "address", to_hex, from_hex
);

// ---------------------------------------------------------------------------
// Address bech32 form
// ---------------------------------------------------------------------------

/// Result of parsing `"<alias>-<hrp>1<data>"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedAddress {
    pub chain_alias: String,
    pub hrp: String,
    pub address: Address,
}

impl Address {
    /// Formats as `"<alias>-<hrp>1..."`, e.g. `X-axc1...`.
    pub fn to_bech32(&self, chain_alias: &str, hrp: &str) -> Result<String> {
        let hrp = Hrp::parse(hrp).map_err(|e| AxvmError::Encoding {
            encoding: "bech32",
            reason: e.to_string(),
        })?;
        let encoded = bech32::encode::<Bech32>(hrp, &self.0).map_err(|e| AxvmError::Encoding {
            encoding: "bech32",
            reason: e.to_string(),
        })?;
        Ok(format!("{}-{}", chain_alias, encoded))
    }

    /// Parses the form produced by [`Address::to_bech32`]. A bad checksum
    /// is reported as [`AxvmError::Checksum`].
    pub fn parse_bech32(s: &str) -> Result<ParsedAddress> {
        let (chain_alias, rest) = s.split_once('-').ok_or_else(|| AxvmError::Encoding {
            encoding: "bech32",
            reason: format!("missing chain alias in {s}"),
        })?;
        let (hrp, data) = bech32::decode(rest).map_err(|e| match e {
            bech32::DecodeError::Checksum(_) => AxvmError::Checksum,
            other => AxvmError::Encoding {
                encoding: "bech32",
                reason: other.to_string(),
            },
        })?;
        Ok(ParsedAddress {
            chain_alias: chain_alias.to_string(),
            hrp: hrp.to_string(),
            address: Address::from_slice(&data)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Utxoid
// ---------------------------------------------------------------------------

/// Points at exactly one output of exactly one transaction.
///
/// Wire form is the 32-byte transaction id followed by the big-endian
/// output index, so the derived ordering equals byte ordering.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Utxoid {
    pub tx_id: TxId,
    pub output_index: u32,
}

impl Utxoid {
    pub const fn new(tx_id: TxId, output_index: u32) -> Self {
        Self {
            tx_id,
            output_index,
        }
    }

    pub fn to_array(&self) -> [u8; UTXO_ID_LENGTH] {
        let mut out = [0u8; UTXO_ID_LENGTH];
        out[..ID_LENGTH].copy_from_slice(self.tx_id.as_bytes());
        out[ID_LENGTH..].copy_from_slice(&self.output_index.to_be_bytes());
        out
    }

    pub fn from_array(bytes: &[u8; UTXO_ID_LENGTH]) -> Self {
        let mut tx = [0u8; ID_LENGTH];
        tx.copy_from_slice(&bytes[..ID_LENGTH]);
        let mut idx = [0u8; 4];
        idx.copy_from_slice(&bytes[ID_LENGTH..]);
        Self::new(TxId::from_bytes(tx), u32::from_be_bytes(idx))
    }

    pub fn to_cb58(&self) -> String {
        cb58_encode(&self.to_array())
    }

    pub fn from_cb58(s: &str) -> Result<Self> {
        let raw = cb58_decode(s)?;
        let arr: [u8; UTXO_ID_LENGTH] =
            raw.as_slice()
                .try_into()
                .map_err(|_| AxvmError::InvalidLength {
                    what: "utxo id",
                    expected: UTXO_ID_LENGTH,
                    got: raw.len(),
                })?;
        Ok(Self::from_array(&arr))
    }
}

impl Packable for Utxoid {
    fn pack(&self, buf: &mut BytesMut) {
        self.tx_id.pack(buf);
        buf.put_u32(self.output_index);
    }

    fn unpack(reader: &mut Reader<'_>) -> Result<Self> {
        Ok(Self {
            tx_id: TxId::unpack(reader)?,
            output_index: reader.read_u32()?,
        })
    }
}

impl fmt::Display for Utxoid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_cb58())
    }
}

impl fmt::Debug for Utxoid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Utxoid({}:{})", self.tx_id, self.output_index)
    }
}

impl FromStr for Utxoid {
    type Err = AxvmError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_cb58(s)
    }
}

impl HumanReadable for Utxoid {
    const SCHEMA: &'static [FieldSpec] = &[("txID", Encoding::Cb58), ("outputIdx", Encoding::Decimal)];

    fn to_fields(&self) -> Result<Fields> {
        let mut fields = Fields::new(Self::SCHEMA);
        fields.put_bytes("txID", self.tx_id.as_bytes())?;
        fields.put_u64("outputIdx", self.output_index as u64)?;
        Ok(fields)
    }

    fn from_fields(fields: &Fields) -> Result<Self> {
        Ok(Self {
            tx_id: TxId::from_bytes(fields.array("txID")?),
            output_index: fields.u32("outputIdx")?,
        })
    }
}

// ---------------------------------------------------------------------------
// SigIdx
// ---------------------------------------------------------------------------

/// One signature slot of an input or operation.
///
/// Only `address_index` goes on the wire. `source` records which address
/// the slot was assigned to so the signer can find the right key; after a
/// decode it is the zero address until the caller fills it in.
#[derive(Clone, Copy, Debug, Default, Eq)]
pub struct SigIdx {
    pub address_index: u32,
    pub source: Address,
}

impl SigIdx {
    pub fn new(address_index: u32, source: Address) -> Self {
        Self {
            address_index,
            source,
        }
    }
}

impl PartialEq for SigIdx {
    fn eq(&self, other: &Self) -> bool {
        self.address_index == other.address_index
    }
}

impl Packable for SigIdx {
    fn pack(&self, buf: &mut BytesMut) {
        buf.put_u32(self.address_index);
    }

    fn unpack(reader: &mut Reader<'_>) -> Result<Self> {
        Ok(Self {
            address_index: reader.read_u32()?,
            source: Address::default(),
        })
    }
}

impl HumanReadable for SigIdx {
    const SCHEMA: &'static [FieldSpec] = &[("source", Encoding::Hex), ("addressIndex", Encoding::Decimal)];

    fn to_fields(&self) -> Result<Fields> {
        let mut fields = Fields::new(Self::SCHEMA);
        fields.put_bytes("source", self.source.as_bytes())?;
        fields.put_u64("addressIndex", self.address_index as u64)?;
        Ok(fields)
    }

    fn from_fields(fields: &Fields) -> Result<Self> {
        Ok(Self {
            address_index: fields.u32("addressIndex")?,
            source: Address::from_bytes(fields.array("source")?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_order_as_raw_bytes() {
        let a = AssetId::from_bytes([0u8; 32]);
        let mut b_bytes = [0u8; 32];
        b_bytes[31] = 1;
        let b = AssetId::from_bytes(b_bytes);
        assert!(a < b);

        let hi = Address::from_bytes([0x80; 20]);
        let lo = Address::from_bytes([0x7f; 20]);
        assert!(lo < hi);
    }

    #[test]
    fn from_slice_checks_length() {
        let err = Address::from_slice(&[0u8; 19]).unwrap_err();
        assert_eq!(
            err,
            AxvmError::InvalidLength {
                what: "address",
                expected: 20,
                got: 19
            }
        );
    }

    #[test]
    fn cb58_string_form() {
        let id = TxId::from_bytes([5u8; 32]);
        let s = id.to_string();
        assert_eq!(s.parse::<TxId>().unwrap(), id);
        assert!(format!("{:?}", id).starts_with("TxId("));
    }

    #[test]
    fn serde_uses_string_forms() {
        let addr = Address::from_bytes([0xab; 20]);
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, format!("\"{}\"", "ab".repeat(20)));
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);
    }

    #[test]
    fn utxoid_is_36_bytes() {
        let id = Utxoid::new(TxId::from_bytes([1u8; 32]), 0x0102_0304);
        let bytes = id.to_bytes();
        assert_eq!(bytes.len(), 36);
        assert_eq!(&bytes[32..], &[1, 2, 3, 4]);
        assert_eq!(Utxoid::from_bytes(&bytes).unwrap(), id);
        assert_eq!(bytes.as_slice(), id.to_array().as_slice());
    }

    #[test]
    fn utxoid_human_readable() {
        let id = Utxoid::new(TxId::from_bytes([9u8; 32]), 3);
        let s = id.to_string();
        assert_eq!(Utxoid::from_str(&s).unwrap(), id);

        let json = id.to_json().unwrap();
        assert_eq!(json["outputIdx"], "3");
        assert_eq!(Utxoid::from_json(&json).unwrap(), id);
    }

    #[test]
    fn utxoid_bad_checksum_is_authorization_error() {
        let id = Utxoid::new(TxId::from_bytes([9u8; 32]), 3);
        let mut raw = bs58::decode(id.to_string()).into_vec().unwrap();
        let last = raw.len() - 1;
        raw[last] ^= 0xff;
        let tampered = bs58::encode(raw).into_string();
        let err = Utxoid::from_str(&tampered).unwrap_err();
        assert_eq!(err, AxvmError::Checksum);
        assert!(err.is_user_facing());
    }

    #[test]
    fn bech32_address_roundtrip() {
        let addr = Address::from_bytes([0x3c; 20]);
        let s = addr.to_bech32("X", "axc").unwrap();
        assert!(s.starts_with("X-axc1"));
        let parsed = Address::parse_bech32(&s).unwrap();
        assert_eq!(parsed.address, addr);
        assert_eq!(parsed.chain_alias, "X");
        assert_eq!(parsed.hrp, "axc");
    }

    #[test]
    fn bech32_rejects_missing_alias() {
        assert!(Address::parse_bech32("axc1qqqq").is_err());
    }

    #[test]
    fn sig_idx_wire_form_is_index_only() {
        let sig = SigIdx::new(7, Address::from_bytes([1u8; 20]));
        let bytes = sig.to_bytes();
        assert_eq!(bytes, vec![0, 0, 0, 7]);
        let back = SigIdx::from_bytes(&bytes).unwrap();
        assert_eq!(back, sig);
        assert_eq!(back.source, Address::default());
    }
}
