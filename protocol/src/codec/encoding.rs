//! Human-readable (JSON) forms of wire structures.
//!
//! Every field of a human-readable structure declares one [`Encoding`] in a
//! static schema. [`Fields`] applies that schema when values are put in or
//! taken out, so individual types never format strings themselves.
//!
//! cb58 is base58 over the payload followed by the last four bytes of its
//! SHA-256 digest; decoding verifies those four bytes.

use serde_json::{Map, Value};

use crate::config::CB58_CHECKSUM_LENGTH;
use crate::crypto::hash::sha256_array;
use crate::error::{AxvmError, Result};

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// String form of a single field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
    /// Lowercase hex, `0x` accepted on input.
    Hex,
    /// Checksummed base58.
    Cb58,
    /// Raw UTF-8 text.
    Utf8,
    /// Unsigned big-endian integer written in base 10.
    Decimal,
}

impl Encoding {
    pub fn name(self) -> &'static str {
        match self {
            Self::Hex => "hex",
            Self::Cb58 => "cb58",
            Self::Utf8 => "utf8",
            Self::Decimal => "decimal",
        }
    }
}

/// `(field name, encoding)`.
pub type FieldSpec = (&'static str, Encoding);

pub fn cb58_encode(bytes: &[u8]) -> String {
    let checksum = sha256_array(bytes);
    let mut payload = Vec::with_capacity(bytes.len() + CB58_CHECKSUM_LENGTH);
    payload.extend_from_slice(bytes);
    payload.extend_from_slice(&checksum[checksum.len() - CB58_CHECKSUM_LENGTH..]);
    bs58::encode(payload).into_string()
}

pub fn cb58_decode(s: &str) -> Result<Vec<u8>> {
    let raw = bs58::decode(s)
        .into_vec()
        .map_err(|e| AxvmError::Encoding {
            encoding: "cb58",
            reason: e.to_string(),
        })?;
    if raw.len() < CB58_CHECKSUM_LENGTH {
        return Err(AxvmError::Encoding {
            encoding: "cb58",
            reason: format!("{} bytes is shorter than the checksum", raw.len()),
        });
    }
    let (payload, checksum) = raw.split_at(raw.len() - CB58_CHECKSUM_LENGTH);
    let expected = sha256_array(payload);
    if checksum != &expected[expected.len() - CB58_CHECKSUM_LENGTH..] {
        return Err(AxvmError::Checksum);
    }
    Ok(payload.to_vec())
}

/// Renders `bytes` in the given encoding.
pub fn encode_bytes(bytes: &[u8], encoding: Encoding) -> Result<String> {
    match encoding {
        Encoding::Hex => Ok(hex::encode(bytes)),
        Encoding::Cb58 => Ok(cb58_encode(bytes)),
        Encoding::Utf8 => String::from_utf8(bytes.to_vec()).map_err(|_| AxvmError::Encoding {
            encoding: "utf8",
            reason: "bytes are not valid utf-8".to_string(),
        }),
        Encoding::Decimal => {
            if bytes.len() > 8 {
                return Err(AxvmError::Encoding {
                    encoding: "decimal",
                    reason: format!("{} bytes do not fit in a u64", bytes.len()),
                });
            }
            let value = bytes.iter().fold(0u64, |acc, b| (acc << 8) | *b as u64);
            Ok(value.to_string())
        }
    }
}

/// Parses a string produced by [`encode_bytes`]. Decimal values come back
/// as eight big-endian bytes.
pub fn decode_bytes(s: &str, encoding: Encoding) -> Result<Vec<u8>> {
    match encoding {
        Encoding::Hex => {
            let trimmed = s.strip_prefix("0x").unwrap_or(s);
            hex::decode(trimmed).map_err(|e| AxvmError::Encoding {
                encoding: "hex",
                reason: e.to_string(),
            })
        }
        Encoding::Cb58 => cb58_decode(s),
        Encoding::Utf8 => Ok(s.as_bytes().to_vec()),
        Encoding::Decimal => s
            .parse::<u64>()
            .map(|v| v.to_be_bytes().to_vec())
            .map_err(|e| AxvmError::Encoding {
                encoding: "decimal",
                reason: e.to_string(),
            }),
    }
}

// ---------------------------------------------------------------------------
// Fields
// ---------------------------------------------------------------------------

/// A JSON object whose leaf fields are encoded according to a schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Fields {
    schema: &'static [FieldSpec],
    map: Map<String, Value>,
}

impl Fields {
    pub fn new(schema: &'static [FieldSpec]) -> Self {
        Self {
            schema,
            map: Map::new(),
        }
    }

    /// Wraps a parsed JSON object; fails if `value` is not an object.
    pub fn from_value(schema: &'static [FieldSpec], value: &Value) -> Result<Self> {
        let map = value
            .as_object()
            .cloned()
            .ok_or_else(|| AxvmError::Encoding {
                encoding: "json",
                reason: "expected an object".to_string(),
            })?;
        Ok(Self { schema, map })
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.map)
    }

    fn encoding_of(&self, name: &'static str) -> Result<Encoding> {
        self.schema
            .iter()
            .find(|(field, _)| *field == name)
            .map(|(_, encoding)| *encoding)
            .ok_or(AxvmError::MissingField(name))
    }

    fn raw(&self, name: &'static str) -> Result<&Value> {
        self.map.get(name).ok_or(AxvmError::MissingField(name))
    }

    fn raw_str(&self, name: &'static str) -> Result<&str> {
        self.raw(name)?.as_str().ok_or_else(|| AxvmError::Encoding {
            encoding: "json",
            reason: format!("field {name} is not a string"),
        })
    }

    pub fn put_bytes(&mut self, name: &'static str, bytes: &[u8]) -> Result<()> {
        let encoded = encode_bytes(bytes, self.encoding_of(name)?)?;
        self.map.insert(name.to_string(), Value::String(encoded));
        Ok(())
    }

    pub fn put_u64(&mut self, name: &'static str, value: u64) -> Result<()> {
        self.put_bytes(name, &value.to_be_bytes())
    }

    pub fn put_value(&mut self, name: &'static str, value: Value) {
        self.map.insert(name.to_string(), value);
    }

    pub fn put_object<T: HumanReadable>(&mut self, name: &'static str, item: &T) -> Result<()> {
        self.put_value(name, item.to_json()?);
        Ok(())
    }

    pub fn put_list<T: HumanReadable>(&mut self, name: &'static str, items: &[T]) -> Result<()> {
        let values = items
            .iter()
            .map(HumanReadable::to_json)
            .collect::<Result<Vec<_>>>()?;
        self.put_value(name, Value::Array(values));
        Ok(())
    }

    /// Stores a list of byte strings, each in the field's encoding.
    pub fn put_bytes_list<'b>(
        &mut self,
        name: &'static str,
        items: impl IntoIterator<Item = &'b [u8]>,
    ) -> Result<()> {
        let encoding = self.encoding_of(name)?;
        let values = items
            .into_iter()
            .map(|item| encode_bytes(item, encoding).map(Value::String))
            .collect::<Result<Vec<_>>>()?;
        self.put_value(name, Value::Array(values));
        Ok(())
    }

    pub fn bytes_list(&self, name: &'static str) -> Result<Vec<Vec<u8>>> {
        let encoding = self.encoding_of(name)?;
        let values = self.raw(name)?.as_array().ok_or_else(|| AxvmError::Encoding {
            encoding: "json",
            reason: format!("field {name} is not an array"),
        })?;
        values
            .iter()
            .map(|v| {
                let s = v.as_str().ok_or_else(|| AxvmError::Encoding {
                    encoding: "json",
                    reason: format!("field {name} holds a non-string element"),
                })?;
                decode_bytes(s, encoding)
            })
            .collect()
    }

    pub fn has(&self, name: &str) -> bool {
        self.map.contains_key(name)
    }

    pub fn bytes(&self, name: &'static str) -> Result<Vec<u8>> {
        decode_bytes(self.raw_str(name)?, self.encoding_of(name)?)
    }

    pub fn array<const N: usize>(&self, name: &'static str) -> Result<[u8; N]> {
        let bytes = self.bytes(name)?;
        bytes.as_slice().try_into().map_err(|_| AxvmError::InvalidLength {
            what: name,
            expected: N,
            got: bytes.len(),
        })
    }

    pub fn u64(&self, name: &'static str) -> Result<u64> {
        Ok(u64::from_be_bytes(self.array::<8>(name)?))
    }

    pub fn u32(&self, name: &'static str) -> Result<u32> {
        u32::try_from(self.u64(name)?).map_err(|_| AxvmError::Overflow)
    }

    pub fn text(&self, name: &'static str) -> Result<String> {
        String::from_utf8(self.bytes(name)?).map_err(|_| AxvmError::InvalidUtf8 { field: name })
    }

    pub fn object<T: HumanReadable>(&self, name: &'static str) -> Result<T> {
        T::from_json(self.raw(name)?)
    }

    pub fn list<T: HumanReadable>(&self, name: &'static str) -> Result<Vec<T>> {
        let values = self.raw(name)?.as_array().ok_or_else(|| AxvmError::Encoding {
            encoding: "json",
            reason: format!("field {name} is not an array"),
        })?;
        values.iter().map(T::from_json).collect()
    }
}

// ---------------------------------------------------------------------------
// HumanReadable
// ---------------------------------------------------------------------------

/// Structures with a JSON form driven by a static field schema.
pub trait HumanReadable: Sized {
    /// Encodings of this type's leaf fields.
    const SCHEMA: &'static [FieldSpec];

    fn to_fields(&self) -> Result<Fields>;

    fn from_fields(fields: &Fields) -> Result<Self>;

    fn to_json(&self) -> Result<Value> {
        Ok(self.to_fields()?.into_value())
    }

    fn from_json(value: &Value) -> Result<Self> {
        Self::from_fields(&Fields::from_value(Self::SCHEMA, value)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cb58_roundtrip_and_checksum() {
        let data = b"axvm utxo id bytes";
        let encoded = cb58_encode(data);
        assert_eq!(cb58_decode(&encoded).unwrap(), data.to_vec());

        // Flip one payload byte: the checksum must catch it.
        let mut raw = bs58::decode(&encoded).into_vec().unwrap();
        raw[0] ^= 0x01;
        let tampered = bs58::encode(raw).into_string();
        assert_eq!(cb58_decode(&tampered).unwrap_err(), AxvmError::Checksum);
    }

    #[test]
    fn cb58_rejects_garbage() {
        assert!(matches!(
            cb58_decode("0OIl").unwrap_err(),
            AxvmError::Encoding { encoding: "cb58", .. }
        ));
        assert!(matches!(
            cb58_decode("1").unwrap_err(),
            AxvmError::Encoding { .. }
        ));
    }

    #[test]
    fn decimal_is_fixed_width() {
        let s = encode_bytes(&1234u64.to_be_bytes(), Encoding::Decimal).unwrap();
        assert_eq!(s, "1234");
        assert_eq!(
            decode_bytes(&s, Encoding::Decimal).unwrap(),
            1234u64.to_be_bytes().to_vec()
        );
        assert!(encode_bytes(&[0u8; 9], Encoding::Decimal).is_err());
    }

    #[test]
    fn hex_accepts_prefix() {
        assert_eq!(decode_bytes("0xdead", Encoding::Hex).unwrap(), vec![0xde, 0xad]);
        assert_eq!(encode_bytes(&[0xbe, 0xef], Encoding::Hex).unwrap(), "beef");
    }

    #[test]
    fn fields_follow_schema() {
        static SCHEMA: &[FieldSpec] = &[("name", Encoding::Utf8), ("amount", Encoding::Decimal)];
        let mut fields = Fields::new(SCHEMA);
        fields.put_bytes("name", b"AXC").unwrap();
        fields.put_u64("amount", 42).unwrap();

        let value = fields.clone().into_value();
        assert_eq!(value["name"], "AXC");
        assert_eq!(value["amount"], "42");

        let back = Fields::from_value(SCHEMA, &value).unwrap();
        assert_eq!(back.text("name").unwrap(), "AXC");
        assert_eq!(back.u64("amount").unwrap(), 42);
        assert_eq!(
            back.u64("missing").unwrap_err(),
            AxvmError::MissingField("missing")
        );
    }
}
