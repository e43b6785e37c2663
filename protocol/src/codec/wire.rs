//! Fixed-order binary encoding.
//!
//! All integers are big-endian. Variable-length fields carry a `u16` or
//! `u32` length prefix followed by raw bytes. Writers append to a
//! [`BytesMut`]; readers walk a borrowed slice with a [`Reader`] that
//! remembers its offset, so every decoder can report where it stopped.

use bytes::{BufMut, BytesMut};
use tracing::error;

use crate::error::{AxvmError, Result};

// ---------------------------------------------------------------------------
// Reader
// ---------------------------------------------------------------------------

/// Bounds-checked big-endian cursor over a byte slice.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    buf: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, offset: 0 }
    }

    /// Starts reading at `offset` instead of the beginning of `buf`.
    pub fn at(buf: &'a [u8], offset: usize) -> Self {
        Self { buf, offset }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.offset)
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Borrows the next `len` bytes and advances past them.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        if self.remaining() < len {
            return Err(AxvmError::UnexpectedEof {
                offset: self.offset,
                needed: len,
                available: self.remaining(),
            });
        }
        let start = self.offset;
        self.offset += len;
        Ok(&self.buf[start..self.offset])
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(u16::from_be_bytes(self.read_array()?))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(u32::from_be_bytes(self.read_array()?))
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        Ok(u64::from_be_bytes(self.read_array()?))
    }

    /// `u16` length followed by that many bytes.
    pub fn read_u16_prefixed(&mut self) -> Result<Vec<u8>> {
        let len = self.read_u16()? as usize;
        Ok(self.read_bytes(len)?.to_vec())
    }

    /// `u32` length followed by that many bytes.
    pub fn read_u32_prefixed(&mut self) -> Result<Vec<u8>> {
        let len = self.read_u32()? as usize;
        Ok(self.read_bytes(len)?.to_vec())
    }

    /// `u16`-prefixed UTF-8 string.
    pub fn read_string(&mut self, field: &'static str) -> Result<String> {
        let raw = self.read_u16_prefixed()?;
        String::from_utf8(raw).map_err(|_| AxvmError::InvalidUtf8 { field })
    }

    /// Reads a `u32` element count followed by that many elements.
    ///
    /// The count is not trusted for pre-allocation: a corrupted length
    /// fails on the first missing element instead of allocating gigabytes.
    pub fn read_vec<T>(&mut self, mut read: impl FnMut(&mut Self) -> Result<T>) -> Result<Vec<T>> {
        let count = self.read_u32()? as usize;
        let mut items = Vec::with_capacity(count.min(self.remaining()));
        for _ in 0..count {
            items.push(read(self)?);
        }
        Ok(items)
    }

    /// Errors unless every byte has been consumed.
    pub fn finish(&self) -> Result<()> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(AxvmError::TrailingBytes(n)),
        }
    }
}

// ---------------------------------------------------------------------------
// Writer helpers
// ---------------------------------------------------------------------------

// Lengths are bounded when values are constructed, so these prefixes always
// fit. If one ever does not, the data is cut to what the prefix describes
// and an error is logged: the encoding stays parseable.

pub(crate) fn put_u16_prefixed(buf: &mut BytesMut, bytes: &[u8]) {
    let len = u16::try_from(bytes.len()).unwrap_or_else(|_| {
        error!(len = bytes.len(), max = u16::MAX, "u16 length prefix overflow, truncating");
        u16::MAX
    });
    buf.put_u16(len);
    buf.put_slice(&bytes[..usize::from(len)]);
}

pub(crate) fn put_u32_prefixed(buf: &mut BytesMut, bytes: &[u8]) {
    let len = put_count(buf, bytes.len());
    buf.put_slice(&bytes[..len]);
}

/// Writes a `u32` element count and returns how many elements it covers.
pub(crate) fn put_count(buf: &mut BytesMut, len: usize) -> usize {
    let count = u32::try_from(len).unwrap_or_else(|_| {
        error!(len, max = u32::MAX, "u32 length prefix overflow, truncating");
        u32::MAX
    });
    buf.put_u32(count);
    len.min(count as usize)
}

pub(crate) fn put_vec<T: Packable>(buf: &mut BytesMut, items: &[T]) {
    let count = put_count(buf, items.len());
    for item in &items[..count] {
        item.pack(buf);
    }
}

/// Errors with [`AxvmError::NotCanonical`] unless `items` ascend under
/// `key`. With `strict`, equal neighbours are rejected too.
pub(crate) fn ensure_sorted<T, K: Ord>(
    what: &'static str,
    items: &[T],
    strict: bool,
    key: impl FnMut(&T) -> K,
) -> Result<()> {
    let keys: Vec<K> = items.iter().map(key).collect();
    let ordered = keys
        .windows(2)
        .all(|pair| if strict { pair[0] < pair[1] } else { pair[0] <= pair[1] });
    if ordered {
        Ok(())
    } else {
        Err(AxvmError::NotCanonical(what))
    }
}

// ---------------------------------------------------------------------------
// Packable
// ---------------------------------------------------------------------------

/// A value with a byte-exact wire representation.
pub trait Packable: Sized {
    /// Appends the wire form of `self` to `buf`.
    fn pack(&self, buf: &mut BytesMut);

    /// Parses one value, advancing the reader past it.
    fn unpack(reader: &mut Reader<'_>) -> Result<Self>;

    fn to_bytes(&self) -> Vec<u8> {
        let mut buf = BytesMut::new();
        self.pack(&mut buf);
        buf.to_vec()
    }

    /// Parses a value that must span the whole of `bytes`.
    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut reader = Reader::new(bytes);
        let value = Self::unpack(&mut reader)?;
        reader.finish()?;
        Ok(value)
    }

    /// Parses a value starting at `offset`; returns it with the offset just
    /// past its last byte.
    fn from_bytes_at(bytes: &[u8], offset: usize) -> Result<(Self, usize)> {
        let mut reader = Reader::at(bytes, offset);
        let value = Self::unpack(&mut reader)?;
        Ok((value, reader.offset()))
    }
}

/// Checks a length against a protocol limit.
pub(crate) fn check_len(field: &'static str, len: usize, max: usize) -> Result<()> {
    if len > max {
        return Err(AxvmError::FieldTooLong { field, len, max });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_big_endian_integers() {
        let bytes = [0x00, 0x01, 0x00, 0x00, 0x00, 0x02, 0xff];
        let mut r = Reader::new(&bytes);
        assert_eq!(r.read_u16().unwrap(), 1);
        assert_eq!(r.read_u32().unwrap(), 2);
        assert_eq!(r.read_u8().unwrap(), 0xff);
        assert!(r.is_empty());
        r.finish().unwrap();
    }

    #[test]
    fn short_buffer_reports_offset() {
        let bytes = [0u8; 3];
        let mut r = Reader::at(&bytes, 1);
        let err = r.read_u32().unwrap_err();
        assert_eq!(
            err,
            AxvmError::UnexpectedEof {
                offset: 1,
                needed: 4,
                available: 2
            }
        );
    }

    #[test]
    fn prefixed_fields() {
        let mut buf = BytesMut::new();
        put_u16_prefixed(&mut buf, b"AXC");
        put_u32_prefixed(&mut buf, &[]);
        let bytes = buf.to_vec();
        assert_eq!(bytes, vec![0, 3, b'A', b'X', b'C', 0, 0, 0, 0]);

        let mut r = Reader::new(&bytes);
        assert_eq!(r.read_string("name").unwrap(), "AXC");
        assert!(r.read_u32_prefixed().unwrap().is_empty());
    }

    #[test]
    fn oversized_prefix_is_cut_to_fit() {
        let mut buf = BytesMut::new();
        put_u16_prefixed(&mut buf, &vec![b'a'; 70_000]);
        assert_eq!(&buf[..2], &[0xff, 0xff]);
        assert_eq!(buf.len(), 2 + u16::MAX as usize);

        let bytes = buf.to_vec();
        let mut r = Reader::new(&bytes);
        assert_eq!(r.read_u16_prefixed().unwrap().len(), u16::MAX as usize);
        r.finish().unwrap();
    }

    #[test]
    fn sorted_checks() {
        assert!(ensure_sorted("ids", &[1, 2, 2, 3], false, |v| *v).is_ok());
        assert_eq!(
            ensure_sorted("ids", &[1, 2, 2, 3], true, |v| *v).unwrap_err(),
            AxvmError::NotCanonical("ids")
        );
        assert!(ensure_sorted("ids", &[3, 1], false, |v| *v).is_err());
        let empty: [u8; 0] = [];
        assert!(ensure_sorted("ids", &empty, true, |v| *v).is_ok());
    }

    #[test]
    fn invalid_utf8_is_rejected() {
        let bytes = [0, 2, 0xc3, 0x28];
        let err = Reader::new(&bytes).read_string("symbol").unwrap_err();
        assert_eq!(err, AxvmError::InvalidUtf8 { field: "symbol" });
    }

    #[test]
    fn huge_count_fails_without_allocating() {
        let bytes = [0xff, 0xff, 0xff, 0xff];
        let err = Reader::new(&bytes).read_vec(|r| r.read_u32()).unwrap_err();
        assert!(matches!(err, AxvmError::UnexpectedEof { .. }));
    }

    #[test]
    fn trailing_bytes_are_reported() {
        let r = Reader::new(&[1, 2]);
        assert_eq!(r.finish().unwrap_err(), AxvmError::TrailingBytes(2));
    }

    #[test]
    fn check_len_limits() {
        assert!(check_len("memo", 256, 256).is_ok());
        assert_eq!(
            check_len("memo", 257, 256).unwrap_err(),
            AxvmError::FieldTooLong {
                field: "memo",
                len: 257,
                max: 256
            }
        );
    }
}
