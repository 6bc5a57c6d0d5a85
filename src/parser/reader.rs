//! Bounds-checked big-endian field access over a byte buffer.
//!
//! Every read is positioned by an absolute offset into the wrapped slice and
//! fails with [`MobiError::OutOfBounds`] instead of panicking when the field
//! would run past the end. Text reads are lossy and never fail on content.

use byteorder::{BigEndian, ByteOrder};

use crate::error::{MobiError, Result};

/// A read-only view over a byte buffer.
#[derive(Debug, Clone, Copy)]
pub struct ByteView<'a> {
    data: &'a [u8],
}

impl<'a> ByteView<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    /// Whether `width` bytes starting at `offset` lie inside the buffer.
    pub fn contains(&self, offset: usize, width: usize) -> bool {
        offset
            .checked_add(width)
            .is_some_and(|end| end <= self.data.len())
    }

    /// Borrow `width` bytes at `offset`.
    pub fn bytes(&self, offset: usize, width: usize) -> Result<&'a [u8]> {
        if !self.contains(offset, width) {
            return Err(MobiError::OutOfBounds {
                offset,
                width,
                len: self.data.len(),
            });
        }
        Ok(&self.data[offset..offset + width])
    }

    /// Everything from `offset` to the end of the buffer.
    ///
    /// An offset at or past the end yields an empty slice.
    pub fn tail(&self, offset: usize) -> &'a [u8] {
        self.data.get(offset..).unwrap_or(&[])
    }

    pub fn u8_at(&self, offset: usize) -> Result<u8> {
        Ok(self.bytes(offset, 1)?[0])
    }

    pub fn u16_at(&self, offset: usize) -> Result<u16> {
        Ok(BigEndian::read_u16(self.bytes(offset, 2)?))
    }

    /// A 3-byte big-endian integer, widened with a zero high byte.
    pub fn u24_at(&self, offset: usize) -> Result<u32> {
        Ok(BigEndian::read_u24(self.bytes(offset, 3)?))
    }

    pub fn u32_at(&self, offset: usize) -> Result<u32> {
        Ok(BigEndian::read_u32(self.bytes(offset, 4)?))
    }

    /// Fixed-length text with trailing NUL padding stripped.
    ///
    /// Invalid UTF-8 sequences are replaced, not rejected.
    pub fn padded_str_at(&self, offset: usize, len: usize) -> Result<String> {
        let raw = self.bytes(offset, len)?;
        let end = raw.iter().rposition(|&b| b != 0).map_or(0, |p| p + 1);
        Ok(String::from_utf8_lossy(&raw[..end]).into_owned())
    }

    /// A 4-byte ASCII tag such as `BOOK`, `MOBI` or `EXTH`.
    ///
    /// Non-ASCII bytes are dropped.
    pub fn tag_at(&self, offset: usize) -> Result<String> {
        let raw = self.bytes(offset, 4)?;
        Ok(raw
            .iter()
            .filter(|b| b.is_ascii())
            .map(|&b| b as char)
            .collect())
    }

    /// Whether the 4 bytes at `offset` equal `tag`. Out-of-range reads are simply `false`.
    pub fn has_tag(&self, offset: usize, tag: &[u8; 4]) -> bool {
        matches!(self.bytes(offset, 4), Ok(raw) if raw == tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_width_reads() {
        let data = [0x12, 0x34, 0x56, 0x78, 0x9A];
        let view = ByteView::new(&data);
        assert_eq!(view.u8_at(4).unwrap(), 0x9A);
        assert_eq!(view.u16_at(0).unwrap(), 0x1234);
        assert_eq!(view.u24_at(1).unwrap(), 0x0034_5678);
        assert_eq!(view.u32_at(1).unwrap(), 0x3456_789A);
    }

    #[test]
    fn test_read_past_end_is_out_of_bounds() {
        let data = [0u8; 4];
        let view = ByteView::new(&data);
        assert!(view.u32_at(0).is_ok());
        match view.u32_at(1) {
            Err(MobiError::OutOfBounds { offset, width, len }) => {
                assert_eq!((offset, width, len), (1, 4, 4));
            }
            other => panic!("expected OutOfBounds, got {other:?}"),
        }
        assert!(view.u8_at(4).is_err());
        assert!(view.bytes(usize::MAX, 2).is_err());
    }

    #[test]
    fn test_padded_str_strips_trailing_nuls_only() {
        let mut data = [0u8; 8];
        data[..5].copy_from_slice(b"a\0b c");
        let view = ByteView::new(&data);
        assert_eq!(view.padded_str_at(0, 8).unwrap(), "a\0b c");
        assert_eq!(view.padded_str_at(5, 3).unwrap(), "");
    }

    #[test]
    fn test_padded_str_is_lossy() {
        let data = [b'O', 0xFF, b'K', 0];
        let view = ByteView::new(&data);
        assert_eq!(view.padded_str_at(0, 4).unwrap(), "O\u{FFFD}K");
    }

    #[test]
    fn test_tags() {
        let data = *b"BOOKMOBI";
        let view = ByteView::new(&data);
        assert_eq!(view.tag_at(0).unwrap(), "BOOK");
        assert!(view.has_tag(4, b"MOBI"));
        assert!(!view.has_tag(0, b"MOBI"));
        assert!(!view.has_tag(6, b"MOBI"));
    }

    #[test]
    fn test_tail_clamps() {
        let data = [1u8, 2, 3];
        let view = ByteView::new(&data);
        assert_eq!(view.tail(1), &[2, 3]);
        assert!(view.tail(3).is_empty());
        assert!(view.tail(99).is_empty());
    }
}
