//! Mobipocket header following the PalmDOC header in record 0.
//!
//! Field offsets are relative to the start of record 0:
//!
//! ```text
//!  16 "MOBI"              20 header_length       24 mobi_type
//!  28 text_encoding       32 unique_id           36 format_version
//!  40 orthographic_index  44 inflection_index    80 first_non_book_index
//!  84 full_name_offset    88 full_name_length    92 locale
//!  96 input_language     100 output_language    104 min_version
//! 108 first_image_index  112 huffman_rec_offset 116 huffman_rec_count
//! 128 exth_flags         168 drm_offset         172 drm_count
//! 176 drm_size           180 drm_flags          192 first_content (u16)
//! 194 last_content (u16)
//! ```

use tracing::debug;

use crate::error::{MobiError, Result};
use crate::model::record0::{MobiHeader, TextEncoding};
use crate::parser::palmdoc::PALMDOC_HEADER_SIZE;
use crate::parser::reader::ByteView;

/// Offset of the `MOBI` marker inside record 0.
pub const MOBI_MARKER_OFFSET: usize = PALMDOC_HEADER_SIZE;

/// Full-name offset value meaning "no name stored".
const NO_FULL_NAME: u32 = u32::MAX;

/// Reads optional fields that must fit inside both the buffer and the
/// declared header extent.
struct BoundedFields<'a> {
    view: ByteView<'a>,
    extent: usize,
}

impl BoundedFields<'_> {
    fn fits(&self, offset: usize, width: usize) -> bool {
        offset + width <= self.extent && self.view.contains(offset, width)
    }

    fn u32(&self, offset: usize) -> Option<u32> {
        if self.fits(offset, 4) {
            self.view.u32_at(offset).ok()
        } else {
            None
        }
    }

    fn u16(&self, offset: usize) -> Option<u16> {
        if self.fits(offset, 2) {
            self.view.u16_at(offset).ok()
        } else {
            None
        }
    }
}

/// Decode the MOBI header from `record0`, which starts at record 0's offset
/// and runs to the end of the file.
///
/// Returns `Ok(None)` when bytes 16..20 are not `MOBI`: plain PalmDOC files
/// are valid and simply lack this extension. A marker followed by an
/// unreadable header length fails with [`MobiError::OutOfBounds`].
pub fn parse_mobi_header(record0: &[u8]) -> Result<Option<MobiHeader>> {
    let view = ByteView::new(record0);
    if !view.has_tag(MOBI_MARKER_OFFSET, b"MOBI") {
        debug!("No MOBI marker in record 0");
        return Ok(None);
    }

    let header_length = view.u32_at(MOBI_MARKER_OFFSET + 4)?;
    let fields = BoundedFields {
        view,
        extent: MOBI_MARKER_OFFSET.saturating_add(header_length as usize),
    };

    let header = MobiHeader {
        mobi_marker: "MOBI".to_string(),
        header_length,
        mobi_type: fields.u32(24),
        text_encoding: fields.u32(28),
        unique_id: fields.u32(32),
        format_version: fields.u32(36),
        orthographic_index: fields.u32(40),
        inflection_index: fields.u32(44),
        first_non_book_index: fields.u32(80),
        full_name_offset: fields.u32(84),
        full_name_length: fields.u32(88),
        locale: fields.u32(92),
        input_language: fields.u32(96),
        output_language: fields.u32(100),
        min_version: fields.u32(104),
        first_image_index: fields.u32(108),
        huffman_record_offset: fields.u32(112),
        huffman_record_count: fields.u32(116),
        exth_flags: fields.u32(128),
        drm_offset: fields.u32(168),
        drm_count: fields.u32(172),
        drm_size: fields.u32(176),
        drm_flags: fields.u32(180),
        first_content_rec: fields.u16(192),
        last_content_rec: fields.u16(194),
        full_name: None,
    };

    debug!(
        header_length,
        format_version = ?header.format_version,
        exth_flags = ?header.exth_flags,
        "Parsed MOBI header"
    );
    Ok(Some(header))
}

/// Decode the book's full name from record 0's own bytes.
///
/// Returns `Ok(None)` when the header stores no name. A name span that runs
/// past the end of `record0` fails with [`MobiError::OutOfBounds`].
pub fn resolve_full_name(record0: &[u8], header: &MobiHeader) -> Result<Option<String>> {
    let (Some(offset), Some(length)) = (header.full_name_offset, header.full_name_length) else {
        return Ok(None);
    };
    if offset == NO_FULL_NAME || length == 0 {
        return Ok(None);
    }

    let raw = ByteView::new(record0).bytes(offset as usize, length as usize)?;
    let encoding = header.encoding().unwrap_or(TextEncoding::Utf8);
    Ok(Some(encoding.decode_lossy(raw)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn put_u32(buf: &mut [u8], offset: usize, value: u32) {
        buf[offset..offset + 4].copy_from_slice(&value.to_be_bytes());
    }

    /// A record 0 with a full 232-byte MOBI header.
    fn full_record0() -> Vec<u8> {
        let mut buf = vec![0u8; 16 + 232 + 32];
        buf[16..20].copy_from_slice(b"MOBI");
        put_u32(&mut buf, 20, 232);
        put_u32(&mut buf, 24, 2);
        put_u32(&mut buf, 28, 65001);
        put_u32(&mut buf, 32, 0xDEAD_BEEF);
        put_u32(&mut buf, 36, 6);
        put_u32(&mut buf, 40, 0x0000_0401);
        put_u32(&mut buf, 44, 0x0000_0402);
        put_u32(&mut buf, 80, 12);
        put_u32(&mut buf, 84, 248);
        put_u32(&mut buf, 88, 9);
        put_u32(&mut buf, 92, 0x0409);
        put_u32(&mut buf, 96, 0x07);
        put_u32(&mut buf, 100, 0x0C);
        put_u32(&mut buf, 104, 6);
        put_u32(&mut buf, 108, 10);
        put_u32(&mut buf, 112, 0x0000_0500);
        put_u32(&mut buf, 116, 0x0000_0003);
        put_u32(&mut buf, 128, 0x50);
        put_u32(&mut buf, 168, u32::MAX);
        put_u32(&mut buf, 172, 0x0000_0011);
        put_u32(&mut buf, 176, 0x0000_0022);
        put_u32(&mut buf, 180, 0);
        buf[192..194].copy_from_slice(&1u16.to_be_bytes());
        buf[194..196].copy_from_slice(&9u16.to_be_bytes());
        buf[248..257].copy_from_slice(b"Test Book");
        buf
    }

    #[test]
    fn test_full_header_fields() {
        let header = parse_mobi_header(&full_record0()).unwrap().unwrap();
        assert_eq!(header.mobi_marker, "MOBI");
        assert_eq!(header.header_length, 232);
        assert_eq!(header.mobi_type, Some(2));
        assert_eq!(header.text_encoding, Some(65001));
        assert_eq!(header.unique_id, Some(0xDEAD_BEEF));
        assert_eq!(header.format_version, Some(6));
        assert_eq!(header.orthographic_index, Some(0x401));
        assert_eq!(header.inflection_index, Some(0x402));
        assert_eq!(header.first_non_book_index, Some(12));
        assert_eq!(header.full_name_offset, Some(248));
        assert_eq!(header.full_name_length, Some(9));
        assert_eq!(header.locale, Some(0x0409));
        assert_eq!(header.language_code(), Some(0x09));
        assert_eq!(header.dialect_code(), Some(1));
        assert_eq!(header.input_language, Some(0x07));
        assert_eq!(header.output_language, Some(0x0C));
        assert_eq!(header.min_version, Some(6));
        assert_eq!(header.first_image_index, Some(10));
        assert_eq!(header.huffman_record_offset, Some(0x500));
        assert_eq!(header.huffman_record_count, Some(3));
        assert_eq!(header.exth_flags, Some(0x50));
        assert!(header.has_exth_flag());
        assert_eq!(header.drm_offset, Some(u32::MAX));
        assert_eq!(header.drm_count, Some(0x11));
        assert_eq!(header.drm_size, Some(0x22));
        assert_eq!(header.drm_flags, Some(0));
        assert!(!header.has_drm());
        assert_eq!(header.first_content_rec, Some(1));
        assert_eq!(header.last_content_rec, Some(9));
    }

    #[test]
    fn test_no_marker_is_absent() {
        let mut buf = full_record0();
        buf[16..20].copy_from_slice(b"TEXT");
        assert!(parse_mobi_header(&buf).unwrap().is_none());

        // Too short to even hold a marker
        assert!(parse_mobi_header(&[0u8; 18]).unwrap().is_none());
    }

    #[test]
    fn test_marker_without_length_is_out_of_bounds() {
        let mut buf = vec![0u8; 22];
        buf[16..20].copy_from_slice(b"MOBI");
        assert!(matches!(
            parse_mobi_header(&buf),
            Err(MobiError::OutOfBounds { offset: 20, .. })
        ));
    }

    #[test]
    fn test_short_header_variant_leaves_trailing_fields_absent() {
        let mut buf = full_record0();
        // Declared length covers bytes 16..132: through exth_flags
        put_u32(&mut buf, 20, 116);
        let header = parse_mobi_header(&buf).unwrap().unwrap();
        assert_eq!(header.exth_flags, Some(0x50));
        assert_eq!(header.drm_offset, None);
        assert_eq!(header.drm_flags, None);
        assert_eq!(header.first_content_rec, None);
        assert_eq!(header.last_content_rec, None);
    }

    #[test]
    fn test_buffer_end_truncates_fields() {
        let buf = &full_record0()[..150];
        let header = parse_mobi_header(buf).unwrap().unwrap();
        assert_eq!(header.header_length, 232);
        assert_eq!(header.exth_flags, Some(0x50));
        assert_eq!(header.drm_offset, None);
        assert_eq!(header.last_content_rec, None);
    }

    #[test]
    fn test_full_name_resolution() {
        let buf = full_record0();
        let header = parse_mobi_header(&buf).unwrap().unwrap();
        assert_eq!(
            resolve_full_name(&buf, &header).unwrap().as_deref(),
            Some("Test Book")
        );
        assert!(resolve_full_name(&buf[..250], &header).is_err());
    }

    #[test]
    fn test_dialect_from_locale_bits() {
        let mut buf = full_record0();
        // English (0x09) with sub-language 0x08 in bits 10..17
        put_u32(&mut buf, 92, (0x08 << 10) | 0x09);
        let header = parse_mobi_header(&buf).unwrap().unwrap();
        assert_eq!(header.language_code(), Some(0x09));
        assert_eq!(header.dialect_code(), Some(0x08));

        put_u32(&mut buf, 92, 0x3FC00 | 0x0C);
        let header = parse_mobi_header(&buf).unwrap().unwrap();
        assert_eq!(header.dialect_code(), Some(0xFF));
    }

    #[test]
    fn test_full_name_without_encoding_decodes_as_utf8() {
        let mut buf = full_record0();
        buf[248..257].copy_from_slice("Café Bk!".as_bytes());
        let mut header = parse_mobi_header(&buf).unwrap().unwrap();
        header.text_encoding = None;
        assert_eq!(
            resolve_full_name(&buf, &header).unwrap().as_deref(),
            Some("Café Bk!")
        );

        header.text_encoding = Some(1252);
        assert_eq!(
            resolve_full_name(&buf, &header).unwrap().as_deref(),
            Some("CafÃ© Bk!")
        );
    }

    #[test]
    fn test_no_full_name_stored() {
        let mut buf = full_record0();
        put_u32(&mut buf, 84, u32::MAX);
        let header = parse_mobi_header(&buf).unwrap().unwrap();
        assert_eq!(resolve_full_name(&buf, &header).unwrap(), None);
    }
}
