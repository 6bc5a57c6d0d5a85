//! Headers stored inside record 0: PalmDOC, MOBI and EXTH.

use std::fmt;

/// EXTH flag bit signalling that an EXTH block follows the MOBI header.
pub const EXTH_FLAG: u32 = 0x40;

/// Text compression scheme declared by the PalmDOC header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    PalmDoc,
    HuffCdic,
    Unknown(u16),
}

impl From<u16> for Compression {
    fn from(raw: u16) -> Self {
        match raw {
            1 => Self::None,
            2 => Self::PalmDoc,
            17480 => Self::HuffCdic,
            n => Self::Unknown(n),
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("none"),
            Self::PalmDoc => f.write_str("PalmDOC LZ77"),
            Self::HuffCdic => f.write_str("HUFF/CDIC"),
            Self::Unknown(n) => write!(f, "unknown ({n})"),
        }
    }
}

/// Encryption scheme declared by the PalmDOC header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encryption {
    None,
    OldMobipocket,
    Mobipocket,
    Unknown(u16),
}

impl From<u16> for Encryption {
    fn from(raw: u16) -> Self {
        match raw {
            0 => Self::None,
            1 => Self::OldMobipocket,
            2 => Self::Mobipocket,
            n => Self::Unknown(n),
        }
    }
}

impl fmt::Display for Encryption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("none"),
            Self::OldMobipocket => f.write_str("old Mobipocket"),
            Self::Mobipocket => f.write_str("Mobipocket"),
            Self::Unknown(n) => write!(f, "unknown ({n})"),
        }
    }
}

/// Text encoding declared by the MOBI header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Cp1252,
    Utf8,
    Unknown(u32),
}

impl From<u32> for TextEncoding {
    fn from(raw: u32) -> Self {
        match raw {
            1252 => Self::Cp1252,
            65001 => Self::Utf8,
            n => Self::Unknown(n),
        }
    }
}

impl TextEncoding {
    /// Decode bytes in this encoding, replacing anything undecodable.
    pub fn decode_lossy(&self, bytes: &[u8]) -> String {
        match self {
            Self::Cp1252 => {
                let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
                decoded.into_owned()
            }
            Self::Utf8 | Self::Unknown(_) => String::from_utf8_lossy(bytes).into_owned(),
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cp1252 => f.write_str("CP1252"),
            Self::Utf8 => f.write_str("UTF-8"),
            Self::Unknown(n) => write!(f, "unknown ({n})"),
        }
    }
}

/// The 16-byte PalmDOC header at the start of record 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct PalmDocHeader {
    pub compression: u16,
    /// Reserved; carried verbatim, never interpreted.
    pub unused: u16,
    pub uncompressed_text_size: u32,
    /// Number of text records.
    pub record_count: u16,
    /// Maximum uncompressed bytes per text record (usually 4096).
    pub record_size: u16,
    pub encryption_type: u16,
    /// Trailing two bytes; carried verbatim, never interpreted.
    pub unknown: u16,
}

impl PalmDocHeader {
    pub fn compression_kind(&self) -> Compression {
        Compression::from(self.compression)
    }

    pub fn encryption_kind(&self) -> Encryption {
        Encryption::from(self.encryption_type)
    }
}

/// The Mobipocket header following the PalmDOC header in record 0.
///
/// Only the marker and the header length are guaranteed. Every other field is
/// `None` when it lies beyond the declared header length or the end of the file,
/// which is normal for short, older header variants.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct MobiHeader {
    /// Always `"MOBI"`.
    pub mobi_marker: String,
    /// Length of the MOBI header, counted from the marker.
    pub header_length: u32,
    pub mobi_type: Option<u32>,
    pub text_encoding: Option<u32>,
    pub unique_id: Option<u32>,
    pub format_version: Option<u32>,
    pub orthographic_index: Option<u32>,
    pub inflection_index: Option<u32>,
    pub first_non_book_index: Option<u32>,
    /// Offset of the full name, relative to the start of record 0.
    pub full_name_offset: Option<u32>,
    pub full_name_length: Option<u32>,
    pub locale: Option<u32>,
    pub input_language: Option<u32>,
    pub output_language: Option<u32>,
    pub min_version: Option<u32>,
    pub first_image_index: Option<u32>,
    pub huffman_record_offset: Option<u32>,
    pub huffman_record_count: Option<u32>,
    pub exth_flags: Option<u32>,
    pub drm_offset: Option<u32>,
    pub drm_count: Option<u32>,
    pub drm_size: Option<u32>,
    pub drm_flags: Option<u32>,
    pub first_content_rec: Option<u16>,
    pub last_content_rec: Option<u16>,
    /// Book title resolved through `full_name_offset`/`full_name_length`.
    pub full_name: Option<String>,
}

impl MobiHeader {
    /// Whether the EXTH flag bit (0x40) is set.
    pub fn has_exth_flag(&self) -> bool {
        self.exth_flags.is_some_and(|f| f & EXTH_FLAG != 0)
    }

    pub fn encoding(&self) -> Option<TextEncoding> {
        self.text_encoding.map(TextEncoding::from)
    }

    /// Primary language id (low byte of the locale).
    pub fn language_code(&self) -> Option<u32> {
        self.locale.map(|l| l & 0xFF)
    }

    /// Dialect / sub-language id packed above the language byte.
    pub fn dialect_code(&self) -> Option<u32> {
        self.locale.map(|l| (l >> 10) & 0xFF)
    }

    /// Whether a DRM block is declared.
    pub fn has_drm(&self) -> bool {
        matches!(self.drm_offset, Some(off) if off != 0 && off != u32::MAX)
            && self.drm_count.is_some_and(|c| c > 0)
    }

    /// Absolute offset at which an EXTH block would start, given record 0's offset.
    pub fn exth_offset(&self, record0_offset: usize) -> usize {
        record0_offset
            .saturating_add(16)
            .saturating_add(self.header_length as usize)
    }
}

/// The outer header of an EXTH metadata block.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ExthHeader {
    /// Always `"EXTH"`.
    pub marker: String,
    /// Absolute file offset of the marker.
    pub offset: usize,
    /// Length of the whole block, including this header.
    pub header_length: u32,
    /// Number of metadata records in the block.
    pub record_count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_mapping() {
        assert_eq!(Compression::from(1), Compression::None);
        assert_eq!(Compression::from(2), Compression::PalmDoc);
        assert_eq!(Compression::from(17480), Compression::HuffCdic);
        assert_eq!(Compression::from(7), Compression::Unknown(7));
        assert_eq!(Encryption::from(2), Encryption::Mobipocket);
        assert_eq!(TextEncoding::from(65001), TextEncoding::Utf8);
        assert_eq!(TextEncoding::from(1252), TextEncoding::Cp1252);
    }

    #[test]
    fn test_cp1252_decoding() {
        // "Müller" in Windows-1252
        let bytes = [b'M', 0xFC, b'l', b'l', b'e', b'r'];
        assert_eq!(TextEncoding::Cp1252.decode_lossy(&bytes), "Müller");
        assert_eq!(TextEncoding::Utf8.decode_lossy(&bytes), "M\u{FFFD}ller");
    }
}
