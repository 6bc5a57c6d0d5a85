//! PalmDOC header at the start of record 0.

use tracing::debug;

use crate::error::{MobiError, Result};
use crate::model::palmdb::RecordInfoEntry;
use crate::model::record0::PalmDocHeader;
use crate::parser::reader::ByteView;

/// Size of the PalmDOC header.
pub const PALMDOC_HEADER_SIZE: usize = 16;

/// Resolve record 0's offset from the record list.
pub fn record0_offset(records: &[RecordInfoEntry]) -> Result<usize> {
    records
        .first()
        .map(|r| r.offset as usize)
        .ok_or(MobiError::MissingRecordZero)
}

/// Decode the PalmDOC header of record 0.
///
/// `data` is the whole file; the header is read at record 0's offset.
pub fn parse_palmdoc_header(data: &[u8], records: &[RecordInfoEntry]) -> Result<PalmDocHeader> {
    let offset = record0_offset(records)?;
    let available = data.len().saturating_sub(offset);
    if available < PALMDOC_HEADER_SIZE {
        return Err(MobiError::TruncatedHeader {
            section: "PalmDOC header",
            required: PALMDOC_HEADER_SIZE,
            available,
        });
    }

    let view = ByteView::new(data);
    let header = PalmDocHeader {
        compression: view.u16_at(offset)?,
        unused: view.u16_at(offset + 2)?,
        uncompressed_text_size: view.u32_at(offset + 4)?,
        record_count: view.u16_at(offset + 8)?,
        record_size: view.u16_at(offset + 10)?,
        encryption_type: view.u16_at(offset + 12)?,
        unknown: view.u16_at(offset + 14)?,
    };

    debug!(
        offset,
        compression = %header.compression_kind(),
        text_records = header.record_count,
        "Parsed PalmDOC header"
    );
    Ok(header)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record0_at(offset: u32) -> Vec<RecordInfoEntry> {
        vec![RecordInfoEntry {
            index: 0,
            offset,
            attributes: 0,
            unique_id: 0,
        }]
    }

    #[test]
    fn test_fields_at_record0() {
        let mut data = vec![0xEEu8; 4];
        data.extend_from_slice(&2u16.to_be_bytes());
        data.extend_from_slice(&0xFFFFu16.to_be_bytes());
        data.extend_from_slice(&123_456u32.to_be_bytes());
        data.extend_from_slice(&31u16.to_be_bytes());
        data.extend_from_slice(&4096u16.to_be_bytes());
        data.extend_from_slice(&1u16.to_be_bytes());
        data.extend_from_slice(&9u16.to_be_bytes());

        let header = parse_palmdoc_header(&data, &record0_at(4)).unwrap();
        assert_eq!(header.compression, 2);
        assert_eq!(header.unused, 0xFFFF);
        assert_eq!(header.uncompressed_text_size, 123_456);
        assert_eq!(header.record_count, 31);
        assert_eq!(header.record_size, 4096);
        assert_eq!(header.encryption_type, 1);
        assert_eq!(header.unknown, 9);
    }

    #[test]
    fn test_empty_record_list() {
        let data = vec![0u8; 64];
        assert!(matches!(
            parse_palmdoc_header(&data, &[]),
            Err(MobiError::MissingRecordZero)
        ));
    }

    #[test]
    fn test_short_record0() {
        let data = vec![0u8; 40];
        match parse_palmdoc_header(&data, &record0_at(30)) {
            Err(MobiError::TruncatedHeader { available, .. }) => assert_eq!(available, 10),
            other => panic!("expected TruncatedHeader, got {other:?}"),
        }
        assert!(matches!(
            parse_palmdoc_header(&data, &record0_at(500)),
            Err(MobiError::TruncatedHeader { available: 0, .. })
        ));
    }
}
