//! PalmDB database header and record info list.

use tracing::debug;

use crate::error::{MobiError, Result};
use crate::model::palmdb::{PalmDbHeader, RecordInfoEntry};
use crate::parser::reader::ByteView;

/// Size of the fixed PalmDB header.
pub const PALMDB_HEADER_SIZE: usize = 78;

/// Size of one record info entry.
pub const RECORD_ENTRY_SIZE: usize = 8;

/// Decode the 78-byte PalmDB header at the start of `data`.
pub fn parse_palmdb_header(data: &[u8]) -> Result<PalmDbHeader> {
    if data.len() < PALMDB_HEADER_SIZE {
        return Err(MobiError::TruncatedHeader {
            section: "PalmDB header",
            required: PALMDB_HEADER_SIZE,
            available: data.len(),
        });
    }

    let view = ByteView::new(data);
    let header = PalmDbHeader {
        name: view.padded_str_at(0, 32)?,
        attributes: view.u16_at(32)?,
        version: view.u16_at(34)?,
        creation_date: view.u32_at(36)?,
        modification_date: view.u32_at(40)?,
        last_backup_date: view.u32_at(44)?,
        modification_number: view.u32_at(48)?,
        app_info_offset: view.u32_at(52)?,
        sort_info_offset: view.u32_at(56)?,
        type_tag: view.tag_at(60)?,
        creator: view.tag_at(64)?,
        unique_id_seed: view.u32_at(68)?,
        next_record_list_id: view.u32_at(72)?,
        num_records: view.u16_at(76)?,
    };

    debug!(
        name = %header.name,
        identity = %header.identity(),
        num_records = header.num_records,
        "Parsed PalmDB header"
    );
    Ok(header)
}

/// Decode `num_records` consecutive 8-byte entries starting right after the header.
///
/// Entries keep file order; `index` is the position in the list.
pub fn parse_record_list(data: &[u8], num_records: u16) -> Result<Vec<RecordInfoEntry>> {
    let required = usize::from(num_records) * RECORD_ENTRY_SIZE;
    let available = data.len().saturating_sub(PALMDB_HEADER_SIZE);
    if available < required {
        return Err(MobiError::TruncatedRecordList {
            declared: num_records,
            required,
            available,
        });
    }

    let view = ByteView::new(data);
    let mut entries = Vec::with_capacity(usize::from(num_records));
    for index in 0..usize::from(num_records) {
        let base = PALMDB_HEADER_SIZE + index * RECORD_ENTRY_SIZE;
        entries.push(RecordInfoEntry {
            index,
            offset: view.u32_at(base)?,
            attributes: view.u8_at(base + 4)?,
            unique_id: view.u24_at(base + 5)?,
        });
    }

    debug!(count = entries.len(), "Parsed record info list");
    Ok(entries)
}
