//! Outer header of the EXTH metadata block.

use tracing::debug;

use crate::error::Result;
use crate::model::record0::ExthHeader;
use crate::parser::reader::ByteView;

/// Marker, block length and record count.
pub const EXTH_HEADER_SIZE: usize = 12;

/// Decode the EXTH header at absolute `offset` in `data`.
///
/// Returns `Ok(None)` when the four bytes at `offset` are not `EXTH`.
/// Individual metadata records are not decoded. A marker whose length or
/// count fields run past the buffer fails with `OutOfBounds`.
pub fn parse_exth_header(data: &[u8], offset: usize) -> Result<Option<ExthHeader>> {
    let view = ByteView::new(data);
    if !view.has_tag(offset, b"EXTH") {
        debug!(offset, "No EXTH marker");
        return Ok(None);
    }

    let header = ExthHeader {
        marker: "EXTH".to_string(),
        offset,
        header_length: view.u32_at(offset + 4)?,
        record_count: view.u32_at(offset + 8)?,
    };

    debug!(
        offset,
        length = header.header_length,
        records = header.record_count,
        "Parsed EXTH header"
    );
    Ok(Some(header))
}
