//! PalmDB container types: the database header and its record list.

use chrono::{DateTime, Utc};

/// Seconds between the Mac epoch (1904-01-01) and the Unix epoch.
pub const MAC_EPOCH_OFFSET: i64 = 2_082_844_800;

/// The fixed 78-byte header at the start of every PalmDB file.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct PalmDbHeader {
    /// Database name, NUL padding removed.
    pub name: String,
    pub attributes: u16,
    pub version: u16,
    /// Raw creation timestamp. See [`palm_timestamp`].
    pub creation_date: u32,
    pub modification_date: u32,
    pub last_backup_date: u32,
    pub modification_number: u32,
    /// Offset of the application info block (0 = absent).
    pub app_info_offset: u32,
    /// Offset of the sort info block (0 = absent).
    pub sort_info_offset: u32,
    /// Database type tag, e.g. `BOOK` or `TEXt`.
    #[serde(rename = "type")]
    pub type_tag: String,
    /// Creator tag, e.g. `MOBI` or `REAd`.
    pub creator: String,
    pub unique_id_seed: u32,
    pub next_record_list_id: u32,
    /// Number of entries in the record info list that follows.
    pub num_records: u16,
}

impl PalmDbHeader {
    /// Creation time, if set.
    pub fn created(&self) -> Option<DateTime<Utc>> {
        palm_timestamp(self.creation_date)
    }

    pub fn modified(&self) -> Option<DateTime<Utc>> {
        palm_timestamp(self.modification_date)
    }

    pub fn last_backup(&self) -> Option<DateTime<Utc>> {
        palm_timestamp(self.last_backup_date)
    }

    /// The 8-byte type+creator identity, e.g. `BOOKMOBI`.
    pub fn identity(&self) -> String {
        format!("{}{}", self.type_tag, self.creator)
    }
}

/// Convert a raw PalmDB timestamp to UTC.
///
/// Values with the high bit set count from the Mac epoch; smaller values
/// count from the Unix epoch, which is what most modern writers emit.
/// Zero means "never set".
pub fn palm_timestamp(raw: u32) -> Option<DateTime<Utc>> {
    if raw == 0 {
        return None;
    }
    let secs = if raw & 0x8000_0000 != 0 {
        i64::from(raw) - MAC_EPOCH_OFFSET
    } else {
        i64::from(raw)
    };
    DateTime::from_timestamp(secs, 0)
}

/// One entry of the record info list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct RecordInfoEntry {
    /// Position in the list (0-based, file order).
    pub index: usize,
    /// Absolute byte offset of the record's data.
    pub offset: u32,
    pub attributes: u8,
    /// 24-bit unique id.
    pub unique_id: u32,
}

/// The byte range a record occupies, derived from neighbouring offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct RecordSpan {
    pub index: usize,
    pub offset: u32,
    pub length: u32,
    /// The record starts past the end of the file.
    pub truncated: bool,
}

impl RecordSpan {
    /// The record's bytes, clamped to `data`.
    pub fn slice<'a>(&self, data: &'a [u8]) -> &'a [u8] {
        let start = (self.offset as usize).min(data.len());
        let end = start.saturating_add(self.length as usize).min(data.len());
        &data[start..end]
    }

    /// At most `n` leading bytes of the record.
    pub fn preview<'a>(&self, data: &'a [u8], n: usize) -> &'a [u8] {
        let bytes = self.slice(data);
        &bytes[..n.min(bytes.len())]
    }
}

/// Derive every record's span from the list and the file length.
///
/// A record's length runs to the next record's offset, or to the end of the
/// file for the last one. Offsets past the end of the file give zero-length,
/// truncated spans; a next offset lower than the current one gives length 0.
pub fn record_spans(entries: &[RecordInfoEntry], file_len: u64) -> Vec<RecordSpan> {
    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let start = u64::from(entry.offset);
            if start > file_len {
                return RecordSpan {
                    index: entry.index,
                    offset: entry.offset,
                    length: 0,
                    truncated: true,
                };
            }
            let end = entries
                .get(i + 1)
                .map_or(file_len, |next| u64::from(next.offset).min(file_len));
            RecordSpan {
                index: entry.index,
                offset: entry.offset,
                length: u32::try_from(end.saturating_sub(start)).unwrap_or(u32::MAX),
                truncated: false,
            }
        })
        .collect()
}
