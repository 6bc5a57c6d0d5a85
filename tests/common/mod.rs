//! Builds synthetic MOBI files for the integration tests.

#![allow(dead_code)]

pub const TITLE: &str = "Test Book";
pub const TEXT_RECORD_LEN: usize = 64;

/// Knobs for [`build_mobi`].
#[derive(Debug, Clone)]
pub struct BookSpec {
    pub name: &'static str,
    pub compression: u16,
    pub record_size: u16,
    pub encryption_type: u16,
    /// Write a MOBI header after the PalmDOC header.
    pub mobi: bool,
    pub header_length: u32,
    pub format_version: u32,
    pub exth_flags: u32,
    /// Write an EXTH block after the MOBI header.
    pub exth: bool,
    pub first_content_rec: u16,
    pub last_content_rec: u16,
    pub text_records: usize,
}

impl Default for BookSpec {
    fn default() -> Self {
        Self {
            name: "Test_Book",
            compression: 2,
            record_size: 4096,
            encryption_type: 0,
            mobi: true,
            header_length: 232,
            format_version: 6,
            exth_flags: 0x50,
            exth: true,
            first_content_rec: 1,
            last_content_rec: 3,
            text_records: 3,
        }
    }
}

fn put_u16(buf: &mut [u8], offset: usize, value: u16) {
    buf[offset..offset + 2].copy_from_slice(&value.to_be_bytes());
}

fn put_u32(buf: &mut [u8], offset: usize, value: u32) {
    buf[offset..offset + 4].copy_from_slice(&value.to_be_bytes());
}

/// The EXTH block: one author record ("Ann"), padded to a multiple of 4.
pub fn exth_block() -> Vec<u8> {
    let mut block = b"EXTH".to_vec();
    block.extend_from_slice(&24u32.to_be_bytes());
    block.extend_from_slice(&1u32.to_be_bytes());
    block.extend_from_slice(&100u32.to_be_bytes());
    block.extend_from_slice(&11u32.to_be_bytes());
    block.extend_from_slice(b"Ann");
    block.push(0);
    block
}

/// Record 0: PalmDOC header, optional MOBI header, optional EXTH, title.
pub fn record0(book: &BookSpec) -> Vec<u8> {
    let mut rec = vec![0u8; 16];
    put_u16(&mut rec, 0, book.compression);
    put_u32(&mut rec, 4, (book.text_records * TEXT_RECORD_LEN) as u32);
    put_u16(&mut rec, 8, book.text_records as u16);
    put_u16(&mut rec, 10, book.record_size);
    put_u16(&mut rec, 12, book.encryption_type);

    if !book.mobi {
        return rec;
    }

    let mobi_len = book.header_length as usize;
    rec.resize(16 + mobi_len, 0);
    rec[16..20].copy_from_slice(b"MOBI");
    put_u32(&mut rec, 20, book.header_length);
    let mut put_field = |offset: usize, value: u32| {
        if offset + 4 <= 16 + mobi_len {
            put_u32(&mut rec, offset, value);
        }
    };
    put_field(24, 2);
    put_field(28, 65001);
    put_field(32, 0x1234_5678);
    put_field(36, book.format_version);
    put_field(80, book.text_records as u32 + 1);
    put_field(92, 0x09);
    put_field(104, book.format_version);
    put_field(108, u32::MAX);
    put_field(128, book.exth_flags);
    put_field(168, u32::MAX);
    if 16 + mobi_len >= 196 {
        put_u16(&mut rec, 192, book.first_content_rec);
        put_u16(&mut rec, 194, book.last_content_rec);
    }

    if book.exth {
        rec.extend_from_slice(&exth_block());
    }

    let name_offset = rec.len();
    rec.extend_from_slice(TITLE.as_bytes());
    rec.extend_from_slice(&[0, 0]);
    if 16 + mobi_len >= 92 {
        put_u32(&mut rec, 84, name_offset as u32);
        put_u32(&mut rec, 88, TITLE.len() as u32);
    }
    rec
}

/// A complete PalmDB file with record 0 followed by `text_records` records.
pub fn build_mobi(book: &BookSpec) -> Vec<u8> {
    let num_records = 1 + book.text_records;
    let mut records: Vec<Vec<u8>> = vec![record0(book)];
    for i in 0..book.text_records {
        records.push(vec![i as u8 + 1; TEXT_RECORD_LEN]);
    }

    let mut buf = vec![0u8; 78];
    buf[..book.name.len()].copy_from_slice(book.name.as_bytes());
    put_u32(&mut buf, 36, 1_700_000_000);
    put_u32(&mut buf, 40, 1_700_000_000);
    buf[60..68].copy_from_slice(b"BOOKMOBI");
    put_u32(&mut buf, 68, (2 * num_records - 1) as u32);
    put_u16(&mut buf, 76, num_records as u16);

    // Record list plus the conventional 2-byte gap
    let mut offset = 78 + num_records * 8 + 2;
    for (i, rec) in records.iter().enumerate() {
        buf.extend_from_slice(&(offset as u32).to_be_bytes());
        buf.push(0);
        buf.extend_from_slice(&((2 * i) as u32).to_be_bytes()[1..]);
        offset += rec.len();
    }
    buf.extend_from_slice(&[0, 0]);

    for rec in &records {
        buf.extend_from_slice(rec);
    }
    buf
}

/// Offset of record `index`'s entry in the record info list.
pub fn entry_offset(index: usize) -> usize {
    78 + index * 8
}

/// Overwrite record `index`'s data offset.
pub fn set_record_offset(buf: &mut [u8], index: usize, offset: u32) {
    put_u32(buf, entry_offset(index), offset);
}
