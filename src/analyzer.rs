//! Whole-file analysis: runs every parser in order over one file's bytes.

use std::path::Path;

use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::error::{MobiError, Result, Stage};
use crate::model::analysis::{AnalysisResult, AnalysisWarning};
use crate::model::palmdb::{record_spans, RecordInfoEntry};
use crate::model::record0::{ExthHeader, MobiHeader};
use crate::parser::exth::EXTH_HEADER_SIZE;
use crate::parser::reader::ByteView;
use crate::parser::{exth, mobi, palmdb, palmdoc};

/// Read a whole file into memory.
pub fn load_file(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| MobiError::file_read(path, e))
}

/// Load and analyse the file at `path`.
///
/// Errors carry the file path and, for structural failures, the stage.
pub fn analyze_file(path: &Path) -> Result<AnalysisResult> {
    info!(path = %path.display(), "Analyzing file");
    let data = load_file(path)?;
    analyze_bytes(&data).map_err(|e| e.in_file(path))
}

/// Analyse an in-memory file.
///
/// The PalmDB header, the record list and (when the list is not empty) the
/// PalmDOC header are required; a failure in any of them aborts. Missing or
/// truncated MOBI and EXTH headers only produce `None` and a warning.
pub fn analyze_bytes(data: &[u8]) -> Result<AnalysisResult> {
    let header =
        palmdb::parse_palmdb_header(data).map_err(|e| e.at_stage(Stage::PalmDbHeader))?;
    let records = palmdb::parse_record_list(data, header.num_records)
        .map_err(|e| e.at_stage(Stage::RecordList))?;

    let file_size = data.len() as u64;
    let mut warnings = check_record_offsets(&records, file_size);
    let spans = record_spans(&records, file_size);

    let mut result = AnalysisResult {
        file_size,
        sha256: sha256_hex(data),
        palmdb: header,
        records,
        spans,
        palmdoc: None,
        mobi: None,
        exth: None,
        warnings: Vec::new(),
    };

    if result.records.is_empty() {
        debug!("Record list is empty; skipping record 0 headers");
        return Ok(finish(result, warnings));
    }

    let palmdoc_header = palmdoc::parse_palmdoc_header(data, &result.records)
        .map_err(|e| e.at_stage(Stage::PalmDocHeader))?;
    result.palmdoc = Some(palmdoc_header);

    let rec0_offset = palmdoc::record0_offset(&result.records)?;
    let rec0_tail = ByteView::new(data).tail(rec0_offset);

    let mobi_header = match mobi::parse_mobi_header(rec0_tail) {
        Ok(found) => found,
        Err(e) => {
            debug!(error = %e, "MOBI header unreadable");
            warnings.push(AnalysisWarning::TruncatedMobiHeader);
            None
        }
    };

    if let Some(mut mobi_header) = mobi_header {
        let record0 = result.spans[0].slice(data);
        match mobi::resolve_full_name(record0, &mobi_header) {
            Ok(name) => mobi_header.full_name = name,
            Err(_) => warnings.push(AnalysisWarning::FullNameOutOfRange {
                offset: mobi_header.full_name_offset.unwrap_or(0),
                length: mobi_header.full_name_length.unwrap_or(0),
            }),
        }

        warnings.extend(check_mobi_header(&mobi_header));
        warnings.extend(check_content_records(
            &mobi_header,
            result.palmdb.num_records,
        ));

        let (exth_header, exth_warnings) = read_exth(data, rec0_offset, &mobi_header);
        warnings.extend(exth_warnings);
        result.exth = exth_header;
        result.mobi = Some(mobi_header);
    }

    Ok(finish(result, warnings))
}

fn finish(mut result: AnalysisResult, warnings: Vec<AnalysisWarning>) -> AnalysisResult {
    for w in &warnings {
        warn!(warning = %w, "Structural irregularity");
    }
    result.warnings = warnings;
    result
}

/// Flag offsets that go backwards or point past the end of the file.
fn check_record_offsets(records: &[RecordInfoEntry], file_size: u64) -> Vec<AnalysisWarning> {
    let mut warnings = Vec::new();
    for (i, entry) in records.iter().enumerate() {
        if i > 0 && entry.offset < records[i - 1].offset {
            warnings.push(AnalysisWarning::NonMonotonicOffset { index: entry.index });
        }
        if u64::from(entry.offset) > file_size {
            warnings.push(AnalysisWarning::OffsetBeyondEof {
                index: entry.index,
                offset: entry.offset,
            });
        }
    }
    warnings
}

/// Header lengths and format versions that well-formed books never use.
const MIN_MOBI_HEADER_LENGTH: u32 = 232;
const KNOWN_FORMAT_VERSIONS: std::ops::RangeInclusive<u32> = 2..=8;

fn check_mobi_header(header: &MobiHeader) -> Option<AnalysisWarning> {
    let short = header.header_length < MIN_MOBI_HEADER_LENGTH;
    let odd_version = header
        .format_version
        .is_some_and(|v| !KNOWN_FORMAT_VERSIONS.contains(&v));
    (short || odd_version).then_some(AnalysisWarning::UnusualMobiHeader {
        header_length: header.header_length,
        format_version: header.format_version,
    })
}

/// Report content-record bounds that do not name a record. Never enforced.
fn check_content_records(header: &MobiHeader, num_records: u16) -> Vec<AnalysisWarning> {
    [
        ("first_content_rec", header.first_content_rec),
        ("last_content_rec", header.last_content_rec),
    ]
    .into_iter()
    .filter_map(|(field, value)| {
        let value = value?;
        (value >= num_records).then_some(AnalysisWarning::ContentRecordOutOfRange {
            field,
            value,
            num_records,
        })
    })
    .collect()
}

/// Locate and decode the EXTH header that may follow the MOBI header.
fn read_exth(
    data: &[u8],
    rec0_offset: usize,
    header: &MobiHeader,
) -> (Option<ExthHeader>, Vec<AnalysisWarning>) {
    let offset = header.exth_offset(rec0_offset);
    let mut warnings = Vec::new();

    let (exth_header, marker_found) = match exth::parse_exth_header(data, offset) {
        Ok(found) => {
            let marker_found = found.is_some();
            (found, marker_found)
        }
        Err(e) => {
            debug!(offset, error = %e, "EXTH header unreadable");
            warnings.push(AnalysisWarning::TruncatedExthHeader { offset });
            (None, true)
        }
    };

    if let Some(exth) = &exth_header {
        warnings.extend(check_exth_header(exth, data.len()));
    }

    if header.exth_flags.is_some() && header.has_exth_flag() != marker_found {
        warnings.push(AnalysisWarning::ExthFlagMismatch {
            flag_set: header.has_exth_flag(),
            marker_found,
        });
    }
    (exth_header, warnings)
}

fn check_exth_header(exth: &ExthHeader, file_size: usize) -> Vec<AnalysisWarning> {
    let mut warnings = Vec::new();
    let length = exth.header_length as usize;
    let past_eof = exth
        .offset
        .checked_add(length)
        .is_none_or(|end| end > file_size);
    if length < EXTH_HEADER_SIZE || past_eof {
        warnings.push(AnalysisWarning::ExthLengthInvalid {
            offset: exth.offset,
            header_length: exth.header_length,
        });
    }
    if exth.record_count == 0 {
        warnings.push(AnalysisWarning::ExthEmpty { offset: exth.offset });
    }
    warnings
}

/// Hex SHA-256 of `data`.
fn sha256_hex(data: &[u8]) -> String {
    Sha256::digest(data)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}
