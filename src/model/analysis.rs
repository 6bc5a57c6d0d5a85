//! The aggregate produced by analysing one file.

use std::fmt;

use super::palmdb::{PalmDbHeader, RecordInfoEntry, RecordSpan};
use super::record0::{ExthHeader, MobiHeader, PalmDocHeader};

/// A structural irregularity that does not stop analysis.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnalysisWarning {
    /// `records[index].offset` is lower than the previous record's offset.
    NonMonotonicOffset { index: usize },
    /// A record starts past the end of the file.
    OffsetBeyondEof { index: usize, offset: u32 },
    /// A MOBI content-record bound does not name an existing record.
    ContentRecordOutOfRange {
        field: &'static str,
        value: u16,
        num_records: u16,
    },
    /// The EXTH flag bit and the presence of an EXTH marker disagree.
    ExthFlagMismatch { flag_set: bool, marker_found: bool },
    /// A MOBI marker was found but the header length could not be read.
    TruncatedMobiHeader,
    /// An EXTH marker was found but its length/count fields run past the file.
    TruncatedExthHeader { offset: usize },
    /// The full-name span points outside record 0.
    FullNameOutOfRange { offset: u32, length: u32 },
    /// The EXTH block length is smaller than its own 12-byte header or
    /// runs past the end of the file.
    ExthLengthInvalid { offset: usize, header_length: u32 },
    /// An EXTH block that declares no metadata records.
    ExthEmpty { offset: usize },
    /// A MOBI header shorter than 232 bytes or a format version outside 2..=8.
    UnusualMobiHeader {
        header_length: u32,
        format_version: Option<u32>,
    },
}

impl fmt::Display for AnalysisWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonMonotonicOffset { index } => {
                write!(f, "record {index} starts before the previous record")
            }
            Self::OffsetBeyondEof { index, offset } => {
                write!(f, "record {index} offset {offset} is past end of file")
            }
            Self::ContentRecordOutOfRange {
                field,
                value,
                num_records,
            } => write!(
                f,
                "{field} = {value} is outside the {num_records} record(s) in the file"
            ),
            Self::ExthFlagMismatch {
                flag_set,
                marker_found,
            } => write!(
                f,
                "EXTH flag {} but EXTH marker {}",
                if *flag_set { "set" } else { "clear" },
                if *marker_found { "found" } else { "missing" }
            ),
            Self::TruncatedMobiHeader => f.write_str("MOBI marker present but header is truncated"),
            Self::TruncatedExthHeader { offset } => {
                write!(f, "EXTH marker at {offset} but header is truncated")
            }
            Self::FullNameOutOfRange { offset, length } => write!(
                f,
                "full name ({length} bytes at +{offset}) lies outside record 0"
            ),
            Self::ExthLengthInvalid {
                offset,
                header_length,
            } => write!(
                f,
                "EXTH block at {offset} declares an invalid length of {header_length} bytes"
            ),
            Self::ExthEmpty { offset } => write!(f, "EXTH block at {offset} has no records"),
            Self::UnusualMobiHeader {
                header_length,
                format_version,
            } => match format_version {
                Some(version) => write!(
                    f,
                    "unusual MOBI header: length {header_length}, version {version}"
                ),
                None => write!(f, "unusual MOBI header: length {header_length}, no version"),
            },
        }
    }
}

/// Everything decoded from a single file.
///
/// The record-0 sections are `None` when the record list is empty; `mobi` and
/// `exth` are also `None` when their markers are absent.
#[derive(Debug, Clone, serde::Serialize)]
pub struct AnalysisResult {
    pub file_size: u64,
    /// Hex SHA-256 of the whole file.
    pub sha256: String,
    pub palmdb: PalmDbHeader,
    pub records: Vec<RecordInfoEntry>,
    pub spans: Vec<RecordSpan>,
    pub palmdoc: Option<PalmDocHeader>,
    pub mobi: Option<MobiHeader>,
    pub exth: Option<ExthHeader>,
    pub warnings: Vec<AnalysisWarning>,
}

impl AnalysisResult {
    /// Offset of record 0, if the record list is not empty.
    pub fn record0_offset(&self) -> Option<u32> {
        self.records.first().map(|r| r.offset)
    }

    /// Spans of the text records (records 1 onwards).
    pub fn text_record_spans(&self) -> &[RecordSpan] {
        self.spans.get(1..).unwrap_or(&[])
    }
}
