//! Side-by-side comparison of two analysed files.
//!
//! Only a fixed set of fields is compared: the PalmDOC `compression`,
//! `record_size` and `encryption_type`, and the MOBI `format_version`,
//! `first_content_rec` and `exth_flags`.

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::analyzer;
use crate::error::MobiError;
use crate::model::analysis::AnalysisResult;
use crate::model::record0::{MobiHeader, PalmDocHeader};

/// Which of the two inputs a note refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    A,
    B,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::A => f.write_str("A"),
            Side::B => f.write_str("B"),
        }
    }
}

/// Why a section was not compared.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// The file could not be analysed at all.
    AnalysisFailed { side: Side, error: String },
    /// The file has no record 0 to read headers from.
    NoRecordZero { side: Side },
    /// The file has no MOBI header.
    NoMobiHeader { side: Side },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AnalysisFailed { side, error } => write!(f, "file {side} failed: {error}"),
            Self::NoRecordZero { side } => write!(f, "file {side} has no record 0"),
            Self::NoMobiHeader { side } => write!(f, "file {side} has no MOBI header"),
        }
    }
}

/// Equality of one named field across the two files.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct FieldComparison {
    pub field_name: &'static str,
    pub value_a: Option<u32>,
    pub value_b: Option<u32>,
    pub equal: bool,
}

impl FieldComparison {
    fn new(field_name: &'static str, value_a: Option<u32>, value_b: Option<u32>) -> Self {
        Self {
            field_name,
            value_a,
            value_b,
            equal: value_a == value_b,
        }
    }
}

/// The outcome for one header section.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SectionComparison {
    Compared { fields: Vec<FieldComparison> },
    Skipped { reason: SkipReason },
}

impl SectionComparison {
    /// The compared fields, or an empty slice when skipped.
    pub fn fields(&self) -> &[FieldComparison] {
        match self {
            Self::Compared { fields } => fields,
            Self::Skipped { .. } => &[],
        }
    }

    /// Names of the fields that differ.
    pub fn differing(&self) -> Vec<&'static str> {
        self.fields()
            .iter()
            .filter(|c| !c.equal)
            .map(|c| c.field_name)
            .collect()
    }
}

/// The full comparison of two files.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Comparison {
    /// Whether the two files are byte-identical. `None` if either failed to load.
    pub identical: Option<bool>,
    pub palmdoc: SectionComparison,
    pub mobi: SectionComparison,
}

type Field<H> = (&'static str, fn(&H) -> Option<u32>);

const PALMDOC_FIELDS: [Field<PalmDocHeader>; 3] = [
    ("compression", palmdoc_compression),
    ("record_size", palmdoc_record_size),
    ("encryption_type", palmdoc_encryption_type),
];

const MOBI_FIELDS: [Field<MobiHeader>; 3] = [
    ("format_version", mobi_format_version),
    ("first_content_rec", mobi_first_content_rec),
    ("exth_flags", mobi_exth_flags),
];

fn palmdoc_compression(h: &PalmDocHeader) -> Option<u32> {
    Some(u32::from(h.compression))
}

fn palmdoc_record_size(h: &PalmDocHeader) -> Option<u32> {
    Some(u32::from(h.record_size))
}

fn palmdoc_encryption_type(h: &PalmDocHeader) -> Option<u32> {
    Some(u32::from(h.encryption_type))
}

fn mobi_format_version(h: &MobiHeader) -> Option<u32> {
    h.format_version
}

fn mobi_first_content_rec(h: &MobiHeader) -> Option<u32> {
    h.first_content_rec.map(u32::from)
}

fn mobi_exth_flags(h: &MobiHeader) -> Option<u32> {
    h.exth_flags
}

fn compare_fields<H>(fields: &[Field<H>], a: &H, b: &H) -> Vec<FieldComparison> {
    fields
        .iter()
        .map(|&(name, get)| FieldComparison::new(name, get(a), get(b)))
        .collect()
}

/// Compare two successful analyses.
///
/// Sections are skipped, with a reason, when either file lacks record 0 or
/// (for the MOBI section) a MOBI header.
pub fn compare_results(a: &AnalysisResult, b: &AnalysisResult) -> Comparison {
    let identical = Some(a.sha256 == b.sha256);

    let (pd_a, pd_b) = match (&a.palmdoc, &b.palmdoc) {
        (Some(x), Some(y)) => (x, y),
        (None, _) => return both_skipped(identical, SkipReason::NoRecordZero { side: Side::A }),
        (_, None) => return both_skipped(identical, SkipReason::NoRecordZero { side: Side::B }),
    };
    let palmdoc = SectionComparison::Compared {
        fields: compare_fields(&PALMDOC_FIELDS, pd_a, pd_b),
    };

    let mobi = match (&a.mobi, &b.mobi) {
        (Some(x), Some(y)) => SectionComparison::Compared {
            fields: compare_fields(&MOBI_FIELDS, x, y),
        },
        (None, _) => SectionComparison::Skipped {
            reason: SkipReason::NoMobiHeader { side: Side::A },
        },
        (_, None) => SectionComparison::Skipped {
            reason: SkipReason::NoMobiHeader { side: Side::B },
        },
    };

    Comparison {
        identical,
        palmdoc,
        mobi,
    }
}

fn both_skipped(identical: Option<bool>, reason: SkipReason) -> Comparison {
    debug!(reason = %reason, "Comparison skipped");
    Comparison {
        identical,
        palmdoc: SectionComparison::Skipped {
            reason: reason.clone(),
        },
        mobi: SectionComparison::Skipped { reason },
    }
}

/// One input of a file comparison and its analysis outcome.
#[derive(Debug)]
pub struct FileOutcome {
    pub path: PathBuf,
    /// The file's bytes; empty if it could not be read.
    pub data: Vec<u8>,
    pub result: Result<AnalysisResult, MobiError>,
}

impl FileOutcome {
    /// Load and analyse one file, keeping any failure instead of returning it.
    pub fn analyze(path: &Path) -> Self {
        match analyzer::load_file(path) {
            Ok(data) => {
                let result = analyzer::analyze_bytes(&data).map_err(|e| e.in_file(path));
                Self {
                    path: path.to_path_buf(),
                    data,
                    result,
                }
            }
            Err(e) => Self {
                path: path.to_path_buf(),
                data: Vec::new(),
                result: Err(e),
            },
        }
    }
}

/// Two analysed files and their comparison.
#[derive(Debug)]
pub struct CompareReport {
    pub a: FileOutcome,
    pub b: FileOutcome,
    pub comparison: Comparison,
}

/// Analyse both files independently and compare them.
///
/// A file that fails to load or parse never aborts the comparison; its
/// failure is kept in its [`FileOutcome`] and both sections are skipped.
pub fn compare_files(path_a: &Path, path_b: &Path) -> CompareReport {
    info!(a = %path_a.display(), b = %path_b.display(), "Comparing files");
    let a = FileOutcome::analyze(path_a);
    let b = FileOutcome::analyze(path_b);

    let comparison = match (&a.result, &b.result) {
        (Ok(ra), Ok(rb)) => compare_results(ra, rb),
        (Err(e), _) => both_skipped(
            None,
            SkipReason::AnalysisFailed {
                side: Side::A,
                error: e.to_string(),
            },
        ),
        (_, Err(e)) => both_skipped(
            None,
            SkipReason::AnalysisFailed {
                side: Side::B,
                error: e.to_string(),
            },
        ),
    };

    CompareReport { a, b, comparison }
}
