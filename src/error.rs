//! Centralized error types for mobiscope.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// The structural stage of an analysis that produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    PalmDbHeader,
    RecordList,
    PalmDocHeader,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::PalmDbHeader => "PalmDB header",
            Stage::RecordList => "record info list",
            Stage::PalmDocHeader => "PalmDOC header",
        };
        f.write_str(name)
    }
}

/// All errors produced by the mobiscope library.
#[derive(Error, Debug)]
pub enum MobiError {
    /// A fixed-width read ran past the end of the buffer.
    #[error("Read of {width} byte(s) at offset {offset} exceeds buffer of {len} bytes")]
    OutOfBounds { offset: usize, width: usize, len: usize },

    /// A fixed-size header is shorter than its required minimum.
    #[error("Truncated {section}: need {required} bytes, found {available}")]
    TruncatedHeader {
        section: &'static str,
        required: usize,
        available: usize,
    },

    /// The declared record count needs more bytes than the file holds.
    #[error("Truncated record list: {declared} record(s) need {required} bytes, found {available}")]
    TruncatedRecordList {
        declared: u16,
        required: usize,
        available: usize,
    },

    /// Record 0 was required but the record list is empty.
    #[error("Record list is empty; record 0 is missing")]
    MissingRecordZero,

    /// The input file could not be opened or read.
    #[error("I/O error reading '{path}': {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// An error labeled with the analysis stage that raised it.
    #[error("{stage}: {source}")]
    Stage {
        stage: Stage,
        #[source]
        source: Box<MobiError>,
    },

    /// An error labeled with the file it came from.
    #[error("{}: {source}", path.display())]
    InFile {
        path: PathBuf,
        #[source]
        source: Box<MobiError>,
    },
}

/// Convenience alias for `Result<T, MobiError>`.
pub type Result<T> = std::result::Result<T, MobiError>;

impl MobiError {
    /// Create a `FileRead` variant from a path and an `io::Error`.
    pub fn file_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileRead {
            path: path.into(),
            source,
        }
    }

    /// Label this error with the stage that produced it.
    pub fn at_stage(self, stage: Stage) -> Self {
        Self::Stage {
            stage,
            source: Box::new(self),
        }
    }

    /// Label this error with the file that produced it.
    pub fn in_file(self, path: impl Into<PathBuf>) -> Self {
        Self::InFile {
            path: path.into(),
            source: Box::new(self),
        }
    }

    /// The stage label, if any layer carries one.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::Stage { stage, .. } => Some(*stage),
            Self::InFile { source, .. } => source.stage(),
            _ => None,
        }
    }

    /// The innermost error, with all labeling layers removed.
    pub fn root(&self) -> &MobiError {
        match self {
            Self::Stage { source, .. } | Self::InFile { source, .. } => source.root(),
            other => other,
        }
    }
}
