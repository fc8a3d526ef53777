//! Per-file conversion results and the bad-row policy.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;
use tracing::warn;

use crate::normalize::FieldMappingError;
use crate::record::DrawRecord;

/// A whole input file that cannot be converted
#[derive(Error, Debug)]
pub enum MalformedInputError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot open workbook: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported JSON structure: {0}")]
    UnsupportedShape(String),

    #[error("no sheet has the required columns (missing: {})", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("{bad} of {total} rows could not be converted (first: {first})")]
    TooManyBadRows {
        bad: usize,
        total: usize,
        first: String,
    },
}

/// Where a row or entry sits in its source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowLocation {
    /// 1-based row number as shown by spreadsheet applications
    Sheet { sheet: String, row: usize },
    /// Index into a JSON array, under its group key
    Entry { group: String, index: usize },
}

impl fmt::Display for RowLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowLocation::Sheet { sheet, row } => write!(f, "sheet '{}' row {}", sheet, row),
            RowLocation::Entry { group, index } => write!(f, "{}[{}]", group, index),
        }
    }
}

/// A row or entry dropped during conversion
#[derive(Debug, Clone, PartialEq)]
pub struct RowFailure {
    pub location: RowLocation,
    pub error: FieldMappingError,
}

impl fmt::Display for RowFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.location, self.error)
    }
}

/// Outcome of converting one input file
#[derive(Debug, Clone, Default)]
pub struct Conversion {
    /// Player id found in the file, if any
    pub uid: Option<String>,
    /// Converted records in source order
    pub records: Vec<DrawRecord>,
    /// Rows that were dropped, in source order
    pub failures: Vec<RowFailure>,
}

/// Drain a record stream, keeping failures instead of stopping on them.
///
/// The file as a whole is rejected only when the share of failed rows
/// exceeds `max_bad_row_ratio`. A stream with no rows converts to nothing.
pub fn collect_records<I>(
    rows: I,
    max_bad_row_ratio: f64,
) -> Result<(Vec<DrawRecord>, Vec<RowFailure>), MalformedInputError>
where
    I: IntoIterator<Item = Result<DrawRecord, RowFailure>>,
{
    let mut records = Vec::new();
    let mut failures = Vec::new();

    for row in rows {
        match row {
            Ok(record) => records.push(record),
            Err(failure) => {
                warn!("Skipping {}", failure);
                failures.push(failure);
            }
        }
    }

    let total = records.len() + failures.len();
    if exceeds_ratio(failures.len(), total, max_bad_row_ratio) {
        return Err(MalformedInputError::TooManyBadRows {
            bad: failures.len(),
            total,
            first: failures
                .first()
                .map(ToString::to_string)
                .unwrap_or_default(),
        });
    }

    Ok((records, failures))
}

fn exceeds_ratio(bad: usize, total: usize, max_ratio: f64) -> bool {
    total > 0 && (bad as f64 / total as f64) > max_ratio
}
