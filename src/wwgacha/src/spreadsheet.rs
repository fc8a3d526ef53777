//! Spreadsheet converter.
//!
//! Reads workbooks written by the spreadsheet export tool: one sheet per
//! player (named after the player id), first row holding the column headers,
//! one draw per row.

use calamine::{open_workbook_auto, Data, Range, Reader};
use std::path::Path;
use tracing::{debug, warn};

use crate::conversion::{MalformedInputError, RowFailure, RowLocation};
use crate::normalize::{self, RawField, SourceRecord};
use crate::record::DrawRecord;
use crate::reference::{SourceField, REQUIRED_COLUMNS, SPREADSHEET_COLUMNS};

/// Extensions handled by this converter (lowercase, without the dot)
pub const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls"];

/// Column index of each mapped field within a sheet
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct ColumnMap {
    columns: Vec<(usize, SourceField)>,
}

impl ColumnMap {
    /// Map header cells to fields. Returns the missing required column names on failure.
    fn from_header<'a>(header: impl Iterator<Item = &'a Data>) -> Result<Self, Vec<String>> {
        let mut columns = Vec::new();
        for (index, cell) in header.enumerate() {
            let Data::String(title) = cell else {
                continue;
            };
            if let Some(field) = SPREADSHEET_COLUMNS.get(title.trim()) {
                if !columns.iter().any(|(_, f)| f == field) {
                    columns.push((index, *field));
                }
            }
        }

        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|name| match SPREADSHEET_COLUMNS.get(**name) {
                Some(field) => !columns.iter().any(|(_, f)| f == field),
                None => true,
            })
            .map(|name| name.to_string())
            .collect();

        if missing.is_empty() {
            Ok(ColumnMap { columns })
        } else {
            Err(missing)
        }
    }
}

/// A sheet whose header carries every required column
#[derive(Debug, Clone)]
struct SheetTable {
    name: String,
    columns: ColumnMap,
    range: Range<Data>,
    /// Spreadsheet row number of the range's first row
    first_row: usize,
}

impl SheetTable {
    fn is_blank_row(&self, row: usize) -> bool {
        (0..self.range.width()).all(|col| {
            self.range
                .get((row, col))
                .map_or(true, |cell| cell_to_raw(cell).is_empty())
        })
    }

    fn source_record(&self, row: usize) -> SourceRecord {
        let mut source = SourceRecord::default();
        for (col, field) in &self.columns.columns {
            let raw = self
                .range
                .get((row, *col))
                .map(cell_to_raw)
                .unwrap_or_default();
            source.set(*field, raw);
        }
        source
    }
}

/// Lazy, single-pass stream of the draws in a workbook, in sheet and row order
#[derive(Debug, Clone)]
pub struct SpreadsheetRecords {
    uid: Option<String>,
    sheets: Vec<SheetTable>,
    sheet: usize,
    row: usize,
}

impl SpreadsheetRecords {
    /// Build the stream from already-loaded sheets, in workbook order
    pub fn from_sheets(sheets: Vec<(String, Range<Data>)>) -> Result<Self, MalformedInputError> {
        let uid = sheets
            .iter()
            .map(|(name, _)| name.trim())
            .find(|name| !name.is_empty() && name.chars().all(|c| c.is_ascii_digit()))
            .map(String::from);

        let mut tables = Vec::new();
        let mut first_missing: Option<Vec<String>> = None;

        for (name, range) in sheets {
            let header = range.rows().next().unwrap_or(&[]);
            match ColumnMap::from_header(header.iter()) {
                Ok(columns) => {
                    debug!("Sheet '{}': {} rows", name, range.height().saturating_sub(1));
                    let first_row = range.start().map_or(1, |(row, _)| row as usize + 1);
                    tables.push(SheetTable {
                        name,
                        columns,
                        range,
                        first_row,
                    });
                }
                Err(missing) => {
                    warn!(
                        "Skipping sheet '{}': missing columns {}",
                        name,
                        missing.join(", ")
                    );
                    first_missing.get_or_insert(missing);
                }
            }
        }

        if tables.is_empty() {
            let missing = first_missing
                .unwrap_or_else(|| REQUIRED_COLUMNS.iter().map(|s| s.to_string()).collect());
            return Err(MalformedInputError::MissingColumns(missing));
        }

        Ok(SpreadsheetRecords {
            uid,
            sheets: tables,
            sheet: 0,
            row: 1,
        })
    }

    /// Player id taken from the first all-digit sheet name
    pub fn uid(&self) -> Option<&str> {
        self.uid.as_deref()
    }
}

impl Iterator for SpreadsheetRecords {
    type Item = Result<DrawRecord, RowFailure>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let table = self.sheets.get(self.sheet)?;
            if self.row >= table.range.height() {
                self.sheet += 1;
                self.row = 1;
                continue;
            }

            let row = self.row;
            self.row += 1;
            if table.is_blank_row(row) {
                continue;
            }

            return Some(
                normalize::normalize(table.source_record(row)).map_err(|error| RowFailure {
                    location: RowLocation::Sheet {
                        sheet: table.name.clone(),
                        row: table.first_row + row,
                    },
                    error,
                }),
            );
        }
    }
}

/// Open a workbook and load every sheet.
///
/// The file is closed before this returns; iteration works on the loaded sheets.
pub fn open(path: &Path) -> Result<SpreadsheetRecords, MalformedInputError> {
    let mut workbook = open_workbook_auto(path)?;
    let loaded = workbook
        .sheet_names()
        .into_iter()
        .map(|name| {
            let range = workbook.worksheet_range(&name);
            (name, range)
        })
        .collect();
    from_loaded_sheets(loaded)
}

/// Keep the sheets that could be read. A read error only fails the file
/// when no sheet was readable at all.
fn from_loaded_sheets(
    loaded: Vec<(String, Result<Range<Data>, calamine::Error>)>,
) -> Result<SpreadsheetRecords, MalformedInputError> {
    let mut sheets = Vec::new();
    let mut first_error = None;
    for (name, range) in loaded {
        match range {
            Ok(range) => sheets.push((name, range)),
            Err(e) => {
                warn!("Skipping sheet '{}': {}", name, e);
                first_error.get_or_insert(e);
            }
        }
    }

    match first_error {
        Some(e) if sheets.is_empty() => Err(MalformedInputError::Workbook(e)),
        _ => SpreadsheetRecords::from_sheets(sheets),
    }
}

/// Interpret a cell without applying any field semantics
fn cell_to_raw(cell: &Data) -> RawField {
    match cell {
        Data::Empty => RawField::Empty,
        Data::Int(n) => RawField::Integer(*n),
        Data::Float(f) => RawField::Float(*f),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => RawField::text(s.as_str()),
        Data::Bool(b) => RawField::Text(b.to_string()),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(RawField::DateTime)
            .unwrap_or(RawField::Float(dt.as_f64())),
        Data::Error(e) => RawField::Text(format!("#{:?}", e)),
    }
}
