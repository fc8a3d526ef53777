//! Output writer.
//!
//! Serializes draw records as pretty-printed JSON and persists them through a
//! temporary file, so a destination file is either complete or absent.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::record::{DrawRecord, OUTPUT_TIME_FORMAT};
use crate::reference::{EXPORT_APP, EXPORT_APP_VERSION, EXPORT_VERSION, UNKNOWN_UID};

#[derive(Error, Debug)]
pub enum WriteError {
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("cannot write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Top-level shape of an output file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputLayout {
    /// A bare array of draw records
    #[default]
    Records,
    /// `{"info": {...}, "list": [...]}` as read by the import tool
    Export,
}

/// Header block of the export layout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportInfo {
    pub export_time: String,
    pub export_app: String,
    pub export_app_version: String,
    pub export_timestamp: i64,
    pub version: String,
    pub uid: String,
}

impl ExportInfo {
    pub fn new(uid: Option<&str>, exported_at: DateTime<Local>) -> Self {
        ExportInfo {
            export_time: exported_at.format(OUTPUT_TIME_FORMAT).to_string(),
            export_app: EXPORT_APP.to_string(),
            export_app_version: EXPORT_APP_VERSION.to_string(),
            export_timestamp: exported_at.timestamp(),
            version: EXPORT_VERSION.to_string(),
            uid: uid.unwrap_or(UNKNOWN_UID).to_string(),
        }
    }
}

#[derive(Serialize)]
struct ExportDocument<'a> {
    info: &'a ExportInfo,
    list: &'a [DrawRecord],
}

/// Render records in the given layout: four-space indent, trailing newline
pub fn render(
    records: &[DrawRecord],
    layout: OutputLayout,
    info: &ExportInfo,
) -> Result<Vec<u8>, serde_json::Error> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    match layout {
        OutputLayout::Records => records.serialize(&mut serializer)?,
        OutputLayout::Export => ExportDocument {
            info,
            list: records,
        }
        .serialize(&mut serializer)?,
    }
    buf.push(b'\n');
    Ok(buf)
}

/// Write `data` to `path` through a temporary file in the same directory
pub fn write_atomic(path: &Path, data: &[u8]) -> Result<(), WriteError> {
    let io_error = |source| WriteError::Io {
        path: path.to_path_buf(),
        source,
    };
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file = NamedTempFile::new_in(dir).map_err(io_error)?;
    file.write_all(data).map_err(io_error)?;
    file.as_file().sync_all().map_err(io_error)?;
    file.persist(path).map_err(|e| io_error(e.error))?;
    Ok(())
}

/// Writes output files into one directory, never reusing a name within a run
#[derive(Debug)]
pub struct OutputWriter {
    dir: PathBuf,
    layout: OutputLayout,
    used_names: HashSet<String>,
}

impl OutputWriter {
    pub fn new(dir: impl Into<PathBuf>, layout: OutputLayout) -> Self {
        OutputWriter {
            dir: dir.into(),
            layout,
            used_names: HashSet::new(),
        }
    }

    /// Reserve the output path for a group: `export_<uid>.json`, falling back to
    /// the source file stem, with a numeric suffix on repeats
    pub fn reserve_path(&mut self, uid: Option<&str>, source_stem: &str) -> PathBuf {
        let base = format!("export_{}", sanitize(uid.unwrap_or(source_stem)));
        let mut name = format!("{}.json", base);
        let mut n = 2;
        while self.used_names.contains(&name) {
            name = format!("{}_{}.json", base, n);
            n += 1;
        }
        self.used_names.insert(name.clone());
        self.dir.join(name)
    }

    /// Serialize records and write them to a reserved path
    pub fn write(
        &self,
        path: &Path,
        uid: Option<&str>,
        records: &[DrawRecord],
    ) -> Result<(), WriteError> {
        let info = ExportInfo::new(uid, Local::now());
        let data = render(records, self.layout, &info)?;
        write_atomic(path, &data)
    }
}

/// Keep file names portable: anything but ASCII alphanumerics, `-` and `_` becomes `_`
fn sanitize(s: &str) -> String {
    let cleaned: String = s
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        UNKNOWN_UID.to_string()
    } else {
        cleaned
    }
}
