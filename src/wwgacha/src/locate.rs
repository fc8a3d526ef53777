//! Input discovery.
//!
//! Lists the files of the input directory that one of the converters can
//! handle. Anything else is reported back as skipped, never as an error.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::ConfigurationError;
use crate::conversion::MalformedInputError;
use crate::dictionary::{self, JsonShape, JSON_EXTENSION};
use crate::spreadsheet::SPREADSHEET_EXTENSIONS;

/// Detected format of an input file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Spreadsheet,
    JsonDictionary(JsonShape),
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceFormat::Spreadsheet => f.write_str("spreadsheet"),
            SourceFormat::JsonDictionary(JsonShape::TrackerExport) => {
                f.write_str("tracker export")
            }
            SourceFormat::JsonDictionary(JsonShape::PoolKeyed) => {
                f.write_str("pool-keyed dictionary")
            }
        }
    }
}

/// A file selected for conversion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub path: PathBuf,
    pub format: SourceFormat,
}

/// Why a file was left out of the batch
#[derive(Debug)]
pub enum SkipReason {
    UnsupportedExtension,
    NotAFile,
    Malformed(MalformedInputError),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::UnsupportedExtension => f.write_str("unsupported file type"),
            SkipReason::NotAFile => f.write_str("not a regular file"),
            SkipReason::Malformed(e) => write!(f, "{}", e),
        }
    }
}

#[derive(Debug)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: SkipReason,
}

/// Result of scanning the input directory
#[derive(Debug, Default)]
pub struct Scan {
    /// Convertible files, in file-name order
    pub candidates: Vec<Candidate>,
    pub skipped: Vec<SkippedFile>,
}

/// Scan `dir` (non-recursively) for convertible files
pub fn locate(dir: &Path) -> Result<Scan, ConfigurationError> {
    if !dir.exists() {
        return Err(ConfigurationError::MissingInputDir(dir.to_path_buf()));
    }
    if !dir.is_dir() {
        return Err(ConfigurationError::NotADirectory(dir.to_path_buf()));
    }

    let unreadable = |source| ConfigurationError::UnreadableInputDir {
        path: dir.to_path_buf(),
        source,
    };
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).map_err(unreadable)? {
        paths.push(entry.map_err(unreadable)?.path());
    }
    paths.sort();

    let mut scan = Scan::default();
    for path in paths {
        match classify(&path) {
            Ok(format) => {
                debug!("{}: {}", path.display(), format);
                scan.candidates.push(Candidate { path, format });
            }
            Err(reason) => {
                debug!("{}: skipped ({})", path.display(), reason);
                scan.skipped.push(SkippedFile { path, reason });
            }
        }
    }
    Ok(scan)
}

/// Detect the format of a single file.
///
/// Extension decides first; JSON files must also have a supported shape.
pub fn classify(path: &Path) -> Result<SourceFormat, SkipReason> {
    if !path.is_file() {
        return Err(SkipReason::NotAFile);
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    if SPREADSHEET_EXTENSIONS.contains(&extension.as_str()) {
        return Ok(SourceFormat::Spreadsheet);
    }
    if extension == JSON_EXTENSION {
        let doc = dictionary::read_document(path).map_err(SkipReason::Malformed)?;
        let shape = dictionary::detect_shape(&doc).map_err(SkipReason::Malformed)?;
        return Ok(SourceFormat::JsonDictionary(shape));
    }
    Err(SkipReason::UnsupportedExtension)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(paths: impl IntoIterator<Item = PathBuf>) -> Vec<String> {
        paths
            .into_iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("data");
        assert!(matches!(
            locate(&missing),
            Err(ConfigurationError::MissingInputDir(_))
        ));
    }

    #[test]
    fn test_file_instead_of_directory() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("data");
        fs::write(&file, b"").unwrap();
        assert!(matches!(
            locate(&file),
            Err(ConfigurationError::NotADirectory(_))
        ));
    }

    #[test]
    fn test_classifies_directory_contents() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("b.XLSX"), b"not really a workbook").unwrap();
        fs::write(root.join("a.json"), br#"{"playerId": "1", "pulls": []}"#).unwrap();
        fs::write(root.join("c.json"), br#"{"info": {}, "list": []}"#).unwrap();
        fs::write(root.join("d.json"), b"{").unwrap();
        fs::write(root.join("e.json"), br#"{"1": []}"#).unwrap();
        fs::write(root.join("notes.txt"), b"hello").unwrap();
        fs::create_dir(root.join("nested.json")).unwrap();

        let scan = locate(root).unwrap();

        assert_eq!(
            names(scan.candidates.iter().map(|c| c.path.clone())),
            vec!["a.json", "b.XLSX", "e.json"]
        );
        assert_eq!(
            scan.candidates[0].format,
            SourceFormat::JsonDictionary(JsonShape::TrackerExport)
        );
        assert_eq!(scan.candidates[1].format, SourceFormat::Spreadsheet);
        assert_eq!(
            scan.candidates[2].format,
            SourceFormat::JsonDictionary(JsonShape::PoolKeyed)
        );

        assert_eq!(
            names(scan.skipped.iter().map(|s| s.path.clone())),
            vec!["c.json", "d.json", "nested.json", "notes.txt"]
        );
        assert!(matches!(
            scan.skipped[0].reason,
            SkipReason::Malformed(MalformedInputError::UnsupportedShape(_))
        ));
        assert!(matches!(
            scan.skipped[1].reason,
            SkipReason::Malformed(MalformedInputError::Json(_))
        ));
        assert!(matches!(scan.skipped[2].reason, SkipReason::NotAFile));
        assert!(matches!(
            scan.skipped[3].reason,
            SkipReason::UnsupportedExtension
        ));
    }
}
