//! Batch runner: locate, convert and write every file of the input directory.
//!
//! A file that cannot be converted is skipped and the run goes on. Only a
//! [`ConfigurationError`] stops a batch; write failures are collected in the
//! summary.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::config::{ConfigurationError, ConversionConfig, Grouping};
use crate::conversion::{collect_records, Conversion, MalformedInputError, RowFailure};
use crate::dictionary;
use crate::locate::{self, Candidate, SkipReason, SkippedFile, SourceFormat};
use crate::output::{OutputWriter, WriteError};
use crate::spreadsheet;

/// A source file that was converted
#[derive(Debug)]
pub struct ConvertedFile {
    pub source: PathBuf,
    pub format: SourceFormat,
    pub uid: Option<String>,
    /// Number of records converted
    pub records: usize,
    /// Rows or entries that were dropped
    pub failures: Vec<RowFailure>,
    /// Output file holding the records, unless writing it failed
    pub output: Option<PathBuf>,
}

#[derive(Debug)]
pub struct FailedWrite {
    /// Source files whose records were meant for this output
    pub sources: Vec<PathBuf>,
    pub output: PathBuf,
    pub error: WriteError,
}

/// Everything a batch did, in file-name order
#[derive(Debug, Default)]
pub struct BatchSummary {
    pub converted: Vec<ConvertedFile>,
    pub skipped: Vec<SkippedFile>,
    pub write_failures: Vec<FailedWrite>,
}

impl BatchSummary {
    /// Total rows dropped across all converted files
    pub fn skipped_rows(&self) -> usize {
        self.converted.iter().map(|f| f.failures.len()).sum()
    }

    /// True when every converted file reached its output
    pub fn is_success(&self) -> bool {
        self.write_failures.is_empty()
    }
}

/// Convert a single located file
pub fn convert_file(
    candidate: &Candidate,
    max_bad_row_ratio: f64,
) -> Result<Conversion, MalformedInputError> {
    let path = &candidate.path;
    let (uid, (records, failures)) = match candidate.format {
        SourceFormat::Spreadsheet => {
            let rows = spreadsheet::open(path)?;
            let uid = rows.uid().map(String::from);
            (uid, collect_records(rows, max_bad_row_ratio)?)
        }
        SourceFormat::JsonDictionary(_) => {
            let rows = dictionary::open(path)?;
            let uid = rows.uid().map(String::from);
            (uid, collect_records(rows, max_bad_row_ratio)?)
        }
    };
    Ok(Conversion {
        uid,
        records,
        failures,
    })
}

/// Run a whole batch as configured
pub fn run_batch(config: &ConversionConfig) -> Result<BatchSummary, ConfigurationError> {
    config.validate()?;
    let scan = locate::locate(&config.input_dir)?;
    prepare_output_dir(&config.output_dir, config.create_output_dir)?;

    info!(
        "Found {} input files in {}",
        scan.candidates.len(),
        config.input_dir.display()
    );

    let mut summary = BatchSummary {
        skipped: scan.skipped,
        ..Default::default()
    };
    let mut writer = OutputWriter::new(&config.output_dir, config.layout);

    let mut converted = Vec::new();
    for candidate in scan.candidates {
        match convert_file(&candidate, config.max_bad_row_ratio) {
            Ok(conversion) => {
                info!(
                    "{}: {} records, {} rows skipped",
                    candidate.path.display(),
                    conversion.records.len(),
                    conversion.failures.len()
                );
                if config.grouping == Grouping::PerFile {
                    write_group(&mut writer, &mut summary, vec![(candidate, conversion)]);
                } else {
                    converted.push((candidate, conversion));
                }
            }
            Err(e) => {
                warn!("Skipping {}: {}", candidate.path.display(), e);
                summary.skipped.push(SkippedFile {
                    path: candidate.path,
                    reason: SkipReason::Malformed(e),
                });
            }
        }
    }

    for group in group_by_uid(converted) {
        write_group(&mut writer, &mut summary, group);
    }

    summary.converted.sort_by(|a, b| a.source.cmp(&b.source));
    summary.skipped.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(summary)
}

fn prepare_output_dir(dir: &Path, create: bool) -> Result<(), ConfigurationError> {
    if dir.is_dir() {
        return Ok(());
    }
    if !create {
        return Err(ConfigurationError::MissingOutputDir(dir.to_path_buf()));
    }
    fs::create_dir_all(dir).map_err(|source| ConfigurationError::OutputDir {
        path: dir.to_path_buf(),
        source,
    })
}

/// Merge conversions sharing a player id, keeping batch order.
/// Files without an id stay on their own.
fn group_by_uid(converted: Vec<(Candidate, Conversion)>) -> Vec<Vec<(Candidate, Conversion)>> {
    let mut groups: Vec<Vec<(Candidate, Conversion)>> = Vec::new();
    for (candidate, conversion) in converted {
        let existing = conversion.uid.as_ref().and_then(|uid| {
            groups
                .iter()
                .position(|g| g.first().and_then(|(_, c)| c.uid.as_ref()) == Some(uid))
        });
        match existing {
            Some(index) => groups[index].push((candidate, conversion)),
            None => groups.push(vec![(candidate, conversion)]),
        }
    }
    groups
}

/// Write one output file for a group of conversions and record the outcome
fn write_group(
    writer: &mut OutputWriter,
    summary: &mut BatchSummary,
    group: Vec<(Candidate, Conversion)>,
) {
    let Some((first, first_conversion)) = group.first() else {
        return;
    };
    let uid = first_conversion.uid.clone();
    let stem = first
        .path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let records: Vec<_> = group
        .iter()
        .flat_map(|(_, c)| c.records.iter().cloned())
        .collect();

    let path = writer.reserve_path(uid.as_deref(), &stem);
    let output = match writer.write(&path, uid.as_deref(), &records) {
        Ok(()) => {
            info!("Wrote {} records to {}", records.len(), path.display());
            Some(path)
        }
        Err(error) => {
            warn!("Cannot write {}: {}", path.display(), error);
            summary.write_failures.push(FailedWrite {
                sources: group.iter().map(|(c, _)| c.path.clone()).collect(),
                output: path,
                error,
            });
            None
        }
    };

    for (candidate, conversion) in group {
        summary.converted.push(ConvertedFile {
            source: candidate.path,
            format: candidate.format,
            uid: conversion.uid,
            records: conversion.records.len(),
            failures: conversion.failures,
            output: output.clone(),
        });
    }
}
