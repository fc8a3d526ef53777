//! Conversion settings.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

use crate::output::OutputLayout;

/// Problems that stop a run before any file is converted
#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("input directory {0} does not exist")]
    MissingInputDir(PathBuf),

    #[error("{0} is not a directory")]
    NotADirectory(PathBuf),

    #[error("cannot read input directory {path}: {source}")]
    UnreadableInputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("output directory {0} does not exist")]
    MissingOutputDir(PathBuf),

    #[error("cannot create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("max_bad_row_ratio must be between 0.0 and 1.0, got {0}")]
    InvalidBadRowRatio(f64),

    #[error("invalid config file {path}: {message}")]
    ConfigFile { path: PathBuf, message: String },
}

/// How converted files are split into output files
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Grouping {
    /// One output per input file
    #[default]
    PerFile,
    /// One output per player id, merging files in batch order
    ByUid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConversionConfig {
    /// Directory scanned (non-recursively) for input files
    pub input_dir: PathBuf,
    /// Directory receiving the converted JSON files
    pub output_dir: PathBuf,
    /// Share of failed rows above which a whole file is rejected
    pub max_bad_row_ratio: f64,
    pub layout: OutputLayout,
    pub grouping: Grouping,
    /// Create `output_dir` when it is missing
    pub create_output_dir: bool,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        ConversionConfig {
            input_dir: PathBuf::from("data"),
            output_dir: PathBuf::from("export"),
            max_bad_row_ratio: 0.5,
            layout: OutputLayout::default(),
            grouping: Grouping::default(),
            create_output_dir: true,
        }
    }
}

impl ConversionConfig {
    /// Check values that serde cannot
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if !(0.0..=1.0).contains(&self.max_bad_row_ratio) {
            return Err(ConfigurationError::InvalidBadRowRatio(self.max_bad_row_ratio));
        }
        Ok(())
    }
}
