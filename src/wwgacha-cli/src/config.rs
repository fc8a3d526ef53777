//! Config file loading

use std::fs;
use std::path::{Path, PathBuf};
use wwgacha::{ConfigurationError, ConversionConfig};

use crate::cli::Cli;

/// Looked up in the working directory when no `--config` is given
pub const DEFAULT_CONFIG_FILE: &str = "wwgacha.toml";

/// Load the config file, or defaults when the implicit file does not exist.
///
/// A file named explicitly must exist.
pub fn load(explicit: Option<&Path>) -> Result<ConversionConfig, ConfigurationError> {
    let path = explicit.unwrap_or(Path::new(DEFAULT_CONFIG_FILE));

    if explicit.is_none() && !path.exists() {
        return Ok(ConversionConfig::default());
    }

    let contents = fs::read_to_string(path).map_err(|e| config_error(path, e))?;
    toml::from_str(&contents).map_err(|e| config_error(path, e))
}

fn config_error(path: &Path, e: impl std::fmt::Display) -> ConfigurationError {
    ConfigurationError::ConfigFile {
        path: path.to_path_buf(),
        message: e.to_string(),
    }
}

/// Apply command-line flags on top of the loaded config
pub fn apply_overrides(mut config: ConversionConfig, cli: &Cli) -> ConversionConfig {
    if let Some(input) = &cli.input {
        config.input_dir = input.clone();
    }
    if let Some(output) = &cli.output {
        config.output_dir = output.clone();
    }
    if let Some(layout) = cli.layout {
        config.layout = layout.into();
    }
    if let Some(grouping) = cli.grouping {
        config.grouping = grouping.into();
    }
    if let Some(ratio) = cli.max_bad_row_ratio {
        config.max_bad_row_ratio = ratio;
    }
    config
}

/// Create the configured directories for a first run
pub fn init_dirs(config: &ConversionConfig) -> Result<Vec<PathBuf>, ConfigurationError> {
    let mut created = Vec::new();
    for dir in [&config.input_dir, &config.output_dir] {
        if dir.is_dir() {
            continue;
        }
        fs::create_dir_all(dir).map_err(|source| ConfigurationError::OutputDir {
            path: dir.clone(),
            source,
        })?;
        created.push(dir.clone());
    }
    Ok(created)
}
