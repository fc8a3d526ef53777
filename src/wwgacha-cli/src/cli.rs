//! CLI definitions

use clap::Parser;
use std::path::PathBuf;
use tracing::Level;
use wwgacha::{Grouping, OutputLayout};

/// Top-level shape of the written files
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum LayoutArg {
    /// Bare array of records
    #[default]
    Records,
    /// `info` header plus `list` of records
    Export,
}

impl From<LayoutArg> for OutputLayout {
    fn from(arg: LayoutArg) -> Self {
        match arg {
            LayoutArg::Records => OutputLayout::Records,
            LayoutArg::Export => OutputLayout::Export,
        }
    }
}

/// How converted files map to output files
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum GroupingArg {
    /// One output per input file
    #[default]
    PerFile,
    /// One output per player id
    ByUid,
}

impl From<GroupingArg> for Grouping {
    fn from(arg: GroupingArg) -> Self {
        match arg {
            GroupingArg::PerFile => Grouping::PerFile,
            GroupingArg::ByUid => Grouping::ByUid,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "wwgacha")]
#[command(about = "Convert Wuthering Waves convene records to JSON", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Directory holding the spreadsheet and JSON exports
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Directory receiving the converted files
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Config file (defaults to wwgacha.toml when present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output file layout
    #[arg(long, value_enum)]
    pub layout: Option<LayoutArg>,

    /// Output grouping
    #[arg(long, value_enum)]
    pub grouping: Option<GroupingArg>,

    /// Reject a file when more than this share of its rows fail (0.0 to 1.0)
    #[arg(long)]
    pub max_bad_row_ratio: Option<f64>,

    /// Create the input and output directories, then exit
    #[arg(long)]
    pub init: bool,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Cli {
    pub fn log_level(&self) -> Level {
        if self.quiet {
            return Level::WARN;
        }
        match self.verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    }
}
