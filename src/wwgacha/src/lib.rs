//! # wwgacha
//!
//! Wuthering Waves convene record converter library.
//!
//! This library provides functionality to:
//! - Find spreadsheet and tracker JSON exports in a directory
//! - Convert their rows and entries into canonical draw records
//! - Write the records as JSON for the import tool
//!
//! ## Example
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = wwgacha::ConversionConfig::default();
//! let summary = wwgacha::run_batch(&config)?;
//!
//! for file in &summary.converted {
//!     println!("{}: {} records", file.source.display(), file.records);
//! }
//! for skipped in &summary.skipped {
//!     println!("skipped {}: {}", skipped.path.display(), skipped.reason);
//! }
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod config;
pub mod conversion;
pub mod dictionary;
pub mod locate;
pub mod normalize;
pub mod output;
pub mod record;
pub mod reference;
pub mod spreadsheet;

// Re-export commonly used items
#[doc(inline)]
pub use batch::{convert_file, run_batch, BatchSummary, ConvertedFile, FailedWrite};
#[doc(inline)]
pub use config::{ConfigurationError, ConversionConfig, Grouping};
#[doc(inline)]
pub use conversion::{Conversion, MalformedInputError, RowFailure, RowLocation};
#[doc(inline)]
pub use locate::{locate, Candidate, Scan, SkipReason, SkippedFile, SourceFormat};
#[doc(inline)]
pub use normalize::{normalize, FieldMappingError, RawField, SourceRecord};
#[doc(inline)]
pub use output::{OutputLayout, OutputWriter, WriteError};
#[doc(inline)]
pub use record::{CardPoolType, DrawRecord};

// Input formats
#[doc(inline)]
pub use dictionary::{DictionaryRecords, JsonShape};
#[doc(inline)]
pub use spreadsheet::SpreadsheetRecords;
