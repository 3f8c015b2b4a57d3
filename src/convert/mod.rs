//! End-to-end conversion of a PDF into a workbook.
//!
//! # Example
//!
//! ```no_run
//! use pdfsheet::convert::{ConvertOptions, Converter, LogProgress};
//! use std::path::Path;
//!
//! fn main() -> pdfsheet::Result<()> {
//!     let converter = Converter::new(ConvertOptions::default());
//!     let report = converter.convert(
//!         Path::new("report.pdf"),
//!         Path::new("report.xlsx"),
//!         &LogProgress,
//!     )?;
//!     println!("{} sheets written", report.sheet_count);
//!     Ok(())
//! }
//! ```

use std::path::{Path, PathBuf};

use crate::encoding::InvalidBytes;
use crate::error::Result;
use crate::extract::{extract_tables, extract_text};
use crate::model::Workbook;
use crate::parser::{BackendLoader, LopdfLoader, TableDetectorConfig};
use crate::render::write_workbook;
use crate::tabularize::tabularize;

/// Reported before the text stage.
pub const MSG_EXTRACTING_TEXT: &str = "Extracting text-based tables...";
/// Reported before the table detection stage.
pub const MSG_EXTRACTING_TABLES: &str = "Extracting embedded tables...";
/// Reported before the workbook is written.
pub const MSG_SAVING: &str = "Saving to Excel...";
/// Reported after the workbook file is closed.
pub const MSG_COMPLETE: &str = "Table extraction complete";

/// Receives human-readable progress messages.
pub trait Progress {
    /// Called once per stage boundary.
    fn message(&self, message: &str);
}

/// Progress sink that logs at info level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogProgress;

impl Progress for LogProgress {
    fn message(&self, message: &str) {
        log::info!("{}", message);
    }
}

/// Progress sink that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl Progress for NoProgress {
    fn message(&self, _message: &str) {}
}

/// Options for document conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertOptions {
    /// Handling of bytes and characters that cannot be stored as sheet text
    pub invalid_bytes: InvalidBytes,

    /// Table detector tuning
    pub detector: TableDetectorConfig,

    /// Whether to run table detection at all
    pub detect_tables: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            invalid_bytes: InvalidBytes::default(),
            detector: TableDetectorConfig::default(),
            detect_tables: true,
        }
    }
}

impl ConvertOptions {
    /// Create new conversion options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the invalid-bytes policy.
    pub fn with_invalid_bytes(mut self, policy: InvalidBytes) -> Self {
        self.invalid_bytes = policy;
        self
    }

    /// Set the table detector configuration.
    pub fn with_detector(mut self, config: TableDetectorConfig) -> Self {
        self.detector = config;
        self
    }

    /// Enable or disable table detection.
    pub fn with_table_detection(mut self, enabled: bool) -> Self {
        self.detect_tables = enabled;
        self
    }

    /// Limit the number of columns a detected table may have.
    pub fn with_max_columns(mut self, max_columns: usize) -> Self {
        self.detector.max_columns = max_columns;
        self
    }
}

/// Summary of a finished conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertReport {
    /// Path of the written workbook
    pub output: PathBuf,

    /// Number of sheets that came from detected tables
    pub detected_tables: usize,

    /// Rows in the tabularized-text sheet
    pub text_rows: usize,

    /// Total sheets written
    pub sheet_count: usize,
}

/// Runs the extraction stages and writes the workbook.
pub struct Converter {
    loader: Box<dyn BackendLoader>,
    options: ConvertOptions,
}

impl Converter {
    /// Create a converter using the lopdf backend.
    pub fn new(options: ConvertOptions) -> Self {
        let loader = LopdfLoader::new()
            .with_invalid_bytes(options.invalid_bytes)
            .with_detector_config(options.detector.clone());
        Self::with_loader(Box::new(loader), options)
    }

    /// Create a converter with a custom backend loader.
    pub fn with_loader(loader: Box<dyn BackendLoader>, options: ConvertOptions) -> Self {
        Self { loader, options }
    }

    /// Conversion options in effect.
    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    /// Run the extraction stages and assemble the workbook without writing it.
    ///
    /// The document is opened once for text and once more for tables.
    pub fn assemble(&self, input: &Path, progress: &dyn Progress) -> Result<Workbook> {
        progress.message(MSG_EXTRACTING_TEXT);
        let text = extract_text(self.loader.as_ref(), input)?;
        let text_grid = tabularize(&text);

        let detected = if self.options.detect_tables {
            progress.message(MSG_EXTRACTING_TABLES);
            extract_tables(self.loader.as_ref(), input)?
        } else {
            log::info!("Table detection disabled, writing text sheet only");
            Vec::new()
        };

        Ok(Workbook::assemble(detected, text_grid))
    }

    /// Convert `input` into a workbook at `output`.
    pub fn convert(
        &self,
        input: &Path,
        output: &Path,
        progress: &dyn Progress,
    ) -> Result<ConvertReport> {
        let workbook = self.assemble(input, progress)?;

        progress.message(MSG_SAVING);
        let output = write_workbook(&workbook, output, self.options.invalid_bytes)?;
        progress.message(MSG_COMPLETE);

        let sheet_count = workbook.sheet_count();
        Ok(ConvertReport {
            output,
            detected_tables: sheet_count.saturating_sub(1),
            text_rows: workbook.text_sheet().map_or(0, |s| s.rows.row_count()),
            sheet_count,
        })
    }
}

impl Default for Converter {
    fn default() -> Self {
        Self::new(ConvertOptions::default())
    }
}
