//! # pdfsheet
//!
//! Extract tables and tabular text from PDF documents into XLSX workbooks.
//!
//! Two independent passes run over the document: a table detector that
//! finds column-aligned regions on each page, and a text pass that turns
//! every non-blank line into a row, splitting cells on runs of two or more
//! spaces. Each detected table becomes one sheet, followed by exactly one
//! sheet for the text. Sheets are named `Table_1`, `Table_2`, ...
//!
//! ## Quick Start
//!
//! ```no_run
//! fn main() -> pdfsheet::Result<()> {
//!     let report = pdfsheet::convert_file("report.pdf", "report.xlsx")?;
//!     println!("{} sheets", report.sheet_count);
//!     Ok(())
//! }
//! ```
//!
//! ## Stages
//!
//! - [`extract_text`] and [`extract_tables`] read the document through a
//!   [`BackendLoader`]
//! - [`tabularize`] splits text into a [`Grid`]
//! - [`Workbook::assemble`] orders the grids into sheets
//! - [`write_workbook`] writes the XLSX file

pub mod convert;
pub mod detect;
pub mod encoding;
pub mod error;
pub mod extract;
pub mod model;
pub mod parser;
pub mod render;
pub mod tabularize;

// Re-export commonly used types
pub use convert::{
    ConvertOptions, ConvertReport, Converter, LogProgress, NoProgress, Progress,
};
pub use detect::{detect_format_from_bytes, detect_format_from_path, is_pdf, PdfFormat};
pub use encoding::{clean_bytes, clean_cell, InvalidBytes};
pub use error::{DocumentOpenError, Error, Result, WriteError};
pub use extract::{extract_tables, extract_text};
pub use model::{Grid, RawTable, Sheet, Workbook, SHEET_PREFIX};
pub use parser::{
    BackendLoader, LopdfBackend, LopdfLoader, PdfBackend, TableDetector, TableDetectorConfig,
};
pub use render::{to_json, write_workbook, JsonFormat, SheetWriter};
pub use tabularize::tabularize;

use std::path::Path;

/// Convert a PDF file into an XLSX workbook with default options.
///
/// # Example
///
/// ```no_run
/// let report = pdfsheet::convert_file("invoice.pdf", "invoice.xlsx").unwrap();
/// assert!(report.sheet_count >= 1);
/// ```
pub fn convert_file<P: AsRef<Path>, Q: AsRef<Path>>(input: P, output: Q) -> Result<ConvertReport> {
    convert_file_with_options(input, output, ConvertOptions::default())
}

/// Convert a PDF file into an XLSX workbook with custom options.
///
/// Progress messages go to the `log` facade at info level.
///
/// # Example
///
/// ```no_run
/// use pdfsheet::{convert_file_with_options, ConvertOptions, InvalidBytes};
///
/// let options = ConvertOptions::new()
///     .with_invalid_bytes(InvalidBytes::Replace)
///     .with_max_columns(4);
/// convert_file_with_options("scan.pdf", "scan.xlsx", options).unwrap();
/// ```
pub fn convert_file_with_options<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output: Q,
    options: ConvertOptions,
) -> Result<ConvertReport> {
    Converter::new(options).convert(input.as_ref(), output.as_ref(), &LogProgress)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_file_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let result = convert_file("/nonexistent/input.pdf", dir.path().join("out.xlsx"));
        assert!(matches!(result, Err(Error::DocumentOpen { .. })));
    }

    #[test]
    fn test_convert_file_not_a_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("notes.pdf");
        std::fs::write(&input, "<!DOCTYPE html><html></html>").unwrap();

        let result = convert_file(&input, dir.path().join("out.xlsx"));
        assert!(matches!(
            result,
            Err(Error::DocumentOpen {
                reason: DocumentOpenError::NotPdf,
                ..
            })
        ));
    }

    #[test]
    fn test_default_options() {
        let converter = Converter::default();
        assert_eq!(converter.options(), &ConvertOptions::default());
    }
}
