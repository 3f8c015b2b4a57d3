//! Error types for pdfsheet library.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias for pdfsheet operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while converting a PDF to a workbook.
#[derive(Error, Debug)]
pub enum Error {
    /// The input document could not be opened, read, or parsed.
    #[error("Cannot open {}: {reason}", path.display())]
    DocumentOpen {
        path: PathBuf,
        #[source]
        reason: DocumentOpenError,
    },

    /// The output workbook could not be written.
    #[error("Cannot write {}: {reason}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        reason: WriteError,
    },

    /// Text could not be cleaned under the strict invalid-bytes policy.
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Error during rendering (JSON).
    #[error("Rendering error: {0}")]
    Render(String),
}

impl Error {
    pub(crate) fn open(path: &Path, reason: impl Into<DocumentOpenError>) -> Self {
        Error::DocumentOpen {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }

    pub(crate) fn write(path: &Path, reason: impl Into<WriteError>) -> Self {
        Error::Write {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }
}

/// Why an input document could not be opened.
#[derive(Error, Debug)]
pub enum DocumentOpenError {
    /// I/O error when reading the file.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The file does not start with a PDF header.
    #[error("not a valid PDF")]
    NotPdf,

    /// The PDF header names a version we do not accept.
    #[error("unsupported PDF version: {0}")]
    UnsupportedVersion(String),

    /// The PDF document is encrypted.
    #[error("document is encrypted")]
    Encrypted,

    /// The PDF structure could not be parsed.
    #[error("PDF parsing error: {0}")]
    Parse(String),
}

impl From<lopdf::Error> for DocumentOpenError {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => DocumentOpenError::Io(e),
            lopdf::Error::Decryption(_) => DocumentOpenError::Encrypted,
            _ => DocumentOpenError::Parse(err.to_string()),
        }
    }
}

/// Why an output workbook could not be written.
#[derive(Error, Debug)]
pub enum WriteError {
    /// I/O error when creating or writing the file.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Sheet name violates the spreadsheet naming rules.
    #[error("invalid sheet name '{name}': {reason}")]
    InvalidSheetName { name: String, reason: &'static str },

    /// Two sheets share a name (compared case-insensitively).
    #[error("duplicate sheet name '{0}'")]
    DuplicateSheetName(String),

    /// The workbook serializer rejected the data.
    #[error("XLSX serialization failed: {0}")]
    Backend(String),
}
