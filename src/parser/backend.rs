//! PDF backend abstraction layer.
//!
//! The extraction stages only see [`PdfBackend`] and [`BackendLoader`]; the
//! concrete PDF library (lopdf) stays behind [`LopdfBackend`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use lopdf::{Document as LopdfDocument, ObjectId};

use crate::detect::{detect_format_from_path, PdfFormat};
use crate::encoding::InvalidBytes;
use crate::error::{DocumentOpenError, Error, Result};
use crate::model::RawTable;

use super::layout::{render_page_text, SpanExtractor, TextSpan};
use super::table_detector::{TableDetector, TableDetectorConfig};

/// An opened PDF document.
///
/// A handle is owned by the call that opened it and released when dropped.
pub trait PdfBackend {
    /// 1-based page numbers in document order.
    fn page_numbers(&self) -> Vec<u32>;

    /// Text of one page; lines separated by `\n`.
    fn page_text(&self, page: u32) -> Result<String>;

    /// Tables detected on one page, in detection order.
    fn page_tables(&self, page: u32) -> Result<Vec<RawTable>>;
}

/// Opens documents by path.
pub trait BackendLoader {
    /// Open the document at `path`, failing with [`Error::DocumentOpen`].
    fn load(&self, path: &Path) -> Result<Box<dyn PdfBackend>>;
}

/// Concrete [`PdfBackend`] backed by `lopdf::Document`.
pub struct LopdfBackend {
    doc: LopdfDocument,
    path: PathBuf,
    format: PdfFormat,
    pages: BTreeMap<u32, ObjectId>,
    invalid_bytes: InvalidBytes,
    detector: TableDetector,
}

impl LopdfBackend {
    /// Load from a file path with default settings.
    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::load_file_with(path, InvalidBytes::default(), TableDetectorConfig::default())
    }

    /// Load from a file path.
    ///
    /// The header is checked before parsing so that non-PDF input fails with
    /// [`DocumentOpenError::NotPdf`] rather than a parser message.
    pub fn load_file_with<P: AsRef<Path>>(
        path: P,
        invalid_bytes: InvalidBytes,
        detector: TableDetectorConfig,
    ) -> Result<Self> {
        let path = path.as_ref();
        let format = detect_format_from_path(path).map_err(|e| Error::open(path, e))?;

        let doc = LopdfDocument::load(path).map_err(|e| Error::open(path, e))?;
        if doc.is_encrypted() {
            return Err(Error::open(path, DocumentOpenError::Encrypted));
        }

        let pages = doc.get_pages();
        log::debug!(
            "Opened {} ({}, {} pages)",
            path.display(),
            format,
            pages.len()
        );

        Ok(Self {
            doc,
            path: path.to_path_buf(),
            format,
            pages,
            invalid_bytes,
            detector: TableDetector::with_config(detector),
        })
    }

    /// Header information of the loaded file.
    pub fn format(&self) -> &PdfFormat {
        &self.format
    }

    /// Number of pages.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Path the document was loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn page_spans(&self, page: u32) -> Result<Vec<TextSpan>> {
        let page_id = self.pages.get(&page).ok_or_else(|| {
            Error::open(
                &self.path,
                DocumentOpenError::Parse(format!(
                    "page {} is out of range (document has {} pages)",
                    page,
                    self.pages.len()
                )),
            )
        })?;

        SpanExtractor::new(&self.doc, self.invalid_bytes).page_spans(*page_id)
    }
}

impl PdfBackend for LopdfBackend {
    fn page_numbers(&self) -> Vec<u32> {
        self.pages.keys().copied().collect()
    }

    fn page_text(&self, page: u32) -> Result<String> {
        let spans = self.page_spans(page)?;
        Ok(render_page_text(
            &spans,
            self.detector.config().y_tolerance_factor,
        ))
    }

    fn page_tables(&self, page: u32) -> Result<Vec<RawTable>> {
        let spans = self.page_spans(page)?;
        let tables = self.detector.extract_tables(&spans);
        log::debug!("Page {}: {} tables detected", page, tables.len());
        Ok(tables)
    }
}

/// Loader producing [`LopdfBackend`] handles.
#[derive(Debug, Clone, Default)]
pub struct LopdfLoader {
    invalid_bytes: InvalidBytes,
    detector: TableDetectorConfig,
}

impl LopdfLoader {
    /// Create a loader with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the policy for undecodable string bytes.
    pub fn with_invalid_bytes(mut self, policy: InvalidBytes) -> Self {
        self.invalid_bytes = policy;
        self
    }

    /// Set the table detector configuration.
    pub fn with_detector_config(mut self, config: TableDetectorConfig) -> Self {
        self.detector = config;
        self
    }
}

impl BackendLoader for LopdfLoader {
    fn load(&self, path: &Path) -> Result<Box<dyn PdfBackend>> {
        let backend =
            LopdfBackend::load_file_with(path, self.invalid_bytes, self.detector.clone())?;
        Ok(Box::new(backend))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_missing_file() {
        let result = LopdfLoader::new().load(Path::new("/nonexistent/input.pdf"));
        assert!(matches!(
            result,
            Err(Error::DocumentOpen {
                reason: DocumentOpenError::Io(_),
                ..
            })
        ));
    }

    #[test]
    fn test_load_not_a_pdf() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"Name,Age\nAlice,30\n").unwrap();

        let result = LopdfBackend::load_file(file.path());
        assert!(matches!(
            result,
            Err(Error::DocumentOpen {
                reason: DocumentOpenError::NotPdf,
                ..
            })
        ));
    }

    #[test]
    fn test_load_truncated_pdf() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"%PDF-1.7\n1 0 obj\n<< /Type").unwrap();

        let result = LopdfBackend::load_file(file.path());
        assert!(matches!(result, Err(Error::DocumentOpen { .. })));
    }
}
