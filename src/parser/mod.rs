//! PDF parsing module.

mod backend;
mod layout;
mod table_detector;

pub use backend::{BackendLoader, LopdfBackend, LopdfLoader, PdfBackend};
pub use layout::{group_into_lines, render_page_text, SpanExtractor, TextLine, TextSpan};
pub use table_detector::{DetectedTable, TableDetector, TableDetectorConfig};
