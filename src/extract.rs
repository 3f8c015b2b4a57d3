//! Extraction stages.
//!
//! Each stage opens the document through the loader it is given and drops
//! the handle before returning, on success and on error alike.

use std::path::Path;

use crate::error::Result;
use crate::model::Grid;
use crate::parser::BackendLoader;

/// Extract the text of every page, joined with a single newline.
pub fn extract_text(loader: &dyn BackendLoader, path: &Path) -> Result<String> {
    let backend = loader.load(path)?;

    let pages = backend
        .page_numbers()
        .into_iter()
        .map(|page| backend.page_text(page))
        .collect::<Result<Vec<_>>>()?;

    log::info!("Extracted text from {} pages", pages.len());
    Ok(pages.join("\n"))
}

/// Extract every detected table as a grid, in page order and then
/// detection order within a page.
pub fn extract_tables(loader: &dyn BackendLoader, path: &Path) -> Result<Vec<Grid>> {
    let backend = loader.load(path)?;

    let mut grids = Vec::new();
    for page in backend.page_numbers() {
        for raw in backend.page_tables(page)? {
            grids.push(Grid::from_raw(raw));
        }
    }

    log::info!("Detected {} tables", grids.len());
    Ok(grids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DocumentOpenError, Error};
    use crate::model::RawTable;
    use crate::parser::PdfBackend;
    use std::collections::BTreeMap;

    struct FakeBackend {
        pages: BTreeMap<u32, (String, Vec<RawTable>)>,
    }

    impl PdfBackend for FakeBackend {
        fn page_numbers(&self) -> Vec<u32> {
            self.pages.keys().copied().collect()
        }

        fn page_text(&self, page: u32) -> Result<String> {
            Ok(self.pages[&page].0.clone())
        }

        fn page_tables(&self, page: u32) -> Result<Vec<RawTable>> {
            Ok(self.pages[&page].1.clone())
        }
    }

    struct FakeLoader(Vec<(String, Vec<RawTable>)>);

    impl BackendLoader for FakeLoader {
        fn load(&self, _path: &Path) -> Result<Box<dyn PdfBackend>> {
            let pages = (1u32..).zip(self.0.iter().cloned()).collect();
            Ok(Box::new(FakeBackend { pages }))
        }
    }

    struct MissingLoader;

    impl BackendLoader for MissingLoader {
        fn load(&self, path: &Path) -> Result<Box<dyn PdfBackend>> {
            Err(Error::open(path, DocumentOpenError::NotPdf))
        }
    }

    fn raw(rows: &[&[Option<&str>]]) -> RawTable {
        RawTable::new(
            rows.iter()
                .map(|r| r.iter().map(|c| c.map(str::to_string)).collect())
                .collect(),
        )
    }

    #[test]
    fn test_extract_text_joins_pages() {
        let loader = FakeLoader(vec![
            ("first page".to_string(), vec![]),
            ("second  page".to_string(), vec![]),
        ]);
        let text = extract_text(&loader, Path::new("doc.pdf")).unwrap();
        assert_eq!(text, "first page\nsecond  page");
    }

    #[test]
    fn test_extract_text_empty_document() {
        let loader = FakeLoader(vec![]);
        assert_eq!(extract_text(&loader, Path::new("doc.pdf")).unwrap(), "");
    }

    #[test]
    fn test_extract_tables_order_and_none_cells() {
        let loader = FakeLoader(vec![
            (
                String::new(),
                vec![
                    raw(&[&[Some("A"), Some("B")]]),
                    raw(&[&[Some("C"), None]]),
                ],
            ),
            (String::new(), vec![]),
            (String::new(), vec![raw(&[&[None, Some("D")]])]),
        ]);

        let grids = extract_tables(&loader, Path::new("doc.pdf")).unwrap();
        assert_eq!(grids.len(), 3);
        assert_eq!(grids[0].rows, vec![vec!["A", "B"]]);
        assert_eq!(grids[1].rows, vec![vec!["C", ""]]);
        assert_eq!(grids[2].rows, vec![vec!["", "D"]]);
    }

    #[test]
    fn test_open_failure_propagates() {
        let err = extract_text(&MissingLoader, Path::new("nope.pdf")).unwrap_err();
        assert!(matches!(err, Error::DocumentOpen { .. }));

        let err = extract_tables(&MissingLoader, Path::new("nope.pdf")).unwrap_err();
        assert!(matches!(err, Error::DocumentOpen { .. }));
    }
}
