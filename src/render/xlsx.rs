//! XLSX workbook writer.
//!
//! Grids are written as plain string cells starting at `A1`: no header row,
//! no index column.

use std::collections::HashSet;
use std::fs::File;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use ooxml_sml::WorkbookBuilder;

use crate::encoding::{clean_cell, InvalidBytes};
use crate::error::{Error, Result, WriteError};
use crate::model::{Grid, Workbook};

/// Longest sheet name a workbook accepts.
pub const MAX_SHEET_NAME_LEN: usize = 31;

const FORBIDDEN_NAME_CHARS: &[char] = &['[', ']', ':', '*', '?', '/', '\\'];

/// Writes sheets into one output file.
///
/// The file is created by [`SheetWriter::create`] and committed by
/// [`SheetWriter::finish`]. Dropping the writer without finishing closes the
/// file and leaves it empty.
pub struct SheetWriter {
    path: PathBuf,
    file: File,
    workbook: WorkbookBuilder,
    names: HashSet<String>,
    policy: InvalidBytes,
}

impl SheetWriter {
    /// Create the output file and an empty workbook.
    pub fn create<P: AsRef<Path>>(path: P, policy: InvalidBytes) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| Error::write(path, e))?;

        Ok(Self {
            path: path.to_path_buf(),
            file,
            workbook: WorkbookBuilder::new(),
            names: HashSet::new(),
            policy,
        })
    }

    /// Output path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of sheets written so far.
    pub fn sheet_count(&self) -> usize {
        self.names.len()
    }

    /// Add one sheet holding `grid`. Empty cells are left blank.
    pub fn write_sheet(&mut self, name: &str, grid: &Grid) -> Result<()> {
        validate_sheet_name(name).map_err(|e| Error::write(&self.path, e))?;
        if !self.names.insert(name.to_lowercase()) {
            return Err(Error::write(
                &self.path,
                WriteError::DuplicateSheetName(name.to_string()),
            ));
        }

        let sheet = self.workbook.add_sheet(name);
        let mut written = 0usize;
        for (row, col, text) in grid.cells() {
            let text = clean_cell(text, self.policy)?;
            sheet.set_cell(&cell_reference(row, col), text.into_owned());
            written += 1;
        }

        log::debug!(
            "Sheet {}: {} rows, {} cells",
            name,
            grid.row_count(),
            written
        );
        Ok(())
    }

    /// Serialize the workbook into the output file and flush it.
    pub fn finish(mut self) -> Result<PathBuf> {
        if self.names.is_empty() {
            return Err(Error::write(
                &self.path,
                WriteError::Backend("workbook has no sheets".to_string()),
            ));
        }

        let mut cursor = Cursor::new(Vec::new());
        self.workbook
            .write(&mut cursor)
            .map_err(|e| Error::write(&self.path, WriteError::Backend(e.to_string())))?;

        self.file
            .write_all(cursor.get_ref())
            .and_then(|_| self.file.sync_all())
            .map_err(|e| Error::write(&self.path, e))?;

        Ok(self.path)
    }
}

/// Write every sheet of `workbook` to `path` and return the path written.
pub fn write_workbook<P: AsRef<Path>>(
    workbook: &Workbook,
    path: P,
    policy: InvalidBytes,
) -> Result<PathBuf> {
    let mut writer = SheetWriter::create(path, policy)?;
    for sheet in &workbook.sheets {
        writer.write_sheet(&sheet.name, &sheet.rows)?;
    }

    let path = writer.finish()?;
    log::info!(
        "Wrote {} sheets to {}",
        workbook.sheet_count(),
        path.display()
    );
    Ok(path)
}

/// Check a sheet name against the workbook naming rules.
pub fn validate_sheet_name(name: &str) -> std::result::Result<(), WriteError> {
    let invalid = |reason: &'static str| WriteError::InvalidSheetName {
        name: name.to_string(),
        reason,
    };

    if name.is_empty() {
        return Err(invalid("name is empty"));
    }
    if name.chars().count() > MAX_SHEET_NAME_LEN {
        return Err(invalid("name is longer than 31 characters"));
    }
    if name.contains(FORBIDDEN_NAME_CHARS) {
        return Err(invalid("name contains one of [ ] : * ? / \\"));
    }
    if name.starts_with('\'') || name.ends_with('\'') {
        return Err(invalid("name starts or ends with an apostrophe"));
    }
    Ok(())
}

/// A1-style reference for a 0-based row and column.
fn cell_reference(row: usize, col: usize) -> String {
    format!("{}{}", column_to_letter(col as u32 + 1), row + 1)
}

/// Convert a 1-based column number to letters (A, B, ..., Z, AA, AB, ...).
fn column_to_letter(mut col: u32) -> String {
    let mut result = String::new();
    while col > 0 {
        col -= 1;
        let c = (b'A' + (col % 26) as u8) as char;
        result.insert(0, c);
        col /= 26;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_reference() {
        assert_eq!(cell_reference(0, 0), "A1");
        assert_eq!(cell_reference(1, 2), "C2");
        assert_eq!(cell_reference(9, 26), "AA10");
        assert_eq!(column_to_letter(52), "AZ");
        assert_eq!(column_to_letter(53), "BA");
    }

    #[test]
    fn test_validate_sheet_name() {
        assert!(validate_sheet_name("Table_1").is_ok());
        assert!(validate_sheet_name(&"x".repeat(31)).is_ok());

        for bad in ["", "a/b", "a[1]", "what?", "x:y", "'quoted'"] {
            assert!(
                matches!(
                    validate_sheet_name(bad),
                    Err(WriteError::InvalidSheetName { .. })
                ),
                "{bad:?} should be rejected"
            );
        }
        assert!(validate_sheet_name(&"x".repeat(32)).is_err());
    }

    #[test]
    fn test_duplicate_sheet_name() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer =
            SheetWriter::create(dir.path().join("dup.xlsx"), InvalidBytes::Drop).unwrap();

        writer.write_sheet("Table_1", &Grid::new()).unwrap();
        let err = writer.write_sheet("TABLE_1", &Grid::new()).unwrap_err();
        assert!(matches!(
            err,
            Error::Write {
                reason: WriteError::DuplicateSheetName(_),
                ..
            }
        ));
    }

    #[test]
    fn test_create_in_missing_directory() {
        let err = SheetWriter::create("/nonexistent/dir/out.xlsx", InvalidBytes::Drop)
            .err()
            .unwrap();
        assert!(matches!(
            err,
            Error::Write {
                reason: WriteError::Io(_),
                ..
            }
        ));
    }

    #[test]
    fn test_unfinished_writer_leaves_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.xlsx");
        {
            let mut writer = SheetWriter::create(&path, InvalidBytes::Drop).unwrap();
            writer
                .write_sheet("Table_1", &Grid::from_iter(vec![vec!["a"]]))
                .unwrap();
        }
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 0);
    }

    #[test]
    fn test_finish_writes_zip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.xlsx");

        let workbook = Workbook::assemble(
            vec![Grid::from_iter(vec![vec!["A", "B"], vec!["1", "2"]])],
            Grid::from_iter(vec![vec!["hello"]]),
        );
        let written = write_workbook(&workbook, &path, InvalidBytes::Drop).unwrap();
        assert_eq!(written, path);

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[0..4], &[0x50, 0x4b, 0x03, 0x04]);
    }

    #[test]
    fn test_strict_policy_rejects_control_characters() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer =
            SheetWriter::create(dir.path().join("strict.xlsx"), InvalidBytes::Error).unwrap();

        let err = writer
            .write_sheet("Table_1", &Grid::from_iter(vec![vec!["bad\u{7}"]]))
            .unwrap_err();
        assert!(matches!(err, Error::Encoding(_)));
    }
}
