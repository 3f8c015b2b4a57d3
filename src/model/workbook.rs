//! Workbook assembly.

use serde::{Deserialize, Serialize};

use super::Grid;

/// Prefix of every generated sheet name.
pub const SHEET_PREFIX: &str = "Table_";

/// One named sheet holding one grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sheet {
    pub name: String,
    pub rows: Grid,
}

/// An ordered sequence of sheets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    /// Name of the sheet at a 0-based position: `Table_{index + 1}`.
    pub fn sheet_name(index: usize) -> String {
        format!("{}{}", SHEET_PREFIX, index + 1)
    }

    /// Build a workbook with one sheet per grid, named in order.
    pub fn from_grids<I: IntoIterator<Item = Grid>>(grids: I) -> Self {
        let sheets = grids
            .into_iter()
            .enumerate()
            .map(|(i, rows)| Sheet {
                name: Self::sheet_name(i),
                rows,
            })
            .collect();
        Self { sheets }
    }

    /// Detected tables first, then exactly one sheet for the tabularized text.
    pub fn assemble(detected: Vec<Grid>, text_grid: Grid) -> Self {
        Self::from_grids(detected.into_iter().chain(std::iter::once(text_grid)))
    }

    /// Number of sheets.
    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    /// Look up a sheet by name.
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    /// The sheet built from the document text (always the last one).
    pub fn text_sheet(&self) -> Option<&Sheet> {
        self.sheets.last()
    }
}
