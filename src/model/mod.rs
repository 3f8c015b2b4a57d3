//! Data model shared by the extraction stages and the writers.
//!
//! Detected tables and tabularized text both end up as a [`Grid`]; the
//! ordered list of grids becomes a [`Workbook`] of `Table_N` sheets.

mod grid;
mod workbook;

pub use grid::{Grid, RawTable};
pub use workbook::{Sheet, Workbook, SHEET_PREFIX};
