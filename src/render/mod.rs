//! Output writers for assembled workbooks.

mod json;
mod xlsx;

pub use json::{to_json, JsonFormat};
pub use xlsx::{validate_sheet_name, write_workbook, SheetWriter, MAX_SHEET_NAME_LEN};
