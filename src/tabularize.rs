//! Heuristic conversion of free text into a grid.
//!
//! Every non-blank line becomes a row; runs of two or more whitespace
//! characters separate cells. Rows are not padded, so a paragraph line and a
//! tabular line can sit next to each other with different widths.

use std::sync::OnceLock;

use regex::Regex;

use crate::model::Grid;

fn cell_separator() -> &'static Regex {
    static SEPARATOR: OnceLock<Regex> = OnceLock::new();
    SEPARATOR.get_or_init(|| Regex::new(r"\s{2,}").expect("cell separator pattern is valid"))
}

/// Split text into rows and cells.
///
/// Lines are trimmed and blank lines dropped. A single space never splits a
/// cell. Cell text is kept exactly as extracted; characters a sheet cannot
/// hold are handled by the writer.
pub fn tabularize(text: &str) -> Grid {
    let separator = cell_separator();
    let mut grid = Grid::new();

    for line in text.split('\n') {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        grid.push_row(separator.split(line).map(str::to_string).collect());
    }

    log::debug!("Tabularized text into {} rows", grid.row_count());
    grid
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(text: &str) -> Vec<Vec<String>> {
        tabularize(text).rows
    }

    #[test]
    fn test_single_space_does_not_split() {
        assert_eq!(rows("foo bar"), vec![vec!["foo bar"]]);
    }

    #[test]
    fn test_double_space_splits() {
        assert_eq!(rows("foo  bar"), vec![vec!["foo", "bar"]]);
        assert_eq!(rows("foo \t bar"), vec![vec!["foo", "bar"]]);
        assert_eq!(rows("a     b  c"), vec![vec!["a", "b", "c"]]);
    }

    #[test]
    fn test_blank_lines_dropped() {
        assert_eq!(rows("a\n\n   \nb"), vec![vec!["a"], vec!["b"]]);
        assert!(rows("").is_empty());
        assert!(rows("\n \t\n").is_empty());
    }

    #[test]
    fn test_lines_are_trimmed() {
        assert_eq!(rows("   Name    Age   \r"), vec![vec!["Name", "Age"]]);
    }

    #[test]
    fn test_rows_are_not_padded() {
        let grid = tabularize("X  Y\nhello\n1  2  3");
        assert_eq!(
            grid.rows,
            vec![vec!["X", "Y"], vec!["hello"], vec!["1", "2", "3"]]
        );
        assert_eq!(grid.max_columns(), 3);
    }

    #[test]
    fn test_cell_text_kept_as_extracted() {
        assert_eq!(rows("a\u{1}b  c"), vec![vec!["a\u{1}b", "c"]]);
        assert_eq!(rows("x\u{FFFD}y"), vec![vec!["x\u{FFFD}y"]]);
    }

    #[test]
    fn test_unicode_text() {
        assert_eq!(rows("이름  나이\n홍길동  30"), vec![vec!["이름", "나이"], vec!["홍길동", "30"]]);
    }
}
