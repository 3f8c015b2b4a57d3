//! Table detection using text position analysis (Stream mode algorithm).
//!
//! Detects tables by analyzing text alignment patterns without relying on
//! ruling lines: rows come from shared baselines, columns from left edges
//! that line up across rows.

use std::collections::{HashMap, HashSet};

use crate::model::RawTable;

use super::layout::{group_into_lines, TextLine, TextSpan};

/// Width of the buckets left edges are grouped into (points).
const EDGE_BUCKET: f32 = 5.0;
/// How far a span may sit from a column edge and still count as aligned.
const ALIGN_TOLERANCE: f32 = 5.0;
/// Slack allowed for spans starting slightly before their column edge.
const COLUMN_SLACK: f32 = 10.0;

/// A detected table region.
#[derive(Debug, Clone)]
pub struct DetectedTable {
    /// Detected column boundaries (left edges, X coordinates)
    pub columns: Vec<f32>,
    /// Right boundary of the table
    pub right_x: f32,
    /// Rows of text spans, top to bottom
    pub rows: Vec<TextLine>,
}

/// Table detector configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct TableDetectorConfig {
    /// Minimum number of rows to consider as table
    pub min_rows: usize,
    /// Minimum number of columns to consider as table
    pub min_columns: usize,
    /// Maximum number of columns (above this, likely word-level splitting)
    pub max_columns: usize,
    /// Y tolerance for grouping spans into rows (fraction of font size)
    pub y_tolerance_factor: f32,
    /// Minimum column alignment ratio (0.0-1.0)
    pub min_alignment_ratio: f32,
    /// Minimum gap between columns (points)
    pub min_column_gap: f32,
}

impl Default for TableDetectorConfig {
    fn default() -> Self {
        Self {
            min_rows: 2,
            min_columns: 2,
            max_columns: 6,
            y_tolerance_factor: 0.4,
            min_alignment_ratio: 0.3,
            min_column_gap: 15.0,
        }
    }
}

/// Detects tables in the text spans of one page.
#[derive(Debug, Clone, Default)]
pub struct TableDetector {
    config: TableDetectorConfig,
}

impl TableDetector {
    /// Create a new table detector with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new table detector with custom configuration.
    pub fn with_config(config: TableDetectorConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    pub fn config(&self) -> &TableDetectorConfig {
        &self.config
    }

    /// Detect tables and convert them to raw grids, top of the page first.
    pub fn extract_tables(&self, spans: &[TextSpan]) -> Vec<RawTable> {
        self.detect(spans)
            .iter()
            .map(|table| self.to_raw_table(table))
            .collect()
    }

    /// Detect table regions in the given spans.
    pub fn detect(&self, spans: &[TextSpan]) -> Vec<DetectedTable> {
        let cfg = &self.config;
        log::debug!("TableDetector: starting with {} spans", spans.len());

        if spans.len() < cfg.min_rows * cfg.min_columns {
            log::debug!(
                "TableDetector: not enough spans ({} < {})",
                spans.len(),
                cfg.min_rows * cfg.min_columns
            );
            return vec![];
        }

        let rows = group_into_lines(spans, cfg.y_tolerance_factor);
        if rows.len() < cfg.min_rows {
            log::debug!("TableDetector: not enough rows ({})", rows.len());
            return vec![];
        }

        let columns = self.detect_columns(&rows);
        log::debug!(
            "TableDetector: detected {} columns at positions: {:?}",
            columns.len(),
            columns
        );
        if columns.len() < cfg.min_columns {
            return vec![];
        }

        let mut detected = Vec::new();
        for (start, end) in self.find_table_regions(&rows, &columns) {
            let table_rows = rows[start..=end].to_vec();

            // Re-detect columns for this specific table region
            let table_columns = self.detect_columns(&table_rows);
            if table_columns.len() < cfg.min_columns {
                continue;
            }
            if table_columns.len() > cfg.max_columns {
                log::debug!(
                    "TableDetector: skipping region, too many columns ({} > {})",
                    table_columns.len(),
                    cfg.max_columns
                );
                continue;
            }
            if self.is_list_pattern(&table_rows, &table_columns) {
                log::debug!("TableDetector: skipping region, detected as list pattern");
                continue;
            }

            let right_x = table_rows
                .iter()
                .flat_map(|r| r.spans.iter())
                .map(TextSpan::right)
                .fold(f32::MIN, f32::max);

            detected.push(DetectedTable {
                columns: table_columns,
                right_x,
                rows: table_rows,
            });
        }

        log::debug!("TableDetector: found {} tables", detected.len());
        detected
    }

    /// Detect column boundaries from text left edges.
    ///
    /// Prefers rows with two or more spans (likely table rows); falls back to
    /// every row when too few of those exist.
    fn detect_columns(&self, rows: &[TextLine]) -> Vec<f32> {
        let multi_span_rows: Vec<&TextLine> =
            rows.iter().filter(|r| r.spans.len() >= 2).collect();

        let mut edge_counts: HashMap<i32, usize> = HashMap::new();
        let considered = if multi_span_rows.len() >= self.config.min_rows {
            // Count each bucket once per row
            for row in &multi_span_rows {
                let buckets: HashSet<i32> = row
                    .spans
                    .iter()
                    .map(|s| (s.x / EDGE_BUCKET).round() as i32)
                    .collect();
                for bucket in buckets {
                    *edge_counts.entry(bucket).or_insert(0) += 1;
                }
            }
            multi_span_rows.len()
        } else {
            for span in rows.iter().flat_map(|r| r.spans.iter()) {
                *edge_counts
                    .entry((span.x / EDGE_BUCKET).round() as i32)
                    .or_insert(0) += 1;
            }
            rows.len()
        };

        let min_occurrences =
            ((considered as f32 * self.config.min_alignment_ratio) as usize).max(2);

        let mut edges: Vec<f32> = edge_counts
            .iter()
            .filter(|(_, count)| **count >= min_occurrences)
            .map(|(bucket, _)| *bucket as f32 * EDGE_BUCKET)
            .collect();
        edges.sort_by(|a, b| a.total_cmp(b));

        // Merge close edges
        let mut merged: Vec<f32> = Vec::new();
        for edge in edges {
            match merged.last() {
                Some(last) if edge - last < self.config.min_column_gap => {}
                _ => merged.push(edge),
            }
        }
        merged
    }

    /// Find contiguous row ranges whose spans align with the columns.
    fn find_table_regions(&self, rows: &[TextLine], columns: &[f32]) -> Vec<(usize, usize)> {
        let mut regions = Vec::new();
        let mut current_start: Option<usize> = None;

        for (i, row) in rows.iter().enumerate() {
            if self.alignment_score(row, columns) >= self.config.min_alignment_ratio {
                current_start.get_or_insert(i);
            } else if let Some(start) = current_start.take() {
                if i - start >= self.config.min_rows {
                    regions.push((start, i - 1));
                }
            }
        }

        if let Some(start) = current_start {
            if rows.len() - start >= self.config.min_rows {
                regions.push((start, rows.len() - 1));
            }
        }

        regions
    }

    /// Fraction of a row's spans that start on a column edge.
    fn alignment_score(&self, row: &TextLine, columns: &[f32]) -> f32 {
        if row.spans.is_empty() || columns.is_empty() {
            return 0.0;
        }

        let aligned = row
            .spans
            .iter()
            .filter(|span| columns.iter().any(|col| (span.x - col).abs() <= ALIGN_TOLERANCE))
            .count();

        aligned as f32 / row.spans.len() as f32
    }

    /// Convert a detected table to a raw grid.
    ///
    /// Every row gets one cell per column; a column no span landed in is `None`.
    pub fn to_raw_table(&self, detected: &DetectedTable) -> RawTable {
        let rows = detected
            .rows
            .iter()
            .map(|row| {
                let mut cells: Vec<Vec<&str>> = vec![Vec::new(); detected.columns.len()];
                for span in &row.spans {
                    let col = find_column_for_span(span.x, &detected.columns, detected.right_x);
                    if let Some(cell) = cells.get_mut(col) {
                        cell.push(span.text.trim());
                    }
                }
                cells
                    .into_iter()
                    .map(|parts| {
                        let text = parts.join(" ");
                        (!text.is_empty()).then_some(text)
                    })
                    .collect()
            })
            .collect();

        RawTable::new(rows)
    }

    /// Check if detected rows actually represent a numbered or bulleted list.
    ///
    /// A numbered list like "1. Item" often splits into a marker span and a
    /// text span at different X positions, which looks like two columns.
    fn is_list_pattern(&self, rows: &[TextLine], columns: &[f32]) -> bool {
        if columns.len() < 2 || rows.is_empty() {
            return false;
        }

        let mut bullet_count = 0;
        let mut number_count = 0;

        for row in rows {
            // Spans are sorted by X, so the first is the leftmost
            if let Some(span) = row.spans.first() {
                let text = span.text.trim();
                if is_bullet_marker(text) {
                    bullet_count += 1;
                } else if is_number_marker(text) {
                    number_count += 1;
                }
            }
        }

        let bullet_ratio = bullet_count as f32 / rows.len() as f32;
        let total_ratio = (bullet_count + number_count) as f32 / rows.len() as f32;
        log::debug!(
            "TableDetector: list markers: bullets={}, numbers={}, rows={}",
            bullet_count,
            number_count,
            rows.len()
        );

        // Numbered first columns are common in real tables; only reject
        // two-column regions for them.
        bullet_ratio >= 0.5 || (columns.len() == 2 && total_ratio >= 0.5)
    }
}

/// Find which column a span belongs to based on its X position.
fn find_column_for_span(span_x: f32, columns: &[f32], right_x: f32) -> usize {
    for (i, &col_start) in columns.iter().enumerate() {
        let col_end = columns.get(i + 1).copied().unwrap_or(right_x + 100.0);
        if span_x >= col_start - COLUMN_SLACK && span_x < col_end - COLUMN_SLACK {
            return i;
        }
    }

    // No range matched; take the nearest edge
    columns
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| (span_x - **a).abs().total_cmp(&(span_x - **b).abs()))
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// Check if text is a bullet marker (•, -, etc.).
fn is_bullet_marker(text: &str) -> bool {
    matches!(
        text.trim(),
        "-" | "–" | "—" | "•" | "·" | "*" | "○" | "▪" | "◦" | "▸" | "▹" | "►" | "■" | "●" | "※" | "□" | "◆" | "◇" | "▶" | "▷" | "☞" | "➤" | "➜"
    )
}

/// Check if text is a number-style list marker (1., 2), a., etc.).
fn is_number_marker(text: &str) -> bool {
    let cleaned: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.is_empty() {
        return false;
    }

    // "1.", "12.", "1)"
    if let Some(pos) = cleaned.find(|c: char| !c.is_ascii_digit()) {
        let (prefix, suffix) = cleaned.split_at(pos);
        if !prefix.is_empty() && (suffix == "." || suffix == ")") {
            return true;
        }
    }

    if cleaned.parse::<u32>().is_ok() {
        return true;
    }

    // "a.", "B)"
    let mut chars = cleaned.chars();
    matches!(
        (chars.next(), chars.next(), chars.next()),
        (Some(letter), Some('.' | ')'), None) if letter.is_alphabetic()
    )
}
