//! Gesture table normalization.
//!
//! The capturing client uploads a CSV with an absolute `Timestamp` column
//! and one column per inertial sensor channel. The gesture classifier was
//! trained on rows where the absolute timestamp is replaced by the time
//! elapsed since the first sample of the same recording, so that is the
//! transform applied here: `relative_time = Timestamp - Timestamp[0]`,
//! appended as the last column, original timestamp dropped, everything else
//! carried through untouched and in order.

use crate::error::InputError;

/// Header keyword of the required absolute-timestamp column.
pub const TIMESTAMP_COLUMN: &str = "Timestamp";

/// Name of the derived elapsed-time column.
pub const RELATIVE_TIME_COLUMN: &str = "relative_time";

/// Normalized gesture table: one feature row per sensor sample.
///
/// Invariants: `columns.len()` equals every row's length; row order matches
/// the source file; the last column is [`RELATIVE_TIME_COLUMN`] and its
/// first value is 0.
#[derive(Debug, Clone, PartialEq)]
pub struct GestureMatrix {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<f32>>,
}

impl GestureMatrix {
    /// Number of feature rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when the table holds no feature rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of feature columns per row.
    pub fn width(&self) -> usize {
        self.columns.len()
    }
}

/// Parses a gesture CSV payload into a [`GestureMatrix`].
///
/// Requires a header row containing [`TIMESTAMP_COLUMN`] and at least one
/// data row. Handles `\r\n` line endings and a trailing newline; anything
/// non-numeric in a data cell is an [`InputError::BadCell`].
pub fn extract_gesture_features(data: &[u8]) -> Result<GestureMatrix, InputError> {
    let text = std::str::from_utf8(data).map_err(|_| InputError::BadEncoding)?;
    let mut lines = text.lines().filter(|l| !l.trim().is_empty());

    let header_line = lines.next().ok_or(InputError::EmptyTable)?;
    let header: Vec<&str> = header_line.split(',').map(str::trim).collect();

    let ts_index = header
        .iter()
        .position(|&name| name == TIMESTAMP_COLUMN)
        .ok_or(InputError::MissingColumn(TIMESTAMP_COLUMN))?;

    let mut columns: Vec<String> = header
        .iter()
        .enumerate()
        .filter(|&(i, _)| i != ts_index)
        .map(|(_, name)| name.to_string())
        .collect();
    columns.push(RELATIVE_TIME_COLUMN.to_string());

    let mut rows: Vec<Vec<f32>> = Vec::new();
    // Timestamps are nanosecond counters; the subtraction runs in f64 so
    // the relative values survive the narrowing to f32.
    let mut first_timestamp: Option<f64> = None;

    for (row_idx, line) in lines.enumerate() {
        let cells: Vec<&str> = line.split(',').map(str::trim).collect();
        if cells.len() != header.len() {
            return Err(InputError::RaggedRow {
                row: row_idx,
                expected: header.len(),
                got: cells.len(),
            });
        }

        let mut row = Vec::with_capacity(columns.len());
        let mut timestamp = 0.0f64;
        for (col_idx, cell) in cells.iter().enumerate() {
            let value: f64 = cell.parse().map_err(|_| InputError::BadCell {
                row: row_idx,
                column: header[col_idx].to_string(),
            })?;
            if col_idx == ts_index {
                timestamp = value;
            } else {
                row.push(value as f32);
            }
        }

        let base = *first_timestamp.get_or_insert(timestamp);
        row.push((timestamp - base) as f32);
        rows.push(row);
    }

    if rows.is_empty() {
        return Err(InputError::EmptyTable);
    }

    Ok(GestureMatrix { columns, rows })
}
