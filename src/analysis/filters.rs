//! Table filters and aggregations.
//!
//! This module provides the small set of row selections the predefined
//! questions and the agent tools are built from. Cells are text; numeric
//! helpers parse them on the fly and skip anything that is not a number.

use crate::models::{RankedValue, Table};
use std::cmp::Ordering;

/// Parse a cell as a number, ignoring surrounding whitespace.
pub fn parse_number(cell: &str) -> Option<f64> {
    let value = cell.trim().parse::<f64>().ok()?;
    value.is_finite().then_some(value)
}

/// Largest numeric value in a column.
pub fn column_max(table: &Table, column: usize) -> Option<f64> {
    table
        .rows
        .iter()
        .filter_map(|row| row.get(column).and_then(|c| parse_number(c)))
        .fold(None, |max, v| match max {
            Some(m) if m >= v => Some(m),
            _ => Some(v),
        })
}

/// Rows whose cell in `column` is numerically equal to `target`.
pub fn rows_where_number_eq(table: &Table, column: usize, target: f64) -> Table {
    let indices: Vec<usize> = table
        .rows
        .iter()
        .enumerate()
        .filter(|(_, row)| {
            row.get(column)
                .and_then(|c| parse_number(c))
                .is_some_and(|v| v == target)
        })
        .map(|(i, _)| i)
        .collect();

    table.select_rows(&indices)
}

/// Rows holding the column maximum. Ties are all kept, in table order.
pub fn rows_at_max(table: &Table, column: usize) -> Table {
    match column_max(table, column) {
        Some(max) => rows_where_number_eq(table, column, max),
        None => table.select_rows(&[]),
    }
}

/// First row whose cell in `column` equals `value` exactly.
pub fn first_row_where_eq<'a>(table: &'a Table, column: usize, value: &str) -> Option<&'a [String]> {
    table
        .rows
        .iter()
        .find(|row| row.get(column).is_some_and(|c| c == value))
        .map(Vec::as_slice)
}

/// Up to `limit` rows whose cell in `column` equals `value` exactly.
pub fn rows_where_eq(table: &Table, column: usize, value: &str, limit: usize) -> Table {
    let indices: Vec<usize> = table
        .rows
        .iter()
        .enumerate()
        .filter(|(_, row)| row.get(column).is_some_and(|c| c == value))
        .map(|(i, _)| i)
        .take(limit)
        .collect();

    table.select_rows(&indices)
}

/// Numeric cells of `row` from column `from` onward, highest first.
///
/// Non-numeric cells are dropped. Equal values keep their column order.
pub fn rank_numeric_cells(headers: &[String], row: &[String], from: usize) -> Vec<RankedValue> {
    let mut ranked: Vec<RankedValue> = headers
        .iter()
        .zip(row.iter())
        .skip(from)
        .filter_map(|(column, cell)| {
            parse_number(cell).map(|value| RankedValue {
                column: column.clone(),
                value,
            })
        })
        .collect();

    ranked.sort_by(|a, b| b.value.partial_cmp(&a.value).unwrap_or(Ordering::Equal));
    ranked
}
