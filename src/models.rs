//! Data models for the Pokédex.
//!
//! This module contains the core data structures shared by the dataset
//! catalog, the predefined-question dispatcher and the renderers.

use serde::Serialize;
use std::fmt;

/// An immutable in-memory table: named columns and text cells.
///
/// Every row has exactly `headers.len()` cells; loaders pad or truncate
/// ragged rows before building a table.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    /// Column names, in file order.
    pub headers: Vec<String>,
    /// Row cells, in file order.
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Create a table, normalising every row to the header width.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();

        Self { headers, rows }
    }

    /// Index of the column with exactly this name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Number of data rows (header excluded).
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns.
    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    /// Returns true if the table has no data rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell at the given row and column.
    #[allow(dead_code)] // Used by tests
    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.rows.get(row)?.get(column).map(String::as_str)
    }

    /// A copy of the first `n` rows.
    pub fn head(&self, n: usize) -> Table {
        Table {
            headers: self.headers.clone(),
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }

    /// A copy containing only the rows at `indices`, in the given order.
    pub fn select_rows(&self, indices: &[usize]) -> Table {
        Table {
            headers: self.headers.clone(),
            rows: indices
                .iter()
                .filter_map(|&i| self.rows.get(i).cloned())
                .collect(),
        }
    }
}

/// A numeric cell labelled with its column, used for ranked answers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedValue {
    pub column: String,
    pub value: f64,
}

/// Result of running a predefined question.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QueryAnswer {
    /// A filtered row set.
    Rows { table: Table },
    /// Labelled values sorted from highest to lowest.
    Ranking { entries: Vec<RankedValue> },
    /// A single text field.
    Text { text: String },
    /// The looked-up entity does not exist; carries a readable message.
    NotFound { message: String },
}

impl QueryAnswer {
    /// Single-line form used when an answer is written to the history log.
    pub fn history_text(&self) -> String {
        match self {
            QueryAnswer::Rows { table } => {
                let rows: Vec<String> = table.rows.iter().map(|r| r.join(" ")).collect();
                format!("{} filas: {}", table.row_count(), rows.join("; "))
            }
            QueryAnswer::Ranking { entries } => entries
                .iter()
                .map(|e| format!("{} {}", e.column, e.value))
                .collect::<Vec<_>>()
                .join("; "),
            QueryAnswer::Text { text } => text.replace('\n', " "),
            QueryAnswer::NotFound { message } => message.clone(),
        }
    }
}

impl fmt::Display for QueryAnswer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.history_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> Table {
        Table::new(
            vec!["Name".to_string(), "Total".to_string()],
            vec![
                vec!["Bulbasaur".to_string(), "318".to_string()],
                vec!["Ivysaur".to_string()],
                vec!["Venusaur".to_string(), "525".to_string(), "extra".to_string()],
            ],
        )
    }

    #[test]
    fn test_rows_normalised_to_header_width() {
        let t = table();
        assert_eq!(t.rows[1], vec!["Ivysaur".to_string(), String::new()]);
        assert_eq!(t.rows[2].len(), 2);
    }

    #[test]
    fn test_column_index_and_cell() {
        let t = table();
        assert_eq!(t.column_index("Total"), Some(1));
        assert_eq!(t.column_index("total"), None);
        assert_eq!(t.cell(2, 1), Some("525"));
        assert_eq!(t.cell(5, 0), None);
    }

    #[test]
    fn test_head_and_select_rows() {
        let t = table();
        assert_eq!(t.head(1).row_count(), 1);
        assert_eq!(t.head(10).row_count(), 3);

        let picked = t.select_rows(&[2, 0]);
        assert_eq!(picked.rows[0][0], "Venusaur");
        assert_eq!(picked.rows[1][0], "Bulbasaur");
    }

    #[test]
    fn test_history_text_is_single_line() {
        let answer = QueryAnswer::Text {
            text: "line one\nline two".to_string(),
        };
        assert_eq!(answer.history_text(), "line one line two");

        let rows = QueryAnswer::Rows { table: table() };
        assert!(rows.history_text().starts_with("3 filas:"));
    }
}
