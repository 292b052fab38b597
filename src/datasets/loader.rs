//! CSV file loading.

use super::{DatasetError, DatasetId};
use crate::models::Table;
use std::path::Path;
use tracing::debug;

/// Read a CSV file with a header row into a [`Table`].
///
/// Rows may be shorter or longer than the header; they are padded or cut
/// to the header width.
pub fn load_table(id: DatasetId, path: &Path) -> Result<Table, DatasetError> {
    if !path.is_file() {
        return Err(DatasetError::Missing {
            id,
            path: path.to_path_buf(),
        });
    }

    let read_error = |source: csv::Error| DatasetError::Read {
        id,
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(read_error)?;

    let headers: Vec<String> = reader
        .headers()
        .map_err(read_error)?
        .iter()
        .enumerate()
        .map(|(i, h)| {
            if i == 0 {
                h.trim_start_matches('\u{feff}').to_string()
            } else {
                h.to_string()
            }
        })
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(read_error)?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    debug!(
        "Loaded {} rows x {} columns from {}",
        rows.len(),
        headers.len(),
        path.display()
    );

    Ok(Table::new(headers, rows))
}
