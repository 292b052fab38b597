//! Read-only collection of the loaded dataset tables.

use super::loader::load_table;
use super::{DatasetError, DatasetId};
use crate::config::DatasetsConfig;
use crate::models::Table;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;

/// All dataset tables, loaded once and never mutated.
#[derive(Debug, Clone)]
pub struct DatasetCatalog {
    root: PathBuf,
    tables: BTreeMap<DatasetId, Table>,
    files: BTreeMap<DatasetId, String>,
}

impl DatasetCatalog {
    /// Load every dataset named in the config. Any missing file is an error.
    pub fn load(config: &DatasetsConfig) -> Result<Self, DatasetError> {
        let mut tables = BTreeMap::new();
        let mut files = BTreeMap::new();

        for id in DatasetId::ALL {
            let path = config.path_for(id);
            let table = load_table(id, &path)?;
            tables.insert(id, table);
            files.insert(id, config.file_for(id).to_string());
        }

        info!(
            "Loaded {} datasets from {}",
            tables.len(),
            config.dir.display()
        );

        Ok(Self {
            root: config.dir.clone(),
            tables,
            files,
        })
    }

    /// Build a catalog from tables already in memory.
    #[allow(dead_code)] // Used by tests
    pub fn from_tables(root: PathBuf, tables: impl IntoIterator<Item = (DatasetId, Table)>) -> Self {
        let tables: BTreeMap<DatasetId, Table> = tables.into_iter().collect();
        let files = tables
            .keys()
            .map(|id| (*id, id.default_file().to_string()))
            .collect();

        Self {
            root,
            tables,
            files,
        }
    }

    /// Directory the datasets were loaded from.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File name a dataset was loaded from, relative to [`Self::root`].
    pub fn file_name(&self, id: DatasetId) -> &str {
        self.files
            .get(&id)
            .map(String::as_str)
            .unwrap_or_else(|| id.default_file())
    }

    /// Look up a table.
    pub fn get(&self, id: DatasetId) -> Result<&Table, DatasetError> {
        self.tables.get(&id).ok_or(DatasetError::NotLoaded(id))
    }

    /// Loaded tables in display order.
    pub fn iter(&self) -> impl Iterator<Item = (DatasetId, &Table)> {
        self.tables.iter().map(|(id, table)| (*id, table))
    }
}
