//! Pokémon dataset catalog.
//!
//! The six CSV tables are loaded once per process into a read-only
//! [`DatasetCatalog`] that is passed to whatever needs it.

pub mod catalog;
pub mod loader;

pub use catalog::DatasetCatalog;

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// Identifier of one of the six known datasets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DatasetId {
    PokemonDatabase,
    AlopezDataMining,
    PokemonDescriptions,
    AllPokemonStats,
    PokemonGames,
    TypeMatchupData,
}

impl DatasetId {
    /// Every dataset, in display order.
    pub const ALL: [DatasetId; 6] = [
        DatasetId::PokemonDatabase,
        DatasetId::AlopezDataMining,
        DatasetId::PokemonDescriptions,
        DatasetId::AllPokemonStats,
        DatasetId::PokemonGames,
        DatasetId::TypeMatchupData,
    ];

    /// Short identifier used on the command line.
    pub fn slug(&self) -> &'static str {
        match self {
            DatasetId::PokemonDatabase => "pokemon-database",
            DatasetId::AlopezDataMining => "alopez-data-mining",
            DatasetId::PokemonDescriptions => "pokemon-descriptions",
            DatasetId::AllPokemonStats => "all-pokemon-stats",
            DatasetId::PokemonGames => "pokemon-games",
            DatasetId::TypeMatchupData => "type-matchup-data",
        }
    }

    /// Human-readable name.
    pub fn display_name(&self) -> &'static str {
        match self {
            DatasetId::PokemonDatabase => "Pokemon Database",
            DatasetId::AlopezDataMining => "Alopez Data Mining",
            DatasetId::PokemonDescriptions => "Pokemon Descriptions",
            DatasetId::AllPokemonStats => "All Pokemon Stats",
            DatasetId::PokemonGames => "Pokemon Games",
            DatasetId::TypeMatchupData => "Type Matchup Data",
        }
    }

    /// File name used when the config does not override it.
    pub fn default_file(&self) -> &'static str {
        match self {
            DatasetId::PokemonDatabase => "Pokemon Database.csv",
            DatasetId::AlopezDataMining => "pokemon_alopez247.csv",
            DatasetId::PokemonDescriptions => "pokemon_descriptions.csv",
            DatasetId::AllPokemonStats => "PokemonDB.csv",
            DatasetId::PokemonGames => "pokemonGames.csv",
            DatasetId::TypeMatchupData => "PokeTypeMatchupData.csv",
        }
    }
}

impl fmt::Display for DatasetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl FromStr for DatasetId {
    type Err = DatasetError;

    /// Accepts the slug or the display name, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        DatasetId::ALL
            .into_iter()
            .find(|id| id.slug() == wanted || id.display_name().to_lowercase() == wanted)
            .ok_or_else(|| DatasetError::Unknown(s.to_string()))
    }
}

/// Errors raised while loading or looking up datasets.
#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("Dataset '{id}' file not found: {}", .path.display())]
    Missing { id: DatasetId, path: PathBuf },

    #[error("Failed to read dataset '{id}' from {}: {source}", .path.display())]
    Read {
        id: DatasetId,
        path: PathBuf,
        source: csv::Error,
    },

    #[error("Unknown dataset: {0}")]
    Unknown(String),

    #[error("Dataset '{0}' is not loaded")]
    NotLoaded(DatasetId),
}

/// Dataset config pointing at the CSV samples under `fixtures/`.
#[cfg(test)]
pub(crate) fn fixtures_config() -> crate::config::DatasetsConfig {
    crate::config::DatasetsConfig {
        dir: PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/fixtures")),
        ..Default::default()
    }
}

/// Catalog loaded from the CSV samples under `fixtures/`.
#[cfg(test)]
pub(crate) fn fixture_catalog() -> DatasetCatalog {
    DatasetCatalog::load(&fixtures_config()).expect("fixture datasets load")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str_accepts_slug_and_name() {
        assert_eq!("pokemon-games".parse::<DatasetId>().unwrap(), DatasetId::PokemonGames);
        assert_eq!("Type Matchup Data".parse::<DatasetId>().unwrap(), DatasetId::TypeMatchupData);
        assert_eq!(" ALL POKEMON STATS ".parse::<DatasetId>().unwrap(), DatasetId::AllPokemonStats);
    }

    #[test]
    fn test_from_str_unknown() {
        let err = "digimon".parse::<DatasetId>().unwrap_err();
        assert!(matches!(err, DatasetError::Unknown(ref s) if s == "digimon"));
    }

    #[test]
    fn test_slugs_are_unique() {
        let mut slugs: Vec<_> = DatasetId::ALL.iter().map(|id| id.slug()).collect();
        slugs.sort();
        slugs.dedup();
        assert_eq!(slugs.len(), DatasetId::ALL.len());
    }
}
