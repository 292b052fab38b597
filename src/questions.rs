//! Predefined questions and their fixed resolution rules.
//!
//! Each question maps to exactly one dataset and one filter. The set is
//! closed: adding a question means adding a variant, and the compiler
//! checks that [`dispatch`] handles it.

use crate::analysis::{first_row_where_eq, rank_numeric_cells, rows_at_max, rows_where_number_eq};
use crate::datasets::{DatasetCatalog, DatasetError, DatasetId};
use crate::history::HistoryLog;
use crate::models::{QueryAnswer, Table};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

/// Entity looked up by the type-matchup question.
const MATCHUP_TARGET: &str = "Charizard";

/// Entity looked up by the description question.
const DESCRIPTION_TARGET: &str = "Pikachu";

/// Matchup columns start after the name and primary type.
const MATCHUP_FIRST_VALUE_COLUMN: usize = 2;

/// Errors from running a predefined question.
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Unknown predefined question: {0}")]
    UnknownQuestion(String),

    #[error("Dataset '{dataset}' has no column '{column}'")]
    MissingColumn { dataset: DatasetId, column: String },

    #[error("No row named '{name}' in dataset '{dataset}'")]
    MissingRow { dataset: DatasetId, name: String },

    #[error(transparent)]
    Dataset(#[from] DatasetError),
}

/// One of the five canned questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PredefinedQuestion {
    HighestTotal,
    GamesOf2021,
    CharizardMatchups,
    PikachuDescription,
    GenerationOne,
}

impl PredefinedQuestion {
    /// All questions, in menu order.
    pub const ALL: [PredefinedQuestion; 5] = [
        PredefinedQuestion::HighestTotal,
        PredefinedQuestion::GamesOf2021,
        PredefinedQuestion::CharizardMatchups,
        PredefinedQuestion::PikachuDescription,
        PredefinedQuestion::GenerationOne,
    ];

    /// The question as shown to the user.
    pub fn text(&self) -> &'static str {
        match self {
            PredefinedQuestion::HighestTotal => {
                "¿Cuál es el Pokémon con la mayor estadística total?"
            }
            PredefinedQuestion::GamesOf2021 => "¿Qué juegos de Pokémon salieron en 2021?",
            PredefinedQuestion::CharizardMatchups => {
                "¿Cuáles son los tipos más efectivos contra Charizard?"
            }
            PredefinedQuestion::PikachuDescription => {
                "¿Cuál es la descripción física de Pikachu?"
            }
            PredefinedQuestion::GenerationOne => {
                "¿Qué información existe sobre los Pokémon de la generación 1?"
            }
        }
    }

    /// Short ASCII name for the command line.
    pub fn slug(&self) -> &'static str {
        match self {
            PredefinedQuestion::HighestTotal => "highest-total",
            PredefinedQuestion::GamesOf2021 => "games-2021",
            PredefinedQuestion::CharizardMatchups => "charizard-matchups",
            PredefinedQuestion::PikachuDescription => "pikachu-description",
            PredefinedQuestion::GenerationOne => "generation-1",
        }
    }

    /// Label printed before the answer.
    pub fn caption(&self) -> &'static str {
        match self {
            PredefinedQuestion::HighestTotal => "Respuesta del agente:",
            PredefinedQuestion::GamesOf2021 => "Juegos lanzados en 2021:",
            PredefinedQuestion::CharizardMatchups => "Tipos efectivos contra Charizard:",
            PredefinedQuestion::PikachuDescription => "Descripción física de Pikachu:",
            PredefinedQuestion::GenerationOne => "Información sobre la Generación 1:",
        }
    }

    /// Dataset the question reads.
    pub fn dataset(&self) -> DatasetId {
        match self {
            PredefinedQuestion::HighestTotal => DatasetId::AllPokemonStats,
            PredefinedQuestion::GamesOf2021 => DatasetId::PokemonGames,
            PredefinedQuestion::CharizardMatchups => DatasetId::TypeMatchupData,
            PredefinedQuestion::PikachuDescription => DatasetId::PokemonDescriptions,
            PredefinedQuestion::GenerationOne => DatasetId::AlopezDataMining,
        }
    }

    /// Resolve user input: the exact text, the slug, or a 1-based position.
    pub fn resolve(input: &str) -> Result<Self, QueryError> {
        let trimmed = input.trim();

        if let Ok(position) = trimmed.parse::<usize>() {
            return position
                .checked_sub(1)
                .and_then(|i| Self::ALL.get(i).copied())
                .ok_or_else(|| QueryError::UnknownQuestion(input.to_string()));
        }

        if let Some(question) = Self::ALL.iter().find(|q| q.slug() == trimmed) {
            return Ok(*question);
        }

        input.parse()
    }
}

impl fmt::Display for PredefinedQuestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text())
    }
}

impl FromStr for PredefinedQuestion {
    type Err = QueryError;

    /// Exact match on the question text.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|q| q.text() == s)
            .ok_or_else(|| QueryError::UnknownQuestion(s.to_string()))
    }
}

/// Run a predefined question against the catalog.
pub fn dispatch(
    question: PredefinedQuestion,
    catalog: &DatasetCatalog,
) -> Result<QueryAnswer, QueryError> {
    let dataset = question.dataset();
    let table = catalog.get(dataset)?;
    debug!("Dispatching '{}' against {}", question.slug(), dataset);

    match question {
        PredefinedQuestion::HighestTotal => highest_total(dataset, table),
        PredefinedQuestion::GamesOf2021 => games_of_year(dataset, table, 2021),
        PredefinedQuestion::CharizardMatchups => matchups_against(dataset, table, MATCHUP_TARGET),
        PredefinedQuestion::PikachuDescription => {
            description_of(dataset, table, DESCRIPTION_TARGET)
        }
        PredefinedQuestion::GenerationOne => generation(dataset, table, 1),
    }
}

/// Append a predefined answer to the history when recording is enabled.
///
/// Returns whether a line was written.
pub fn record_answer(
    history: &HistoryLog,
    enabled: bool,
    question: PredefinedQuestion,
    answer: &QueryAnswer,
) -> anyhow::Result<bool> {
    if !enabled {
        return Ok(false);
    }

    history.append(question.text(), &answer.history_text())?;
    Ok(true)
}

fn require_column(dataset: DatasetId, table: &Table, column: &str) -> Result<usize, QueryError> {
    table
        .column_index(column)
        .ok_or_else(|| QueryError::MissingColumn {
            dataset,
            column: column.to_string(),
        })
}

fn highest_total(dataset: DatasetId, table: &Table) -> Result<QueryAnswer, QueryError> {
    let total = require_column(dataset, table, "Total")?;
    Ok(QueryAnswer::Rows {
        table: rows_at_max(table, total),
    })
}

fn games_of_year(dataset: DatasetId, table: &Table, year: u16) -> Result<QueryAnswer, QueryError> {
    let column = require_column(dataset, table, "gameReleaseYear")?;
    Ok(QueryAnswer::Rows {
        table: rows_where_number_eq(table, column, f64::from(year)),
    })
}

fn matchups_against(dataset: DatasetId, table: &Table, name: &str) -> Result<QueryAnswer, QueryError> {
    let name_column = require_column(dataset, table, "Name")?;

    match first_row_where_eq(table, name_column, name) {
        Some(row) => Ok(QueryAnswer::Ranking {
            entries: rank_numeric_cells(&table.headers, row, MATCHUP_FIRST_VALUE_COLUMN),
        }),
        None => Ok(QueryAnswer::NotFound {
            message: format!("No se encontraron datos para {}.", name),
        }),
    }
}

fn description_of(dataset: DatasetId, table: &Table, name: &str) -> Result<QueryAnswer, QueryError> {
    let name_column = require_column(dataset, table, "Name")?;
    let description = require_column(dataset, table, "Description")?;

    let row = first_row_where_eq(table, name_column, name).ok_or_else(|| {
        QueryError::MissingRow {
            dataset,
            name: name.to_string(),
        }
    })?;

    Ok(QueryAnswer::Text {
        text: row[description].clone(),
    })
}

fn generation(dataset: DatasetId, table: &Table, number: u8) -> Result<QueryAnswer, QueryError> {
    let column = require_column(dataset, table, "Generation")?;
    Ok(QueryAnswer::Rows {
        table: rows_where_number_eq(table, column, f64::from(number)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasets::fixture_catalog;
    use std::path::PathBuf;

    fn catalog_with(id: DatasetId, headers: &[&str], rows: &[&[&str]]) -> DatasetCatalog {
        let table = Table::new(
            headers.iter().map(|h| h.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        );
        DatasetCatalog::from_tables(PathBuf::from("."), vec![(id, table)])
    }

    fn rows(answer: QueryAnswer) -> Table {
        match answer {
            QueryAnswer::Rows { table } => table,
            other => panic!("expected rows, got {:?}", other),
        }
    }

    #[test]
    fn test_text_round_trips_through_from_str() {
        for question in PredefinedQuestion::ALL {
            assert_eq!(question.text().parse::<PredefinedQuestion>().unwrap(), question);
        }
    }

    #[test]
    fn test_from_str_requires_exact_text() {
        assert!("¿qué juegos de pokémon salieron en 2021?"
            .parse::<PredefinedQuestion>()
            .is_err());
        assert!("Which games came out in 2021?".parse::<PredefinedQuestion>().is_err());
    }

    #[test]
    fn test_resolve_by_position_slug_and_text() {
        assert_eq!(PredefinedQuestion::resolve("1").unwrap(), PredefinedQuestion::HighestTotal);
        assert_eq!(PredefinedQuestion::resolve("5").unwrap(), PredefinedQuestion::GenerationOne);
        assert_eq!(
            PredefinedQuestion::resolve("charizard-matchups").unwrap(),
            PredefinedQuestion::CharizardMatchups
        );
        assert_eq!(
            PredefinedQuestion::resolve("¿Cuál es la descripción física de Pikachu?").unwrap(),
            PredefinedQuestion::PikachuDescription
        );
        assert!(PredefinedQuestion::resolve("0").is_err());
        assert!(PredefinedQuestion::resolve("6").is_err());
        assert!(PredefinedQuestion::resolve("best-pokemon").is_err());
    }

    #[test]
    fn test_highest_total_includes_all_ties() {
        let table = rows(dispatch(PredefinedQuestion::HighestTotal, &fixture_catalog()).unwrap());
        let total = table.column_index("Total").unwrap();
        let names: Vec<_> = table.rows.iter().map(|r| r[1].as_str()).collect();

        assert_eq!(names, vec!["Mega Mewtwo X", "Mega Mewtwo Y", "Mega Rayquaza"]);
        assert!(table.rows.iter().all(|r| r[total] == "780"));
    }

    #[test]
    fn test_games_of_2021() {
        let table = rows(dispatch(PredefinedQuestion::GamesOf2021, &fixture_catalog()).unwrap());
        let titles: Vec<_> = table.rows.iter().map(|r| r[0].as_str()).collect();

        assert_eq!(titles, vec!["Pokémon Brilliant Diamond", "Pokémon Shining Pearl"]);
        assert!(table.rows.iter().all(|r| r[1] == "2021"));
    }

    #[test]
    fn test_games_of_2021_with_float_years() {
        let catalog = catalog_with(
            DatasetId::PokemonGames,
            &["gameTitle", "gameReleaseYear"],
            &[&["A", "2021.0"], &["B", "2020"], &["C", " 2021"], &["D", "n/a"]],
        );
        let table = rows(dispatch(PredefinedQuestion::GamesOf2021, &catalog).unwrap());
        let titles: Vec<_> = table.rows.iter().map(|r| r[0].as_str()).collect();
        assert_eq!(titles, vec!["A", "C"]);
    }

    #[test]
    fn test_charizard_matchups_sorted_descending() {
        let answer = dispatch(PredefinedQuestion::CharizardMatchups, &fixture_catalog()).unwrap();
        let QueryAnswer::Ranking { entries } = answer else {
            panic!("expected ranking");
        };

        assert_eq!(entries[0].column, "Rock");
        assert_eq!(entries[0].value, 4.0);
        assert!(entries.windows(2).all(|w| w[0].value >= w[1].value));
        // The secondary type column is text and never ranked
        assert!(entries.iter().all(|e| e.column != "Secondary Type"));
        assert_eq!(entries.len(), 8);
    }

    #[test]
    fn test_charizard_absent_is_not_found() {
        let catalog = catalog_with(
            DatasetId::TypeMatchupData,
            &["Name", "Primary Type", "Secondary Type", "Fire"],
            &[&["Squirtle", "Water", "", "0.5"]],
        );
        let answer = dispatch(PredefinedQuestion::CharizardMatchups, &catalog).unwrap();
        assert_eq!(
            answer,
            QueryAnswer::NotFound {
                message: "No se encontraron datos para Charizard.".to_string()
            }
        );
    }

    #[test]
    fn test_pikachu_description() {
        let answer = dispatch(PredefinedQuestion::PikachuDescription, &fixture_catalog()).unwrap();
        assert_eq!(
            answer,
            QueryAnswer::Text {
                text: "It has small electric sacs on both its cheeks. If threatened, it looses electric charges from the sacs.".to_string()
            }
        );
    }

    #[test]
    fn test_pikachu_absent_is_handled_error() {
        let catalog = catalog_with(
            DatasetId::PokemonDescriptions,
            &["Name", "Description"],
            &[&["Raichu", "Its tail discharges electricity."]],
        );
        let err = dispatch(PredefinedQuestion::PikachuDescription, &catalog).unwrap_err();
        assert!(matches!(
            err,
            QueryError::MissingRow { dataset: DatasetId::PokemonDescriptions, ref name } if name == "Pikachu"
        ));
    }

    #[test]
    fn test_generation_one() {
        let table = rows(dispatch(PredefinedQuestion::GenerationOne, &fixture_catalog()).unwrap());
        let names: Vec<_> = table.rows.iter().map(|r| r[1].as_str()).collect();
        assert_eq!(names, vec!["Bulbasaur", "Charmander", "Mewtwo"]);
    }

    #[test]
    fn test_missing_column_is_reported() {
        let catalog = catalog_with(DatasetId::AllPokemonStats, &["Name", "HP"], &[&["Pikachu", "35"]]);
        let err = dispatch(PredefinedQuestion::HighestTotal, &catalog).unwrap_err();
        assert!(matches!(err, QueryError::MissingColumn { ref column, .. } if column == "Total"));
    }

    #[test]
    fn test_dataset_not_loaded() {
        let catalog = DatasetCatalog::from_tables(PathBuf::from("."), Vec::new());
        let err = dispatch(PredefinedQuestion::GenerationOne, &catalog).unwrap_err();
        assert!(matches!(err, QueryError::Dataset(DatasetError::NotLoaded(_))));
    }

    #[test]
    fn test_record_answer_when_enabled() {
        let dir = tempfile::TempDir::new().unwrap();
        let history = HistoryLog::new(dir.path().join("history.txt"));
        let answer = QueryAnswer::Text {
            text: "Ratón eléctrico".to_string(),
        };

        let written =
            record_answer(&history, true, PredefinedQuestion::PikachuDescription, &answer).unwrap();
        assert!(written);

        let lines = history.load().unwrap();
        assert_eq!(lines.len(), 1);
        let entry = lines[0].entry().unwrap();
        assert_eq!(entry.question, PredefinedQuestion::PikachuDescription.text());
        assert_eq!(entry.answer, answer.history_text());
    }

    #[test]
    fn test_record_answer_when_disabled() {
        let dir = tempfile::TempDir::new().unwrap();
        let history = HistoryLog::new(dir.path().join("history.txt"));
        let answer = dispatch(PredefinedQuestion::GamesOf2021, &fixture_catalog()).unwrap();

        let written = record_answer(&history, false, PredefinedQuestion::GamesOf2021, &answer).unwrap();
        assert!(!written);
        assert!(!history.path().exists());
    }
}
