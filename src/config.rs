//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.pokedex.toml` files.

use crate::cli::OutputFormat;
use crate::datasets::DatasetId;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".pokedex.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Dataset file locations.
    #[serde(default)]
    pub datasets: DatasetsConfig,

    /// History log settings.
    #[serde(default)]
    pub history: HistoryConfig,

    /// Agent settings.
    #[serde(default)]
    pub agent: AgentSettings,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,

    /// Output format for answers and listings.
    #[serde(default)]
    pub format: OutputFormat,
}

/// Where the six CSV files live.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetsConfig {
    /// Directory the file names below are resolved against.
    #[serde(default = "default_data_dir")]
    pub dir: PathBuf,

    #[serde(default = "default_pokemon_database")]
    pub pokemon_database: String,

    #[serde(default = "default_alopez_data_mining")]
    pub alopez_data_mining: String,

    #[serde(default = "default_pokemon_descriptions")]
    pub pokemon_descriptions: String,

    #[serde(default = "default_all_pokemon_stats")]
    pub all_pokemon_stats: String,

    #[serde(default = "default_pokemon_games")]
    pub pokemon_games: String,

    #[serde(default = "default_type_matchup_data")]
    pub type_matchup_data: String,
}

impl Default for DatasetsConfig {
    fn default() -> Self {
        Self {
            dir: default_data_dir(),
            pokemon_database: default_pokemon_database(),
            alopez_data_mining: default_alopez_data_mining(),
            pokemon_descriptions: default_pokemon_descriptions(),
            all_pokemon_stats: default_all_pokemon_stats(),
            pokemon_games: default_pokemon_games(),
            type_matchup_data: default_type_matchup_data(),
        }
    }
}

impl DatasetsConfig {
    /// File name configured for a dataset.
    pub fn file_for(&self, id: DatasetId) -> &str {
        match id {
            DatasetId::PokemonDatabase => &self.pokemon_database,
            DatasetId::AlopezDataMining => &self.alopez_data_mining,
            DatasetId::PokemonDescriptions => &self.pokemon_descriptions,
            DatasetId::AllPokemonStats => &self.all_pokemon_stats,
            DatasetId::PokemonGames => &self.pokemon_games,
            DatasetId::TypeMatchupData => &self.type_matchup_data,
        }
    }

    /// Full path of a dataset file.
    pub fn path_for(&self, id: DatasetId) -> PathBuf {
        self.dir.join(self.file_for(id))
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_pokemon_database() -> String {
    DatasetId::PokemonDatabase.default_file().to_string()
}

fn default_alopez_data_mining() -> String {
    DatasetId::AlopezDataMining.default_file().to_string()
}

fn default_pokemon_descriptions() -> String {
    DatasetId::PokemonDescriptions.default_file().to_string()
}

fn default_all_pokemon_stats() -> String {
    DatasetId::AllPokemonStats.default_file().to_string()
}

fn default_pokemon_games() -> String {
    DatasetId::PokemonGames.default_file().to_string()
}

fn default_type_matchup_data() -> String {
    DatasetId::TypeMatchupData.default_file().to_string()
}

/// History log settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Path of the append-only history file.
    #[serde(default = "default_history_path")]
    pub path: PathBuf,

    /// Also record answers to predefined questions.
    #[serde(default)]
    pub record_predefined: bool,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            path: default_history_path(),
            record_predefined: false,
        }
    }
}

fn default_history_path() -> PathBuf {
    PathBuf::from(crate::history::DEFAULT_HISTORY_FILE)
}

/// LLM agent settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSettings {
    /// Ollama API URL.
    #[serde(default = "default_ollama_url")]
    pub ollama_url: String,

    /// Model name.
    #[serde(default = "default_model")]
    pub model: String,

    /// Temperature for generation.
    #[serde(default)]
    pub temperature: f32,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Maximum model turns per question.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// Offer the `run_python` tool to the model.
    #[serde(default = "default_true")]
    pub allow_code_execution: bool,

    /// Interpreter used by `run_python`.
    #[serde(default = "default_python")]
    pub python: String,

    /// Wall-clock limit for one `run_python` call.
    #[serde(default = "default_code_timeout")]
    pub code_timeout_seconds: u64,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            ollama_url: default_ollama_url(),
            model: default_model(),
            temperature: 0.0,
            timeout_seconds: default_timeout(),
            max_iterations: default_max_iterations(),
            allow_code_execution: true,
            python: default_python(),
            code_timeout_seconds: default_code_timeout(),
        }
    }
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_model() -> String {
    "llama3.1:latest".to_string()
}

fn default_timeout() -> u64 {
    300
}

fn default_max_iterations() -> usize {
    15
}

fn default_true() -> bool {
    true
}

fn default_python() -> String {
    "python3".to_string()
}

fn default_code_timeout() -> u64 {
    30
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE_NAME);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were given explicitly.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref dir) = args.data_dir {
            self.datasets.dir = dir.clone();
        }
        if let Some(ref path) = args.history_file {
            self.history.path = path.clone();
        }
        if let Some(format) = args.format {
            self.general.format = format;
        }

        if let Some(ref model) = args.model {
            self.agent.model = model.clone();
        }
        if let Some(ref url) = args.ollama_url {
            self.agent.ollama_url = url.clone();
        }
        if let Some(temperature) = args.temperature {
            self.agent.temperature = temperature;
        }
        if let Some(timeout) = args.timeout {
            self.agent.timeout_seconds = timeout;
        }
        if args.no_code_execution {
            self.agent.allow_code_execution = false;
        }

        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.agent.model, "llama3.1:latest");
        assert_eq!(config.agent.temperature, 0.0);
        assert!(config.agent.allow_code_execution);
        assert!(!config.history.record_predefined);
        assert_eq!(config.history.path, PathBuf::from("history.txt"));
        assert_eq!(config.general.format, OutputFormat::Markdown);
    }

    #[test]
    fn test_default_dataset_files() {
        let datasets = DatasetsConfig::default();
        assert_eq!(datasets.file_for(DatasetId::AllPokemonStats), "PokemonDB.csv");
        assert_eq!(datasets.file_for(DatasetId::PokemonGames), "pokemonGames.csv");
        assert_eq!(
            datasets.path_for(DatasetId::PokemonDatabase),
            PathBuf::from(".").join("Pokemon Database.csv")
        );
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
verbose = true
format = "json"

[datasets]
dir = "/srv/pokemon"
pokemon_games = "games.csv"

[history]
path = "/tmp/pokedex-history.txt"
record_predefined = true

[agent]
model = "qwen2.5:14b"
allow_code_execution = false
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert!(config.general.verbose);
        assert_eq!(config.general.format, OutputFormat::Json);
        assert_eq!(
            config.datasets.path_for(DatasetId::PokemonGames),
            PathBuf::from("/srv/pokemon/games.csv")
        );
        assert_eq!(config.datasets.file_for(DatasetId::TypeMatchupData), "PokeTypeMatchupData.csv");
        assert!(config.history.record_predefined);
        assert_eq!(config.agent.model, "qwen2.5:14b");
        assert!(!config.agent.allow_code_execution);
        assert_eq!(config.agent.python, "python3");
    }

    #[test]
    fn test_merge_with_args_overrides_only_given_flags() {
        use crate::cli::Args;
        use clap::Parser;

        let toml_content = r#"
[general]
verbose = true

[datasets]
dir = "/srv/pokemon"
pokemon_games = "games.csv"

[history]
path = "/var/lib/pokedex/history.txt"
record_predefined = true

[agent]
model = "qwen2.5:14b"
temperature = 0.3
timeout_seconds = 120
python = "/usr/bin/python3.12"
"#;

        // No flags: the file wins everywhere
        let mut config: Config = toml::from_str(toml_content).unwrap();
        let args = Args::try_parse_from(["pokedex", "questions"]).unwrap();
        let model_from_env = args.model.is_some();
        config.merge_with_args(&args);

        assert_eq!(config.datasets.dir, PathBuf::from("/srv/pokemon"));
        assert_eq!(config.history.path, PathBuf::from("/var/lib/pokedex/history.txt"));
        assert_eq!(config.general.format, OutputFormat::Markdown);
        assert!(config.agent.allow_code_execution);
        assert_eq!(config.agent.temperature, 0.3);
        if !model_from_env {
            assert_eq!(config.agent.model, "qwen2.5:14b");
        }

        // Given flags override, the rest of the file stays
        let mut config: Config = toml::from_str(toml_content).unwrap();
        let args = Args::try_parse_from([
            "pokedex",
            "--data-dir",
            "./data",
            "--history-file",
            "qa.txt",
            "--format",
            "json",
            "--no-code-execution",
            "--model",
            "llama3.2:latest",
            "--temperature",
            "0.0",
            "query",
            "1",
        ])
        .unwrap();
        config.merge_with_args(&args);

        assert_eq!(config.datasets.dir, PathBuf::from("./data"));
        assert_eq!(config.history.path, PathBuf::from("qa.txt"));
        assert_eq!(config.general.format, OutputFormat::Json);
        assert!(!config.agent.allow_code_execution);
        assert_eq!(config.agent.model, "llama3.2:latest");
        assert_eq!(config.agent.temperature, 0.0);

        assert_eq!(config.datasets.file_for(DatasetId::PokemonGames), "games.csv");
        assert!(config.history.record_predefined);
        assert!(config.general.verbose);
        assert_eq!(config.agent.timeout_seconds, 120);
        assert_eq!(config.agent.python, "/usr/bin/python3.12");
    }

    #[test]
    fn test_load_missing_file_errors() {
        let dir = tempfile::TempDir::new().unwrap();
        let result = Config::load(&dir.path().join("nope.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[datasets]"));
        assert!(toml_str.contains("[history]"));
        assert!(toml_str.contains("[agent]"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.agent.max_iterations, 15);
    }
}
