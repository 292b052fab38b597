//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation of values clap cannot check on its own.

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Pokédex - ask questions about Pokémon CSV datasets
///
/// Answer five predefined questions with fixed filters, or ask anything
/// in free text and let a local LLM agent work it out from the data.
///
/// Examples:
///   pokedex questions
///   pokedex query 3
///   pokedex query games-2021 --format json
///   pokedex ask "¿Qué Pokémon de tipo agua es el más rápido?"
///   pokedex history
///   pokedex show pokemon-games --limit 5
///   pokedex --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Command to run
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .pokedex.toml in the current directory
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output format (markdown, json)
    #[arg(long, value_name = "FORMAT", global = true)]
    pub format: Option<OutputFormat>,

    /// Directory containing the CSV datasets
    #[arg(long, value_name = "DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    /// History file path
    #[arg(long, value_name = "FILE", global = true)]
    pub history_file: Option<PathBuf>,

    /// Ollama model used by `ask`
    #[arg(short, long, env = "POKEDEX_MODEL", global = true)]
    pub model: Option<String>,

    /// Ollama API endpoint URL
    #[arg(long, env = "OLLAMA_URL", global = true)]
    pub ollama_url: Option<String>,

    /// Temperature for LLM responses (0.0 - 1.0)
    #[arg(long, global = true)]
    pub temperature: Option<f32>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS", global = true)]
    pub timeout: Option<u64>,

    /// Do not let the agent run Python code
    #[arg(long, global = true)]
    pub no_code_execution: bool,

    /// Generate a default .pokedex.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// List the predefined questions
    Questions,

    /// Answer a predefined question
    Query {
        /// Question number (1-5), slug, or exact text
        question: String,
    },

    /// Ask a free-text question to the LLM agent
    Ask {
        /// The question
        question: String,
    },

    /// Show the question/answer history
    History {
        /// Only show the last N entries
        #[arg(short = 'n', long, value_name = "COUNT")]
        limit: Option<usize>,
    },

    /// List the loaded datasets
    Datasets,

    /// Show the first rows of a dataset
    Show {
        /// Dataset slug or display name
        dataset: String,

        /// Number of rows to show
        #[arg(short = 'n', long, default_value = "10", value_name = "COUNT")]
        limit: usize,
    },
}

/// Output format for answers and listings.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        let Some(ref command) = self.command else {
            return Err("A command is required. Run with --help to see them.".to_string());
        };

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(ref url) = self.ollama_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("Ollama URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if let Some(temperature) = self.temperature {
            if !(0.0..=1.0).contains(&temperature) {
                return Err("Temperature must be between 0.0 and 1.0".to_string());
            }
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        match command {
            Command::Show { limit: 0, .. } => {
                return Err("Row limit must be at least 1".to_string());
            }
            Command::History { limit: Some(0) } => {
                return Err("History limit must be at least 1".to_string());
            }
            _ => {}
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
