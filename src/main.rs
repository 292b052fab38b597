//! Pokédex - query Pokémon CSV datasets from the command line
//!
//! Five predefined questions are answered with fixed filters over the
//! datasets; any other question goes to a local LLM agent through Ollama.
//! Agent answers are appended to a plain-text history file.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Any handled error (bad arguments, missing dataset, agent failure)

mod agent;
mod analysis;
mod cli;
mod config;
mod datasets;
mod history;
mod models;
mod questions;
mod report;

use agent::{AgentConfig, AskOutcome, OllamaAgent};
use anyhow::{Context, Result};
use cli::{Args, Command, OutputFormat};
use config::{Config, CONFIG_FILE_NAME};
use datasets::{DatasetCatalog, DatasetId};
use history::HistoryLog;
use indicatif::{ProgressBar, ProgressStyle};
use questions::PredefinedQuestion;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Load configuration before logging so the file can turn on verbose output
    let mut config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    // Initialize logging
    init_logging(&args, &config);

    info!("Pokédex v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    debug!("Configuration: {:?}", config);

    match run(args, config).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Command failed: {:#}", e);
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .pokedex.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!("{} already exists. Remove it first or edit it manually.", CONFIG_FILE_NAME);
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("Created {} with default settings.", CONFIG_FILE_NAME);
    println!("Edit it to point at your datasets and choose a model.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args, config: &Config) {
    let level = if !args.quiet && config.general.verbose {
        tracing::Level::DEBUG
    } else {
        args.log_level()
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Run the selected command. Returns the exit code.
async fn run(args: Args, config: Config) -> Result<i32> {
    let json = config.general.format == OutputFormat::Json;
    let history = HistoryLog::new(&config.history.path);

    let Some(command) = args.command else {
        return Ok(0);
    };

    match command {
        Command::Questions => {
            print!("{}", report::render_questions(json)?);
            Ok(0)
        }
        Command::Query { question } => {
            let question = PredefinedQuestion::resolve(&question)?;
            let catalog = load_catalog(&config)?;
            handle_query(question, &catalog, &config, &history, json)
        }
        Command::Ask { question } => {
            let catalog = Arc::new(load_catalog(&config)?);
            handle_ask(&question, catalog, &config, &history, args.quiet, json).await
        }
        Command::History { limit } => {
            let mut lines = history.load()?;
            if let Some(limit) = limit {
                let skip = lines.len().saturating_sub(limit);
                lines.drain(..skip);
            }
            print!("{}", report::render_history(&lines, json)?);
            Ok(0)
        }
        Command::Datasets => {
            let catalog = load_catalog(&config)?;
            print!("{}", report::render_datasets(&catalog, json)?);
            Ok(0)
        }
        Command::Show { dataset, limit } => {
            let id: DatasetId = dataset.parse()?;
            let catalog = load_catalog(&config)?;
            let table = catalog.get(id)?;
            print!(
                "{}",
                report::render_preview(id.display_name(), table, limit, json)?
            );
            Ok(0)
        }
    }
}

/// Answer a predefined question, recording it if configured to.
fn handle_query(
    question: PredefinedQuestion,
    catalog: &DatasetCatalog,
    config: &Config,
    history: &HistoryLog,
    json: bool,
) -> Result<i32> {
    info!("Running predefined question '{}'", question.slug());
    let answer = questions::dispatch(question, catalog)?;

    if let Err(e) =
        questions::record_answer(history, config.history.record_predefined, question, &answer)
    {
        warn!("Could not record answer in history: {:#}", e);
    }

    print!("{}", report::render_answer(question, &answer, json)?);
    Ok(0)
}

/// Send a free-text question to the agent.
async fn handle_ask(
    question: &str,
    catalog: Arc<DatasetCatalog>,
    config: &Config,
    history: &HistoryLog,
    quiet: bool,
    json: bool,
) -> Result<i32> {
    let agent_config = AgentConfig::from(&config.agent);

    if !quiet {
        eprintln!(
            "Model: {} | Ollama: {} | Code execution: {}",
            agent_config.model_name,
            agent_config.ollama_url,
            if agent_config.allow_code_execution { "on" } else { "off" }
        );
    }

    let agent = OllamaAgent::new(agent_config, catalog)?;

    let spinner = if quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg} [{elapsed}]")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message("El agente está pensando...");
        pb.enable_steady_tick(Duration::from_millis(120));
        pb
    };

    let outcome = agent::ask(&agent, history, question).await;
    spinner.finish_and_clear();

    match outcome {
        AskOutcome::Empty => {
            eprintln!("Escribe una pregunta.");
            Ok(1)
        }
        AskOutcome::Answered(answer) => {
            print!("{}", report::render_agent_answer(&answer, json)?);
            Ok(0)
        }
        AskOutcome::Failed(message) => {
            eprintln!("{}", message);
            Ok(1)
        }
    }
}

/// Load every dataset named by the configuration.
fn load_catalog(config: &Config) -> Result<DatasetCatalog> {
    let catalog = DatasetCatalog::load(&config.datasets).with_context(|| {
        format!(
            "Failed to load datasets from {}",
            config.datasets.dir.display()
        )
    })?;
    debug!("Loaded {} datasets", catalog.iter().count());
    Ok(catalog)
}

/// Load configuration from file or use defaults.
///
/// Runs before logging is set up, so problems are reported on stderr directly.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => Ok(config),
        Ok(None) => Ok(Config::default()),
        Err(e) => {
            eprintln!("Warning: failed to load {}: {:#}", CONFIG_FILE_NAME, e);
            Ok(Config::default())
        }
    }
}
