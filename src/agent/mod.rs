//! LLM agent for free-text questions.
//!
//! The rest of the program only sees the [`Agent`] trait: send a question,
//! get an [`Answer`] or an [`AgentError`]. [`OllamaAgent`] is the bundled
//! implementation, a tool-calling loop with dataset and code-execution tools.

pub mod agent_loop;
pub mod tools;

pub use agent_loop::{AgentConfig, OllamaAgent};

use crate::history::HistoryLog;
use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

/// Errors from answering a free-text question.
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Cannot connect to Ollama at {0}. Is Ollama running?")]
    Connection(String),

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("Ollama API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Invalid response from model: {0}")]
    InvalidResponse(String),

    #[error("No final answer after {0} iterations")]
    IterationLimit(usize),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// A tool invocation made while answering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentStep {
    pub tool: String,
    pub input: serde_json::Value,
    pub output: String,
    pub success: bool,
}

/// The agent's reply.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Answer {
    /// Final text shown to the user and stored in the history.
    pub output: String,
    /// Tool calls made on the way, in order.
    pub steps: Vec<AgentStep>,
}

impl Answer {
    /// An answer produced without any tool calls.
    #[allow(dead_code)] // Convenience constructor for simple agents
    pub fn text(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            steps: Vec::new(),
        }
    }
}

/// Anything that can answer a free-text question.
#[async_trait]
pub trait Agent: Send + Sync {
    async fn answer(&self, question: &str) -> Result<Answer, AgentError>;
}

/// What happened to a free-text question.
#[derive(Debug)]
pub enum AskOutcome {
    /// Nothing was asked.
    Empty,
    /// The agent answered; the answer has been recorded.
    Answered(Answer),
    /// The agent failed; carries the message to show.
    Failed(String),
}

/// Forward a question to the agent and record a successful answer.
///
/// Failures are turned into a message for the user and never recorded.
pub async fn ask<A>(agent: &A, history: &HistoryLog, question: &str) -> AskOutcome
where
    A: Agent + ?Sized,
{
    if question.trim().is_empty() {
        return AskOutcome::Empty;
    }

    match agent.answer(question).await {
        Ok(answer) => {
            info!("Agent answered using {} tool calls", answer.steps.len());
            if let Err(e) = history.append(question, &answer.output) {
                warn!("Could not record answer in history: {:#}", e);
            }
            AskOutcome::Answered(answer)
        }
        Err(e) => {
            warn!("Agent failed: {}", e);
            AskOutcome::Failed(format!("Error procesando la pregunta: {}", e))
        }
    }
}
