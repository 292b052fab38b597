//! Agent loop for free-text questions.
//!
//! The model is given the question, a system prompt describing the
//! datasets, and the tool definitions. Each turn either calls tools (their
//! results are fed back) or replies with plain text, which ends the loop.

use crate::agent::tools::{CodeExecution, ToolCall, ToolExecutor};
use crate::agent::{Agent, AgentError, AgentStep, Answer};
use crate::config::AgentSettings;
use crate::datasets::DatasetCatalog;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Configuration for the agent.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub ollama_url: String,
    pub model_name: String,
    pub temperature: f32,
    pub max_iterations: usize,
    pub timeout_seconds: u64,
    pub allow_code_execution: bool,
    pub python: String,
    pub code_timeout_seconds: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self::from(&AgentSettings::default())
    }
}

impl From<&AgentSettings> for AgentConfig {
    fn from(settings: &AgentSettings) -> Self {
        Self {
            ollama_url: settings.ollama_url.trim_end_matches('/').to_string(),
            model_name: settings.model.clone(),
            temperature: settings.temperature,
            max_iterations: settings.max_iterations,
            timeout_seconds: settings.timeout_seconds,
            allow_code_execution: settings.allow_code_execution,
            python: settings.python.clone(),
            code_timeout_seconds: settings.code_timeout_seconds,
        }
    }
}

/// Message in the chat history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
}

impl ChatMessage {
    fn new(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: content.into(),
            tool_calls: None,
        }
    }
}

/// Ollama chat API request.
#[derive(Debug, Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Value>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
}

/// Ollama chat API response.
#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: String,
    #[serde(default)]
    tool_calls: Option<Vec<ToolCall>>,
}

/// Agent backed by a local Ollama model.
pub struct OllamaAgent {
    config: AgentConfig,
    http_client: reqwest::Client,
    tool_executor: ToolExecutor,
    system_prompt: String,
}

impl OllamaAgent {
    /// Create an agent that answers questions about the given catalog.
    pub fn new(config: AgentConfig, catalog: Arc<DatasetCatalog>) -> Result<Self, AgentError> {
        info!(
            "Initializing agent with model {} at {}",
            config.model_name, config.ollama_url
        );

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        let system_prompt = build_system_prompt(&catalog, config.allow_code_execution);
        let tool_executor = ToolExecutor::new(
            catalog,
            CodeExecution {
                enabled: config.allow_code_execution,
                python: config.python.clone(),
                timeout: Duration::from_secs(config.code_timeout_seconds),
            },
        );

        Ok(Self {
            config,
            http_client,
            tool_executor,
            system_prompt,
        })
    }

    /// Send the conversation so far to Ollama.
    async fn chat(&self, messages: &[ChatMessage]) -> Result<ResponseMessage, AgentError> {
        let url = format!("{}/api/chat", self.config.ollama_url);

        let tools: Vec<Value> = self
            .tool_executor
            .definitions()
            .iter()
            .filter_map(|t| serde_json::to_value(t).ok())
            .collect();

        let request = OllamaChatRequest {
            model: &self.config.model_name,
            messages,
            tools,
            stream: false,
            options: OllamaOptions {
                temperature: self.config.temperature,
            },
        };

        debug!("Sending chat request with {} messages", messages.len());

        let response = self
            .http_client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AgentError::Timeout(self.config.timeout_seconds)
                } else if e.is_connect() {
                    AgentError::Connection(self.config.ollama_url.clone())
                } else {
                    AgentError::Http(e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(AgentError::Api { status, body });
        }

        let chat_response: OllamaChatResponse = response
            .json()
            .await
            .map_err(|e| AgentError::InvalidResponse(e.to_string()))?;

        Ok(chat_response.message)
    }
}

#[async_trait]
impl Agent for OllamaAgent {
    async fn answer(&self, question: &str) -> Result<Answer, AgentError> {
        let mut messages = vec![
            ChatMessage::new("system", self.system_prompt.clone()),
            ChatMessage::new("user", question),
        ];
        let mut steps = Vec::new();

        for iteration in 0..self.config.max_iterations {
            debug!("Agent iteration {}", iteration + 1);

            let response = self.chat(&messages).await?;
            let tool_calls = response.tool_calls.unwrap_or_default();

            if tool_calls.is_empty() {
                info!("Agent finished after {} iterations", iteration + 1);
                return Ok(Answer {
                    output: response.content.trim().to_string(),
                    steps,
                });
            }

            messages.push(ChatMessage {
                role: "assistant".to_string(),
                content: response.content,
                tool_calls: Some(tool_calls.clone()),
            });

            for call in &tool_calls {
                let result = self.tool_executor.execute(call).await;
                info!("Tool {} executed (success: {})", call.function.name, result.success);

                let content = result.content();
                steps.push(AgentStep {
                    tool: call.function.name.clone(),
                    input: call.function.arguments.clone(),
                    output: content.clone(),
                    success: result.success,
                });
                messages.push(ChatMessage::new("tool", content));
            }
        }

        Err(AgentError::IterationLimit(self.config.max_iterations))
    }
}

/// Describe the datasets and tools to the model.
fn build_system_prompt(catalog: &DatasetCatalog, allow_code_execution: bool) -> String {
    let mut prompt = String::from(AGENT_SYSTEM_PROMPT);

    prompt.push_str("\n## Datasets\n\n");
    for (id, table) in catalog.iter() {
        prompt.push_str(&format!(
            "- `{}` ({}, file `{}`): {}\n",
            id.slug(),
            id.display_name(),
            catalog.file_name(id),
            table.headers.join(", ")
        ));
    }

    if allow_code_execution {
        prompt.push_str(CODE_EXECUTION_PROMPT);
    }

    prompt
}

/// System prompt for the question-answering agent
const AGENT_SYSTEM_PROMPT: &str = r#"You are a Pokédex assistant. Answer questions about Pokémon using the datasets described below.

## Available Tools

- `list_datasets()` - List the datasets and their sizes
- `describe_dataset(dataset)` - Show columns and sample rows
- `find_rows(dataset, column, value)` - Rows where a column equals a value

## Your Process

1. Look up the data you need with the tools
2. When you have enough information, reply with the final answer as plain text, without calling a tool

Answer in the language of the question. Be concise and base your answer on the data.
"#;

const CODE_EXECUTION_PROMPT: &str = r#"
## Code Execution

`run_python(code)` runs Python in the directory holding the CSV files above. Use pandas for
calculations, e.g. `import pandas as pd; df = pd.read_csv("PokemonDB.csv")`, and print the result.
"#;
