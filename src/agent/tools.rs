//! Tool definitions for the Pokédex agent.
//!
//! This module defines the tools the LLM can call: read-only views of the
//! loaded datasets and a Python code-execution tool that runs in the
//! dataset directory.

use crate::analysis::rows_where_eq;
use crate::datasets::{DatasetCatalog, DatasetId};
use crate::models::Table;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Rows shown by `describe_dataset`.
const PREVIEW_ROWS: usize = 5;

/// Default and maximum row count for `find_rows`.
const DEFAULT_FIND_LIMIT: u64 = 20;
const MAX_FIND_LIMIT: u64 = 200;

/// Tool output is cut to this many bytes before going back to the model.
const MAX_TOOL_OUTPUT: usize = 8 * 1024;

/// Tool definition for Ollama's tool-calling API.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    #[serde(rename = "type")]
    pub tool_type: String,
    pub function: FunctionDefinition,
}

#[derive(Debug, Clone, Serialize)]
pub struct FunctionDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// A tool call made by the LLM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub function: FunctionCall,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
}

/// Result of executing a tool.
#[derive(Debug, Clone, Serialize)]
pub struct ToolResult {
    pub success: bool,
    pub output: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolResult {
    pub fn success(output: String) -> Self {
        Self {
            success: true,
            output,
            error: None,
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            output: String::new(),
            error: Some(message),
        }
    }

    /// Text handed back to the model.
    pub fn content(&self) -> String {
        let text = if self.success {
            self.output.clone()
        } else {
            format!("Error: {}", self.error.as_deref().unwrap_or_default())
        };
        truncate(text, MAX_TOOL_OUTPUT)
    }
}

/// Settings for the code-execution tool.
#[derive(Debug, Clone)]
pub struct CodeExecution {
    /// Offer `run_python` at all.
    pub enabled: bool,
    /// Interpreter binary.
    pub python: String,
    /// Wall-clock limit per call.
    pub timeout: Duration,
}

/// Executes tool calls against the dataset catalog.
pub struct ToolExecutor {
    catalog: Arc<DatasetCatalog>,
    code: CodeExecution,
}

impl ToolExecutor {
    pub fn new(catalog: Arc<DatasetCatalog>, code: CodeExecution) -> Self {
        Self { catalog, code }
    }

    /// Tools offered to the model.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        get_tool_definitions(self.code.enabled)
    }

    /// Execute a tool call and return the result.
    pub async fn execute(&self, tool_call: &ToolCall) -> ToolResult {
        let name = &tool_call.function.name;
        let args = &tool_call.function.arguments;

        debug!("Executing tool: {} with args: {:?}", name, args);

        match name.as_str() {
            "list_datasets" => self.list_datasets(),
            "describe_dataset" => self.describe_dataset(args),
            "find_rows" => self.find_rows(args),
            "run_python" if self.code.enabled => self.run_python(args).await,
            _ => ToolResult::error(format!("Unknown tool: {}", name)),
        }
    }

    /// One line per dataset: slug, name, file, shape.
    fn list_datasets(&self) -> ToolResult {
        let lines: Vec<String> = self
            .catalog
            .iter()
            .map(|(id, table)| {
                format!(
                    "{} | {} | {} | {} rows x {} columns",
                    id.slug(),
                    id.display_name(),
                    self.catalog.file_name(id),
                    table.row_count(),
                    table.column_count()
                )
            })
            .collect();

        ToolResult::success(lines.join("\n"))
    }

    /// Column names and the first rows of a dataset.
    fn describe_dataset(&self, args: &Value) -> ToolResult {
        let (id, table) = match self.dataset_arg(args) {
            Ok(found) => found,
            Err(result) => return result,
        };

        let mut output = format!(
            "{} ({} rows)\ncolumns: {}\n",
            id.display_name(),
            table.row_count(),
            table.headers.join(", ")
        );
        match to_csv_lines(&table.head(PREVIEW_ROWS)) {
            Ok(lines) => output.push_str(&lines),
            Err(e) => return ToolResult::error(format!("Failed to render rows: {}", e)),
        }

        ToolResult::success(output)
    }

    /// Rows whose column equals a value exactly.
    fn find_rows(&self, args: &Value) -> ToolResult {
        let (_, table) = match self.dataset_arg(args) {
            Ok(found) => found,
            Err(result) => return result,
        };

        let column = match args.get("column").and_then(|v| v.as_str()) {
            Some(c) => c,
            None => return ToolResult::error("Missing required parameter: column".to_string()),
        };

        let value = match args.get("value") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::Bool(b)) => (if *b { "True" } else { "False" }).to_string(),
            _ => return ToolResult::error("Missing required parameter: value".to_string()),
        };

        let limit = args
            .get("limit")
            .and_then(|v| v.as_u64())
            .unwrap_or(DEFAULT_FIND_LIMIT)
            .min(MAX_FIND_LIMIT) as usize;

        let Some(index) = table.column_index(column) else {
            return ToolResult::error(format!(
                "Unknown column '{}'. Columns: {}",
                column,
                table.headers.join(", ")
            ));
        };

        let matches = rows_where_eq(table, index, &value, limit);
        if matches.is_empty() {
            return ToolResult::success("No matching rows".to_string());
        }

        match to_csv_lines(&matches) {
            Ok(lines) => ToolResult::success(lines),
            Err(e) => ToolResult::error(format!("Failed to render rows: {}", e)),
        }
    }

    /// Run Python code with the dataset directory as working directory.
    async fn run_python(&self, args: &Value) -> ToolResult {
        let code = match args.get("code").and_then(|v| v.as_str()) {
            Some(c) => c,
            None => return ToolResult::error("Missing required parameter: code".to_string()),
        };

        let child = Command::new(&self.code.python)
            .arg("-c")
            .arg(code)
            .current_dir(self.catalog.root())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn();

        let child = match child {
            Ok(c) => c,
            Err(e) => {
                return ToolResult::error(format!("Failed to start {}: {}", self.code.python, e))
            }
        };

        let output = match tokio::time::timeout(self.code.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => return ToolResult::error(format!("Execution failed: {}", e)),
            Err(_) => {
                return ToolResult::error(format!(
                    "Execution timed out after {}s",
                    self.code.timeout.as_secs()
                ))
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        if output.status.success() {
            if stderr.trim().is_empty() {
                ToolResult::success(stdout)
            } else {
                ToolResult::success(format!("{}\nstderr:\n{}", stdout, stderr))
            }
        } else {
            ToolResult::error(format!("{}\n{}{}", output.status, stdout, stderr))
        }
    }

    fn dataset_arg(&self, args: &Value) -> Result<(DatasetId, &Table), ToolResult> {
        let name = args
            .get("dataset")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ToolResult::error("Missing required parameter: dataset".to_string()))?;

        let id: DatasetId = name.parse().map_err(|e| {
            ToolResult::error(format!("{}. Call list_datasets for valid names.", e))
        })?;

        let table = self
            .catalog
            .get(id)
            .map_err(|e| ToolResult::error(e.to_string()))?;

        Ok((id, table))
    }
}

/// Render a table as CSV text, header first.
fn to_csv_lines(table: &Table) -> csv::Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&table.headers)?;
    for row in &table.rows {
        writer.write_record(row)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).to_string())
}

fn truncate(mut text: String, max: usize) -> String {
    if text.len() <= max {
        return text;
    }

    let mut cut = max;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    text.truncate(cut);
    text.push_str("\n... [truncated]");
    text
}

/// Get the tool definitions for the Ollama API.
pub fn get_tool_definitions(allow_code_execution: bool) -> Vec<ToolDefinition> {
    let mut tools = vec![
        ToolDefinition {
            tool_type: "function".to_string(),
            function: FunctionDefinition {
                name: "list_datasets".to_string(),
                description: "List the loaded Pokémon datasets with their file names and sizes.".to_string(),
                parameters: json!({
                    "type": "object",
                    "properties": {},
                    "required": []
                }),
            },
        },
        ToolDefinition {
            tool_type: "function".to_string(),
            function: FunctionDefinition {
                name: "describe_dataset".to_string(),
                description: "Show the columns and first rows of a dataset.".to_string(),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "dataset": {
                            "type": "string",
                            "description": "Dataset id from list_datasets, e.g. 'all-pokemon-stats'"
                        }
                    },
                    "required": ["dataset"]
                }),
            },
        },
        ToolDefinition {
            tool_type: "function".to_string(),
            function: FunctionDefinition {
                name: "find_rows".to_string(),
                description: "Return rows of a dataset where a column equals a value exactly.".to_string(),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "dataset": {
                            "type": "string",
                            "description": "Dataset id from list_datasets"
                        },
                        "column": {
                            "type": "string",
                            "description": "Column name, case-sensitive"
                        },
                        "value": {
                            "type": "string",
                            "description": "Exact cell value to match"
                        },
                        "limit": {
                            "type": "integer",
                            "description": "Maximum number of rows (default: 20)"
                        }
                    },
                    "required": ["dataset", "column", "value"]
                }),
            },
        },
    ];

    if allow_code_execution {
        tools.push(ToolDefinition {
            tool_type: "function".to_string(),
            function: FunctionDefinition {
                name: "run_python".to_string(),
                description: "Run Python code for calculations. The working directory holds the dataset CSV files, so pandas can read them by file name. Print the values you need.".to_string(),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "code": {
                            "type": "string",
                            "description": "Python source to execute"
                        }
                    },
                    "required": ["code"]
                }),
            },
        });
    }

    tools
}
