//! Append-only question/answer history.
//!
//! Each entry is one line of plain text: `timestamp, question, answer`.
//! Fields are not escaped, so a question or answer containing `", "` or a
//! newline cannot be split back into the original three fields. Lines are
//! always reloaded verbatim; parsing into fields is best-effort.
//!
//! There is no locking: concurrent writers may interleave lines.

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default history file name, relative to the working directory.
pub const DEFAULT_HISTORY_FILE: &str = "history.txt";

/// Separator between the three fields of a line.
pub const FIELD_SEPARATOR: &str = ", ";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// A history line split into its fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    pub timestamp: String,
    pub question: String,
    pub answer: String,
}

/// One line of the history file, exactly as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryLine {
    pub raw: String,
}

impl HistoryLine {
    /// Split the line into fields. Lines with fewer than three fields yield `None`.
    ///
    /// Everything after the second separator is the answer, so an answer
    /// containing the separator survives; a question containing it does not.
    pub fn entry(&self) -> Option<HistoryEntry> {
        let mut parts = self.raw.splitn(3, FIELD_SEPARATOR);
        let timestamp = parts.next()?;
        let question = parts.next()?;
        let answer = parts.next()?;

        Some(HistoryEntry {
            timestamp: timestamp.to_string(),
            question: question.to_string(),
            answer: answer.to_string(),
        })
    }
}

/// Format one history line (without the trailing newline).
pub fn format_line(timestamp: &DateTime<Local>, question: &str, answer: &str) -> String {
    format!(
        "{}{sep}{}{sep}{}",
        timestamp.format(TIMESTAMP_FORMAT),
        question,
        answer,
        sep = FIELD_SEPARATOR
    )
}

/// The history file.
#[derive(Debug, Clone)]
pub struct HistoryLog {
    path: PathBuf,
}

impl HistoryLog {
    /// Create a handle; the file is created on first append.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the history file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append an entry stamped with the current local time.
    pub fn append(&self, question: &str, answer: &str) -> Result<()> {
        self.append_at(&Local::now(), question, answer)
    }

    /// Append an entry with an explicit timestamp.
    pub fn append_at(&self, timestamp: &DateTime<Local>, question: &str, answer: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open history file: {}", self.path.display()))?;

        let line = format_line(timestamp, question, answer);
        writeln!(file, "{}", line)
            .with_context(|| format!("Failed to write history file: {}", self.path.display()))?;

        debug!("Appended history entry to {}", self.path.display());
        Ok(())
    }

    /// Load every line. A missing file is an empty history.
    pub fn load(&self) -> Result<Vec<HistoryLine>> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No history file at {}", self.path.display());
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to read history file: {}", self.path.display())
                })
            }
        };

        let content = String::from_utf8_lossy(&bytes);
        Ok(content
            .lines()
            .map(|line| HistoryLine {
                raw: line.to_string(),
            })
            .collect())
    }
}
