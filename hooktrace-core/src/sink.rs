use std::sync::Mutex;

use serde::{Deserialize, Serialize};

/// Severity of a line handed to the log sink. This system only ever emits
/// at these two levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Debug,
    Warning,
}

/// External collaborator that delivers log lines.
pub trait LogSink: Send + Sync {
    fn emit(&self, severity: Severity, message: &str);
}

/// Sink that forwards to the `tracing` subscriber.
#[derive(Debug, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn emit(&self, severity: Severity, message: &str) {
        match severity {
            Severity::Debug => tracing::debug!(target: "hooktrace", "{message}"),
            Severity::Warning => tracing::warn!(target: "hooktrace", "{message}"),
        }
    }
}

/// Capture sink for tests and embedders that inspect the trail.
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<(Severity, String)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<(Severity, String)> {
        match self.lines.lock() {
            Ok(lines) => lines.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn messages(&self) -> Vec<String> {
        self.lines().into_iter().map(|(_, m)| m).collect()
    }

    /// Number of captured lines containing `needle`.
    pub fn count_containing(&self, needle: &str) -> usize {
        self.lines()
            .iter()
            .filter(|(_, m)| m.contains(needle))
            .count()
    }
}

impl LogSink for MemorySink {
    fn emit(&self, severity: Severity, message: &str) {
        let mut lines = match self.lines.lock() {
            Ok(lines) => lines,
            Err(poisoned) => poisoned.into_inner(),
        };
        lines.push((severity, message.to_string()));
    }
}
