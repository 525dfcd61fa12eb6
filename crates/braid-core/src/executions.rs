//! Tool execution records.
//!
//! Every tool invocation the assistant makes is recorded per thread as a
//! [`ToolExecutionRecord`]: what was called, with which arguments, what came
//! back, and where it sits in the thread's total order. The engine derives
//! an `arguments_digest` at insertion so repeated calls with deep-equal
//! arguments collapse onto one cache entry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Outcome classification of a recorded execution.
///
/// An error outcome wins over a skip marker: a tool that failed is reported
/// as failed even if the caller also flagged it skipped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    /// The tool ran and produced a result.
    Success,
    /// The tool ran and failed.
    Error,
    /// The tool was deliberately not run.
    Skipped,
}

impl ExecutionStatus {
    /// Lowercase wire form, matching the serde representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Skipped => "skipped",
        }
    }
}

/// A recorded tool invocation within a thread.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolExecutionRecord {
    /// Position in the thread's total order, shared with messages.
    pub sequence: u64,
    /// Name of the tool that was invoked.
    pub tool_name: String,
    /// Arguments as passed, key order preserved.
    pub arguments: Map<String, Value>,
    /// Canonical digest of `tool_name` + arguments (32 hex chars).
    pub arguments_digest: String,
    /// When the execution was recorded.
    pub timestamp: DateTime<Utc>,
    /// Result payload, when the tool produced one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Failure description, when the tool failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Whether the tool was deliberately not run.
    #[serde(default)]
    pub skipped: bool,
}

impl ToolExecutionRecord {
    /// Classify the outcome. Error takes precedence over skipped.
    #[must_use]
    pub fn status(&self) -> ExecutionStatus {
        if self.error.is_some() {
            ExecutionStatus::Error
        } else if self.skipped {
            ExecutionStatus::Skipped
        } else {
            ExecutionStatus::Success
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
