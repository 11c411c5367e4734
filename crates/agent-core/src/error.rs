//! Error Types

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for agent operations
pub type Result<T> = std::result::Result<T, AgentError>;

/// Agent error types
#[derive(Error, Debug)]
pub enum AgentError {
    /// Tool parameters, tool config or tool output failed schema validation
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Tool name or type not present on the agent
    #[error("Tool not found: {0}")]
    UnknownTool(String),

    /// Model identifier not present in the registry
    #[error("Model not registered: {0}")]
    UnknownModel(String),

    /// Model identifier not in the agent's permitted set
    #[error("Model '{model}' is not permitted for agent '{agent}'")]
    ModelNotPermitted { agent: String, model: String },

    /// Instruction fragment references an unknown tool type or model
    #[error("Invalid instruction: {0}")]
    InvalidInstruction(String),

    /// Tool body failed
    #[error("Tool '{tool}' failed: {message}")]
    ToolExecution { tool: String, message: String },

    /// Tool body did not settle in time
    #[error("Tool '{tool}' timed out after {after:?}")]
    ToolTimeout { tool: String, after: Duration },

    /// Backend model error
    #[error("Provider error: {0}")]
    Provider(String),

    /// Backend unavailable or not responding
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Rate limited by the backend
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Authentication with the backend failed
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Loop exceeded its configured round limit
    #[error("Maximum tool rounds ({0}) reached")]
    MaxRounds(usize),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Other/unknown error
    #[error("{0}")]
    Other(String),
}

impl AgentError {
    /// Check if error is retryable
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ProviderUnavailable(_) | Self::RateLimited(_) | Self::ToolTimeout { .. }
        )
    }

    /// Resolution failures: an identifier the agent or registry does not know.
    pub const fn is_resolution(&self) -> bool {
        matches!(
            self,
            Self::UnknownTool(_)
                | Self::UnknownModel(_)
                | Self::ModelNotPermitted { .. }
                | Self::InvalidInstruction(_)
        )
    }

    pub(crate) fn tool_execution(tool: impl Into<String>, err: impl fmt::Display) -> Self {
        Self::ToolExecution {
            tool: tool.into(),
            message: err.to_string(),
        }
    }
}

impl From<anyhow::Error> for AgentError {
    fn from(err: anyhow::Error) -> Self {
        // Keep typed agent errors raised inside tool bodies intact
        match err.downcast::<Self>() {
            Ok(inner) => inner,
            Err(err) => Self::Other(format!("{err:#}")),
        }
    }
}

/// One offending field in a validation failure
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldIssue {
    /// Dotted path of the field (`"."` for the value itself)
    pub field: String,
    pub message: String,
}

/// Structured schema validation failure
#[derive(Error, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub issues: Vec<FieldIssue>,
}

impl ValidationError {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single-issue error
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut err = Self::new();
        err.push(field, message);
        err
    }

    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.issues.push(FieldIssue {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// Names of all offending fields, in discovery order
    pub fn fields(&self) -> Vec<&str> {
        self.issues.iter().map(|i| i.field.as_str()).collect()
    }

    /// Prefix every field path, used when nesting validation results
    #[must_use]
    pub fn within(mut self, parent: &str) -> Self {
        for issue in &mut self.issues {
            issue.field = if issue.field == "." {
                parent.to_string()
            } else {
                format!("{parent}.{}", issue.field)
            };
        }
        self
    }

    pub(crate) fn into_result(self) -> std::result::Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl From<serde_json::Error> for ValidationError {
    fn from(err: serde_json::Error) -> Self {
        Self::field(".", err.to_string())
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.issues.is_empty() {
            return write!(f, "invalid input");
        }
        let parts: Vec<String> = self
            .issues
            .iter()
            .map(|i| format!("{}: {}", i.field, i.message))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}
