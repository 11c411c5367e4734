//! Backend Model Contract
//!
//! Defines the narrow interface every concrete backend (OpenAI, Ollama,
//! Anthropic, a test stub) implements. Model adapters are the only callers.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agent_core::provider::{GenerateRequest, LanguageModel};
//!
//! let generation = backend.generate(GenerateRequest::new(history)).await?;
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::message::{Message, ToolCall};
use crate::tool::ToolSchema;

/// Sampling temperature used when a call does not specify one
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Reason for completion finishing
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FinishReason {
    /// Model requested tool calls
    ToolCalls,
    /// Normal termination
    Stop,
    Length,
    ContentFilter,
    Error,
    Other,
    #[default]
    Unknown,
}

impl FinishReason {
    /// Anything but a tool-call request ends an agent loop
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::ToolCalls)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ToolCalls => "tool-calls",
            Self::Stop => "stop",
            Self::Length => "length",
            Self::ContentFilter => "content-filter",
            Self::Error => "error",
            Self::Other => "other",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for FinishReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Token usage statistics
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// One backend invocation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenerateRequest {
    /// System text, omitted when empty
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    /// Full message history, latest input included
    pub messages: Vec<Message>,

    /// Tool schemas; `None` means the request carries no tools at all
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ToolSchema>>,

    pub temperature: f32,
}

impl GenerateRequest {
    pub const fn new(messages: Vec<Message>) -> Self {
        Self {
            system: None,
            messages,
            tools: None,
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    /// Set the system text; blank text leaves it unset
    #[must_use]
    pub fn system(mut self, system: impl Into<String>) -> Self {
        let system = system.into();
        self.system = (!system.is_empty()).then_some(system);
        self
    }

    #[must_use]
    pub fn tools(mut self, tools: Vec<ToolSchema>) -> Self {
        self.tools = Some(tools);
        self
    }

    #[must_use]
    pub const fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

/// Response from a backend invocation
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Generation {
    pub finish_reason: FinishReason,

    /// Messages the backend emitted during this call
    #[serde(default)]
    pub messages: Vec<Message>,

    /// Free text output
    #[serde(default)]
    pub text: String,

    /// Structured tool-call requests
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,

    /// Token usage statistics (if available)
    #[serde(default)]
    pub usage: Option<TokenUsage>,
}

impl Generation {
    /// Plain text answer, emitting one assistant message
    pub fn text(finish_reason: FinishReason, text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            finish_reason,
            messages: vec![Message::assistant(text.clone())],
            text,
            tool_calls: Vec::new(),
            usage: None,
        }
    }

    /// Tool-call request, emitting one assistant message carrying the calls
    pub fn tool_calls(calls: Vec<ToolCall>) -> Self {
        Self {
            finish_reason: FinishReason::ToolCalls,
            messages: vec![Message::assistant_with_calls("", calls.clone())],
            text: String::new(),
            tool_calls: calls,
            usage: None,
        }
    }

    #[must_use]
    pub const fn with_usage(mut self, usage: TokenUsage) -> Self {
        self.usage = Some(usage);
        self
    }
}

/// Strategy trait for backend models
///
/// Implement this trait to add support for new LLM backends.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Backend model identifier, reported in call metadata
    fn model_id(&self) -> &str;

    /// Generate a response for the given history
    async fn generate(&self, request: GenerateRequest) -> Result<Generation>;

    /// Check if the backend is available and configured correctly
    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }
}
