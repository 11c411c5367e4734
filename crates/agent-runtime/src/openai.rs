//! OpenAI-compatible chat-completions backend
//!
//! One `LanguageModel` implementation covers every vendor that exposes the
//! `/chat/completions` wire format: OpenAI itself, Anthropic and Gemini
//! compatibility endpoints, and a local Ollama server under `/v1`.

use std::collections::HashSet;
use std::time::Duration;

use agent_core::{
    error::{AgentError, Result},
    message::{AssistantPart, Message, ToolCall},
    provider::{FinishReason, GenerateRequest, Generation, LanguageModel, TokenUsage},
    tool::ToolSchema,
};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{Map, Value, json};

const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Endpoint configuration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpenAiConfig {
    /// Base URL up to and including the version segment, e.g. `https://api.openai.com/v1`
    pub base_url: String,

    /// Bearer token; local servers usually need none
    pub api_key: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self::openai(None)
    }
}

impl OpenAiConfig {
    pub fn openai(api_key: Option<String>) -> Self {
        Self {
            base_url: "https://api.openai.com/v1".into(),
            api_key,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn anthropic(api_key: Option<String>) -> Self {
        Self {
            base_url: "https://api.anthropic.com/v1".into(),
            api_key,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn gemini(api_key: Option<String>) -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com/v1beta/openai".into(),
            api_key,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn ollama(host: &str, port: u16) -> Self {
        Self {
            base_url: format!("{}:{port}/v1", host.trim_end_matches('/')),
            api_key: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// `OPENAI_BASE_URL`, `OPENAI_API_KEY`, `AGENT_HTTP_TIMEOUT_SECS`
    pub fn from_env() -> Self {
        Self::openai(env_key("OPENAI_API_KEY"))
            .with_base_url_env("OPENAI_BASE_URL")
            .with_timeout_env()
    }

    /// `ANTHROPIC_BASE_URL`, `ANTHROPIC_API_KEY`, `AGENT_HTTP_TIMEOUT_SECS`
    pub fn anthropic_from_env() -> Self {
        Self::anthropic(env_key("ANTHROPIC_API_KEY"))
            .with_base_url_env("ANTHROPIC_BASE_URL")
            .with_timeout_env()
    }

    /// `GEMINI_BASE_URL`, `GEMINI_API_KEY`, `AGENT_HTTP_TIMEOUT_SECS`
    pub fn gemini_from_env() -> Self {
        Self::gemini(env_key("GEMINI_API_KEY"))
            .with_base_url_env("GEMINI_BASE_URL")
            .with_timeout_env()
    }

    /// `OLLAMA_HOST`, `OLLAMA_PORT`, `AGENT_HTTP_TIMEOUT_SECS`
    pub fn ollama_from_env() -> Self {
        let host = std::env::var("OLLAMA_HOST").unwrap_or_else(|_| "http://localhost".into());
        let port = std::env::var("OLLAMA_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(11434);
        Self::ollama(&host, port).with_timeout_env()
    }

    fn with_base_url_env(mut self, var: &str) -> Self {
        if let Some(base_url) = env_key(var) {
            self.base_url = base_url;
        }
        self
    }

    fn with_timeout_env(mut self) -> Self {
        if let Some(secs) = std::env::var("AGENT_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            self.timeout_secs = secs;
        }
        self
    }

    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    pub fn models_url(&self) -> String {
        format!("{}/models", self.base_url.trim_end_matches('/'))
    }
}

fn env_key(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|key| !key.trim().is_empty())
}

/// A single backend model reached over the chat-completions API
pub struct OpenAiModel {
    client: reqwest::Client,
    config: OpenAiConfig,
    model: String,
    sends_temperature: bool,
}

impl OpenAiModel {
    /// `model` is the vendor's own model name
    pub fn new(config: OpenAiConfig, model: impl Into<String>) -> Result<Self> {
        if config.base_url.trim().is_empty() {
            return Err(AgentError::Config("Backend base URL is empty".into()));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AgentError::Config(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            config,
            model: model.into(),
            sends_temperature: true,
        })
    }

    /// Leave sampling temperature to the server (reasoning models reject it)
    #[must_use]
    pub const fn without_temperature(mut self) -> Self {
        self.sends_temperature = false;
        self
    }

    pub const fn config(&self) -> &OpenAiConfig {
        &self.config
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }
}

#[async_trait]
impl LanguageModel for OpenAiModel {
    fn model_id(&self) -> &str {
        &self.model
    }

    async fn generate(&self, request: GenerateRequest) -> Result<Generation> {
        let mut payload = build_payload(&self.model, &request);
        if !self.sends_temperature {
            if let Some(fields) = payload.as_object_mut() {
                fields.remove("temperature");
            }
        }
        tracing::debug!(
            model = %self.model,
            url = %self.config.completions_url(),
            messages = request.messages.len(),
            "Sending chat completion"
        );

        let response = self
            .authorized(self.client.post(self.config.completions_url()))
            .json(&payload)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body));
        }

        let body: Value = response.json().await.map_err(transport_error)?;
        parse_response(&body)
    }

    async fn health_check(&self) -> Result<bool> {
        match self
            .authorized(self.client.get(self.config.models_url()))
            .send()
            .await
        {
            Ok(response) => Ok(response.status().is_success()),
            Err(e) => {
                tracing::warn!(url = %self.config.models_url(), "Backend health check failed: {}", e);
                Ok(false)
            }
        }
    }
}

fn transport_error(err: reqwest::Error) -> AgentError {
    if err.is_connect() || err.is_timeout() {
        AgentError::ProviderUnavailable(err.to_string())
    } else {
        AgentError::Provider(err.to_string())
    }
}

fn status_error(status: StatusCode, body: &str) -> AgentError {
    let detail = format!("{status}: {body}");
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AgentError::Auth(detail),
        StatusCode::TOO_MANY_REQUESTS => AgentError::RateLimited(detail),
        s if s.is_server_error() => AgentError::ProviderUnavailable(detail),
        _ => AgentError::Provider(detail),
    }
}

/// Request body for `/chat/completions`
pub fn build_payload(model: &str, request: &GenerateRequest) -> Value {
    let mut payload = json!({
        "model": model,
        "messages": messages_to_wire(request.system.as_deref(), &request.messages),
        "temperature": request.temperature,
    });
    if let Some(tools) = request.tools.as_deref().filter(|tools| !tools.is_empty()) {
        payload["tools"] = Value::Array(tools_to_wire(tools));
    }
    payload
}

/// History in wire format; each tool result becomes its own `tool` message.
///
/// Tool calls that no tool message answers (a failed call the loop dropped)
/// are left out, since the API rejects an unanswered `tool_calls` entry.
pub fn messages_to_wire(system: Option<&str>, messages: &[Message]) -> Vec<Value> {
    let answered: HashSet<&str> = messages
        .iter()
        .filter_map(|message| match message {
            Message::Tool { content } => Some(content),
            _ => None,
        })
        .flatten()
        .map(|result| result.tool_call_id.as_str())
        .collect();

    let mut wire = Vec::with_capacity(messages.len() + 1);
    if let Some(system) = system.filter(|s| !s.is_empty()) {
        wire.push(json!({"role": "system", "content": system}));
    }

    for message in messages {
        match message {
            Message::System { content } => wire.push(json!({"role": "system", "content": content})),
            Message::User { content } => wire.push(json!({"role": "user", "content": content})),
            Message::Assistant { content } => {
                let mut entry = Map::new();
                entry.insert("role".into(), json!("assistant"));
                let text = message.text();
                let has_text = !text.is_empty();
                entry.insert(
                    "content".into(),
                    if has_text { Value::String(text) } else { Value::Null },
                );
                let calls: Vec<Value> = content
                    .iter()
                    .filter_map(|part| match part {
                        AssistantPart::ToolCall(call)
                            if answered.contains(call.tool_call_id.as_str()) =>
                        {
                            Some(json!({
                                "id": call.tool_call_id,
                                "type": "function",
                                "function": {
                                    "name": call.tool_name,
                                    "arguments": call.args.to_string(),
                                }
                            }))
                        }
                        AssistantPart::ToolCall(_) | AssistantPart::Text { .. } => None,
                    })
                    .collect();
                if calls.is_empty() {
                    if !has_text {
                        continue;
                    }
                } else {
                    entry.insert("tool_calls".into(), Value::Array(calls));
                }
                wire.push(Value::Object(entry));
            }
            Message::Tool { content } => {
                for result in content {
                    let output = match &result.result {
                        Value::String(text) => text.clone(),
                        other => other.to_string(),
                    };
                    wire.push(json!({
                        "role": "tool",
                        "tool_call_id": result.tool_call_id,
                        "content": output,
                    }));
                }
            }
        }
    }

    wire
}

pub fn tools_to_wire(tools: &[ToolSchema]) -> Vec<Value> {
    tools
        .iter()
        .map(|tool| {
            json!({
                "type": "function",
                "function": {
                    "name": tool.name,
                    "description": tool.description,
                    "parameters": tool.parameters,
                }
            })
        })
        .collect()
}

/// Parse a chat-completions response body
pub fn parse_response(body: &Value) -> Result<Generation> {
    if let Some(error) = body.get("error") {
        return Err(AgentError::Provider(format!("Backend error: {error}")));
    }
    let choice = body
        .get("choices")
        .and_then(|choices| choices.get(0))
        .ok_or_else(|| AgentError::Provider("Response carries no choices".into()))?;
    let message = &choice["message"];

    let text = message["content"].as_str().unwrap_or_default().to_string();
    let tool_calls: Vec<ToolCall> = message["tool_calls"]
        .as_array()
        .map(|calls| calls.iter().map(parse_tool_call).collect())
        .unwrap_or_default();

    // some servers report "stop" alongside tool calls
    let finish_reason = if tool_calls.is_empty() {
        parse_finish_reason(choice.get("finish_reason"))
    } else {
        FinishReason::ToolCalls
    };

    let emitted = if tool_calls.is_empty() {
        Message::assistant(text.clone())
    } else {
        Message::assistant_with_calls(text.clone(), tool_calls.clone())
    };

    Ok(Generation {
        finish_reason,
        messages: vec![emitted],
        text,
        tool_calls,
        usage: parse_usage(body.get("usage")),
    })
}

fn parse_tool_call(call: &Value) -> ToolCall {
    let name = call["function"]["name"].as_str().unwrap_or_default();
    // arguments arrive as a JSON string; anything unparsable is handed on
    // verbatim and rejected by parameter validation
    let args = match &call["function"]["arguments"] {
        Value::String(raw) if raw.trim().is_empty() => json!({}),
        Value::String(raw) => serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.clone())),
        other => other.clone(),
    };
    match call["id"].as_str().filter(|id| !id.is_empty()) {
        Some(id) => ToolCall::new(id, name, args),
        None => ToolCall::generated(name, args),
    }
}

fn parse_finish_reason(reason: Option<&Value>) -> FinishReason {
    match reason.and_then(Value::as_str) {
        Some("stop") => FinishReason::Stop,
        Some("length") => FinishReason::Length,
        Some("tool_calls" | "function_call") => FinishReason::ToolCalls,
        Some("content_filter") => FinishReason::ContentFilter,
        Some("error") => FinishReason::Error,
        Some(_) => FinishReason::Other,
        None => FinishReason::Unknown,
    }
}

fn parse_usage(usage: Option<&Value>) -> Option<TokenUsage> {
    let usage = usage?;
    let count = |key: &str| {
        usage
            .get(key)
            .and_then(Value::as_u64)
            .and_then(|n| u32::try_from(n).ok())
    };
    let prompt_tokens = count("prompt_tokens").unwrap_or(0);
    let completion_tokens = count("completion_tokens").unwrap_or(0);
    Some(TokenUsage {
        prompt_tokens,
        completion_tokens,
        total_tokens: count("total_tokens").unwrap_or(prompt_tokens + completion_tokens),
    })
}
