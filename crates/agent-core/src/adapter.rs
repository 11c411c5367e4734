//! Model Adapters
//!
//! Every registered model identifier is served by one [`ModelAdapter`]. Two
//! implementations present the same contract to the agent:
//!
//! - [`ToolCallingModel`] passes tool schemas straight to a tool-capable backend.
//! - [`NonToolCallingModel`] describes the tools in the prompt, lets its backend
//!   answer in free text, then asks a tool-capable delegate adapter to turn that
//!   answer into a structured call.
//!
//! The variant is chosen when the adapter is registered; nothing downstream
//! branches on it.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::message::{AgentInput, Conversation, InputItem, ToolCall};
use crate::prompt::{PromptRetriever, RewrittenPrompt, ToolPromptWriter};
use crate::provider::{
    DEFAULT_TEMPERATURE, FinishReason, GenerateRequest, LanguageModel, TokenUsage,
};
use crate::tool::Tool;

/// Per-backend-call accounting
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CallMetadata {
    pub model: String,
    pub temperature: f32,
    pub usage: Option<TokenUsage>,
    pub created_at: DateTime<Utc>,
}

/// One conversation turn as seen by the agent
#[derive(Clone, Debug, PartialEq)]
pub enum ModelResponse {
    /// The model wants tools run before it continues
    ToolCalls {
        tool_calls: Vec<ToolCall>,
        messages: Conversation,
        metadata: Vec<CallMetadata>,
    },
    /// Terminal text, whatever the reason the backend stopped
    Finished {
        finish_reason: FinishReason,
        text: String,
        messages: Conversation,
        metadata: Vec<CallMetadata>,
    },
}

impl ModelResponse {
    pub const fn finish_reason(&self) -> FinishReason {
        match self {
            Self::ToolCalls { .. } => FinishReason::ToolCalls,
            Self::Finished { finish_reason, .. } => *finish_reason,
        }
    }

    /// Accumulated history, everything appended during the call included
    pub const fn messages(&self) -> &Conversation {
        match self {
            Self::ToolCalls { messages, .. } | Self::Finished { messages, .. } => messages,
        }
    }

    pub fn metadata(&self) -> &[CallMetadata] {
        match self {
            Self::ToolCalls { metadata, .. } | Self::Finished { metadata, .. } => metadata,
        }
    }

    /// Final text; `None` for a tool-call turn
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::ToolCalls { .. } => None,
            Self::Finished { text, .. } => Some(text),
        }
    }

    pub fn tool_calls(&self) -> &[ToolCall] {
        match self {
            Self::ToolCalls { tool_calls, .. } => tool_calls,
            Self::Finished { .. } => &[],
        }
    }

    pub fn into_messages(self) -> Conversation {
        match self {
            Self::ToolCalls { messages, .. } | Self::Finished { messages, .. } => messages,
        }
    }
}

/// Arguments of one adapter call
#[derive(Clone, Debug)]
pub struct ModelCall {
    pub instructions: String,
    pub input: AgentInput,
    pub tools: Vec<Tool>,
    /// Prior history the input is appended to
    pub messages: Conversation,
    pub temperature: Option<f32>,
}

impl ModelCall {
    pub fn new(instructions: impl Into<String>, input: impl Into<AgentInput>) -> Self {
        Self {
            instructions: instructions.into(),
            input: input.into(),
            tools: Vec::new(),
            messages: Conversation::new(),
            temperature: None,
        }
    }

    #[must_use]
    pub fn tools(mut self, tools: Vec<Tool>) -> Self {
        self.tools = tools;
        self
    }

    #[must_use]
    pub fn messages(mut self, messages: Conversation) -> Self {
        self.messages = messages;
        self
    }

    #[must_use]
    pub const fn temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }
}

/// Uniform call contract over one configured backend model
#[async_trait]
pub trait ModelAdapter: Send + Sync {
    /// Registry key
    fn name(&self) -> &str;

    async fn call(&self, call: ModelCall) -> Result<ModelResponse>;
}

/// Append `input` to `messages`, run the backend once and classify the result.
async fn generate(
    backend: &dyn LanguageModel,
    system: Option<String>,
    input: &AgentInput,
    tools: &[Tool],
    mut messages: Conversation,
    temperature: Option<f32>,
) -> Result<ModelResponse> {
    input.append_to(&mut messages);
    let temperature = temperature.unwrap_or(DEFAULT_TEMPERATURE);

    let mut request = GenerateRequest::new(messages.messages().to_vec())
        .system(system.unwrap_or_default())
        .temperature(temperature);
    if !tools.is_empty() {
        request = request.tools(tools.iter().map(Tool::schema).collect());
    }

    tracing::debug!(
        model = %backend.model_id(),
        messages = request.messages.len(),
        tools = tools.len(),
        "Calling backend model"
    );
    let generation = backend.generate(request).await?;
    messages.extend(generation.messages);

    let metadata = vec![CallMetadata {
        model: backend.model_id().to_string(),
        temperature,
        usage: generation.usage,
        created_at: Utc::now(),
    }];

    Ok(match generation.finish_reason {
        FinishReason::ToolCalls => ModelResponse::ToolCalls {
            tool_calls: generation.tool_calls,
            messages,
            metadata,
        },
        finish_reason => ModelResponse::Finished {
            finish_reason,
            text: generation.text,
            messages,
            metadata,
        },
    })
}

/// Adapter for backends with native tool calling
pub struct ToolCallingModel {
    name: String,
    backend: Arc<dyn LanguageModel>,
    prompt_retriever: Option<Arc<PromptRetriever>>,
}

impl ToolCallingModel {
    pub fn new(name: impl Into<String>, backend: Arc<dyn LanguageModel>) -> Self {
        Self {
            name: name.into(),
            backend,
            prompt_retriever: None,
        }
    }

    /// Rewrite `(instructions, prompt)` before each call
    #[must_use]
    pub fn with_prompt_retriever<F>(mut self, retriever: F) -> Self
    where
        F: Fn(&str, &str) -> RewrittenPrompt + Send + Sync + 'static,
    {
        self.prompt_retriever = Some(Arc::new(retriever));
        self
    }
}

#[async_trait]
impl ModelAdapter for ToolCallingModel {
    fn name(&self) -> &str {
        &self.name
    }

    async fn call(&self, call: ModelCall) -> Result<ModelResponse> {
        let (system, input) = match &self.prompt_retriever {
            None => (Some(call.instructions), call.input),
            Some(retriever) => match call.input {
                AgentInput::Prompt(prompt) => {
                    let rewritten = retriever(&call.instructions, &prompt);
                    (rewritten.system, AgentInput::Prompt(rewritten.prompt))
                }
                batch @ AgentInput::Batch(_) => (retriever(&call.instructions, "").system, batch),
            },
        };

        generate(
            self.backend.as_ref(),
            system,
            &input,
            &call.tools,
            call.messages,
            call.temperature,
        )
        .await
    }
}

/// Adapter for backends that cannot call tools natively
pub struct NonToolCallingModel {
    name: String,
    backend: Arc<dyn LanguageModel>,
    delegate: Arc<dyn ModelAdapter>,
    write_prompt: Arc<ToolPromptWriter>,
}

impl NonToolCallingModel {
    pub fn new<F>(
        name: impl Into<String>,
        backend: Arc<dyn LanguageModel>,
        delegate: Arc<dyn ModelAdapter>,
        write_prompt: F,
    ) -> Self
    where
        F: Fn(&[Tool], &str, &str) -> RewrittenPrompt + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            backend,
            delegate,
            write_prompt: Arc::new(write_prompt),
        }
    }

    pub fn delegate(&self) -> &Arc<dyn ModelAdapter> {
        &self.delegate
    }
}

#[async_trait]
impl ModelAdapter for NonToolCallingModel {
    fn name(&self) -> &str {
        &self.name
    }

    async fn call(&self, call: ModelCall) -> Result<ModelResponse> {
        let rewritten = (self.write_prompt)(
            &call.tools,
            &call.instructions,
            call.input.as_prompt().unwrap_or_default(),
        );
        // A batch keeps its items; the tool description rides along as a trailing text entry
        let input = match &call.input {
            AgentInput::Prompt(_) => AgentInput::Prompt(rewritten.prompt),
            AgentInput::Batch(items) => {
                let mut items = items.clone();
                if !rewritten.prompt.is_empty() {
                    items.push(InputItem::Text(rewritten.prompt));
                }
                AgentInput::Batch(items)
            }
        };

        let first = generate(
            self.backend.as_ref(),
            rewritten.system,
            &input,
            &[],
            call.messages,
            call.temperature,
        )
        .await?;

        let first_reason = first.finish_reason();
        if first_reason != FinishReason::Stop {
            tracing::debug!(model = %self.name, reason = %first_reason, "Skipping tool delegation");
            return Ok(first);
        }

        // The delegate continues the planner's history so tool results stay
        // right after the assistant turn that requested them
        let plan = first.text().unwrap_or_default().to_string();
        let planned_len = first.messages().len();
        let second = self
            .delegate
            .call(ModelCall {
                instructions: call.instructions,
                input: AgentInput::Prompt(plan),
                tools: call.tools,
                messages: first.messages().clone(),
                temperature: call.temperature,
            })
            .await?;

        let mut messages = first.messages().clone();
        messages.extend(second.messages().since(planned_len).iter().cloned());
        let mut metadata = first.metadata().to_vec();
        metadata.extend_from_slice(second.metadata());

        Ok(match second {
            ModelResponse::ToolCalls { tool_calls, .. } => ModelResponse::ToolCalls {
                tool_calls,
                messages,
                metadata,
            },
            ModelResponse::Finished { text, .. } => ModelResponse::Finished {
                finish_reason: first_reason,
                text,
                messages,
                metadata,
            },
        })
    }
}
