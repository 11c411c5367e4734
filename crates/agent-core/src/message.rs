//! Conversation Messages
//!
//! Role-tagged message shapes, the append-only conversation log, and the
//! input items an agent round feeds back to a model.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Role of a message sender
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System prompt/instructions
    System,
    /// User input
    User,
    /// Assistant (LLM) response
    Assistant,
    /// Tool results
    Tool,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::System => write!(f, "system"),
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
            Self::Tool => write!(f, "tool"),
        }
    }
}

/// Tool call request from the model
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCall {
    pub tool_call_id: String,
    /// Model-facing tool name
    pub tool_name: String,
    #[serde(default)]
    pub args: Value,
}

impl ToolCall {
    pub fn new(tool_call_id: impl Into<String>, tool_name: impl Into<String>, args: Value) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            tool_name: tool_name.into(),
            args,
        }
    }

    /// Call with a generated identifier, for backends that do not assign one
    pub fn generated(tool_name: impl Into<String>, args: Value) -> Self {
        Self::new(uuid::Uuid::new_v4().to_string(), tool_name, args)
    }
}

/// Result of one executed tool call
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallResult {
    pub tool_call_id: String,
    pub tool_name: String,
    pub result: Value,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

impl ToolCallResult {
    pub fn success(tool_call_id: impl Into<String>, tool_name: impl Into<String>, result: Value) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            tool_name: tool_name.into(),
            result,
            is_error: false,
        }
    }

    pub fn failure(
        tool_call_id: impl Into<String>,
        tool_name: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            tool_name: tool_name.into(),
            result: Value::String(error.into()),
            is_error: true,
        }
    }
}

/// A tool call result plus optional caller metadata
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallOutcome {
    pub tool_call_result: ToolCallResult,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl From<ToolCallResult> for ToolCallOutcome {
    fn from(tool_call_result: ToolCallResult) -> Self {
        Self {
            tool_call_result,
            metadata: None,
        }
    }
}

/// A piece of assistant output
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum AssistantPart {
    Text { text: String },
    ToolCall(ToolCall),
}

/// A single message in a conversation, tagged by role
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Message {
    System { content: String },
    User { content: String },
    Assistant { content: Vec<AssistantPart> },
    Tool { content: Vec<ToolCallResult> },
}

impl Message {
    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self::System {
            content: content.into(),
        }
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::User {
            content: content.into(),
        }
    }

    /// Create a text-only assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::Assistant {
            content: vec![AssistantPart::Text {
                text: content.into(),
            }],
        }
    }

    /// Assistant message carrying optional text followed by tool calls
    pub fn assistant_with_calls(text: impl Into<String>, calls: Vec<ToolCall>) -> Self {
        let text = text.into();
        let mut content = Vec::with_capacity(calls.len() + 1);
        if !text.is_empty() {
            content.push(AssistantPart::Text { text });
        }
        content.extend(calls.into_iter().map(AssistantPart::ToolCall));
        Self::Assistant { content }
    }

    /// Create a tool results message
    pub const fn tool(results: Vec<ToolCallResult>) -> Self {
        Self::Tool { content: results }
    }

    pub const fn role(&self) -> Role {
        match self {
            Self::System { .. } => Role::System,
            Self::User { .. } => Role::User,
            Self::Assistant { .. } => Role::Assistant,
            Self::Tool { .. } => Role::Tool,
        }
    }

    /// Concatenated text content; tool calls and tool results contribute nothing
    pub fn text(&self) -> String {
        match self {
            Self::System { content } | Self::User { content } => content.clone(),
            Self::Assistant { content } => content
                .iter()
                .filter_map(|part| match part {
                    AssistantPart::Text { text } => Some(text.as_str()),
                    AssistantPart::ToolCall(_) => None,
                })
                .collect(),
            Self::Tool { .. } => String::new(),
        }
    }

    /// Tool calls requested by an assistant message
    pub fn tool_calls(&self) -> Vec<&ToolCall> {
        match self {
            Self::Assistant { content } => content
                .iter()
                .filter_map(|part| match part {
                    AssistantPart::ToolCall(call) => Some(call),
                    AssistantPart::Text { .. } => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Append-only conversation history
///
/// Entries are never edited or removed once pushed; the log only grows.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a message
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn extend<I: IntoIterator<Item = Message>>(&mut self, messages: I) {
        self.messages.extend(messages);
    }

    /// Get all messages
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Get the last message
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Entries appended after the first `len` messages
    pub fn since(&self, len: usize) -> &[Message] {
        self.messages.get(len..).unwrap_or_default()
    }

    /// Number of messages
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.messages.iter()
    }

    pub fn into_messages(self) -> Vec<Message> {
        self.messages
    }
}

impl From<Vec<Message>> for Conversation {
    fn from(messages: Vec<Message>) -> Self {
        Self { messages }
    }
}

impl FromIterator<Message> for Conversation {
    fn from_iter<I: IntoIterator<Item = Message>>(iter: I) -> Self {
        Self {
            messages: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Conversation {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.iter()
    }
}

/// One entry of a batched agent input
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InputItem {
    Text(String),
    ToolResult(ToolCallOutcome),
}

impl From<&str> for InputItem {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for InputItem {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<ToolCallOutcome> for InputItem {
    fn from(outcome: ToolCallOutcome) -> Self {
        Self::ToolResult(outcome)
    }
}

/// Input handed to a model: a single prompt or a batch of items
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AgentInput {
    Prompt(String),
    Batch(Vec<InputItem>),
}

impl AgentInput {
    /// Normalize to an ordered sequence of items
    pub fn into_items(self) -> Vec<InputItem> {
        match self {
            Self::Prompt(text) => vec![InputItem::Text(text)],
            Self::Batch(items) => items,
        }
    }

    pub fn as_prompt(&self) -> Option<&str> {
        match self {
            Self::Prompt(text) => Some(text.as_str()),
            Self::Batch(_) => None,
        }
    }

    /// Append this input to a conversation.
    ///
    /// A prompt becomes one user message. A batch contributes every tool result
    /// as a single tool message first, then each text item as its own user
    /// message, each group in its given order.
    pub fn append_to(&self, conversation: &mut Conversation) {
        match self {
            Self::Prompt(text) => conversation.push(Message::user(text.clone())),
            Self::Batch(items) => {
                let results: Vec<ToolCallResult> = items
                    .iter()
                    .filter_map(|item| match item {
                        InputItem::ToolResult(outcome) => Some(outcome.tool_call_result.clone()),
                        InputItem::Text(_) => None,
                    })
                    .collect();
                if !results.is_empty() {
                    conversation.push(Message::tool(results));
                }
                for item in items {
                    if let InputItem::Text(text) = item {
                        conversation.push(Message::user(text.clone()));
                    }
                }
            }
        }
    }
}

impl From<&str> for AgentInput {
    fn from(text: &str) -> Self {
        Self::Prompt(text.to_string())
    }
}

impl From<String> for AgentInput {
    fn from(text: String) -> Self {
        Self::Prompt(text)
    }
}

impl From<Vec<InputItem>> for AgentInput {
    fn from(items: Vec<InputItem>) -> Self {
        Self::Batch(items)
    }
}

impl From<Vec<ToolCallOutcome>> for AgentInput {
    fn from(outcomes: Vec<ToolCallOutcome>) -> Self {
        Self::Batch(outcomes.into_iter().map(InputItem::ToolResult).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn outcome(id: &str) -> InputItem {
        InputItem::ToolResult(ToolCallResult::success(id, "START", json!({"ok": true})).into())
    }

    #[test]
    fn test_message_creation() {
        let msg = Message::user("Hello");
        assert_eq!(msg.role(), Role::User);
        assert_eq!(msg.text(), "Hello");
    }

    #[test]
    fn test_assistant_with_calls() {
        let call = ToolCall::new("call-1", "START", json!({"randomNumber": 7}));
        let msg = Message::assistant_with_calls("", vec![call.clone()]);
        assert_eq!(msg.tool_calls(), vec![&call]);
        assert_eq!(msg.text(), "");
    }

    #[test]
    fn test_prompt_appends_one_user_message() {
        let mut conv = Conversation::new();
        AgentInput::from("hi").append_to(&mut conv);
        assert_eq!(conv.messages(), &[Message::user("hi")]);
    }

    #[test]
    fn test_batch_groups_tool_results_before_text() {
        let input = AgentInput::Batch(vec![
            "first".into(),
            outcome("a"),
            "second".into(),
            outcome("b"),
        ]);
        let mut conv = Conversation::new();
        input.append_to(&mut conv);

        assert_eq!(conv.len(), 3);
        match &conv.messages()[0] {
            Message::Tool { content } => {
                let ids: Vec<&str> = content.iter().map(|r| r.tool_call_id.as_str()).collect();
                assert_eq!(ids, vec!["a", "b"]);
            }
            other => panic!("expected tool message, got {other:?}"),
        }
        assert_eq!(conv.messages()[1], Message::user("first"));
        assert_eq!(conv.messages()[2], Message::user("second"));
    }

    #[test]
    fn test_batch_without_results_has_no_tool_message() {
        let mut conv = Conversation::new();
        AgentInput::Batch(vec!["only text".into()]).append_to(&mut conv);
        assert_eq!(conv.messages(), &[Message::user("only text")]);
    }

    #[test]
    fn test_since_returns_appended_tail() {
        let mut conv: Conversation = vec![Message::system("s")].into();
        conv.push(Message::user("u"));
        assert_eq!(conv.since(1), &[Message::user("u")]);
        assert!(conv.since(5).is_empty());
    }

    #[test]
    fn test_message_serializes_with_role_tag() {
        let value = serde_json::to_value(Message::user("x")).unwrap();
        assert_eq!(value, json!({"role": "user", "content": "x"}));
    }
}
