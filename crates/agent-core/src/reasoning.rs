//! Execution Loop
//!
//! Drives an [`Agent`] through model calls and tool rounds until the model
//! produces a terminal answer.
//!
//! ```text
//!            execute                    finish = tool-calls
//!   start ───────────▶ RUNNING ─────────────────────────────▶ AWAITING_TOOLS
//!                        │  ▲                                      │
//!     any other finish   │  └──── run calls concurrently, ─────────┘
//!                        ▼        feed results back
//!                       DONE ──▶ final text
//! ```
//!
//! A failing tool call is isolated: it is logged and dropped from the round
//! (or reported as an error result when `report_failures` is set) while its
//! siblings complete normally.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use futures::future::join_all;

use crate::adapter::ModelResponse;
use crate::agent::{Agent, ExecuteRequest};
use crate::error::{AgentError, Result};
use crate::message::{
    AgentInput, Conversation, InputItem, ToolCall, ToolCallOutcome, ToolCallResult,
};
use crate::spawn::SpawnAgent;
use crate::tool::Tool;

/// Hook run after each tool round; its output is appended to the next input
pub type AfterToolCalls = dyn Fn(&[ToolCallOutcome]) -> Option<AgentInput> + Send + Sync;

/// Options for [`Agent::execute_loop`]
#[derive(Clone)]
pub struct LoopOptions {
    pub input: AgentInput,
    pub messages: Conversation,
    pub model: Option<String>,
    pub tools: Option<Vec<String>>,
    pub after_tool_calls: Option<Arc<AfterToolCalls>>,
    /// Dump every response and round at info level
    pub verbose_logging: bool,
    /// Per tool call; a call that overruns counts as failed
    pub tool_timeout: Option<Duration>,
    /// Upper bound on tool rounds
    pub max_rounds: Option<usize>,
    /// Feed failed calls back as error results instead of dropping them.
    ///
    /// When off, the assistant turn still lists the dropped call with no
    /// matching result; backends must tolerate or strip that entry.
    pub report_failures: bool,
    pub spawner: SpawnAgent,
}

impl LoopOptions {
    pub fn new(input: impl Into<AgentInput>) -> Self {
        Self {
            input: input.into(),
            messages: Conversation::new(),
            model: None,
            tools: None,
            after_tool_calls: None,
            verbose_logging: false,
            tool_timeout: None,
            max_rounds: None,
            report_failures: false,
            spawner: SpawnAgent::default(),
        }
    }

    #[must_use]
    pub fn messages(mut self, messages: Conversation) -> Self {
        self.messages = messages;
        self
    }

    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    #[must_use]
    pub fn tools<I, S>(mut self, tool_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tools = Some(tool_types.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn after_tool_calls<F>(mut self, hook: F) -> Self
    where
        F: Fn(&[ToolCallOutcome]) -> Option<AgentInput> + Send + Sync + 'static,
    {
        self.after_tool_calls = Some(Arc::new(hook));
        self
    }

    #[must_use]
    pub const fn verbose_logging(mut self, enabled: bool) -> Self {
        self.verbose_logging = enabled;
        self
    }

    #[must_use]
    pub const fn tool_timeout(mut self, timeout: Duration) -> Self {
        self.tool_timeout = Some(timeout);
        self
    }

    #[must_use]
    pub const fn max_rounds(mut self, rounds: usize) -> Self {
        self.max_rounds = Some(rounds);
        self
    }

    #[must_use]
    pub const fn report_failures(mut self, enabled: bool) -> Self {
        self.report_failures = enabled;
        self
    }

    #[must_use]
    pub fn spawner(mut self, spawner: SpawnAgent) -> Self {
        self.spawner = spawner;
        self
    }

    fn step(&self, input: AgentInput, messages: Conversation) -> ExecuteRequest {
        ExecuteRequest {
            input,
            model: self.model.clone(),
            tools: self.tools.clone(),
            messages,
        }
    }
}

impl std::fmt::Debug for LoopOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoopOptions")
            .field("input", &self.input)
            .field("messages", &self.messages.len())
            .field("model", &self.model)
            .field("tools", &self.tools)
            .field("after_tool_calls", &self.after_tool_calls.is_some())
            .field("verbose_logging", &self.verbose_logging)
            .field("tool_timeout", &self.tool_timeout)
            .field("max_rounds", &self.max_rounds)
            .field("report_failures", &self.report_failures)
            .finish_non_exhaustive()
    }
}

enum LoopState {
    Running(ModelResponse),
    AwaitingTools {
        calls: Vec<ToolCall>,
        messages: Conversation,
    },
    Done(String),
}

impl Agent {
    /// Run model calls and tool rounds until a terminal finish reason, then
    /// return the final text.
    ///
    /// Resolution failures and backend errors abort the loop; tool failures
    /// do not.
    pub async fn execute_loop(&self, mut options: LoopOptions) -> Result<String> {
        let input = std::mem::replace(&mut options.input, AgentInput::Batch(Vec::new()));
        let messages = std::mem::take(&mut options.messages);
        let first = self.execute(options.step(input, messages)).await?;

        let mut state = LoopState::Running(first);
        let mut rounds = 0usize;

        loop {
            state = match state {
                LoopState::Running(response) => {
                    if options.verbose_logging {
                        tracing::info!(agent = %self.name(), ?response, "Model response");
                    }
                    match response {
                        ModelResponse::ToolCalls {
                            tool_calls,
                            messages,
                            ..
                        } => LoopState::AwaitingTools {
                            calls: tool_calls,
                            messages,
                        },
                        ModelResponse::Finished {
                            finish_reason,
                            text,
                            ..
                        } => {
                            tracing::debug!(
                                agent = %self.name(),
                                reason = %finish_reason,
                                rounds,
                                "Agent loop finished"
                            );
                            LoopState::Done(text)
                        }
                    }
                }
                LoopState::AwaitingTools { calls, messages } => {
                    rounds += 1;
                    if let Some(max) = options.max_rounds.filter(|max| rounds > *max) {
                        return Err(AgentError::MaxRounds(max));
                    }

                    let outcomes = self.run_tool_round(&calls, &options).await?;
                    if options.verbose_logging {
                        tracing::info!(agent = %self.name(), round = rounds, ?outcomes, "Tool results");
                    }

                    let mut items: Vec<InputItem> = outcomes
                        .iter()
                        .cloned()
                        .map(InputItem::ToolResult)
                        .collect();
                    if let Some(hook) = &options.after_tool_calls {
                        if let Some(extra) = hook(&outcomes) {
                            items.extend(extra.into_items());
                        }
                    }

                    let next = options.step(AgentInput::Batch(items), messages);
                    LoopState::Running(self.execute(next).await?)
                }
                LoopState::Done(text) => {
                    if options.verbose_logging {
                        tracing::info!(agent = %self.name(), %text, "Final answer");
                    }
                    return Ok(text);
                }
            };
        }
    }

    /// Run every call concurrently; keeps call order, drops or reports failures
    async fn run_tool_round(
        &self,
        calls: &[ToolCall],
        options: &LoopOptions,
    ) -> Result<Vec<ToolCallOutcome>> {
        let tools = self.configured_tools()?;
        tracing::debug!(agent = %self.name(), calls = calls.len(), "Running tool calls");

        let settled = join_all(
            calls
                .iter()
                .map(|call| {
                    let running = invoke(&tools, call, options.spawner.clone(), options.tool_timeout);
                    isolated(call, running)
                }),
        )
        .await;

        Ok(settled
            .into_iter()
            .zip(calls)
            .filter_map(|(result, call)| match result {
                Ok(outcome) => Some(outcome),
                Err(err) => {
                    tracing::warn!(
                        agent = %self.name(),
                        tool = %call.tool_name,
                        call_id = %call.tool_call_id,
                        error = %err,
                        "Tool call failed"
                    );
                    options.report_failures.then(|| {
                        ToolCallResult::failure(&call.tool_call_id, &call.tool_name, err.to_string())
                            .into()
                    })
                }
            })
            .collect())
    }
}

/// Turn a panicking tool body into a failure of that call alone
async fn isolated<F>(call: &ToolCall, running: F) -> Result<ToolCallOutcome>
where
    F: Future<Output = Result<ToolCallOutcome>>,
{
    AssertUnwindSafe(running)
        .catch_unwind()
        .await
        .unwrap_or_else(|panic| {
            let message = panic
                .downcast_ref::<&str>()
                .map(ToString::to_string)
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "tool body panicked".to_string());
            Err(AgentError::ToolExecution {
                tool: call.tool_name.clone(),
                message: format!("panicked: {message}"),
            })
        })
}

async fn invoke(
    tools: &[Tool],
    call: &ToolCall,
    spawner: SpawnAgent,
    timeout: Option<Duration>,
) -> Result<ToolCallOutcome> {
    let tool = tools
        .iter()
        .find(|tool| tool.name() == call.tool_name)
        .ok_or_else(|| AgentError::UnknownTool(call.tool_name.clone()))?;

    let running = tool.execute(&call.args, spawner);
    let result = match timeout {
        Some(after) => tokio::time::timeout(after, running)
            .await
            .map_err(|_| AgentError::ToolTimeout {
                tool: call.tool_name.clone(),
                after,
            })??,
        None => running.await?,
    };

    Ok(ToolCallResult::success(&call.tool_call_id, &call.tool_name, result).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{NonToolCallingModel, ToolCallingModel};
    use crate::message::Message;
    use crate::mock::MockModel;
    use crate::prompt::plan_with_tools;
    use crate::provider::{FinishReason, GenerateRequest, Generation, LanguageModel};
    use crate::registry::ModelRegistry;
    use crate::schema::{ObjectSchema, ParameterSchema};
    use crate::spawn::AgentSpawner;
    use async_trait::async_trait;
    use serde::{Deserialize, Serialize};
    use serde_json::{Value, json};
    use std::sync::Mutex;

    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct StartParams {
        random_number: f64,
    }

    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct StartOutput {
        tool_output: String,
    }

    fn start_tool() -> Tool {
        Tool::builder("simple_tool", "START")
            .description("Start the conversation")
            .parameters(
                ObjectSchema::new().param(ParameterSchema::number("randomNumber", "Any number")),
            )
            .execute(|params: StartParams, _options: Value, _spawn| async move {
                anyhow::Ok(StartOutput {
                    tool_output: format!("Hello, {}!", params.random_number),
                })
            })
            .unwrap()
    }

    fn failing_tool() -> Tool {
        Tool::builder("failing", "FAIL")
            .execute(|_params: Value, _options: Value, _spawn| async move {
                Err::<Value, _>(anyhow::anyhow!("service down"))
            })
            .unwrap()
    }

    fn slow_tool() -> Tool {
        Tool::builder("slow", "SLOW")
            .execute(|_params: Value, _options: Value, _spawn| async move {
                tokio::time::sleep(Duration::from_secs(30)).await;
                anyhow::Ok("late")
            })
            .unwrap()
    }

    fn start_call(id: &str, n: u32) -> ToolCall {
        ToolCall::new(id, "START", json!({"randomNumber": n}))
    }

    fn agent_on(model: Arc<MockModel>, tools: Vec<Tool>) -> Agent {
        let registry = ModelRegistry::new().with(Arc::new(ToolCallingModel::new(
            model.model_id().to_string(),
            model.clone(),
        )));
        Agent::builder("test")
            .model(model.model_id())
            .tools(tools)
            .instructions("Call the start tool")
            .registry(Arc::new(registry))
            .build()
            .unwrap()
    }

    fn tool_message(request: &GenerateRequest) -> Vec<ToolCallResult> {
        request
            .messages
            .iter()
            .rev()
            .find_map(|m| match m {
                Message::Tool { content } => Some(content.clone()),
                _ => None,
            })
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn test_terminal_first_response_returns_text() {
        let mock = Arc::new(MockModel::new(
            "m",
            vec![Generation::text(FinishReason::Length, "partial answer")],
        ));
        let agent = agent_on(mock.clone(), vec![start_tool()]);

        let text = agent.execute_loop(LoopOptions::new("hi")).await.unwrap();
        assert_eq!(text, "partial answer");
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_start_tool_end_to_end() {
        let mock = Arc::new(MockModel::new(
            "m",
            vec![
                Generation::tool_calls(vec![start_call("call-1", 7)]),
                Generation::text(FinishReason::Stop, "Hello, 7!"),
            ],
        ));
        let agent = agent_on(mock.clone(), vec![start_tool()]);

        let text = agent.execute_loop(LoopOptions::new("go")).await.unwrap();
        assert_eq!(text, "Hello, 7!");

        let requests = mock.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].system.as_deref(), Some("Call the start tool"));
        // user, assistant call, tool results
        assert_eq!(requests[1].messages.len(), 3);
        assert_eq!(
            tool_message(&requests[1]),
            vec![ToolCallResult::success(
                "call-1",
                "START",
                json!({"toolOutput": "Hello, 7!"})
            )]
        );
    }

    #[tokio::test]
    async fn test_failed_call_is_dropped_and_loop_continues() {
        let mock = Arc::new(MockModel::new(
            "m",
            vec![
                Generation::tool_calls(vec![
                    start_call("call-1", 1),
                    ToolCall::new("call-2", "FAIL", json!({})),
                    start_call("call-3", 3),
                ]),
                Generation::text(FinishReason::Stop, "done"),
            ],
        ));
        let agent = agent_on(mock.clone(), vec![start_tool(), failing_tool()]);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let record = Arc::clone(&seen);

        let text = agent
            .execute_loop(LoopOptions::new("go").after_tool_calls(move |outcomes| {
                record.lock().unwrap().extend(
                    outcomes
                        .iter()
                        .map(|o| o.tool_call_result.tool_call_id.clone()),
                );
                None
            }))
            .await
            .unwrap();

        assert_eq!(text, "done");
        assert_eq!(*seen.lock().unwrap(), vec!["call-1", "call-3"]);
        let ids: Vec<String> = tool_message(&mock.requests()[1])
            .into_iter()
            .map(|r| r.tool_call_id)
            .collect();
        assert_eq!(ids, vec!["call-1", "call-3"]);
    }

    #[tokio::test]
    async fn test_unknown_tool_name_is_isolated() {
        let mock = Arc::new(MockModel::new(
            "m",
            vec![
                Generation::tool_calls(vec![
                    ToolCall::new("call-1", "simple_tool", json!({"randomNumber": 1})),
                    start_call("call-2", 2),
                ]),
                Generation::text(FinishReason::Stop, "done"),
            ],
        ));
        let agent = agent_on(mock.clone(), vec![start_tool()]);

        agent.execute_loop(LoopOptions::new("go")).await.unwrap();
        let results = tool_message(&mock.requests()[1]);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].tool_call_id, "call-2");
    }

    #[tokio::test]
    async fn test_report_failures_keeps_an_error_entry() {
        let mock = Arc::new(MockModel::new(
            "m",
            vec![
                Generation::tool_calls(vec![
                    start_call("call-1", 1),
                    ToolCall::new("call-2", "FAIL", json!({})),
                ]),
                Generation::text(FinishReason::Stop, "done"),
            ],
        ));
        let agent = agent_on(mock.clone(), vec![start_tool(), failing_tool()]);

        agent
            .execute_loop(LoopOptions::new("go").report_failures(true))
            .await
            .unwrap();

        let results = tool_message(&mock.requests()[1]);
        assert_eq!(results.len(), 2);
        assert!(!results[0].is_error);
        assert!(results[1].is_error);
        assert!(results[1].result.as_str().unwrap().contains("service down"));
    }

    #[tokio::test]
    async fn test_panicking_tool_does_not_abort_the_round() {
        let panicking = Tool::builder("panicking", "PANIC")
            .execute(|_params: Value, _options: Value, _spawn| async move {
                let fail = true;
                assert!(!fail, "boom");
                anyhow::Ok(Value::Null)
            })
            .unwrap();
        let mock = Arc::new(MockModel::new(
            "m",
            vec![
                Generation::tool_calls(vec![
                    start_call("call-1", 1),
                    ToolCall::new("call-2", "PANIC", json!({})),
                    start_call("call-3", 3),
                ]),
                Generation::text(FinishReason::Stop, "done"),
            ],
        ));
        let agent = agent_on(mock.clone(), vec![start_tool(), panicking]);

        let text = agent
            .execute_loop(LoopOptions::new("go").report_failures(true))
            .await
            .unwrap();

        assert_eq!(text, "done");
        let results = tool_message(&mock.requests()[1]);
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].result, json!({"toolOutput": "Hello, 1!"}));
        assert!(results[1].is_error);
        let message = results[1].result.as_str().unwrap();
        assert!(message.contains("PANIC") && message.contains("boom"), "{message}");
        assert_eq!(results[2].result, json!({"toolOutput": "Hello, 3!"}));
    }

    #[tokio::test]
    async fn test_tool_timeout_is_an_isolated_failure() {
        let mock = Arc::new(MockModel::new(
            "m",
            vec![
                Generation::tool_calls(vec![
                    ToolCall::new("call-1", "SLOW", json!({})),
                    start_call("call-2", 2),
                ]),
                Generation::text(FinishReason::Stop, "done"),
            ],
        ));
        let agent = agent_on(mock.clone(), vec![start_tool(), slow_tool()]);

        let text = agent
            .execute_loop(LoopOptions::new("go").tool_timeout(Duration::from_millis(20)))
            .await
            .unwrap();
        assert_eq!(text, "done");
        let results = tool_message(&mock.requests()[1]);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].tool_call_id, "call-2");
    }

    #[tokio::test]
    async fn test_max_rounds_bounds_the_loop() {
        let mock = Arc::new(MockModel::new(
            "m",
            vec![
                Generation::tool_calls(vec![start_call("call-1", 1)]),
                Generation::tool_calls(vec![start_call("call-2", 2)]),
            ],
        ));
        let agent = agent_on(mock.clone(), vec![start_tool()]);

        let err = agent
            .execute_loop(LoopOptions::new("go").max_rounds(1))
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::MaxRounds(1)));
        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test]
    async fn test_after_hook_items_follow_results() {
        let mock = Arc::new(MockModel::new(
            "m",
            vec![
                Generation::tool_calls(vec![start_call("call-1", 7)]),
                Generation::text(FinishReason::Stop, "ok"),
            ],
        ));
        let agent = agent_on(mock.clone(), vec![start_tool()]);

        agent
            .execute_loop(
                LoopOptions::new("go")
                    .after_tool_calls(|_| Some(AgentInput::from("Now summarize"))),
            )
            .await
            .unwrap();

        let sent = &mock.requests()[1].messages;
        assert!(matches!(sent[2], Message::Tool { .. }));
        assert_eq!(sent[3], Message::user("Now summarize"));
    }

    #[tokio::test]
    async fn test_loop_errors_propagate() {
        let mock = Arc::new(MockModel::new("m", Vec::new()));
        let agent = agent_on(mock, vec![start_tool()]);

        let err = agent.execute_loop(LoopOptions::new("go")).await.unwrap_err();
        assert!(matches!(err, AgentError::Provider(_)));

        let err = agent
            .execute_loop(LoopOptions::new("go").model("other"))
            .await
            .unwrap_err();
        assert!(err.is_resolution());
    }

    #[tokio::test]
    async fn test_nested_agent_spawn() {
        let inner_model = Arc::new(MockModel::new(
            "inner",
            vec![Generation::text(FinishReason::Stop, "inner answer")],
        ));
        let inner = agent_on(inner_model.clone(), Vec::new());

        let delegate = Tool::builder("delegate", "ASK_EXPERT")
            .parameters(ObjectSchema::new().param(ParameterSchema::string("question", "")))
            .execute(move |params: Value, _options: Value, spawn: SpawnAgent| {
                let inner = inner.clone();
                async move {
                    let question = params["question"].as_str().unwrap_or_default().to_string();
                    let answer = spawn.spawn(&inner, question).await?;
                    anyhow::Ok(answer)
                }
            })
            .unwrap();

        let outer_model = Arc::new(MockModel::new(
            "outer",
            vec![
                Generation::tool_calls(vec![ToolCall::new(
                    "call-1",
                    "ASK_EXPERT",
                    json!({"question": "why?"}),
                )]),
                Generation::text(FinishReason::Stop, "outer done"),
            ],
        ));
        let outer = agent_on(outer_model.clone(), vec![delegate]);

        let text = outer.execute_loop(LoopOptions::new("go")).await.unwrap();
        assert_eq!(text, "outer done");
        assert_eq!(inner_model.requests()[0].messages, vec![Message::user("why?")]);
        assert_eq!(
            tool_message(&outer_model.requests()[1])[0].result,
            json!("inner answer")
        );
    }

    struct StubSpawner;

    #[async_trait]
    impl AgentSpawner for StubSpawner {
        async fn spawn(&self, agent: &Agent, input: AgentInput) -> Result<String> {
            Ok(format!("{} saw {:?}", agent.name(), input.as_prompt()))
        }
    }

    #[tokio::test]
    async fn test_injected_spawner_reaches_tools() {
        let inner = agent_on(Arc::new(MockModel::new("inner", Vec::new())), Vec::new());
        let delegate = Tool::builder("delegate", "ASK")
            .execute(move |_params: Value, _options: Value, spawn: SpawnAgent| {
                let inner = inner.clone();
                async move { anyhow::Ok(spawn.spawn(&inner, "ping").await?) }
            })
            .unwrap();
        let mock = Arc::new(MockModel::new(
            "m",
            vec![
                Generation::tool_calls(vec![ToolCall::new("call-1", "ASK", json!({}))]),
                Generation::text(FinishReason::Stop, "ok"),
            ],
        ));
        let agent = agent_on(mock.clone(), vec![delegate]);

        agent
            .execute_loop(LoopOptions::new("go").spawner(SpawnAgent::new(StubSpawner)))
            .await
            .unwrap();
        assert_eq!(
            tool_message(&mock.requests()[1])[0].result,
            json!("test saw Some(\"ping\")")
        );
    }

    #[tokio::test]
    async fn test_loop_over_non_tool_calling_model() {
        let planner = Arc::new(MockModel::new(
            "planner",
            vec![
                Generation::text(FinishReason::Stop, "use START with 7"),
                Generation::text(FinishReason::Stop, "the tool said Hello, 7!"),
            ],
        ));
        let caller = Arc::new(MockModel::new(
            "caller",
            vec![
                Generation::tool_calls(vec![start_call("call-1", 7)]),
                Generation::text(FinishReason::Stop, "Hello, 7!"),
            ],
        ));
        let delegate = Arc::new(ToolCallingModel::new("caller", caller.clone()));
        let registry = ModelRegistry::new().with(Arc::new(NonToolCallingModel::new(
            "planner",
            planner.clone(),
            delegate,
            plan_with_tools,
        )));
        let agent = Agent::builder("planner-agent")
            .model("planner")
            .tool(start_tool())
            .instructions("Call the start tool")
            .registry(Arc::new(registry))
            .build()
            .unwrap();

        let text = agent.execute_loop(LoopOptions::new("go")).await.unwrap();
        assert_eq!(text, "Hello, 7!");
        assert_eq!(planner.call_count(), 2);
        assert_eq!(caller.call_count(), 2);
        // second planner round sees the tool result
        assert_eq!(tool_message(&planner.requests()[1]).len(), 1);

        // and so does the delegate, directly after the turn that asked for it
        let delegated = &caller.requests()[1].messages;
        let asked = delegated
            .iter()
            .position(|m| !m.tool_calls().is_empty())
            .unwrap();
        match &delegated[asked + 1] {
            Message::Tool { content } => {
                assert_eq!(content[0].tool_call_id, "call-1");
                assert_eq!(content[0].result, json!({"toolOutput": "Hello, 7!"}));
            }
            other => panic!("expected tool results after the tool-call turn, got {other:?}"),
        }
        assert_eq!(
            delegated.last(),
            Some(&Message::user("the tool said Hello, 7!"))
        );
    }
}
