//! Agent
//!
//! An [`Agent`] owns a fixed set of permitted models, a default model, a set of
//! tools keyed by type, and layered instruction fragments. Per-call overrides
//! (model, tool subset, temperature, per-tool config) live in replaceable
//! config values.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let agent = Agent::builder("greeter")
//!     .models(["gpt-4o-mini"])
//!     .tool(start_tool)
//!     .instructions("Call the start tool")
//!     .registry(registry)
//!     .build()?;
//!
//! let answer = agent.execute_loop(LoopOptions::new("hi")).await?;
//! ```

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::adapter::{ModelCall, ModelResponse};
use crate::error::{AgentError, Result, ValidationError};
use crate::message::{AgentInput, Conversation, ToolCallOutcome, ToolCallResult};
use crate::registry::ModelRegistry;
use crate::spawn::SpawnAgent;
use crate::tool::{Tool, ToolConfig};

/// One instruction fragment, optionally scoped to a tool type and/or models
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub models: Option<Vec<String>>,

    pub content: String,
}

impl Instruction {
    /// Unscoped fragment; always applies
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            tool: None,
            models: None,
            content: content.into(),
        }
    }

    /// Applies while `tool_type` is among the call's tools
    pub fn for_tool(tool_type: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            tool: Some(tool_type.into()),
            models: None,
            content: content.into(),
        }
    }

    /// Applies while the call runs on one of `models`
    pub fn for_models<I, S>(models: I, content: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tool: None,
            models: Some(models.into_iter().map(Into::into).collect()),
            content: content.into(),
        }
    }

    pub const fn is_scoped(&self) -> bool {
        self.tool.is_some() || self.models.is_some()
    }

    /// A tool match or a model match is each sufficient on its own
    pub fn applies_to<S: AsRef<str>>(&self, model: &str, tools: &[S]) -> bool {
        if !self.is_scoped() {
            return true;
        }
        let tool_match = self
            .tool
            .as_deref()
            .is_some_and(|scope| tools.iter().any(|t| t.as_ref() == scope));
        let model_match = self
            .models
            .as_ref()
            .is_some_and(|scope| scope.iter().any(|m| m == model));
        tool_match || model_match
    }
}

/// Instruction set given at construction: literal text or scoped fragments
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Instructions(pub Vec<Instruction>);

impl From<&str> for Instructions {
    fn from(text: &str) -> Self {
        Self(vec![Instruction::new(text)])
    }
}

impl From<String> for Instructions {
    fn from(text: String) -> Self {
        Self(vec![Instruction::new(text)])
    }
}

impl From<Vec<Instruction>> for Instructions {
    fn from(fragments: Vec<Instruction>) -> Self {
        Self(fragments)
    }
}

/// Per-agent overrides: model, tool subset, temperature
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Tool types used when a call names none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_tools: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

/// Tool overrides keyed by tool type
pub type ToolConfigs = BTreeMap<String, ToolConfig>;

/// Both override sets, as accepted by [`Agent::clone_and_configure`]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigOverrides {
    #[serde(default)]
    pub tool_configs: ToolConfigs,

    #[serde(default)]
    pub agent_configs: AgentConfig,
}

impl ConfigOverrides {
    /// Parse overrides from untyped JSON
    pub fn from_json(value: Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| ValidationError::from(e).into())
    }
}

/// Arguments of a single [`Agent::execute`] step
#[derive(Clone, Debug)]
pub struct ExecuteRequest {
    pub input: AgentInput,
    pub model: Option<String>,
    /// Tool types; `None` falls back to the agent config, then to every tool
    pub tools: Option<Vec<String>>,
    pub messages: Conversation,
}

impl ExecuteRequest {
    pub fn new(input: impl Into<AgentInput>) -> Self {
        Self {
            input: input.into(),
            model: None,
            tools: None,
            messages: Conversation::new(),
        }
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
    pub fn messages(mut self, messages: Conversation) -> Self {
        self.messages = messages;
        self
    }
}

/// An LLM agent with permitted models, tools and layered instructions
#[derive(Clone, Debug)]
pub struct Agent {
    name: String,
    models: Arc<[String]>,
    default_model: String,
    available_tools: Arc<[Tool]>,
    instructions: Vec<Instruction>,
    agent_config: AgentConfig,
    tool_configs: ToolConfigs,
    registry: Arc<ModelRegistry>,
}

impl Agent {
    pub fn builder(name: impl Into<String>) -> AgentBuilder {
        AgentBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn models(&self) -> &[String] {
        &self.models
    }

    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    /// Tools as registered, without config overrides
    pub fn available_tools(&self) -> &[Tool] {
        &self.available_tools
    }

    pub fn tool_types(&self) -> Vec<&str> {
        self.available_tools.iter().map(Tool::tool_type).collect()
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub const fn registry(&self) -> &Arc<ModelRegistry> {
        &self.registry
    }

    /// Current overrides
    pub fn configs(&self) -> ConfigOverrides {
        ConfigOverrides {
            tool_configs: self.tool_configs.clone(),
            agent_configs: self.agent_config.clone(),
        }
    }

    pub const fn export_tool_configs(&self) -> &ToolConfigs {
        &self.tool_configs
    }

    pub const fn agent_config(&self) -> &AgentConfig {
        &self.agent_config
    }

    /// Independent copy; editing instructions on one never shows in the other
    #[must_use]
    pub fn duplicate(&self) -> Self {
        self.clone()
    }

    /// Independent copy whose overrides are replaced wholesale by `overrides`
    pub fn clone_and_configure(&self, overrides: ConfigOverrides) -> Result<Self> {
        check_agent_config(
            &self.name,
            &self.models,
            &self.available_tools,
            &overrides.agent_configs,
        )?;
        check_tool_configs(&self.available_tools, &overrides.tool_configs)?;

        Ok(Self {
            agent_config: overrides.agent_configs,
            tool_configs: overrides.tool_configs,
            ..self.clone()
        })
    }

    /// Applicable fragments for `model` and the tool-type subset, in
    /// declaration order, joined by a blank line
    pub fn build_instructions_for<S: AsRef<str>>(&self, model: &str, tools: &[S]) -> String {
        self.instructions
            .iter()
            .filter(|fragment| fragment.applies_to(model, tools))
            .map(|fragment| fragment.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Replace the fragment at `index`
    pub fn modify_instructions_at(&mut self, index: usize, fragment: Instruction) -> Result<()> {
        check_instruction(&self.models, &self.available_tools, &fragment)?;
        let len = self.instructions.len();
        let slot = self.instructions.get_mut(index).ok_or_else(|| {
            AgentError::InvalidInstruction(format!("index {index} out of range for {len} fragments"))
        })?;
        *slot = fragment;
        Ok(())
    }

    /// Insert a fragment before `index`; `index == len` appends
    pub fn add_instructions_at(&mut self, index: usize, fragment: Instruction) -> Result<()> {
        check_instruction(&self.models, &self.available_tools, &fragment)?;
        if index > self.instructions.len() {
            return Err(AgentError::InvalidInstruction(format!(
                "index {index} out of range for {} fragments",
                self.instructions.len()
            )));
        }
        self.instructions.insert(index, fragment);
        Ok(())
    }

    /// Every available tool with its stored override applied
    pub fn configured_tools(&self) -> Result<Vec<Tool>> {
        self.available_tools
            .iter()
            .map(|tool| match self.tool_configs.get(tool.tool_type()) {
                Some(config) => tool.configure(config),
                None => Ok(tool.clone()),
            })
            .collect()
    }

    /// Configured tool whose model-facing name is `name`
    pub fn get_configured_tool(&self, name: &str) -> Result<Tool> {
        self.configured_tools()?
            .into_iter()
            .find(|tool| tool.name() == name)
            .ok_or_else(|| AgentError::UnknownTool(name.to_string()))
    }

    /// Run one tool by model-facing name outside of any loop
    pub async fn tool_call(
        &self,
        name: &str,
        tool_call_id: &str,
        parameters: &Value,
        spawner: SpawnAgent,
    ) -> Result<ToolCallOutcome> {
        let tool = self.get_configured_tool(name)?;
        let result = tool.execute(parameters, spawner).await?;
        Ok(ToolCallResult::success(tool_call_id, name, result).into())
    }

    /// Resolve model, tools and instructions, then make one adapter call
    pub async fn execute(&self, request: ExecuteRequest) -> Result<ModelResponse> {
        let model = self.resolve_model(request.model.as_deref())?;
        let tool_types = self.resolve_tool_types(request.tools)?;
        let instructions = self.build_instructions_for(&model, &tool_types);

        let tools: Vec<Tool> = self
            .configured_tools()?
            .into_iter()
            .filter(|tool| tool_types.iter().any(|t| t == tool.tool_type()))
            .collect();
        let adapter = self.registry.get(&model)?;

        tracing::debug!(
            agent = %self.name,
            model = %model,
            tools = tools.len(),
            history = request.messages.len(),
            "Executing agent step"
        );

        adapter
            .call(
                ModelCall::new(instructions, request.input)
                    .tools(tools)
                    .messages(request.messages)
                    .temperature(self.agent_config.temperature),
            )
            .await
    }

    fn resolve_model(&self, requested: Option<&str>) -> Result<String> {
        let model = requested
            .or(self.agent_config.model.as_deref())
            .unwrap_or(&self.default_model);
        if !self.models.iter().any(|m| m == model) {
            return Err(AgentError::ModelNotPermitted {
                agent: self.name.clone(),
                model: model.to_string(),
            });
        }
        Ok(model.to_string())
    }

    fn resolve_tool_types(&self, requested: Option<Vec<String>>) -> Result<Vec<String>> {
        let tool_types = requested
            .or_else(|| self.agent_config.available_tools.clone())
            .unwrap_or_else(|| {
                self.available_tools
                    .iter()
                    .map(|tool| tool.tool_type().to_string())
                    .collect()
            });
        for tool_type in &tool_types {
            if !self.available_tools.iter().any(|t| t.tool_type() == tool_type) {
                return Err(AgentError::UnknownTool(tool_type.clone()));
            }
        }
        Ok(tool_types)
    }
}

fn check_instruction(models: &[String], tools: &[Tool], fragment: &Instruction) -> Result<()> {
    if let Some(tool_type) = &fragment.tool {
        if !tools.iter().any(|t| t.tool_type() == tool_type) {
            return Err(AgentError::InvalidInstruction(format!(
                "fragment scoped to unknown tool type '{tool_type}'"
            )));
        }
    }
    if let Some(scope) = &fragment.models {
        if let Some(model) = scope.iter().find(|m| !models.contains(m)) {
            return Err(AgentError::InvalidInstruction(format!(
                "fragment scoped to model '{model}' outside the agent's models"
            )));
        }
    }
    Ok(())
}

fn check_agent_config(
    agent: &str,
    models: &[String],
    tools: &[Tool],
    config: &AgentConfig,
) -> Result<()> {
    if let Some(model) = &config.model {
        if !models.contains(model) {
            return Err(AgentError::ModelNotPermitted {
                agent: agent.to_string(),
                model: model.clone(),
            });
        }
    }
    for tool_type in config.available_tools.iter().flatten() {
        if !tools.iter().any(|t| t.tool_type() == tool_type) {
            return Err(AgentError::UnknownTool(tool_type.clone()));
        }
    }
    Ok(())
}

/// Overrides must name known tool types and produce valid tools
fn check_tool_configs(tools: &[Tool], configs: &ToolConfigs) -> Result<()> {
    for (tool_type, config) in configs {
        let tool = tools
            .iter()
            .find(|t| t.tool_type() == tool_type)
            .ok_or_else(|| AgentError::UnknownTool(tool_type.clone()))?;
        tool.configure(config)?;
    }
    Ok(())
}

/// Builder for [`Agent`]
pub struct AgentBuilder {
    name: String,
    models: Vec<String>,
    default_model: Option<String>,
    tools: Vec<Tool>,
    instructions: Vec<Instruction>,
    agent_config: AgentConfig,
    tool_configs: ToolConfigs,
    registry: Option<Arc<ModelRegistry>>,
}

impl AgentBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            models: Vec::new(),
            default_model: None,
            tools: Vec::new(),
            instructions: Vec::new(),
            agent_config: AgentConfig::default(),
            tool_configs: ToolConfigs::new(),
            registry: None,
        }
    }

    /// Add one permitted model
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.models.push(model.into());
        self
    }

    #[must_use]
    pub fn models<I, S>(mut self, models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.models.extend(models.into_iter().map(Into::into));
        self
    }

    /// Defaults to the first permitted model
    #[must_use]
    pub fn default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = Some(model.into());
        self
    }

    #[must_use]
    pub fn tool(mut self, tool: Tool) -> Self {
        self.tools.push(tool);
        self
    }

    #[must_use]
    pub fn tools(mut self, tools: impl IntoIterator<Item = Tool>) -> Self {
        self.tools.extend(tools);
        self
    }

    #[must_use]
    pub fn instructions(mut self, instructions: impl Into<Instructions>) -> Self {
        self.instructions = instructions.into().0;
        self
    }

    #[must_use]
    pub fn instruction(mut self, fragment: Instruction) -> Self {
        self.instructions.push(fragment);
        self
    }

    #[must_use]
    pub fn agent_config(mut self, config: AgentConfig) -> Self {
        self.agent_config = config;
        self
    }

    #[must_use]
    pub fn tool_config(mut self, tool_type: impl Into<String>, config: ToolConfig) -> Self {
        self.tool_configs.insert(tool_type.into(), config);
        self
    }

    #[must_use]
    pub fn registry(mut self, registry: Arc<ModelRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn build(self) -> Result<Agent> {
        let registry = self
            .registry
            .ok_or_else(|| AgentError::Config("Model registry is required".into()))?;

        if self.models.is_empty() {
            return Err(AgentError::Config(format!(
                "Agent '{}' needs at least one model",
                self.name
            )));
        }
        let mut seen = HashSet::new();
        if let Some(model) = self.models.iter().find(|m| !seen.insert(m.as_str())) {
            return Err(AgentError::Config(format!("Model '{model}' listed twice")));
        }

        let default_model = self.default_model.unwrap_or_else(|| self.models[0].clone());
        if !self.models.contains(&default_model) {
            return Err(AgentError::ModelNotPermitted {
                agent: self.name,
                model: default_model,
            });
        }

        let mut seen = HashSet::new();
        if let Some(tool) = self.tools.iter().find(|t| !seen.insert(t.tool_type())) {
            return Err(AgentError::Config(format!(
                "Tool type '{}' registered twice",
                tool.tool_type()
            )));
        }

        for fragment in &self.instructions {
            check_instruction(&self.models, &self.tools, fragment)?;
        }
        check_agent_config(&self.name, &self.models, &self.tools, &self.agent_config)?;
        check_tool_configs(&self.tools, &self.tool_configs)?;

        Ok(Agent {
            name: self.name,
            models: self.models.into(),
            default_model,
            available_tools: self.tools.into(),
            instructions: self.instructions,
            agent_config: self.agent_config,
            tool_configs: self.tool_configs,
            registry,
        })
    }
}
