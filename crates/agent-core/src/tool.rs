//! Tool System
//!
//! A [`Tool`] is an immutable, cheaply cloneable unit of capability: a stable
//! type key, a model-facing name, a parameter schema, optional config schema
//! and options, and an async body. Reconfiguring produces a new tool.

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AgentError, Result, ValidationError};
use crate::schema::ObjectSchema;
use crate::spawn::SpawnAgent;

/// Description derived from config options
pub type DescribeFn = dyn Fn(&Value) -> String + Send + Sync;

/// Tool description: fixed text or a pure function of the current config options
#[derive(Clone)]
pub enum Description {
    Static(String),
    Derived(Arc<DescribeFn>),
}

impl Description {
    pub fn derived<F>(f: F) -> Self
    where
        F: Fn(&Value) -> String + Send + Sync + 'static,
    {
        Self::Derived(Arc::new(f))
    }

    pub fn resolve(&self, options: &Value) -> String {
        match self {
            Self::Static(text) => text.clone(),
            Self::Derived(f) => f(options),
        }
    }
}

impl From<&str> for Description {
    fn from(text: &str) -> Self {
        Self::Static(text.to_string())
    }
}

impl From<String> for Description {
    fn from(text: String) -> Self {
        Self::Static(text)
    }
}

impl std::fmt::Debug for Description {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Static(text) => f.debug_tuple("Static").field(text).finish(),
            Self::Derived(_) => f.write_str("Derived(..)"),
        }
    }
}

/// Tool definition schema handed to tool-calling backends
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolSchema {
    /// Model-facing tool name
    pub name: String,

    /// Human-readable description (shown to LLM)
    pub description: String,

    /// JSON Schema of the parameters
    pub parameters: Value,
}

/// Partial override applied by [`Tool::configure`]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ToolConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Replaces the description with fixed text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Merged key-wise over the current config options
    #[serde(
        default,
        alias = "toolOptions",
        alias = "toolConfigOptions",
        skip_serializing_if = "Option::is_none"
    )]
    pub options: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<ObjectSchema>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_schema: Option<ObjectSchema>,
}

impl ToolConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override only the config options
    pub fn options(options: Value) -> Self {
        Self {
            options: Some(options),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.options.is_none()
            && self.parameters.is_none()
            && self.result_schema.is_none()
    }
}

/// Type-erased tool body
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Run with already-validated parameters and the tool's config options
    async fn run(&self, parameters: Value, options: Value, spawner: SpawnAgent) -> anyhow::Result<Value>;
}

/// Adapts a typed async closure into a [`ToolHandler`]
struct FnHandler<F, P, C, Fut, R> {
    f: F,
    _marker: PhantomData<fn(P, C) -> (Fut, R)>,
}

#[async_trait]
impl<F, P, C, Fut, R> ToolHandler for FnHandler<F, P, C, Fut, R>
where
    F: Fn(P, C, SpawnAgent) -> Fut + Send + Sync + 'static,
    P: DeserializeOwned + Send + 'static,
    C: DeserializeOwned + Send + 'static,
    Fut: Future<Output = anyhow::Result<R>> + Send + 'static,
    R: Serialize + Send + 'static,
{
    async fn run(&self, parameters: Value, options: Value, spawner: SpawnAgent) -> anyhow::Result<Value> {
        let params: P = serde_json::from_value(parameters).map_err(ValidationError::from)?;
        let options: C = serde_json::from_value(options)
            .map_err(|e| ValidationError::from(e).within("options"))?;
        let output = (self.f)(params, options, spawner).await?;
        Ok(serde_json::to_value(output)?)
    }
}

/// A named, versionable unit of capability
#[derive(Clone)]
pub struct Tool {
    tool_type: String,
    name: String,
    description: Option<Description>,
    parameters: Arc<ObjectSchema>,
    config_schema: Option<Arc<ObjectSchema>>,
    config_options: Value,
    result_schema: Option<Arc<ObjectSchema>>,
    handler: Arc<dyn ToolHandler>,
}

impl Tool {
    /// Start building a tool with its stable type key and model-facing name
    pub fn builder(tool_type: impl Into<String>, name: impl Into<String>) -> ToolBuilder {
        ToolBuilder::new(tool_type, name)
    }

    /// Stable machine key
    pub fn tool_type(&self) -> &str {
        &self.tool_type
    }

    /// Name surfaced to the model
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resolved against the current config options on every read
    pub fn description(&self) -> String {
        self.description
            .as_ref()
            .map(|d| d.resolve(&self.config_options))
            .unwrap_or_default()
    }

    pub fn parameters(&self) -> &ObjectSchema {
        &self.parameters
    }

    pub fn config_schema(&self) -> Option<&ObjectSchema> {
        self.config_schema.as_deref()
    }

    pub const fn config_options(&self) -> &Value {
        &self.config_options
    }

    pub fn result_schema(&self) -> Option<&ObjectSchema> {
        self.result_schema.as_deref()
    }

    /// Schema for LLM function calling
    pub fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: self.name.clone(),
            description: self.description(),
            parameters: self.parameters.to_json_schema(),
        }
    }

    /// Validate raw parameters, then run the body with the current config options.
    ///
    /// Nothing runs when validation fails.
    pub async fn execute(&self, raw_parameters: &Value, spawner: SpawnAgent) -> Result<Value> {
        let parameters = self.parameters.validate(raw_parameters)?;
        let output = self
            .handler
            .run(parameters, self.config_options.clone(), spawner)
            .await
            .map_err(|e| self.handler_error(e))?;
        self.check_result(output)
    }

    /// Invoke the body directly with explicit options, bypassing live config
    /// and parameter validation.
    pub async fn test_tool(&self, parameters: Value, config_options: Value) -> Result<Value> {
        self.handler
            .run(parameters, config_options, SpawnAgent::default())
            .await
            .map_err(|e| self.handler_error(e))
    }

    /// New tool with `config` merged over this one.
    ///
    /// An empty override returns a clone sharing everything with `self`.
    /// Config options are merged key-wise and validated against the config
    /// schema; schemas are immutable and shared unless overridden.
    pub fn configure(&self, config: &ToolConfig) -> Result<Self> {
        if config.is_empty() {
            return Ok(self.clone());
        }

        let config_options = match &config.options {
            Some(options) => merge_options(&self.config_options, options),
            None => self.config_options.clone(),
        };
        let config_options = validate_options(self.config_schema.as_deref(), config_options)?;

        Ok(Self {
            tool_type: self.tool_type.clone(),
            name: config.name.clone().unwrap_or_else(|| self.name.clone()),
            description: config
                .description
                .clone()
                .map(Description::Static)
                .or_else(|| self.description.clone()),
            parameters: config
                .parameters
                .clone()
                .map_or_else(|| Arc::clone(&self.parameters), Arc::new),
            config_schema: self.config_schema.clone(),
            config_options,
            result_schema: config
                .result_schema
                .clone()
                .map(Arc::new)
                .or_else(|| self.result_schema.clone()),
            handler: Arc::clone(&self.handler),
        })
    }

    fn check_result(&self, output: Value) -> Result<Value> {
        match &self.result_schema {
            Some(schema) => Ok(schema
                .validate(&output)
                .map_err(|e| e.within("result"))?),
            None => Ok(output),
        }
    }

    fn handler_error(&self, err: anyhow::Error) -> AgentError {
        match err.downcast::<ValidationError>() {
            Ok(invalid) => AgentError::Validation(invalid),
            Err(err) => match err.downcast::<AgentError>() {
                Ok(inner) => inner,
                Err(err) => AgentError::tool_execution(&self.name, format!("{err:#}")),
            },
        }
    }
}

impl std::fmt::Debug for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tool")
            .field("tool_type", &self.tool_type)
            .field("name", &self.name)
            .field("description", &self.description)
            .field("config_options", &self.config_options)
            .finish_non_exhaustive()
    }
}

fn merge_options(current: &Value, update: &Value) -> Value {
    match (current, update) {
        (Value::Object(base), Value::Object(patch)) => {
            let mut merged = base.clone();
            for (key, value) in patch {
                merged.insert(key.clone(), value.clone());
            }
            Value::Object(merged)
        }
        _ => update.clone(),
    }
}

fn validate_options(schema: Option<&ObjectSchema>, options: Value) -> Result<Value> {
    match schema {
        Some(schema) => Ok(schema.validate(&options).map_err(|e| e.within("options"))?),
        None => Ok(options),
    }
}

/// Builder for [`Tool`]
pub struct ToolBuilder {
    tool_type: String,
    name: String,
    description: Option<Description>,
    parameters: ObjectSchema,
    config_schema: Option<ObjectSchema>,
    config_options: Value,
    result_schema: Option<ObjectSchema>,
}

impl ToolBuilder {
    pub fn new(tool_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            tool_type: tool_type.into(),
            name: name.into(),
            description: None,
            parameters: ObjectSchema::new(),
            config_schema: None,
            config_options: Value::Null,
            result_schema: None,
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<Description>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Description computed from the config options each time it is read
    #[must_use]
    pub fn describe_with<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value) -> String + Send + Sync + 'static,
    {
        self.description = Some(Description::derived(f));
        self
    }

    #[must_use]
    pub fn parameters(mut self, schema: ObjectSchema) -> Self {
        self.parameters = schema;
        self
    }

    /// Config schema plus the default options
    #[must_use]
    pub fn config(mut self, schema: ObjectSchema, defaults: Value) -> Self {
        self.config_schema = Some(schema);
        self.config_options = defaults;
        self
    }

    #[must_use]
    pub fn result_schema(mut self, schema: ObjectSchema) -> Self {
        self.result_schema = Some(schema);
        self
    }

    /// Finish with a typed async body.
    ///
    /// Parameters and options are parsed into `P` and `C` with serde; the
    /// output is serialized back to JSON.
    pub fn execute<F, P, C, Fut, R>(self, f: F) -> Result<Tool>
    where
        F: Fn(P, C, SpawnAgent) -> Fut + Send + Sync + 'static,
        P: DeserializeOwned + Send + 'static,
        C: DeserializeOwned + Send + 'static,
        Fut: Future<Output = anyhow::Result<R>> + Send + 'static,
        R: Serialize + Send + 'static,
    {
        self.handler(Arc::new(FnHandler {
            f,
            _marker: PhantomData,
        }))
    }

    /// Finish with a pre-built handler
    pub fn handler(self, handler: Arc<dyn ToolHandler>) -> Result<Tool> {
        if self.tool_type.trim().is_empty() {
            return Err(AgentError::Config("Tool type is required".into()));
        }
        if self.name.trim().is_empty() {
            return Err(AgentError::Config(format!(
                "Tool '{}' needs a name",
                self.tool_type
            )));
        }
        let config_options = validate_options(self.config_schema.as_ref(), self.config_options)?;

        Ok(Tool {
            tool_type: self.tool_type,
            name: self.name,
            description: self.description,
            parameters: Arc::new(self.parameters),
            config_schema: self.config_schema.map(Arc::new),
            config_options,
            result_schema: self.result_schema.map(Arc::new),
            handler,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ParameterSchema;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

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

    fn range_tool() -> Tool {
        Tool::builder("simple_tool", "START")
            .config(
                ObjectSchema::new()
                    .param(ParameterSchema::number("startRange", "Lower bound"))
                    .param(ParameterSchema::number("endRange", "Upper bound")),
                json!({"startRange": 10, "endRange": 100}),
            )
            .describe_with(|options| {
                format!(
                    "Provide a random number between {} and {}",
                    options["startRange"], options["endRange"]
                )
            })
            .parameters(
                ObjectSchema::new().param(ParameterSchema::number("randomNumber", "The number")),
            )
            .result_schema(
                ObjectSchema::new().param(ParameterSchema::string("toolOutput", "Greeting")),
            )
            .execute(|params: StartParams, _options: Value, _spawn| async move {
                anyhow::Ok(StartOutput {
                    tool_output: format!("Hello, {}!", params.random_number),
                })
            })
            .unwrap()
    }

    #[tokio::test]
    async fn test_execute_validates_then_runs() {
        let tool = range_tool();
        let out = tool
            .execute(&json!({"randomNumber": 7}), SpawnAgent::default())
            .await
            .unwrap();
        assert_eq!(out, json!({"toolOutput": "Hello, 7!"}));
    }

    #[tokio::test]
    async fn test_invalid_parameters_have_no_side_effect() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let tool = Tool::builder("counter", "COUNT")
            .parameters(ObjectSchema::new().param(ParameterSchema::integer("step", "Increment")))
            .execute(move |params: Value, _options: Value, _spawn| {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    anyhow::Ok(params)
                }
            })
            .unwrap();

        let err = tool
            .execute(&json!({"step": "one"}), SpawnAgent::default())
            .await
            .unwrap_err();
        match err {
            AgentError::Validation(invalid) => assert_eq!(invalid.fields(), vec!["step"]),
            other => panic!("expected validation error, got {other}"),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_description_follows_configured_options() {
        let tool = range_tool();
        assert_eq!(tool.description(), "Provide a random number between 10 and 100");

        let configured = tool
            .configure(&ToolConfig::options(json!({"startRange": 100, "endRange": 1000})))
            .unwrap();
        assert_eq!(
            configured.description(),
            "Provide a random number between 100 and 1000"
        );
        // original untouched
        assert_eq!(tool.config_options(), &json!({"startRange": 10, "endRange": 100}));
    }

    #[test]
    fn test_configure_merges_partial_options() {
        let tool = range_tool();
        let configured = tool
            .configure(&ToolConfig::options(json!({"endRange": 50})))
            .unwrap();
        assert_eq!(
            configured.config_options(),
            &json!({"startRange": 10, "endRange": 50})
        );

        let again = configured
            .configure(&ToolConfig::new().with_name("BEGIN"))
            .unwrap();
        assert_eq!(again.name(), "BEGIN");
        assert_eq!(configured.name(), "START");
        assert_eq!(again.config_options(), configured.config_options());
    }

    #[test]
    fn test_configure_rejects_invalid_options() {
        let err = range_tool()
            .configure(&ToolConfig::options(json!({"startRange": "low"})))
            .unwrap_err();
        match err {
            AgentError::Validation(invalid) => {
                assert_eq!(invalid.fields(), vec!["options.startRange"]);
            }
            other => panic!("expected validation error, got {other}"),
        }
    }

    #[test]
    fn test_empty_configure_is_identity() {
        let tool = range_tool();
        let same = tool.configure(&ToolConfig::new()).unwrap();
        assert!(Arc::ptr_eq(&tool.parameters, &same.parameters));
        assert!(Arc::ptr_eq(&tool.handler, &same.handler));
        assert_eq!(same.config_options(), tool.config_options());
    }

    #[test]
    fn test_description_override_is_static() {
        let tool = range_tool()
            .configure(&ToolConfig::new().with_description("Pick a number"))
            .unwrap();
        assert_eq!(tool.description(), "Pick a number");
    }

    #[tokio::test]
    async fn test_test_tool_bypasses_live_config() {
        let tool = Tool::builder("echo", "ECHO")
            .config(ObjectSchema::new(), json!({"prefix": "live"}))
            .execute(|_params: Value, options: Value, _spawn| async move {
                anyhow::Ok(options["prefix"].clone())
            })
            .unwrap();

        let out = tool
            .test_tool(json!({}), json!({"prefix": "test"}))
            .await
            .unwrap();
        assert_eq!(out, json!("test"));
    }

    #[tokio::test]
    async fn test_result_schema_is_enforced() {
        let tool = Tool::builder("bad", "BAD")
            .result_schema(ObjectSchema::new().param(ParameterSchema::string("toolOutput", "")))
            .execute(|_params: Value, _options: Value, _spawn| async move {
                anyhow::Ok(json!({"toolOutput": 42}))
            })
            .unwrap();

        let err = tool.execute(&json!({}), SpawnAgent::default()).await.unwrap_err();
        match err {
            AgentError::Validation(invalid) => {
                assert_eq!(invalid.fields(), vec!["result.toolOutput"]);
            }
            other => panic!("expected validation error, got {other}"),
        }
    }

    #[tokio::test]
    async fn test_body_errors_become_tool_execution() {
        let tool = Tool::builder("boom", "BOOM")
            .execute(|_params: Value, _options: Value, _spawn| async move {
                Err::<Value, _>(anyhow::anyhow!("exploded"))
            })
            .unwrap();

        let err = tool.execute(&json!({}), SpawnAgent::default()).await.unwrap_err();
        assert!(matches!(err, AgentError::ToolExecution { ref tool, .. } if tool == "BOOM"));
    }

    #[test]
    fn test_schema_uses_name_and_description() {
        let schema = range_tool().schema();
        assert_eq!(schema.name, "START");
        assert_eq!(schema.parameters["properties"]["randomNumber"]["type"], "number");
    }

    #[test]
    fn test_builder_requires_identity() {
        let result = Tool::builder("", "X")
            .execute(|_p: Value, _c: Value, _s| async move { anyhow::Ok(Value::Null) });
        assert!(matches!(result, Err(AgentError::Config(_))));
    }

    #[test]
    fn test_tool_config_parses_legacy_option_key() {
        let config: ToolConfig =
            serde_json::from_value(json!({"name": "GO", "toolOptions": {"endRange": 5}})).unwrap();
        assert_eq!(config.name.as_deref(), Some("GO"));
        assert_eq!(config.options, Some(json!({"endRange": 5})));
    }
}
