//! Single-tool agent run against a live backend.
//!
//! `AGENT_MODEL` picks the catalog model (default `gpt-4o`). Endpoint and key
//! variables are read through `Endpoints::from_env`, after `.env` is loaded.

use std::sync::Arc;

use agent_core::{
    Agent, ExecuteRequest, LanguageModel, LoopOptions, ObjectSchema, ParameterSchema, Tool,
    ToolConfig,
};
use agent_runtime::{
    Endpoints, OpenAiModel,
    catalog::{self, GPT_4O},
    default_registry,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

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

fn start_tool() -> agent_core::Result<Tool> {
    Tool::builder("simple_tool", "START")
        .config(
            ObjectSchema::new()
                .param(ParameterSchema::number("startRange", "Lowest number to pick"))
                .param(ParameterSchema::number("endRange", "Highest number to pick")),
            json!({"startRange": 10, "endRange": 100}),
        )
        .describe_with(|options| {
            format!(
                "Provide a random number between {} and {}",
                options["startRange"], options["endRange"]
            )
        })
        .parameters(ObjectSchema::new().param(ParameterSchema::number(
            "randomNumber",
            "The random number you picked",
        )))
        .result_schema(
            ObjectSchema::new().param(ParameterSchema::string("toolOutput", "Greeting for the number")),
        )
        .execute(|params: StartParams, _options: Value, _spawn| async move {
            tracing::info!(number = params.random_number, "START called");
            anyhow::Ok(StartOutput {
                tool_output: format!("Hello, {}!", params.random_number),
            })
        })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();

    let model = std::env::var("AGENT_MODEL").unwrap_or_else(|_| GPT_4O.into());
    let endpoints = Endpoints::from_env();
    let registry = Arc::new(default_registry(&endpoints)?);

    // Verify the backend before running
    if let Some(row) = catalog::entry(&model) {
        let backend = OpenAiModel::new(endpoints.for_vendor(row.vendor).clone(), row.backend_model)?;
        match backend.health_check().await {
            Ok(true) => tracing::info!(url = %backend.config().base_url, "✓ Backend reachable"),
            Ok(false) | Err(_) => {
                tracing::warn!(url = %backend.config().base_url, "⚠ Backend not available - the run will likely fail");
            }
        }
    }

    let adapter = registry.get(&model)?;
    tracing::info!(model = %model, adapter = adapter.name(), "Using model");

    let start = start_tool()?;
    let widened = start.configure(&ToolConfig::options(json!({"startRange": 100, "endRange": 1000})))?;
    tracing::info!(default = %start.description(), widened = %widened.description(), "START descriptions");

    let agent = Agent::builder("simple")
        .model(model.as_str())
        .tool(start)
        .tool_config("simple_tool", ToolConfig::options(json!({"startRange": 100, "endRange": 1000})))
        .instructions("Call the start tool")
        .registry(Arc::clone(&registry))
        .build()?;

    let step = agent.execute(ExecuteRequest::new("Go")).await?;
    tracing::info!(
        finish_reason = ?step.finish_reason(),
        tool_calls = step.tool_calls().len(),
        "Single step"
    );

    let answer = agent
        .execute_loop(LoopOptions::new("Go").verbose_logging(true).max_rounds(4))
        .await?;
    tracing::info!(answer = %answer, "Loop finished");

    Ok(())
}
