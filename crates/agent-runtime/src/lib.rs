//! # agent-runtime
//!
//! Concrete model backends and the model catalog for `agent-core`.
//!
//! ## Backends
//!
//! - **OpenAI-compatible**: one `LanguageModel` over `/chat/completions`,
//!   pointed at OpenAI, the Anthropic or Gemini compatibility endpoints, or a
//!   local Ollama server.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agent_runtime::{Endpoints, default_registry};
//!
//! let registry = Arc::new(default_registry(&Endpoints::from_env())?);
//! let agent = Agent::builder("simple")
//!     .model("gpt-4o")
//!     .tool(start_tool)
//!     .registry(registry)
//!     .build()?;
//! let answer = agent.execute_loop(LoopOptions::new("Go")).await?;
//! ```

pub mod catalog;
pub mod openai;

pub use catalog::{CATALOG, CatalogEntry, Endpoints, Vendor, default_registry};
pub use openai::{OpenAiConfig, OpenAiModel};

// Re-export core types for convenience
pub use agent_core::{
    Agent, AgentError, LanguageModel, LoopOptions, Message, ModelAdapter, ModelRegistry, Result,
    Role, Tool,
};
