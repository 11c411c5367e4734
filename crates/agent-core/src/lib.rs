//! # agent-core
//!
//! Tool-calling agent loop with a model abstraction that hides whether the
//! backend can call tools natively.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                              Agent                               │
//! │  ┌─────────────┐  ┌─────────────┐  ┌──────────────────────────┐  │
//! │  │  Execution  │  │    Tools    │  │      ModelRegistry       │  │
//! │  │    Loop     │──│ (by type)   │──│  id ─▶ ModelAdapter      │  │
//! │  └─────────────┘  └─────────────┘  └────────────┬─────────────┘  │
//! └─────────────────────────────────────────────────┼────────────────┘
//!                                                   │
//!                      ┌────────────────────────────┴──────────────┐
//!                      │ ToolCallingModel    NonToolCallingModel   │
//!                      │        │             │ plan ─▶ delegate   │
//!                      │        ▼             ▼                    │
//!                      │          LanguageModel (Strategy)         │
//!                      └───────────────────────────────────────────┘
//! ```
//!
//! The `LanguageModel` trait is the only backend seam; concrete backends live
//! in `agent-runtime`.

pub mod adapter;
pub mod agent;
pub mod error;
pub mod message;
pub mod mock;
pub mod prompt;
pub mod provider;
pub mod reasoning;
pub mod registry;
pub mod schema;
pub mod spawn;
pub mod tool;

pub use adapter::{ModelAdapter, ModelCall, ModelResponse, NonToolCallingModel, ToolCallingModel};
pub use agent::{Agent, AgentConfig, ConfigOverrides, ExecuteRequest, Instruction, Instructions};
pub use error::{AgentError, Result, ValidationError};
pub use message::{AgentInput, Conversation, InputItem, Message, Role, ToolCall, ToolCallOutcome, ToolCallResult};
pub use provider::{FinishReason, GenerateRequest, Generation, LanguageModel};
pub use reasoning::LoopOptions;
pub use registry::ModelRegistry;
pub use schema::{ObjectSchema, ParamType, ParameterSchema};
pub use spawn::{AgentSpawner, SpawnAgent};
pub use tool::{Tool, ToolConfig};
