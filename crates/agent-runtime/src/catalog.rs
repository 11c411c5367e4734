//! Model Catalog
//!
//! Known model identifiers, the vendor endpoint and backend model behind each,
//! and whether the model calls tools natively. Tool-incapable entries plan in
//! free text and hand off to a tool-capable delegate.

use std::sync::Arc;

use agent_core::{
    adapter::{ModelAdapter, NonToolCallingModel, ToolCallingModel},
    error::Result,
    prompt::plan_with_tools,
    provider::LanguageModel,
    registry::ModelRegistry,
};

use crate::openai::{OpenAiConfig, OpenAiModel};

pub const GPT_4O: &str = "gpt-4o";
pub const GPT_4O_MINI: &str = "gpt-4o-mini";
pub const CLAUDE_35_SONNET: &str = "claude-35-sonnet";
pub const O1: &str = "o1";
pub const O1_MINI: &str = "o1-mini";
pub const O3_MINI: &str = "o3-mini";
pub const FLASH: &str = "flash";
pub const FLASH_THINKING: &str = "flash-thinking";
pub const LLAMA_3_2: &str = "llama3.2";

/// Where a model is served
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Vendor {
    OpenAi,
    Anthropic,
    Gemini,
    Ollama,
}

/// One catalog row
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CatalogEntry {
    /// Registry key
    pub id: &'static str,
    pub vendor: Vendor,
    /// Model name sent to the vendor
    pub backend_model: &'static str,
    /// Server rejects a sampling temperature
    pub fixed_temperature: bool,
    /// Tool-capable model that turns this model's plan into tool calls
    pub delegate: Option<&'static str>,
}

impl CatalogEntry {
    pub const fn calls_tools(&self) -> bool {
        self.delegate.is_none()
    }
}

const fn tool_calling(id: &'static str, vendor: Vendor, backend_model: &'static str) -> CatalogEntry {
    CatalogEntry {
        id,
        vendor,
        backend_model,
        fixed_temperature: false,
        delegate: None,
    }
}

pub const CATALOG: &[CatalogEntry] = &[
    tool_calling(GPT_4O, Vendor::OpenAi, "gpt-4o"),
    tool_calling(GPT_4O_MINI, Vendor::OpenAi, "gpt-4o-mini"),
    tool_calling(CLAUDE_35_SONNET, Vendor::Anthropic, "claude-3-5-sonnet-latest"),
    CatalogEntry {
        fixed_temperature: true,
        ..tool_calling(O1, Vendor::OpenAi, "o1")
    },
    CatalogEntry {
        fixed_temperature: true,
        delegate: Some(GPT_4O_MINI),
        ..tool_calling(O1_MINI, Vendor::OpenAi, "o1-mini")
    },
    CatalogEntry {
        fixed_temperature: true,
        ..tool_calling(O3_MINI, Vendor::OpenAi, "o3-mini")
    },
    tool_calling(FLASH, Vendor::Gemini, "gemini-2.0-flash-exp"),
    CatalogEntry {
        delegate: Some(FLASH),
        ..tool_calling(FLASH_THINKING, Vendor::Gemini, "gemini-2.0-flash-thinking-exp")
    },
    CatalogEntry {
        delegate: Some(GPT_4O_MINI),
        ..tool_calling(LLAMA_3_2, Vendor::Ollama, "llama3.2")
    },
];

/// Catalog row for `id`
pub fn entry(id: &str) -> Option<&'static CatalogEntry> {
    CATALOG.iter().find(|entry| entry.id == id)
}

/// One endpoint configuration per vendor
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoints {
    pub openai: OpenAiConfig,
    pub anthropic: OpenAiConfig,
    pub gemini: OpenAiConfig,
    pub ollama: OpenAiConfig,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            openai: OpenAiConfig::openai(None),
            anthropic: OpenAiConfig::anthropic(None),
            gemini: OpenAiConfig::gemini(None),
            ollama: OpenAiConfig::ollama("http://localhost", 11434),
        }
    }
}

impl Endpoints {
    pub fn from_env() -> Self {
        Self {
            openai: OpenAiConfig::from_env(),
            anthropic: OpenAiConfig::anthropic_from_env(),
            gemini: OpenAiConfig::gemini_from_env(),
            ollama: OpenAiConfig::ollama_from_env(),
        }
    }

    pub const fn for_vendor(&self, vendor: Vendor) -> &OpenAiConfig {
        match vendor {
            Vendor::OpenAi => &self.openai,
            Vendor::Anthropic => &self.anthropic,
            Vendor::Gemini => &self.gemini,
            Vendor::Ollama => &self.ollama,
        }
    }
}

fn backend(entry: &CatalogEntry, endpoints: &Endpoints) -> Result<Arc<dyn LanguageModel>> {
    let model = OpenAiModel::new(endpoints.for_vendor(entry.vendor).clone(), entry.backend_model)?;
    Ok(Arc::new(if entry.fixed_temperature {
        model.without_temperature()
    } else {
        model
    }))
}

/// Registry holding every catalog model.
///
/// Tool-capable adapters are registered first so tool-incapable ones can
/// resolve their delegate.
pub fn default_registry(endpoints: &Endpoints) -> Result<ModelRegistry> {
    let mut registry = ModelRegistry::new();

    for entry in CATALOG.iter().filter(|entry| entry.calls_tools()) {
        registry.register(Arc::new(ToolCallingModel::new(
            entry.id,
            backend(entry, endpoints)?,
        )));
    }

    for entry in CATALOG {
        let Some(delegate_id) = entry.delegate else {
            continue;
        };
        let delegate: Arc<dyn ModelAdapter> = registry.get(delegate_id)?;
        registry.register(Arc::new(NonToolCallingModel::new(
            entry.id,
            backend(entry, endpoints)?,
            delegate,
            plan_with_tools,
        )));
    }

    tracing::debug!(models = registry.len(), "Model registry ready");
    Ok(registry)
}
