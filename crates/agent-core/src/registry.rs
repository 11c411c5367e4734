//! Model registry: model identifier to adapter

use std::collections::HashMap;
use std::sync::Arc;

use crate::adapter::ModelAdapter;
use crate::error::{AgentError, Result};

/// Registry of model adapters, keyed by adapter name
#[derive(Clone, Default)]
pub struct ModelRegistry {
    adapters: HashMap<String, Arc<dyn ModelAdapter>>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter under its own name, replacing any previous entry
    pub fn register(&mut self, adapter: Arc<dyn ModelAdapter>) {
        tracing::debug!(model = %adapter.name(), "Registering model adapter");
        self.adapters.insert(adapter.name().to_string(), adapter);
    }

    #[must_use]
    pub fn with(mut self, adapter: Arc<dyn ModelAdapter>) -> Self {
        self.register(adapter);
        self
    }

    /// Adapter for `model`, or [`AgentError::UnknownModel`]
    pub fn get(&self, model: &str) -> Result<Arc<dyn ModelAdapter>> {
        self.adapters
            .get(model)
            .cloned()
            .ok_or_else(|| AgentError::UnknownModel(model.to_string()))
    }

    pub fn contains(&self, model: &str) -> bool {
        self.adapters.contains_key(model)
    }

    /// Registered identifiers, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.adapters.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

impl std::fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelRegistry")
            .field("models", &self.names())
            .finish()
    }
}
