//! Scripted backend for tests and offline wiring

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{AgentError, Result};
use crate::provider::{GenerateRequest, Generation, LanguageModel};

/// A mock backend that replays pre-configured generations in order and
/// records every request it receives
pub struct MockModel {
    model_id: String,
    responses: Mutex<VecDeque<Generation>>,
    requests: Mutex<Vec<GenerateRequest>>,
}

impl MockModel {
    /// Create a new mock backend with a sequence of responses
    pub fn new(model_id: impl Into<String>, responses: Vec<Generation>) -> Self {
        Self {
            model_id: model_id.into(),
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<GenerateRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|requests| requests.len()).unwrap_or(0)
    }
}

#[async_trait]
impl LanguageModel for MockModel {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn generate(&self, request: GenerateRequest) -> Result<Generation> {
        self.requests
            .lock()
            .map_err(|_| AgentError::Other("mock request log poisoned".into()))?
            .push(request);

        self.responses
            .lock()
            .map_err(|_| AgentError::Other("mock response queue poisoned".into()))?
            .pop_front()
            .ok_or_else(|| AgentError::Provider(format!("{}: no scripted response left", self.model_id)))
    }
}
