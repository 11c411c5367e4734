//! Nested agent spawning
//!
//! Tools receive a [`SpawnAgent`] handle instead of a reference to any
//! particular agent, so they can launch a nested loop and tests can inject
//! a stub spawner.

use std::sync::Arc;

use async_trait::async_trait;

use crate::agent::Agent;
use crate::error::Result;
use crate::message::AgentInput;
use crate::reasoning::LoopOptions;

/// Runs another agent to completion and returns its final text
#[async_trait]
pub trait AgentSpawner: Send + Sync {
    async fn spawn(&self, agent: &Agent, input: AgentInput) -> Result<String>;
}

/// Default spawner: the full execution loop with default options
#[derive(Clone, Copy, Debug, Default)]
pub struct LoopSpawner;

#[async_trait]
impl AgentSpawner for LoopSpawner {
    async fn spawn(&self, agent: &Agent, input: AgentInput) -> Result<String> {
        tracing::debug!(agent = %agent.name(), "Spawning nested agent loop");
        agent.execute_loop(LoopOptions::new(input)).await
    }
}

/// Cloneable spawn capability handed to tool bodies
#[derive(Clone)]
pub struct SpawnAgent(Arc<dyn AgentSpawner>);

impl SpawnAgent {
    pub fn new<S: AgentSpawner + 'static>(spawner: S) -> Self {
        Self(Arc::new(spawner))
    }

    pub fn from_arc(spawner: Arc<dyn AgentSpawner>) -> Self {
        Self(spawner)
    }

    /// Run `agent` on `input` until it produces a final answer
    pub async fn spawn(&self, agent: &Agent, input: impl Into<AgentInput> + Send) -> Result<String> {
        self.0.spawn(agent, input.into()).await
    }
}

impl Default for SpawnAgent {
    fn default() -> Self {
        Self::new(LoopSpawner)
    }
}

impl std::fmt::Debug for SpawnAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SpawnAgent")
    }
}
