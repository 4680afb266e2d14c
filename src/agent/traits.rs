//! The `Agent` trait: the direct generalization of `weavegraph::node::Node`.
//!
//! Where `Node::run(snapshot, ctx) -> NodePartial` processes a
//! `StateSnapshot`, `Agent::analyze(snapshot, ctx) -> AgentOutcome`
//! processes an `AnalysisSnapshot`. Phase routing is static (declared by
//! the coordinator's phase graph, spec §4.7), so `AgentOutcome` carries no
//! frontier command the way `NodePartial` does.

use std::sync::Arc;

use async_trait::async_trait;
use miette::Diagnostic;
use parking_lot::Mutex;
use serde_json::Value;
use thiserror::Error;

use crate::event_bus::ProgressEmitter;
use crate::llm::{GenerateOptions, LlmAdapter};
use crate::message::Message;
use crate::registry::ComponentRegistry;
use crate::state::AnalysisSnapshot;
use crate::types::{CognitiveStyle, PhaseKind};
use crate::utils::IdGenerator;

#[derive(Debug, Error, Diagnostic)]
pub enum AgentError {
    #[error("missing required input: {what}")]
    #[diagnostic(code(stpasec::agent::missing_input))]
    MissingInput { what: &'static str },

    #[error("llm call failed: {0}")]
    #[diagnostic(code(stpasec::agent::llm))]
    Llm(#[from] crate::llm::LlmError),

    #[error("response failed abstraction-level validation: {0}")]
    #[diagnostic(code(stpasec::agent::abstraction), help("rephrase findings at mission level, not implementation level"))]
    AbstractionViolation(String),

    #[error("response shape was unexpected: {0}")]
    #[diagnostic(code(stpasec::agent::shape))]
    UnexpectedShape(String),
}

/// Per-call context handed to every agent invocation: identity, dispatch
/// handles, and the shared allocator/registry the coordinator owns.
pub struct AgentContext {
    pub agent_type: &'static str,
    pub phase: PhaseKind,
    pub cognitive_style: CognitiveStyle,
    pub adapter: Arc<LlmAdapter>,
    pub registry: Arc<ComponentRegistry>,
    pub id_generator: Arc<Mutex<IdGenerator>>,
    pub emitter: Arc<dyn ProgressEmitter>,
}

impl AgentContext {
    /// Calls the LLM with the agent's cognitive style folded into the
    /// system prompt, the same construction as
    /// `base_step1.py::call_llm`: style modifier prepended to (or
    /// standing in for) the caller's system prompt.
    pub async fn call_llm(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, AgentError> {
        let modifier = self.cognitive_style.prompt_modifier();
        let full_system = if modifier.is_empty() {
            system_prompt.to_string()
        } else {
            format!("{modifier}\n\n{system_prompt}")
        };
        let messages = vec![Message::system(full_system), Message::user(user_prompt)];
        let options = GenerateOptions {
            cognitive_style: self.cognitive_style,
            agent_name: self.agent_type.to_string(),
            ..GenerateOptions::default()
        };
        self.adapter
            .generate(&messages, &options)
            .await
            .map_err(AgentError::from)
    }

    pub async fn call_llm_structured(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<Value, AgentError> {
        let modifier = self.cognitive_style.prompt_modifier();
        let full_system = if modifier.is_empty() {
            system_prompt.to_string()
        } else {
            format!("{modifier}\n\n{system_prompt}")
        };
        let messages = vec![Message::system(full_system), Message::user(user_prompt)];
        let options = GenerateOptions {
            cognitive_style: self.cognitive_style,
            agent_name: self.agent_type.to_string(),
            ..GenerateOptions::default()
        };
        self.adapter
            .generate_structured(&messages, &options)
            .await
            .map_err(AgentError::from)
    }

    pub fn next_id(&self, prefix: &str) -> String {
        self.id_generator.lock().next(prefix).to_string()
    }
}

/// What an agent produces for one (phase, cognitive style) invocation.
#[derive(Clone, Debug, Default)]
pub struct AgentOutcome {
    /// Artifacts keyed by the category channel they belong to, e.g.
    /// `"losses"` -> the loss objects this invocation produced.
    pub artifacts: Vec<(String, Vec<Value>)>,
    pub validation_errors: Vec<String>,
    pub activity: Vec<String>,
}

impl AgentOutcome {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_artifacts(mut self, category: impl Into<String>, items: Vec<Value>) -> Self {
        self.artifacts.push((category.into(), items));
        self
    }

    #[must_use]
    pub fn with_validation_error(mut self, message: impl Into<String>) -> Self {
        self.validation_errors.push(message.into());
        self
    }

    #[must_use]
    pub fn artifact_count(&self) -> usize {
        self.artifacts.iter().map(|(_, items)| items.len()).sum()
    }
}

#[async_trait]
pub trait Agent: Send + Sync {
    /// Stable machine name, used in progress events and persisted rows.
    fn agent_type(&self) -> &'static str;

    async fn analyze(
        &self,
        snapshot: &AnalysisSnapshot,
        ctx: &AgentContext,
    ) -> Result<AgentOutcome, AgentError>;
}
