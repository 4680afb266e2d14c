//! The provider seam: `generate(messages, options) -> text | structured_value`.
//!
//! Concrete HTTP-backed providers (OpenAI, Anthropic, Groq, Ollama shapes)
//! live behind the `http` feature and are deliberately not implemented
//! here in detail — the spec's Non-goals exclude the wire transport, and
//! the trait is the actual contract boundary. [`StubProvider`] is the
//! always-available test double every scenario in spec §8 is driven
//! through, grounded on `weavegraph::node::Node`'s pattern of test-only
//! trait implementations living beside the trait itself.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use crate::llm::adapter::{GenerateOptions, LlmError};
use crate::message::Message;

/// What a provider call returns: either free text or, when a JSON schema
/// was requested and the provider supports structured decoding natively, a
/// parsed value the adapter can skip repairing.
#[derive(Clone, Debug)]
pub enum ProviderResponse {
    Text(String),
    Structured(Value),
}

impl ProviderResponse {
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ProviderResponse::Text(text) => Some(text),
            ProviderResponse::Structured(_) => None,
        }
    }
}

/// The LLM transport seam. Implementations translate `messages`/`options`
/// into a concrete provider's wire format; the adapter never sees it.
#[async_trait]
pub trait ProviderHandle: Send + Sync + fmt::Debug {
    async fn generate(
        &self,
        messages: &[Message],
        options: &GenerateOptions,
    ) -> Result<ProviderResponse, LlmError>;

    /// Human-readable provider name, used in error messages and prompt
    /// saver metadata.
    fn name(&self) -> &str;
}

/// A deterministic, queue-driven provider used by tests and by any caller
/// that wants to drive the coordinator without network access.
///
/// Responses are consumed in FIFO order; `ScriptedResponse::Err` lets
/// tests exercise the LLM Adapter's retry loop (spec scenario S2) and
/// `ScriptedResponse::Malformed` exercises JSON Repair (S3) end to end.
#[derive(Debug, Default)]
pub struct StubProvider {
    queue: Mutex<VecDeque<ScriptedResponse>>,
    calls: Mutex<u32>,
}

#[derive(Debug, Clone)]
pub enum ScriptedResponse {
    Text(String),
    Structured(Value),
    Err(String),
}

impl StubProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a stub that always returns the same text, for agents that
    /// just need a well-formed JSON array/object back.
    #[must_use]
    pub fn with_fixed_text(text: impl Into<String>) -> Self {
        let stub = Self::new();
        stub.push(ScriptedResponse::Text(text.into()));
        stub
    }

    pub fn push(&self, response: ScriptedResponse) {
        self.queue.lock().push_back(response);
    }

    #[must_use]
    pub fn call_count(&self) -> u32 {
        *self.calls.lock()
    }
}

#[async_trait]
impl ProviderHandle for StubProvider {
    async fn generate(
        &self,
        _messages: &[Message],
        _options: &GenerateOptions,
    ) -> Result<ProviderResponse, LlmError> {
        *self.calls.lock() += 1;
        let next = self.queue.lock().pop_front();
        match next {
            Some(ScriptedResponse::Text(text)) => Ok(ProviderResponse::Text(text)),
            Some(ScriptedResponse::Structured(value)) => Ok(ProviderResponse::Structured(value)),
            Some(ScriptedResponse::Err(message)) => Err(LlmError::Provider {
                provider: "stub".to_string(),
                message,
            }),
            None => Ok(ProviderResponse::Text("{}".to_string())),
        }
    }

    fn name(&self) -> &str {
        "stub"
    }
}

/// Shared-handle convenience used throughout the coordinator.
pub type SharedProvider = Arc<dyn ProviderHandle>;

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stub_provider_replays_queued_responses_in_order() {
        let stub = StubProvider::new();
        stub.push(ScriptedResponse::Text("first".into()));
        stub.push(ScriptedResponse::Text("second".into()));

        let options = GenerateOptions::default();
        let first = stub.generate(&[], &options).await.unwrap();
        let second = stub.generate(&[], &options).await.unwrap();

        assert_eq!(first.as_text(), Some("first"));
        assert_eq!(second.as_text(), Some("second"));
        assert_eq!(stub.call_count(), 2);
    }

    #[tokio::test]
    async fn stub_provider_surfaces_scripted_errors() {
        let stub = StubProvider::new();
        stub.push(ScriptedResponse::Err("rate limited".into()));

        let err = stub.generate(&[], &GenerateOptions::default()).await.unwrap_err();
        assert!(matches!(err, LlmError::Provider { .. }));
    }
}
