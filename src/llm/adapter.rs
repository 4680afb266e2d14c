//! LLM Adapter (C1): retries with exponential backoff, a semaphore-backed
//! concurrency cap, and a schema-constrained-then-repair fallback path for
//! structured generation.

use std::sync::Arc;
use std::time::Duration;

use miette::Diagnostic;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::Semaphore;

use crate::llm::json_repair::repair_json;
use crate::llm::prompt_saver::PromptSaver;
use crate::llm::provider::{ProviderHandle, ProviderResponse, SharedProvider};
use crate::message::Message;
use crate::types::CognitiveStyle;

#[derive(Debug, Error, Diagnostic)]
pub enum LlmError {
    #[error("provider `{provider}` call failed: {message}")]
    #[diagnostic(code(stpasec::llm::provider))]
    Provider { provider: String, message: String },

    #[error("exhausted {attempts} attempts calling provider `{provider}`: {last_error}")]
    #[diagnostic(code(stpasec::llm::retries_exhausted), help("check provider availability or raise max_retries"))]
    RetriesExhausted {
        provider: String,
        attempts: u32,
        last_error: String,
    },

    #[error("response was not valid JSON even after repair: {0}")]
    #[diagnostic(code(stpasec::llm::unparseable_json))]
    UnparseableJson(String),

    #[error("call deadline exceeded")]
    #[diagnostic(code(stpasec::llm::deadline))]
    DeadlineExceeded,
}

/// Per-call knobs threaded through to the provider and the retry loop.
#[derive(Clone, Debug)]
pub struct GenerateOptions {
    pub temperature: f32,
    pub max_retries: u32,
    pub schema: Option<Value>,
    pub cognitive_style: CognitiveStyle,
    pub agent_name: String,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_retries: 3,
            schema: None,
            cognitive_style: CognitiveStyle::Balanced,
            agent_name: String::new(),
        }
    }
}

/// Computes the exponential backoff delay for a given (zero-based) retry
/// attempt, capped at 2 seconds. Pure and independently testable.
#[must_use]
pub fn backoff_delay(attempt: u32) -> Duration {
    let base_ms = 50u64.saturating_mul(1u64 << attempt.min(10));
    Duration::from_millis(base_ms.min(2_000))
}

/// Default per-call deadline (spec §4.1's cancellation contract: "every
/// call honors a deadline from the caller").
const DEFAULT_CALL_DEADLINE: Duration = Duration::from_secs(120);

/// The LLM Adapter. Owns the concurrency semaphore (spec §5's "cap on
/// concurrent LLM calls") and the optional Prompt Saver sidecar.
#[derive(Debug)]
pub struct LlmAdapter {
    provider: SharedProvider,
    semaphore: Arc<Semaphore>,
    prompt_saver: Option<Arc<PromptSaver>>,
    call_deadline: Duration,
}

impl LlmAdapter {
    #[must_use]
    pub fn new(provider: SharedProvider, max_concurrent: usize) -> Self {
        Self {
            provider,
            semaphore: Arc::new(Semaphore::new(max_concurrent.max(1))),
            prompt_saver: None,
            call_deadline: DEFAULT_CALL_DEADLINE,
        }
    }

    #[must_use]
    pub fn with_prompt_saver(mut self, saver: Arc<PromptSaver>) -> Self {
        self.prompt_saver = Some(saver);
        self
    }

    /// Overrides the per-call deadline every `generate`/`generate_structured`
    /// attempt is bounded by. An attempt that exceeds it is abandoned and
    /// reported as `LlmError::DeadlineExceeded` without consuming a retry,
    /// matching the cooperative-cancellation contract in spec §4.1.
    #[must_use]
    pub fn with_call_deadline(mut self, deadline: Duration) -> Self {
        self.call_deadline = deadline;
        self
    }

    /// Calls the provider for free-text output, retrying on transport
    /// failure with exponential backoff up to `options.max_retries`.
    pub async fn generate(
        &self,
        messages: &[Message],
        options: &GenerateOptions,
    ) -> Result<String, LlmError> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .expect("semaphore is never closed while the adapter is alive");

        let mut last_error = None;
        for attempt in 0..=options.max_retries {
            if attempt > 0 {
                tokio::time::sleep(backoff_delay(attempt - 1)).await;
            }
            match self.call_provider(messages, options).await {
                Ok(ProviderResponse::Text(text)) => {
                    self.save_prompt(messages, options, &text);
                    return Ok(text);
                }
                Ok(ProviderResponse::Structured(value)) => {
                    let text = value.to_string();
                    self.save_prompt(messages, options, &text);
                    return Ok(text);
                }
                Err(LlmError::DeadlineExceeded) => return Err(LlmError::DeadlineExceeded),
                Err(err) => {
                    last_error = Some(err.to_string());
                }
            }
        }

        Err(LlmError::RetriesExhausted {
            provider: self.provider.name().to_string(),
            attempts: options.max_retries + 1,
            last_error: last_error.unwrap_or_else(|| "unknown error".to_string()),
        })
    }

    /// Calls the provider asking for a JSON value matching `options.schema`
    /// when present. Tries the provider's native structured path first;
    /// if it instead returns text, the response goes through JSON Repair
    /// before parsing, so a provider with no structured-output support
    /// still reliably yields a `Value`.
    pub async fn generate_structured(
        &self,
        messages: &[Message],
        options: &GenerateOptions,
    ) -> Result<Value, LlmError> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .expect("semaphore is never closed while the adapter is alive");

        let mut last_error = None;
        for attempt in 0..=options.max_retries {
            if attempt > 0 {
                tokio::time::sleep(backoff_delay(attempt - 1)).await;
            }
            match self.call_provider(messages, options).await {
                Ok(ProviderResponse::Structured(value)) => {
                    self.save_prompt(messages, options, &value.to_string());
                    return Ok(value);
                }
                Ok(ProviderResponse::Text(text)) => {
                    self.save_prompt(messages, options, &text);
                    match repair_json(&text) {
                        Ok(value) => return Ok(value),
                        Err(err) => last_error = Some(err.to_string()),
                    }
                }
                Err(LlmError::DeadlineExceeded) => return Err(LlmError::DeadlineExceeded),
                Err(err) => {
                    last_error = Some(err.to_string());
                }
            }
        }

        Err(LlmError::RetriesExhausted {
            provider: self.provider.name().to_string(),
            attempts: options.max_retries + 1,
            last_error: last_error.unwrap_or_else(|| "unknown error".to_string()),
        })
    }

    /// Runs one provider call bounded by `call_deadline`, collapsing an
    /// elapsed deadline into `LlmError::DeadlineExceeded` so callers see a
    /// single error type regardless of whether the provider itself failed
    /// or simply ran out of time.
    async fn call_provider(
        &self,
        messages: &[Message],
        options: &GenerateOptions,
    ) -> Result<ProviderResponse, LlmError> {
        match tokio::time::timeout(self.call_deadline, self.provider.generate(messages, options)).await {
            Ok(result) => result,
            Err(_) => Err(LlmError::DeadlineExceeded),
        }
    }

    fn save_prompt(&self, messages: &[Message], options: &GenerateOptions, response: &str) {
        if let Some(saver) = &self.prompt_saver {
            let prompt = messages
                .iter()
                .map(|m| format!("[{}] {}", m.role, m.content))
                .collect::<Vec<_>>()
                .join("\n");
            saver.save(
                &options.agent_name,
                options.cognitive_style,
                &prompt,
                response,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::provider::{ProviderHandle, ScriptedResponse, StubProvider};
    use std::sync::atomic::{AtomicU32, Ordering};

    /// A provider whose `generate` sleeps before responding, used to
    /// exercise the adapter's per-call deadline independent of any
    /// scripted-response machinery `StubProvider` offers.
    #[derive(Debug)]
    struct SlowProvider {
        delay: Duration,
        calls: AtomicU32,
    }

    impl SlowProvider {
        fn new(delay: Duration) -> Self {
            Self { delay, calls: AtomicU32::new(0) }
        }

        fn call_count(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl ProviderHandle for SlowProvider {
        async fn generate(
            &self,
            _messages: &[Message],
            _options: &GenerateOptions,
        ) -> Result<ProviderResponse, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            Ok(ProviderResponse::Text("{}".to_string()))
        }

        fn name(&self) -> &str {
            "slow"
        }
    }

    #[test]
    fn backoff_grows_exponentially_and_caps() {
        assert_eq!(backoff_delay(0), Duration::from_millis(50));
        assert_eq!(backoff_delay(1), Duration::from_millis(100));
        assert_eq!(backoff_delay(2), Duration::from_millis(200));
        assert_eq!(backoff_delay(5), Duration::from_millis(1600));
        assert_eq!(backoff_delay(6), Duration::from_millis(2000));
        assert_eq!(backoff_delay(20), Duration::from_millis(2000));
    }

    #[tokio::test]
    async fn generate_retries_until_success() {
        let provider = Arc::new(StubProvider::new());
        provider.push(ScriptedResponse::Err("boom".into()));
        provider.push(ScriptedResponse::Text("ok".into()));
        let adapter = LlmAdapter::new(provider.clone(), 4);

        let result = adapter
            .generate(&[], &GenerateOptions::default())
            .await
            .unwrap();

        assert_eq!(result, "ok");
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test]
    async fn generate_exhausts_retries_and_reports_last_error() {
        let provider = Arc::new(StubProvider::new());
        for _ in 0..4 {
            provider.push(ScriptedResponse::Err("down".into()));
        }
        let adapter = LlmAdapter::new(provider, 4);
        let options = GenerateOptions {
            max_retries: 2,
            ..GenerateOptions::default()
        };

        let err = adapter.generate(&[], &options).await.unwrap_err();
        match err {
            LlmError::RetriesExhausted { attempts, .. } => assert_eq!(attempts, 3),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn generate_aborts_on_deadline_and_skips_retry_bookkeeping() {
        let provider = Arc::new(SlowProvider::new(Duration::from_millis(200)));
        let adapter = LlmAdapter::new(provider.clone(), 4).with_call_deadline(Duration::from_millis(50));

        let err = adapter.generate(&[], &GenerateOptions::default()).await.unwrap_err();
        assert!(matches!(err, LlmError::DeadlineExceeded));
        assert_eq!(provider.call_count(), 1, "a deadline hit should not be retried");
    }

    #[tokio::test]
    async fn generate_structured_repairs_malformed_text() {
        let provider = Arc::new(StubProvider::new());
        provider.push(ScriptedResponse::Text(
            "```json\n{\"a\": 1, \"b\": 2,}\n```".into(),
        ));
        let adapter = LlmAdapter::new(provider, 2);

        let value = adapter
            .generate_structured(&[], &GenerateOptions::default())
            .await
            .unwrap();

        assert_eq!(value["a"], 1);
        assert_eq!(value["b"], 2);
    }
}
