//! The LLM Adapter (C1), JSON Repair utility (C2), and Prompt Saver
//! sidecar (C3).

mod adapter;
mod json_repair;
mod prompt_saver;
mod provider;

pub use adapter::{GenerateOptions, LlmAdapter, LlmError};
pub use json_repair::{repair_json, JsonRepairError};
pub use prompt_saver::{PromptRecord, PromptSaver};
pub use provider::{ProviderHandle, ProviderResponse, ScriptedResponse, SharedProvider, StubProvider};
