//! YAML-shaped configuration for the orchestration core.
//!
//! Grounded on `weavegraph::runtimes::runtime_config::RuntimeConfig`, which
//! resolves some fields from environment variables via `dotenvy`; here that
//! pattern generalizes to a full `<key>_env: VAR_NAME` redirection on any
//! secret-shaped field (provider API keys) plus a handful of ambient
//! sections (`logging`, `concurrency`) the original Python system left
//! implicit as hardcoded constants.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::StpaSecError;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub providers: Vec<ProviderConfig>,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub concurrency: ConcurrencyConfig,
    #[serde(default)]
    pub persistence: PersistenceConfig,
    #[serde(default)]
    pub prompt_saver: PromptSaverConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            providers: Vec::new(),
            logging: LoggingConfig::default(),
            concurrency: ConcurrencyConfig::default(),
            persistence: PersistenceConfig::default(),
            prompt_saver: PromptSaverConfig::default(),
        }
    }
}

impl Config {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, StpaSecError> {
        serde_yaml::from_str(yaml).map_err(|e| StpaSecError::Config(e.to_string()))
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, StpaSecError> {
        let text = std::fs::read_to_string(path.as_ref())
            .map_err(|e| StpaSecError::Config(format!("reading {}: {e}", path.as_ref().display())))?;
        Self::from_yaml_str(&text)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub name: String,
    pub kind: ProviderKind,
    pub model: String,
    #[serde(default)]
    pub base_url: Option<String>,
    /// Resolved directly; prefer `api_key_env` in committed configuration.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Name of an environment variable holding the API key, loaded through
    /// `dotenvy` the same way `RuntimeConfig` resolves `SQLITE_DB_NAME`.
    #[serde(default)]
    pub api_key_env: Option<String>,
}

impl ProviderConfig {
    pub fn resolve_api_key(&self) -> Option<String> {
        if let Some(key) = &self.api_key {
            return Some(key.clone());
        }
        let var = self.api_key_env.as_deref()?;
        dotenvy::dotenv().ok();
        std::env::var(var).ok()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    OpenAi,
    Anthropic,
    Groq,
    Ollama,
    Stub,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> LogFormat {
    LogFormat::Pretty
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConcurrencyConfig {
    #[serde(default = "default_max_llm_calls")]
    pub max_llm_calls: usize,
    #[serde(default = "default_llm_call_deadline_secs")]
    pub llm_call_deadline_secs: u64,
    #[serde(default = "default_agent_deadline_secs")]
    pub agent_deadline_secs: u64,
    #[serde(default = "default_analysis_deadline_secs")]
    pub analysis_deadline_secs: u64,
    #[serde(default = "default_llm_retries")]
    pub llm_max_retries: u32,
}

fn default_max_llm_calls() -> usize {
    8
}

fn default_llm_call_deadline_secs() -> u64 {
    120
}

fn default_agent_deadline_secs() -> u64 {
    600
}

fn default_analysis_deadline_secs() -> u64 {
    3600
}

fn default_llm_retries() -> u32 {
    3
}

impl Default for ConcurrencyConfig {
    fn default() -> Self {
        Self {
            max_llm_calls: default_max_llm_calls(),
            llm_call_deadline_secs: default_llm_call_deadline_secs(),
            agent_deadline_secs: default_agent_deadline_secs(),
            analysis_deadline_secs: default_analysis_deadline_secs(),
            llm_max_retries: default_llm_retries(),
        }
    }
}

impl ConcurrencyConfig {
    pub fn llm_call_deadline(&self) -> Duration {
        Duration::from_secs(self.llm_call_deadline_secs)
    }

    pub fn agent_deadline(&self) -> Duration {
        Duration::from_secs(self.agent_deadline_secs)
    }

    pub fn analysis_deadline(&self) -> Duration {
        Duration::from_secs(self.analysis_deadline_secs)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PersistenceConfig {
    #[serde(default = "default_backend")]
    pub backend: PersistenceBackend,
    #[serde(default)]
    pub sqlite_path: Option<String>,
}

fn default_backend() -> PersistenceBackend {
    PersistenceBackend::Memory
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            sqlite_path: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersistenceBackend {
    Memory,
    Sqlite,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PromptSaverConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_prompt_dir")]
    pub output_dir: String,
}

fn default_prompt_dir() -> String {
    "prompt_logs".to_string()
}

impl Default for PromptSaverConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            output_dir: default_prompt_dir(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_concurrency_model() {
        let config = Config::default();
        assert_eq!(config.concurrency.max_llm_calls, 8);
        assert_eq!(config.persistence.backend, PersistenceBackend::Memory);
    }

    #[test]
    fn parses_minimal_yaml() {
        let yaml = r#"
providers:
  - name: primary
    kind: openai
    model: gpt-4o-mini
    api_key_env: OPENAI_API_KEY
concurrency:
  max_llm_calls: 4
"#;
        let config = Config::from_yaml_str(yaml).unwrap();
        assert_eq!(config.providers.len(), 1);
        assert_eq!(config.providers[0].kind, ProviderKind::OpenAi);
        assert_eq!(config.concurrency.max_llm_calls, 4);
    }
}
