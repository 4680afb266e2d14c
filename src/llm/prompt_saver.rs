//! Prompt Saver (C3): an optional sidecar writing every prompt/response
//! pair to disk for later inspection.
//!
//! Grounded on `weavegraph::runtimes::runtime_config::EventBusConfig`'s
//! optional, list-configured-sink pattern: the saver is constructed once,
//! handed an `Option<Arc<PromptSaver>>` to the adapter, and does nothing
//! when disabled rather than branching at every call site.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::types::CognitiveStyle;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PromptRecord {
    pub agent: String,
    pub cognitive_style: String,
    pub prompt: String,
    pub response: String,
    pub saved_at: chrono::DateTime<Utc>,
}

/// Writes one JSON file per call under `<output_dir>/prompts/NNNNNN.json`
/// and appends a one-line entry to an in-memory index flushed by
/// [`PromptSaver::write_index`].
#[derive(Debug)]
pub struct PromptSaver {
    output_dir: PathBuf,
    counter: AtomicU64,
    index: Mutex<Vec<String>>,
}

impl PromptSaver {
    #[must_use]
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            counter: AtomicU64::new(0),
            index: Mutex::new(Vec::new()),
        }
    }

    /// Saves one prompt/response pair. I/O errors are logged, not
    /// propagated: a failed prompt save must never fail the analysis run
    /// it is merely observing.
    pub fn save(&self, agent: &str, style: CognitiveStyle, prompt: &str, response: &str) {
        let record = PromptRecord {
            agent: agent.to_string(),
            cognitive_style: style.to_string(),
            prompt: prompt.to_string(),
            response: response.to_string(),
            saved_at: Utc::now(),
        };

        let seq = self.counter.fetch_add(1, Ordering::SeqCst);
        let dir = self.output_dir.join("prompts");
        if let Err(err) = std::fs::create_dir_all(&dir) {
            tracing::warn!(error = %err, "prompt saver could not create output directory");
            return;
        }
        let path = dir.join(format!("{seq:06}-{agent}.json"));
        match serde_json::to_string_pretty(&record) {
            Ok(json) => {
                if let Err(err) = std::fs::write(&path, json) {
                    tracing::warn!(error = %err, path = %path.display(), "prompt saver write failed");
                    return;
                }
                self.index
                    .lock()
                    .push(format!("- `{}` ({}): {}", agent, style, path.display()));
            }
            Err(err) => tracing::warn!(error = %err, "prompt saver serialization failed"),
        }
    }

    /// Writes a Markdown index of every saved prompt to
    /// `<output_dir>/index.md`, called once at the end of a coordinator
    /// run.
    pub fn write_index(&self) -> std::io::Result<()> {
        let entries = self.index.lock();
        let mut body = String::from("# Prompt Log\n\n");
        for entry in entries.iter() {
            body.push_str(entry);
            body.push('\n');
        }
        std::fs::create_dir_all(&self.output_dir)?;
        std::fs::write(self.output_dir.join("index.md"), body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_writes_a_file_per_call() {
        let dir = tempfile::tempdir().unwrap();
        let saver = PromptSaver::new(dir.path());
        saver.save("mission_analyst", CognitiveStyle::Balanced, "prompt", "response");
        saver.save("loss_identification", CognitiveStyle::Intuitive, "p2", "r2");

        let entries: Vec<_> = std::fs::read_dir(dir.path().join("prompts"))
            .unwrap()
            .collect();
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn write_index_lists_every_saved_prompt() {
        let dir = tempfile::tempdir().unwrap();
        let saver = PromptSaver::new(dir.path());
        saver.save("mission_analyst", CognitiveStyle::Balanced, "p", "r");
        saver.write_index().unwrap();

        let index = std::fs::read_to_string(dir.path().join("index.md")).unwrap();
        assert!(index.contains("mission_analyst"));
    }
}
