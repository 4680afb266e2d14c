//! Versioned artifact channels, generalized from
//! `weavegraph::state::{VersionedState, VersionedStateBuilder}`.
//!
//! Where the teacher keys channels by a fixed `ChannelType` (messages,
//! extra, errors), an analysis has an open set of artifact categories
//! (losses, hazards, components, control actions, ...), so channels here
//! are keyed by category name. Each channel still carries its own
//! monotonic version counter bumped only when content actually changes,
//! exactly as `App::apply_barrier` does — this is what gives the
//! Draft/Version Store (C11) a version to snapshot at commit time.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct VersionedChannel {
    pub items: Vec<Value>,
    pub version: u64,
}

impl VersionedChannel {
    /// Appends items and bumps the version only if the channel's content
    /// actually changed, mirroring `App::apply_barrier`'s before/after
    /// comparison.
    pub fn extend(&mut self, new_items: Vec<Value>) -> bool {
        if new_items.is_empty() {
            return false;
        }
        self.items.extend(new_items);
        self.version += 1;
        true
    }

    pub fn replace(&mut self, items: Vec<Value>) -> bool {
        if items == self.items {
            return false;
        }
        self.items = items;
        self.version += 1;
        true
    }
}

/// All artifact channels for a single analysis, keyed by category
/// (`"losses"`, `"hazards"`, `"control_actions"`, ...).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AnalysisState {
    channels: FxHashMap<String, VersionedChannel>,
}

impl AnalysisState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn channel(&self, category: &str) -> Option<&VersionedChannel> {
        self.channels.get(category)
    }

    #[must_use]
    pub fn items(&self, category: &str) -> &[Value] {
        self.channels
            .get(category)
            .map(|c| c.items.as_slice())
            .unwrap_or(&[])
    }

    /// Appends artifacts to a category's channel, returning the list of
    /// channel names that actually changed version (empty if the update
    /// contributed no new content), the same contract
    /// `App::apply_barrier` returns to callers.
    pub fn extend(&mut self, category: &str, items: Vec<Value>) -> Vec<String> {
        let channel = self.channels.entry(category.to_string()).or_default();
        if channel.extend(items) {
            vec![category.to_string()]
        } else {
            Vec::new()
        }
    }

    pub fn version(&self, category: &str) -> u64 {
        self.channels.get(category).map(|c| c.version).unwrap_or(0)
    }

    /// Overwrites a category's items wholesale, bumping its version only
    /// if the content actually differs. Used by the Draft/Version Store
    /// to land a draft's merged edits back onto a category channel.
    pub fn replace_category(&mut self, category: &str, items: Vec<Value>) -> bool {
        let channel = self.channels.entry(category.to_string()).or_default();
        channel.replace(items)
    }

    #[must_use]
    pub fn snapshot(&self) -> AnalysisSnapshot {
        AnalysisSnapshot {
            state: self.clone(),
        }
    }

    #[must_use]
    pub fn categories(&self) -> Vec<String> {
        self.channels.keys().cloned().collect()
    }
}

/// A read-only view over analysis state handed to agents via
/// `AgentContext`, generalizing `weavegraph::state::StateSnapshot`.
#[derive(Clone, Debug, Default)]
pub struct AnalysisSnapshot {
    state: AnalysisState,
}

impl AnalysisSnapshot {
    #[must_use]
    pub fn items(&self, category: &str) -> &[Value] {
        self.state.items(category)
    }

    #[must_use]
    pub fn version(&self, category: &str) -> u64 {
        self.state.version(category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extend_bumps_version_only_when_content_added() {
        let mut state = AnalysisState::new();
        let changed = state.extend("losses", vec![json!({"identifier": "L-1"})]);
        assert_eq!(changed, vec!["losses".to_string()]);
        assert_eq!(state.version("losses"), 1);

        let unchanged = state.extend("losses", vec![]);
        assert!(unchanged.is_empty());
        assert_eq!(state.version("losses"), 1);
    }

    #[test]
    fn snapshot_reflects_current_items() {
        let mut state = AnalysisState::new();
        state.extend("hazards", vec![json!({"identifier": "H-1"})]);
        let snapshot = state.snapshot();
        assert_eq!(snapshot.items("hazards").len(), 1);
        assert_eq!(snapshot.version("hazards"), 1);
    }
}
