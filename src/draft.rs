//! Draft/Version Store (C11): per-user working drafts layered over
//! committed analysis versions, with impact analysis on pending edits.
//!
//! Grounded on the versioned-channel idiom of
//! [`crate::state::AnalysisState`] (each commit is a barrier: accumulate
//! edits, then atomically bump a version number) and on
//! `weavegraph::runtimes::persistence`'s serde-friendly persisted-shape
//! pattern for what gets snapshotted at commit time.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::state::AnalysisState;
use crate::utils::{deep_merge, MergeStrategy};

#[derive(Debug, Error)]
pub enum DraftError {
    #[error("draft `{0}` not found")]
    NotFound(String),
    #[error("draft `{0}` is already committed")]
    AlreadyCommitted(String),
    #[error("analysis `{0}` has no base version to draft from")]
    NoBaseVersion(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftState {
    Working,
    Committed,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Edit {
    pub changes: Value,
    pub freeze: bool,
    pub edited_at: DateTime<Utc>,
}

/// `edits[kind][id]` — the edit currently staged for one artifact,
/// keyed the way `draft_data.edits` is keyed in the original system.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DraftData {
    pub edits: BTreeMap<String, BTreeMap<String, Edit>>,
}

impl DraftData {
    fn accumulate(&mut self, kind: &str, id: &str, changes: Value, freeze: bool) {
        let slot = self.edits.entry(kind.to_string()).or_default();
        let edited_at = Utc::now();
        match slot.get_mut(id) {
            Some(existing) => {
                existing.changes = deep_merge(&existing.changes, &changes, MergeStrategy::DeepMerge);
                existing.freeze = existing.freeze || freeze;
                existing.edited_at = edited_at;
            }
            None => {
                slot.insert(id.to_string(), Edit { changes, freeze, edited_at });
            }
        }
    }

    fn is_empty(&self) -> bool {
        self.edits.values().all(BTreeMap::is_empty)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Draft {
    pub draft_id: String,
    pub analysis_id: String,
    pub user_id: String,
    pub state: DraftState,
    pub draft_data: DraftData,
    pub created_at: DateTime<Utc>,
    pub committed_version: Option<u64>,
}

/// A draft's two-layer history counterpart: one committed snapshot.
/// `Loaded` distinguishes a bulk-imported analysis from an analyst's own
/// edit (`Commit`), per this crate's resolution of the spec's Open
/// Question on demo/loaded analyses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionType {
    Commit,
    Loaded,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Version {
    pub analysis_id: String,
    pub version_number: u64,
    pub version_type: VersionType,
    pub commit_message: String,
    pub created_by: String,
    pub state_snapshot: AnalysisState,
    pub user_modifications: Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImpactSeverity {
    Low,
    Medium,
    High,
}

impl ImpactSeverity {
    fn from_count(count: usize) -> Self {
        if count > 5 {
            ImpactSeverity::High
        } else if count >= 1 {
            ImpactSeverity::Medium
        } else {
            ImpactSeverity::Low
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ImpactReport {
    pub element_id: String,
    pub dependents: Vec<String>,
    pub severity: ImpactSeverity,
}

#[derive(Default)]
struct Inner {
    versions: FxHashMap<String, Vec<Version>>,
    drafts: FxHashMap<String, Draft>,
    /// `element_id -> ids that depend on it`, populated as Step 2 agents
    /// record cross-references (e.g. a control action depends on the
    /// controller and process it names).
    dependencies: FxHashMap<String, Vec<String>>,
}

/// Concurrency-safe store of committed versions and in-progress drafts
/// for every analysis, mirroring the teacher's pattern of a single
/// `RwLock`-guarded map standing in for what a real deployment would put
/// behind the Persistence Gateway's `version`/`draft` tables.
#[derive(Default)]
pub struct DraftStore {
    inner: RwLock<Inner>,
}

impl DraftStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the base version an analysis starts from — version 1,
    /// either a coordinator-produced `Commit` or a bulk-imported `Loaded`
    /// analysis.
    pub fn seed_version(
        &self,
        analysis_id: &str,
        state: AnalysisState,
        created_by: impl Into<String>,
        version_type: VersionType,
    ) -> u64 {
        let mut inner = self.inner.write();
        let versions = inner.versions.entry(analysis_id.to_string()).or_default();
        let version_number = versions.len() as u64 + 1;
        versions.push(Version {
            analysis_id: analysis_id.to_string(),
            version_number,
            version_type,
            commit_message: match version_type {
                VersionType::Commit => "initial analysis run".to_string(),
                VersionType::Loaded => "loaded analysis".to_string(),
            },
            created_by: created_by.into(),
            state_snapshot: state,
            user_modifications: Value::Null,
            created_at: Utc::now(),
        });
        version_number
    }

    #[must_use]
    pub fn latest_version(&self, analysis_id: &str) -> Option<Version> {
        self.inner
            .read()
            .versions
            .get(analysis_id)
            .and_then(|versions| versions.last().cloned())
    }

    /// Fetches a specific prior version by number, independent of whatever
    /// later versions exist — the full history survives every commit in
    /// `Inner.versions`, this just exposes a point lookup into it.
    #[must_use]
    pub fn get_version(&self, analysis_id: &str, version_number: u64) -> Option<Version> {
        self.inner
            .read()
            .versions
            .get(analysis_id)
            .and_then(|versions| versions.iter().find(|v| v.version_number == version_number).cloned())
    }

    pub fn register_dependency(&self, depends_on: &str, dependent: &str) {
        self.inner
            .write()
            .dependencies
            .entry(depends_on.to_string())
            .or_default()
            .push(dependent.to_string());
    }

    /// Returns the existing working draft for `(analysis_id, user_id)` if
    /// one exists, otherwise creates it. At most one working draft exists
    /// per user per analysis at a time.
    pub fn get_or_create_draft(&self, analysis_id: &str, user_id: &str) -> Result<Draft, DraftError> {
        let mut inner = self.inner.write();
        if !inner.versions.contains_key(analysis_id) {
            return Err(DraftError::NoBaseVersion(analysis_id.to_string()));
        }

        if let Some(existing) = inner.drafts.values().find(|d| {
            d.analysis_id == analysis_id && d.user_id == user_id && d.state == DraftState::Working
        }) {
            return Ok(existing.clone());
        }

        let draft = Draft {
            draft_id: uuid::Uuid::new_v4().to_string(),
            analysis_id: analysis_id.to_string(),
            user_id: user_id.to_string(),
            state: DraftState::Working,
            draft_data: DraftData::default(),
            created_at: Utc::now(),
            committed_version: None,
        };
        inner.drafts.insert(draft.draft_id.clone(), draft.clone());
        Ok(draft)
    }

    /// Merges an edit into a draft's pending change set for one artifact.
    /// Repeated edits to the same `(kind, id)` accumulate via deep merge
    /// rather than overwrite, so a user can change one field at a time.
    pub fn accumulate_edit(
        &self,
        draft_id: &str,
        kind: &str,
        id: &str,
        changes: Value,
        freeze: bool,
    ) -> Result<(), DraftError> {
        let mut inner = self.inner.write();
        let draft = inner
            .drafts
            .get_mut(draft_id)
            .ok_or_else(|| DraftError::NotFound(draft_id.to_string()))?;
        if draft.state == DraftState::Committed {
            return Err(DraftError::AlreadyCommitted(draft_id.to_string()));
        }
        draft.draft_data.accumulate(kind, id, changes, freeze);
        Ok(())
    }

    /// Dependent artifacts of `element_id`, with a severity bucket sized
    /// the way an editor would want to warn a user: more than five
    /// dependents is `high`, at least one is `medium`, none is `low`.
    #[must_use]
    pub fn impact(&self, element_id: &str) -> ImpactReport {
        let inner = self.inner.read();
        let dependents = inner
            .dependencies
            .get(element_id)
            .cloned()
            .unwrap_or_default();
        ImpactReport {
            element_id: element_id.to_string(),
            severity: ImpactSeverity::from_count(dependents.len()),
            dependents,
        }
    }

    /// Applies every staged edit onto the analysis's latest committed
    /// state, recording a new [`Version`] and marking the draft
    /// committed. Builds the merged state in a local variable first so a
    /// missing base version leaves nothing mutated — either the whole
    /// commit lands or none of it does.
    pub fn commit(
        &self,
        draft_id: &str,
        commit_message: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Result<u64, DraftError> {
        let mut inner = self.inner.write();

        let draft = inner
            .drafts
            .get(draft_id)
            .ok_or_else(|| DraftError::NotFound(draft_id.to_string()))?
            .clone();
        if draft.state == DraftState::Committed {
            return Err(DraftError::AlreadyCommitted(draft_id.to_string()));
        }

        let versions = inner
            .versions
            .get(&draft.analysis_id)
            .ok_or_else(|| DraftError::NoBaseVersion(draft.analysis_id.clone()))?;
        let base = versions
            .last()
            .ok_or_else(|| DraftError::NoBaseVersion(draft.analysis_id.clone()))?
            .clone();

        let merged_state = apply_edits(&base.state_snapshot, &draft.draft_data);
        let version_number = base.version_number + 1;

        let versions = inner.versions.get_mut(&draft.analysis_id).expect("checked above");
        versions.push(Version {
            analysis_id: draft.analysis_id.clone(),
            version_number,
            version_type: VersionType::Commit,
            commit_message: commit_message.into(),
            created_by: user_id.into(),
            state_snapshot: merged_state,
            user_modifications: serde_json::to_value(&draft.draft_data).unwrap_or(Value::Null),
            created_at: Utc::now(),
        });

        let stored_draft = inner.drafts.get_mut(draft_id).expect("checked above");
        stored_draft.state = DraftState::Committed;
        stored_draft.committed_version = Some(version_number);

        Ok(version_number)
    }
}

/// Replays a draft's staged edits onto a base state: for each `(kind,
/// id)` pair, deep-merges the staged changes into the matching artifact
/// by identifier, or inserts a new artifact if none matched.
fn apply_edits(base: &AnalysisState, draft_data: &DraftData) -> AnalysisState {
    if draft_data.is_empty() {
        return base.clone();
    }

    let mut result = base.clone();
    for (kind, edits) in &draft_data.edits {
        let mut items: Vec<Value> = result.items(kind).to_vec();
        for (id, edit) in edits {
            let mut changes = edit.changes.clone();
            if let Some(obj) = changes.as_object_mut() {
                obj.entry("identifier").or_insert_with(|| Value::String(id.clone()));
                if edit.freeze {
                    obj.insert("frozen".to_string(), Value::Bool(true));
                }
            }

            match items.iter().position(|item| item.get("identifier").and_then(Value::as_str) == Some(id)) {
                Some(index) => {
                    items[index] = deep_merge(&items[index], &changes, MergeStrategy::PreferRight);
                }
                None => items.push(changes),
            }
        }
        result.replace_category(kind, items);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn seeded_store() -> (DraftStore, String) {
        let store = DraftStore::new();
        let mut state = AnalysisState::new();
        state.extend(
            "losses",
            vec![json!({"identifier": "L-1", "description": "loss of funds", "severity": "major"})],
        );
        store.seed_version("an-1", state, "system", VersionType::Commit);
        (store, "an-1".to_string())
    }

    #[test]
    fn get_or_create_draft_is_idempotent_per_user() {
        let (store, analysis_id) = seeded_store();
        let first = store.get_or_create_draft(&analysis_id, "alice").unwrap();
        let second = store.get_or_create_draft(&analysis_id, "alice").unwrap();
        assert_eq!(first.draft_id, second.draft_id);
    }

    #[test]
    fn accumulate_edit_merges_repeated_changes() {
        let (store, analysis_id) = seeded_store();
        let draft = store.get_or_create_draft(&analysis_id, "alice").unwrap();
        store
            .accumulate_edit(&draft.draft_id, "losses", "L-1", json!({"severity": "catastrophic"}), false)
            .unwrap();
        store
            .accumulate_edit(&draft.draft_id, "losses", "L-1", json!({"description": "total loss of funds"}), false)
            .unwrap();

        let version = store.commit(&draft.draft_id, "raise severity", "alice").unwrap();
        assert_eq!(version, 2);

        let latest = store.latest_version(&analysis_id).unwrap();
        let loss = &latest.state_snapshot.items("losses")[0];
        assert_eq!(loss["severity"], "catastrophic");
        assert_eq!(loss["description"], "total loss of funds");
    }

    #[test]
    fn get_version_returns_prior_version_unaffected_by_later_commits() {
        let (store, analysis_id) = seeded_store();
        let draft = store.get_or_create_draft(&analysis_id, "alice").unwrap();
        store
            .accumulate_edit(&draft.draft_id, "losses", "L-1", json!({"severity": "catastrophic"}), false)
            .unwrap();
        store.commit(&draft.draft_id, "raise severity", "alice").unwrap();

        let original = store.get_version(&analysis_id, 1).unwrap();
        let loss = &original.state_snapshot.items("losses")[0];
        assert_eq!(loss["severity"], "major");

        let latest = store.latest_version(&analysis_id).unwrap();
        assert_eq!(latest.version_number, 2);
        assert!(store.get_version(&analysis_id, 99).is_none());
    }

    #[test]
    fn commit_fails_on_unknown_draft() {
        let (store, _) = seeded_store();
        let err = store.commit("missing-draft", "msg", "alice").unwrap_err();
        assert!(matches!(err, DraftError::NotFound(_)));
    }

    #[test]
    fn committed_draft_rejects_further_edits() {
        let (store, analysis_id) = seeded_store();
        let draft = store.get_or_create_draft(&analysis_id, "alice").unwrap();
        store.commit(&draft.draft_id, "empty commit", "alice").unwrap();
        let err = store
            .accumulate_edit(&draft.draft_id, "losses", "L-1", json!({"severity": "minor"}), false)
            .unwrap_err();
        assert!(matches!(err, DraftError::AlreadyCommitted(_)));
    }

    #[test]
    fn impact_severity_scales_with_dependent_count() {
        let (store, _) = seeded_store();
        assert_eq!(store.impact("L-1").severity, ImpactSeverity::Low);

        for dependent in ["H-1", "H-2", "H-3", "H-4", "H-5", "H-6"] {
            store.register_dependency("L-1", dependent);
        }
        assert_eq!(store.impact("L-1").severity, ImpactSeverity::High);
    }
}
