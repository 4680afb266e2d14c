//! In-memory gateway, ported near 1:1 from
//! `weavegraph::runtimes::checkpointer::InMemoryCheckpointer` (swap
//! `std::sync::RwLock` for `parking_lot::RwLock` as the rest of this
//! crate does). Non-durable; intended for tests and ephemeral runs. Has
//! no legacy-schema concept to compat-shim around, so every artifact
//! keeps its `identifier` field directly rather than stashed in
//! `metadata`.

use async_trait::async_trait;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use serde_json::Value;

use crate::types::AnalysisStep;

use super::gateway::{PersistenceError, PersistenceGateway, Result};
use super::models::{AnalysisRecord, ArtifactRecord, MappingRecord};

#[derive(Default)]
pub struct InMemoryGateway {
    analyses: RwLock<FxHashMap<String, AnalysisRecord>>,
    /// `(analysis_id, kind) -> artifacts in insertion order`, keyed
    /// separately from `analyses` the way `system_components` lives in
    /// its own table rather than a JSON blob column on `analyses`.
    artifacts: RwLock<FxHashMap<(String, String), Vec<ArtifactRecord>>>,
    mappings: RwLock<Vec<MappingRecord>>,
}

impl InMemoryGateway {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PersistenceGateway for InMemoryGateway {
    async fn insert_analysis(&self, record: AnalysisRecord) -> Result<()> {
        self.analyses.write().insert(record.analysis_id.clone(), record);
        Ok(())
    }

    async fn insert_artifact(&self, kind: &str, record: ArtifactRecord) -> Result<()> {
        let key = (record.analysis_id.clone(), kind.to_string());
        let mut artifacts = self.artifacts.write();
        let slot = artifacts.entry(key).or_default();
        match slot.iter_mut().find(|existing| existing.identifier == record.identifier) {
            Some(existing) => *existing = record,
            None => slot.push(record),
        }
        Ok(())
    }

    async fn insert_mapping(&self, kind: &str, a_id: &str, b_id: &str, props: Value) -> Result<()> {
        self.mappings.write().push(MappingRecord {
            kind: kind.to_string(),
            a_id: a_id.to_string(),
            b_id: b_id.to_string(),
            props,
            created_at: chrono::Utc::now(),
        });
        Ok(())
    }

    async fn fetch_artifacts(&self, analysis_id: &str, kind: &str) -> Result<Vec<ArtifactRecord>> {
        let key = (analysis_id.to_string(), kind.to_string());
        Ok(self.artifacts.read().get(&key).cloned().unwrap_or_default())
    }

    async fn fetch_latest_step1_for_db(&self) -> Result<Option<AnalysisRecord>> {
        Ok(self
            .analyses
            .read()
            .values()
            .filter(|record| record.step == AnalysisStep::Step1)
            .max_by_key(|record| record.updated_at)
            .cloned())
    }

    async fn load(&self, analysis_id: &str) -> Result<Option<AnalysisRecord>> {
        Ok(self.analyses.read().get(analysis_id).cloned())
    }

    async fn list_ids(&self) -> Result<Vec<String>> {
        Ok(self.analyses.read().keys().cloned().collect())
    }

    async fn delete(&self, analysis_id: &str) -> Result<()> {
        self.analyses
            .write()
            .remove(analysis_id)
            .map(|_| ())
            .ok_or_else(|| PersistenceError::NotFound {
                analysis_id: analysis_id.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn insert_then_load_round_trips() {
        let gateway = InMemoryGateway::new();
        let record = AnalysisRecord::new("run-1", AnalysisStep::Step1);
        gateway.insert_analysis(record).await.unwrap();

        let loaded = gateway.load("run-1").await.unwrap();
        assert!(loaded.is_some());
        assert_eq!(loaded.unwrap().analysis_id, "run-1");
    }

    #[tokio::test]
    async fn load_missing_returns_none() {
        let gateway = InMemoryGateway::new();
        assert!(gateway.load("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_missing_errors() {
        let gateway = InMemoryGateway::new();
        let err = gateway.delete("missing").await.unwrap_err();
        assert!(matches!(err, PersistenceError::NotFound { .. }));
    }

    #[tokio::test]
    async fn list_ids_reflects_inserted_records() {
        let gateway = InMemoryGateway::new();
        gateway.insert_analysis(AnalysisRecord::new("a", AnalysisStep::Step1)).await.unwrap();
        gateway.insert_analysis(AnalysisRecord::new("b", AnalysisStep::Step2)).await.unwrap();
        let mut ids = gateway.list_ids().await.unwrap();
        ids.sort();
        assert_eq!(ids, vec!["a".to_string(), "b".to_string()]);
    }

    #[tokio::test]
    async fn insert_artifact_upserts_by_identifier() {
        let gateway = InMemoryGateway::new();
        gateway
            .insert_artifact("losses", ArtifactRecord::new("run-1", "losses", "loss_identification", "L-1", json!({"description": "v1"})))
            .await
            .unwrap();
        gateway
            .insert_artifact("losses", ArtifactRecord::new("run-1", "losses", "loss_identification", "L-1", json!({"description": "v2"})))
            .await
            .unwrap();

        let artifacts = gateway.fetch_artifacts("run-1", "losses").await.unwrap();
        assert_eq!(artifacts.len(), 1);
        assert_eq!(artifacts[0].data["description"], "v2");
    }

    #[tokio::test]
    async fn fetch_artifacts_is_scoped_by_analysis_and_kind() {
        let gateway = InMemoryGateway::new();
        gateway
            .insert_artifact("losses", ArtifactRecord::new("run-1", "losses", "loss_identification", "L-1", json!({})))
            .await
            .unwrap();
        gateway
            .insert_artifact("hazards", ArtifactRecord::new("run-1", "hazards", "hazard_identification", "H-1", json!({})))
            .await
            .unwrap();
        gateway
            .insert_artifact("losses", ArtifactRecord::new("run-2", "losses", "loss_identification", "L-1", json!({})))
            .await
            .unwrap();

        assert_eq!(gateway.fetch_artifacts("run-1", "losses").await.unwrap().len(), 1);
        assert_eq!(gateway.fetch_artifacts("run-1", "hazards").await.unwrap().len(), 1);
        assert_eq!(gateway.fetch_artifacts("run-2", "losses").await.unwrap().len(), 1);
        assert!(gateway.fetch_artifacts("run-3", "losses").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn fetch_latest_step1_for_db_picks_most_recently_updated() {
        let gateway = InMemoryGateway::new();
        let mut older = AnalysisRecord::new("run-1", AnalysisStep::Step1);
        older.updated_at = chrono::Utc::now() - chrono::Duration::hours(1);
        gateway.insert_analysis(older).await.unwrap();
        gateway.insert_analysis(AnalysisRecord::new("run-2", AnalysisStep::Step1)).await.unwrap();
        gateway.insert_analysis(AnalysisRecord::new("run-3", AnalysisStep::Step2)).await.unwrap();

        let latest = gateway.fetch_latest_step1_for_db().await.unwrap().unwrap();
        assert_eq!(latest.analysis_id, "run-2");
    }
}
