//! The `PersistenceGateway` trait and its shared error type. Spec §4.6
//! calls for a narrow typed surface rather than a generic record store,
//! so this generalizes `weavegraph::runtimes::checkpointer::Checkpointer`'s
//! save/load/list shape into separate operations for the analysis root,
//! its artifacts, and the relationships between them — the same split
//! `db_compat.py` draws between `insert_component`/`insert_control_action`
//! calls against distinct tables.

use async_trait::async_trait;
use miette::Diagnostic;
use serde_json::Value;
use thiserror::Error;

use super::models::{AnalysisRecord, ArtifactRecord};

#[derive(Debug, Error, Diagnostic)]
pub enum PersistenceError {
    #[error("analysis not found: {analysis_id}")]
    #[diagnostic(code(stpasec::persistence::not_found))]
    NotFound { analysis_id: String },

    #[error("persistence backend error: {message}")]
    #[diagnostic(code(stpasec::persistence::backend))]
    Backend { message: String },

    #[error("serialization error: {0}")]
    #[diagnostic(code(stpasec::persistence::serde))]
    Serde(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PersistenceError>;

/// Durable storage for one analysis run: its root record, its artifacts,
/// and the mappings between them. Spec §4.6: "all operations are
/// transactional per call; multi-record writes within a phase either all
/// commit at end-of-phase or the phase fails" — callers (the Step
/// Coordinator) are responsible for treating a failed `insert_artifact`
/// partway through a phase's artifact set as a phase failure, since the
/// gateway itself only guarantees atomicity of the single call it's
/// handed.
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    /// Upserts the analysis root record.
    async fn insert_analysis(&self, record: AnalysisRecord) -> Result<()>;

    /// Inserts or updates one artifact of category `kind` belonging to
    /// `record.analysis_id`, keyed by `(analysis_id, kind, identifier)`.
    async fn insert_artifact(&self, kind: &str, record: ArtifactRecord) -> Result<()>;

    /// Records a relationship of category `kind` between two artifact
    /// identifiers (e.g. a hazard→loss mapping), with relationship-
    /// specific fields carried in `props`.
    async fn insert_mapping(&self, kind: &str, a_id: &str, b_id: &str, props: Value) -> Result<()>;

    /// Every artifact of category `kind` persisted for `analysis_id`, in
    /// insertion order.
    async fn fetch_artifacts(&self, analysis_id: &str, kind: &str) -> Result<Vec<ArtifactRecord>>;

    /// The most recently updated Step 1 analysis record, the anchor a
    /// Step 2 run's prior-result loader reads from when bridging off a
    /// parent Step 1 analysis.
    async fn fetch_latest_step1_for_db(&self) -> Result<Option<AnalysisRecord>>;

    async fn load(&self, analysis_id: &str) -> Result<Option<AnalysisRecord>>;

    async fn list_ids(&self) -> Result<Vec<String>>;

    async fn delete(&self, analysis_id: &str) -> Result<()>;
}
