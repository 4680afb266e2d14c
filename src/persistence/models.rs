//! Serde-friendly persisted shapes, decoupled from the in-memory
//! [`AnalysisState`], following the same split weavegraph keeps between
//! `runtimes::persistence`'s pure data structs and its checkpointer I/O.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::state::AnalysisState;
use crate::types::AnalysisStep;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RunStatus::Running => "running",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
        }
    }
}

impl std::str::FromStr for RunStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "running" => Ok(RunStatus::Running),
            "completed" => Ok(RunStatus::Completed),
            "failed" => Ok(RunStatus::Failed),
            other => Err(format!("unknown run status: {other}")),
        }
    }
}

/// A durable snapshot of one analysis run's channel state at a point in
/// its lifecycle, keyed by `analysis_id`. Mirrors the role of
/// weavegraph's `Checkpoint`, minus frontier/scheduler bookkeeping this
/// system has no equivalent of: phase progression here is driven by the
/// coordinator's static schedule, not a dynamic node frontier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub analysis_id: String,
    pub step: AnalysisStep,
    pub status: RunStatus,
    pub state: AnalysisState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AnalysisRecord {
    #[must_use]
    pub fn new(analysis_id: impl Into<String>, step: AnalysisStep) -> Self {
        let now = Utc::now();
        Self {
            analysis_id: analysis_id.into(),
            step,
            status: RunStatus::Running,
            state: AnalysisState::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// One artifact row as the Persistence Gateway sees it: the category
/// (`kind`) it belongs to, which agent produced it, and its data as a
/// flat JSON object. `metadata` is where a compatibility-mode insert
/// stashes the `identifier` when the backing table lacks that column,
/// mirroring `db_compat.py::insert_component`'s old-schema branch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactRecord {
    pub identifier: String,
    pub analysis_id: String,
    pub kind: String,
    pub agent_type: String,
    pub data: Value,
    #[serde(default)]
    pub metadata: Value,
    pub created_at: DateTime<Utc>,
}

impl ArtifactRecord {
    #[must_use]
    pub fn new(
        analysis_id: impl Into<String>,
        kind: impl Into<String>,
        agent_type: impl Into<String>,
        identifier: impl Into<String>,
        data: Value,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            analysis_id: analysis_id.into(),
            kind: kind.into(),
            agent_type: agent_type.into(),
            data,
            metadata: Value::Null,
            created_at: Utc::now(),
        }
    }
}

/// A relationship row between two artifact identifiers (e.g. a
/// `HazardLossMapping`'s hazard → loss edge), with a free-form `props`
/// bag for relationship-specific fields (strength, rationale, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappingRecord {
    pub kind: String,
    pub a_id: String,
    pub b_id: String,
    pub props: Value,
    pub created_at: DateTime<Utc>,
}
