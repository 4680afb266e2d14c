//! SQLite-backed gateway, following the connect/migrate/query shape of
//! `weavegraph::runtimes::checkpointer_sqlite::SQLiteCheckpointer`, with
//! separate tables for the analysis root, its artifacts, and mappings
//! between them (spec §4.6's typed surface) instead of one flat table.
//!
//! Ported `db_compat.py`'s compatibility check near 1:1: the first
//! artifact insert probes whether the `artifacts` table carries an
//! `identifier` column (via `PRAGMA table_info`, the SQLite analogue of
//! the original's `SELECT identifier ... LIMIT 1` probe) and caches the
//! answer for the lifetime of the connection. A legacy table missing the
//! column gets the identifier folded into `metadata_json` instead of
//! rejected outright.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{Row, SqlitePool, sqlite::SqliteRow};
use tokio::sync::OnceCell;
use tracing::instrument;

use crate::state::AnalysisState;
use crate::types::AnalysisStep;

use super::gateway::{PersistenceError, PersistenceGateway, Result};
use super::models::{AnalysisRecord, ArtifactRecord, RunStatus};

pub struct SqliteGateway {
    pool: Arc<SqlitePool>,
    has_identifier_column: OnceCell<bool>,
}

impl std::fmt::Debug for SqliteGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteGateway").finish()
    }
}

impl SqliteGateway {
    /// Connects to (or creates) a SQLite database at `database_url`,
    /// e.g. `"sqlite://stpasec.db"`, running embedded migrations.
    #[instrument(skip(database_url))]
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .map_err(|e| PersistenceError::Backend {
                message: format!("connect error: {e}"),
            })?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| PersistenceError::Backend {
                message: format!("migration failure: {e}"),
            })?;

        Ok(Self {
            pool: Arc::new(pool),
            has_identifier_column: OnceCell::new(),
        })
    }

    async fn has_identifier_column(&self) -> Result<bool> {
        self.has_identifier_column
            .get_or_try_init(|| async {
                let rows = sqlx::query("PRAGMA table_info(artifacts)")
                    .fetch_all(self.pool.as_ref())
                    .await
                    .map_err(backend_err)?;
                Ok(rows.iter().any(|row| {
                    row.try_get::<String, _>("name")
                        .map(|name| name == "identifier")
                        .unwrap_or(false)
                }))
            })
            .await
            .copied()
    }

    fn row_to_analysis(row: SqliteRow) -> Result<AnalysisRecord> {
        let analysis_id: String = row.try_get("analysis_id").map_err(backend_err)?;
        let step_raw: String = row.try_get("step").map_err(backend_err)?;
        let status_raw: String = row.try_get("status").map_err(backend_err)?;
        let state_json: String = row.try_get("state_json").map_err(backend_err)?;
        let created_at: DateTime<Utc> = row.try_get("created_at").map_err(backend_err)?;
        let updated_at: DateTime<Utc> = row.try_get("updated_at").map_err(backend_err)?;

        let step = match step_raw.as_str() {
            "step1" => AnalysisStep::Step1,
            "step2" => AnalysisStep::Step2,
            other => {
                return Err(PersistenceError::Backend {
                    message: format!("unknown step encoding: {other}"),
                });
            }
        };
        let status: RunStatus = status_raw
            .parse()
            .map_err(|e: String| PersistenceError::Backend { message: e })?;
        let state: AnalysisState = serde_json::from_str(&state_json)?;

        Ok(AnalysisRecord {
            analysis_id,
            step,
            status,
            state,
            created_at,
            updated_at,
        })
    }

    fn row_to_artifact(row: SqliteRow) -> Result<ArtifactRecord> {
        let identifier: String = row
            .try_get::<String, _>("identifier")
            .unwrap_or_default();
        let analysis_id: String = row.try_get("analysis_id").map_err(backend_err)?;
        let kind: String = row.try_get("kind").map_err(backend_err)?;
        let agent_type: String = row.try_get("agent_type").map_err(backend_err)?;
        let data_json: String = row.try_get("data_json").map_err(backend_err)?;
        let metadata_json: String = row.try_get("metadata_json").map_err(backend_err)?;
        let created_at: DateTime<Utc> = row.try_get("created_at").map_err(backend_err)?;

        let data: Value = serde_json::from_str(&data_json)?;
        let metadata: Value = serde_json::from_str(&metadata_json)?;
        let identifier = if identifier.is_empty() {
            metadata
                .get("identifier")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        } else {
            identifier
        };

        Ok(ArtifactRecord {
            identifier,
            analysis_id,
            kind,
            agent_type,
            data,
            metadata,
            created_at,
        })
    }
}

fn backend_err(e: sqlx::Error) -> PersistenceError {
    PersistenceError::Backend { message: e.to_string() }
}

#[async_trait]
impl PersistenceGateway for SqliteGateway {
    #[instrument(skip(self, record), err)]
    async fn insert_analysis(&self, record: AnalysisRecord) -> Result<()> {
        let state_json = serde_json::to_string(&record.state)?;
        let step = match record.step {
            AnalysisStep::Step1 => "step1",
            AnalysisStep::Step2 => "step2",
        };

        sqlx::query(
            r#"
            INSERT INTO analysis_records
                (analysis_id, step, status, state_json, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(analysis_id) DO UPDATE SET
                step = excluded.step,
                status = excluded.status,
                state_json = excluded.state_json,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&record.analysis_id)
        .bind(step)
        .bind(record.status.as_str())
        .bind(&state_json)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(self.pool.as_ref())
        .await
        .map_err(backend_err)?;

        Ok(())
    }

    #[instrument(skip(self, record), err)]
    async fn insert_artifact(&self, kind: &str, mut record: ArtifactRecord) -> Result<()> {
        let data_json = serde_json::to_string(&record.data)?;

        if self.has_identifier_column().await? {
            let metadata_json = serde_json::to_string(&record.metadata)?;
            sqlx::query(
                r#"
                INSERT INTO artifacts
                    (analysis_id, kind, identifier, agent_type, data_json, metadata_json, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                ON CONFLICT(analysis_id, kind, identifier) DO UPDATE SET
                    agent_type = excluded.agent_type,
                    data_json = excluded.data_json,
                    metadata_json = excluded.metadata_json
                "#,
            )
            .bind(&record.analysis_id)
            .bind(kind)
            .bind(&record.identifier)
            .bind(&record.agent_type)
            .bind(&data_json)
            .bind(&metadata_json)
            .bind(record.created_at)
            .execute(self.pool.as_ref())
            .await
            .map_err(backend_err)?;
        } else {
            if let Some(obj) = record.metadata.as_object_mut() {
                obj.insert("identifier".to_string(), Value::String(record.identifier.clone()));
            } else {
                record.metadata = serde_json::json!({ "identifier": record.identifier });
            }
            let metadata_json = serde_json::to_string(&record.metadata)?;

            sqlx::query(
                r#"
                INSERT INTO artifacts
                    (analysis_id, kind, agent_type, data_json, metadata_json, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )
            .bind(&record.analysis_id)
            .bind(kind)
            .bind(&record.agent_type)
            .bind(&data_json)
            .bind(&metadata_json)
            .bind(record.created_at)
            .execute(self.pool.as_ref())
            .await
            .map_err(backend_err)?;
        }

        Ok(())
    }

    async fn insert_mapping(&self, kind: &str, a_id: &str, b_id: &str, props: Value) -> Result<()> {
        let props_json = serde_json::to_string(&props)?;
        sqlx::query(
            r#"
            INSERT INTO mappings (kind, a_id, b_id, props_json, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(kind)
        .bind(a_id)
        .bind(b_id)
        .bind(&props_json)
        .bind(Utc::now())
        .execute(self.pool.as_ref())
        .await
        .map_err(backend_err)?;

        Ok(())
    }

    async fn fetch_artifacts(&self, analysis_id: &str, kind: &str) -> Result<Vec<ArtifactRecord>> {
        let rows = sqlx::query("SELECT * FROM artifacts WHERE analysis_id = ?1 AND kind = ?2 ORDER BY rowid")
            .bind(analysis_id)
            .bind(kind)
            .fetch_all(self.pool.as_ref())
            .await
            .map_err(backend_err)?;

        rows.into_iter().map(Self::row_to_artifact).collect()
    }

    async fn fetch_latest_step1_for_db(&self) -> Result<Option<AnalysisRecord>> {
        let row = sqlx::query(
            "SELECT * FROM analysis_records WHERE step = 'step1' ORDER BY updated_at DESC LIMIT 1",
        )
        .fetch_optional(self.pool.as_ref())
        .await
        .map_err(backend_err)?;

        row.map(Self::row_to_analysis).transpose()
    }

    async fn load(&self, analysis_id: &str) -> Result<Option<AnalysisRecord>> {
        let row = sqlx::query("SELECT * FROM analysis_records WHERE analysis_id = ?1")
            .bind(analysis_id)
            .fetch_optional(self.pool.as_ref())
            .await
            .map_err(backend_err)?;

        row.map(Self::row_to_analysis).transpose()
    }

    async fn list_ids(&self) -> Result<Vec<String>> {
        let rows = sqlx::query("SELECT analysis_id FROM analysis_records")
            .fetch_all(self.pool.as_ref())
            .await
            .map_err(backend_err)?;

        rows.into_iter()
            .map(|row| row.try_get::<String, _>("analysis_id").map_err(backend_err))
            .collect()
    }

    async fn delete(&self, analysis_id: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM analysis_records WHERE analysis_id = ?1")
            .bind(analysis_id)
            .execute(self.pool.as_ref())
            .await
            .map_err(backend_err)?;

        if result.rows_affected() == 0 {
            return Err(PersistenceError::NotFound {
                analysis_id: analysis_id.to_string(),
            });
        }

        sqlx::query("DELETE FROM artifacts WHERE analysis_id = ?1")
            .bind(analysis_id)
            .execute(self.pool.as_ref())
            .await
            .map_err(backend_err)?;

        Ok(())
    }
}
