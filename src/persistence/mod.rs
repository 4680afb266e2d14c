//! Persistence Gateway (C6): durable storage for analysis run state,
//! generalized from `weavegraph::runtimes::checkpointer`.

mod gateway;
mod memory;
mod models;
#[cfg(feature = "sqlite")]
mod sqlite;

pub use gateway::{PersistenceError, PersistenceGateway, Result};
pub use memory::InMemoryGateway;
pub use models::{AnalysisRecord, ArtifactRecord, MappingRecord, RunStatus};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteGateway;
