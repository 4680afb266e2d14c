//! Multi-phase agent orchestration engine for STPA-Sec Step 1 (problem
//! framing) and Step 2 (control structure analysis).
//!
//! The crate is organized around eleven cooperating components:
//!
//! - [`llm`] — the LLM Adapter, JSON Repair utility, and Prompt Saver sidecar
//! - [`agent`] — the Agent Framework shared by every Step 1 and Step 2 agent
//! - [`registry`] — the Component Registry shared identifier ledger
//! - [`persistence`] — the Persistence Gateway
//! - [`coordinator`] — the Step Coordinator that schedules phases and agents
//! - [`synthesis`] — Cognitive Synthesis, merging multi-style agent outputs
//! - [`xref`] — the Cross-Reference Synthesizer used by Step 2
//! - [`validator`] — quality scoring
//! - [`completeness`] — the deterministic post-phase completeness gate
//! - [`draft`] — the Draft/Version Store
//!
//! # Example
//!
//! Building a coordinator that runs Step 1 with the `enhanced` cognitive
//! style mode against a stub LLM provider:
//!
//! ```no_run
//! use stpasec_core::coordinator::{CoordinatorBuilder, ExecutionMode};
//! use stpasec_core::llm::StubProvider;
//! use stpasec_core::persistence::InMemoryGateway;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), stpasec_core::errors::StpaSecError> {
//! let coordinator = CoordinatorBuilder::new()
//!     .with_execution_mode(ExecutionMode::Enhanced)
//!     .with_provider(Arc::new(StubProvider::default()))
//!     .with_gateway(Arc::new(InMemoryGateway::new()))
//!     .build()?;
//!
//! let _versions = coordinator.run_step1("a payment processing system").await?;
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod completeness;
pub mod config;
pub mod coordinator;
pub mod draft;
pub mod errors;
pub mod event_bus;
pub mod llm;
pub mod message;
pub mod persistence;
pub mod registry;
pub mod state;
pub mod synthesis;
pub mod telemetry;
pub mod types;
pub mod utils;
pub mod validator;
pub mod xref;

pub use errors::StpaSecError;
