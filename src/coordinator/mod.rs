//! Step Coordinator (C7): schedules Step 1 and Step 2 phase graphs,
//! generalized from `weavegraph::runtimes::runner::Runner` and
//! `weavegraph::schedulers`.

mod phase_graph;
mod runner;

pub use runner::{Coordinator, CoordinatorBuilder, ExecutionMode, RunOutcome};
