//! Agent Framework (C4): the shared `Agent` trait, mission-level
//! abstraction filters, and the concrete Step 1 / Step 2 agents.

mod abstraction;
mod prior_results;
pub mod step1;
pub mod step2;
mod traits;

pub use abstraction::{extract_mission_language, is_implementation_detail, is_prevention_language};
pub use prior_results::PriorResultLoader;
pub use traits::{Agent, AgentContext, AgentError, AgentOutcome};
