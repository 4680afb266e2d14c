//! Step 2 (control structure analysis) agents, ported from
//! `original_source/.../step2_agents/*.py`. Every agent here reads and
//! writes through the shared [`ComponentRegistry`](crate::registry::ComponentRegistry)
//! so identifiers stay consistent across control actions, feedback
//! mechanisms, process models, and trust boundaries.

mod control_action_mapping;
mod control_structure;
mod feedback_mechanism;
mod process_model;
mod state_context;
mod trust_boundary;

pub use control_action_mapping::ControlActionMappingAgent;
pub use control_structure::ControlStructureAnalystAgent;
pub use feedback_mechanism::FeedbackMechanismAgent;
pub use process_model::ProcessModelAnalystAgent;
pub use state_context::StateContextAnalysisAgent;
pub use trust_boundary::TrustBoundaryAgent;

use serde_json::Value;

use crate::agent::traits::{AgentContext, AgentError, AgentOutcome};

/// Shared mechanics for Step 2 agents that produce a JSON array of
/// findings not tied to component registration (process models, trust
/// boundaries): call the model, assign identifiers, collect results.
pub(super) async fn run_list_agent(
    ctx: &AgentContext,
    category: &str,
    id_prefix: &str,
    system_prompt: &str,
    user_prompt: &str,
) -> Result<AgentOutcome, AgentError> {
    let value = ctx.call_llm_structured(system_prompt, user_prompt).await?;
    let findings = value
        .as_array()
        .cloned()
        .ok_or_else(|| AgentError::UnexpectedShape("expected a JSON array of findings".into()))?;

    let mut artifacts = Vec::with_capacity(findings.len());
    for mut finding in findings {
        if let Some(obj) = finding.as_object_mut() {
            obj.insert(
                "identifier".to_string(),
                Value::String(ctx.next_id(id_prefix)),
            );
        }
        artifacts.push(finding);
    }

    Ok(AgentOutcome::new().with_artifacts(category, artifacts))
}
