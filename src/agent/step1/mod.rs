//! Step 1 (problem framing) agents: mission analysis, loss identification,
//! hazard identification, stakeholder analysis, adversary analysis,
//! security constraints, and system boundaries — one struct per
//! `original_source/.../step1_agents/*.py` file, sharing the list-building
//! mechanics below.

mod adversary_analyst;
mod hazard_identification;
mod loss_identification;
mod mission_analyst;
mod security_constraints;
mod stakeholder_analyst;
mod system_boundaries;

pub use adversary_analyst::AdversaryAnalystAgent;
pub use hazard_identification::HazardIdentificationAgent;
pub use loss_identification::LossIdentificationAgent;
pub use mission_analyst::MissionAnalystAgent;
pub use security_constraints::SecurityConstraintAgent;
pub use stakeholder_analyst::StakeholderAnalystAgent;
pub use system_boundaries::SystemBoundaryAgent;

use serde_json::Value;

use crate::agent::traits::{AgentContext, AgentError, AgentOutcome};
use crate::agent::{extract_mission_language, is_implementation_detail};

/// Shared mechanics for Step 1 agents that ask the LLM for a JSON array of
/// findings: call the model, validate each finding stays at mission-level
/// abstraction, assign a `PREFIX-INT` identifier, and collect results into
/// one [`AgentOutcome`] targeting `category`.
pub(super) async fn run_list_agent(
    ctx: &AgentContext,
    category: &str,
    id_prefix: &str,
    system_prompt: &str,
    user_prompt: &str,
    description_field: &str,
) -> Result<AgentOutcome, AgentError> {
    let value = ctx.call_llm_structured(system_prompt, user_prompt).await?;
    let findings = value
        .as_array()
        .cloned()
        .or_else(|| value.get("items").and_then(Value::as_array).cloned())
        .ok_or_else(|| AgentError::UnexpectedShape("expected a JSON array of findings".into()))?;

    let mut outcome = AgentOutcome::new();
    let mut artifacts = Vec::with_capacity(findings.len());

    for mut finding in findings {
        let description = finding
            .get(description_field)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        if is_implementation_detail(&description) {
            outcome = outcome.with_validation_error(format!(
                "{id_prefix} finding dropped for implementation-level language: {description}"
            ));
            continue;
        }

        let rewritten = extract_mission_language(&description);
        if let Some(obj) = finding.as_object_mut() {
            obj.insert(description_field.to_string(), Value::String(rewritten));
            obj.insert(
                "identifier".to_string(),
                Value::String(ctx.next_id(id_prefix)),
            );
            obj.insert(
                "cognitive_style".to_string(),
                Value::String(ctx.cognitive_style.to_string()),
            );
        }
        artifacts.push(finding);
    }

    Ok(outcome.with_artifacts(category, artifacts))
}
