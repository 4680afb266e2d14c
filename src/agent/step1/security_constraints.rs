//! Ported from `original_source/.../step1_agents/security_constraint_agent.py`.
//!
//! Security constraints are the inverse of hazards ("the system shall not
//! enter hazardous state H"), so unlike the other Step 1 list agents they
//! are expected to use prevention language — the abstraction filter here
//! checks only for implementation detail, not prevention phrasing.

use async_trait::async_trait;
use serde_json::Value;

use crate::agent::traits::{Agent, AgentContext, AgentError, AgentOutcome};
use crate::agent::{extract_mission_language, is_implementation_detail};
use crate::state::AnalysisSnapshot;

const SYSTEM_PROMPT: &str = "You are deriving security constraints for STPA-Sec Step 1 \
analysis. A security constraint is a mission-level constraint that prevents the system from \
entering a hazardous state, phrased as \"the system shall not...\" or \"the system shall \
ensure...\". Each constraint must reference the hazard it addresses and state how it acts on \
that hazard: preventive (stops it occurring), detective (notices it occurring), corrective \
(reverses it), or compensating (limits its effect). Respond with a JSON array of objects: \
[{\"name\": string, \"description\": string, \"addresses_hazard\": string, \"constraint_type\": \
\"preventive\"|\"detective\"|\"corrective\"|\"compensating\"}].";

pub struct SecurityConstraintAgent {
    pub system_description: String,
}

#[async_trait]
impl Agent for SecurityConstraintAgent {
    fn agent_type(&self) -> &'static str {
        "security_constraint_agent"
    }

    async fn analyze(
        &self,
        snapshot: &AnalysisSnapshot,
        ctx: &AgentContext,
    ) -> Result<AgentOutcome, AgentError> {
        let hazards = snapshot
            .items("hazards")
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n");

        let user_prompt = format!(
            "System description:\n{}\n\nIdentified hazards:\n{}\n\nDerive the security constraints.",
            self.system_description, hazards
        );

        let value = ctx.call_llm_structured(SYSTEM_PROMPT, &user_prompt).await?;
        let findings = value
            .as_array()
            .cloned()
            .ok_or_else(|| AgentError::UnexpectedShape("expected a JSON array of constraints".into()))?;

        let mut outcome = AgentOutcome::new();
        let mut artifacts = Vec::with_capacity(findings.len());
        for mut finding in findings {
            let description = finding
                .get("description")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            if is_implementation_detail(&description) {
                outcome = outcome.with_validation_error(format!(
                    "security constraint dropped for implementation-level language: {description}"
                ));
                continue;
            }
            let rewritten = extract_mission_language(&description);
            if let Some(obj) = finding.as_object_mut() {
                obj.insert("description".to_string(), Value::String(rewritten));
                obj.insert("identifier".to_string(), Value::String(ctx.next_id("SC")));
            }
            artifacts.push(finding);
        }

        Ok(outcome.with_artifacts("security_constraints", artifacts))
    }
}
