//! Ported from `original_source/.../step2_agents/control_action_mapping.py`.

use async_trait::async_trait;
use serde_json::Value;

use crate::agent::traits::{Agent, AgentContext, AgentError, AgentOutcome};
use crate::registry::ReferenceOutcome;
use crate::state::AnalysisSnapshot;

const SYSTEM_PROMPT: &str = "You are mapping control actions for STPA-Sec Step 2 analysis. \
A control action is a command a controller issues to a controlled process. Use only the \
component identifiers given in the context below. Respond with a JSON array of objects: \
[{\"name\": string, \"description\": string, \"from_component\": string, \"to_component\": string}].";

pub struct ControlActionMappingAgent {
    pub system_description: String,
}

#[async_trait]
impl Agent for ControlActionMappingAgent {
    fn agent_type(&self) -> &'static str {
        "control_action_mapping"
    }

    async fn analyze(
        &self,
        _snapshot: &AnalysisSnapshot,
        ctx: &AgentContext,
    ) -> Result<AgentOutcome, AgentError> {
        let context = ctx.registry.prompt_context();
        let user_prompt = format!(
            "System description:\n{}\n\n{}\n\nMap the control actions.",
            self.system_description, context
        );

        let value = ctx.call_llm_structured(SYSTEM_PROMPT, &user_prompt).await?;
        let findings = value
            .as_array()
            .cloned()
            .ok_or_else(|| AgentError::UnexpectedShape("expected a JSON array of control actions".into()))?;

        let mut outcome = AgentOutcome::new();
        let mut artifacts = Vec::with_capacity(findings.len());

        for mut finding in findings {
            let from = finding.get("from_component").and_then(Value::as_str).unwrap_or_default().to_string();
            let to = finding.get("to_component").and_then(Value::as_str).unwrap_or_default().to_string();

            match ctx.registry.add_reference(&from, &to) {
                ReferenceOutcome::Ok => {}
                ReferenceOutcome::UndefinedSource => {
                    outcome = outcome.with_validation_error(format!("Invalid controller reference: {from}"));
                    continue;
                }
                ReferenceOutcome::UndefinedTarget => {
                    outcome = outcome.with_validation_error(format!("Invalid process reference: {to}"));
                    continue;
                }
            }

            if let Some(obj) = finding.as_object_mut() {
                obj.insert("identifier".to_string(), Value::String(ctx.next_id("CA")));
            }
            artifacts.push(finding);
        }

        Ok(outcome.with_artifacts("control_actions", artifacts))
    }
}
