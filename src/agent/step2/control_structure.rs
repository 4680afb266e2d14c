//! Ported from `original_source/.../step2_agents/control_structure_analyst.py`.
//! The first Step 2 agent to run: it is the only one permitted to
//! register new components, since every later Step 2 agent's prompt is
//! constrained to the identifiers this agent registers (spec §4.5's
//! closed-world registry policy).

use async_trait::async_trait;
use serde_json::Value;

use crate::agent::traits::{Agent, AgentContext, AgentError, AgentOutcome};
use crate::registry::{ComponentKind, RegisterOutcome};
use crate::state::AnalysisSnapshot;

const SYSTEM_PROMPT: &str = "You are identifying the control structure for STPA-Sec Step 2 \
analysis: the controllers (people, automation, organizations that issue control actions) and \
controlled processes (the processes being controlled) in the system. Some components act as \
both and should be marked dual_role. Respond with a JSON array of objects: [{\"name\": string, \
\"description\": string, \"role\": \"controller\"|\"process\"|\"dual_role\"}].";

pub struct ControlStructureAnalystAgent {
    pub system_description: String,
}

#[async_trait]
impl Agent for ControlStructureAnalystAgent {
    fn agent_type(&self) -> &'static str {
        "control_structure_analyst"
    }

    async fn analyze(
        &self,
        _snapshot: &AnalysisSnapshot,
        ctx: &AgentContext,
    ) -> Result<AgentOutcome, AgentError> {
        let user_prompt = format!(
            "System description:\n{}\n\nIdentify controllers and controlled processes.",
            self.system_description
        );

        let value = ctx.call_llm_structured(SYSTEM_PROMPT, &user_prompt).await?;
        let findings = value
            .as_array()
            .cloned()
            .ok_or_else(|| AgentError::UnexpectedShape("expected a JSON array of components".into()))?;

        let mut outcome = AgentOutcome::new();
        let mut controllers = Vec::new();
        let mut processes = Vec::new();

        for mut finding in findings {
            let name = finding.get("name").and_then(Value::as_str).unwrap_or_default().to_string();
            let description = finding.get("description").and_then(Value::as_str).unwrap_or_default().to_string();
            let role = finding.get("role").and_then(Value::as_str).unwrap_or("controller");

            let kind = match role {
                "process" => ComponentKind::Process,
                "dual_role" => ComponentKind::DualRole,
                _ => ComponentKind::Controller,
            };

            let identifier = ctx.next_id(match kind {
                ComponentKind::Controller => "CTRL",
                ComponentKind::Process => "PROC",
                ComponentKind::DualRole => "DR",
            });

            if ctx.registry.register(identifier.clone(), name, kind, description, self.agent_type())
                == RegisterOutcome::Duplicate
            {
                outcome = outcome.with_validation_error(format!(
                    "component {identifier} could not be registered (duplicate identifier)"
                ));
                continue;
            }

            if let Some(obj) = finding.as_object_mut() {
                obj.insert("identifier".to_string(), Value::String(identifier));
            }
            match kind {
                ComponentKind::Process => processes.push(finding),
                _ => controllers.push(finding),
            }
        }

        Ok(outcome
            .with_artifacts("controllers", controllers)
            .with_artifacts("processes", processes))
    }
}
