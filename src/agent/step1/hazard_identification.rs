//! Ported from `original_source/.../step1_agents/hazard_identification.py`.

use async_trait::async_trait;

use crate::agent::step1::run_list_agent;
use crate::agent::traits::{Agent, AgentContext, AgentError, AgentOutcome};
use crate::state::AnalysisSnapshot;

const SYSTEM_PROMPT: &str = "You are identifying hazards for STPA-Sec Step 1 analysis. A \
hazard is a system state or set of conditions that, together with worst-case environmental \
conditions, leads to a loss. Hazards must be stated as system states, not actions, threats, or \
mitigations. Each hazard must reference which losses it could lead to by their identifiers, and \
must be classified by which system property it compromises. Respond with a JSON array of \
objects: [{\"name\": string, \"description\": string, \"linked_losses\": [string], \
\"hazard_category\": \"integrity_compromised\"|\"confidentiality_breached\"|\
\"availability_degraded\"|\"capability_loss\"}].";

pub struct HazardIdentificationAgent {
    pub system_description: String,
}

#[async_trait]
impl Agent for HazardIdentificationAgent {
    fn agent_type(&self) -> &'static str {
        "hazard_identification"
    }

    async fn analyze(
        &self,
        snapshot: &AnalysisSnapshot,
        ctx: &AgentContext,
    ) -> Result<AgentOutcome, AgentError> {
        let losses = snapshot
            .items("losses")
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n");

        let user_prompt = format!(
            "System description:\n{}\n\nIdentified losses:\n{}\n\nIdentify the hazards.",
            self.system_description, losses
        );

        run_list_agent(ctx, "hazards", "H", SYSTEM_PROMPT, &user_prompt, "description").await
    }
}
