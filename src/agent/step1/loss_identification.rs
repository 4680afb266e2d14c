//! Ported from `original_source/.../step1_agents/loss_identification.py`.

use async_trait::async_trait;

use crate::agent::step1::run_list_agent;
use crate::agent::traits::{Agent, AgentContext, AgentError, AgentOutcome};
use crate::state::AnalysisSnapshot;

const SYSTEM_PROMPT: &str = "You are identifying losses for STPA-Sec Step 1 analysis. A loss \
is something of value to stakeholders that could be lost: loss of life, loss of mission, loss \
of reputation, loss of financial resources, and similar mission-level losses. Describe losses \
at a mission level, never implementation detail. Respond with a JSON array of objects: \
[{\"name\": string, \"description\": string, \"severity\": \"catastrophic\"|\"major\"|\"moderate\"|\"minor\"}].";

pub struct LossIdentificationAgent {
    pub system_description: String,
}

#[async_trait]
impl Agent for LossIdentificationAgent {
    fn agent_type(&self) -> &'static str {
        "loss_identification"
    }

    async fn analyze(
        &self,
        snapshot: &AnalysisSnapshot,
        ctx: &AgentContext,
    ) -> Result<AgentOutcome, AgentError> {
        let mission = snapshot
            .items("mission")
            .first()
            .map(|m| m.to_string())
            .unwrap_or_else(|| "(mission not yet analyzed)".to_string());

        let user_prompt = format!(
            "System description:\n{}\n\nMission context:\n{}\n\nIdentify the losses.",
            self.system_description, mission
        );

        run_list_agent(ctx, "losses", "L", SYSTEM_PROMPT, &user_prompt, "description").await
    }
}
