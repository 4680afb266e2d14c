//! Ported from `original_source/.../step1_agents/stakeholder_analyst.py`.

use async_trait::async_trait;

use crate::agent::step1::run_list_agent;
use crate::agent::traits::{Agent, AgentContext, AgentError, AgentOutcome};
use crate::state::AnalysisSnapshot;

const SYSTEM_PROMPT: &str = "You are identifying stakeholders for STPA-Sec Step 1 analysis. \
Stakeholders are people, groups, or organizations with interests in the system's mission \
success or who could be affected by losses. For each stakeholder describe their interest and \
which losses would affect them. Respond with a JSON array of objects: [{\"name\": string, \
\"description\": string, \"affected_by_losses\": [string]}].";

pub struct StakeholderAnalystAgent {
    pub system_description: String,
}

#[async_trait]
impl Agent for StakeholderAnalystAgent {
    fn agent_type(&self) -> &'static str {
        "stakeholder_analyst"
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
            "System description:\n{}\n\nIdentified losses:\n{}\n\nIdentify the stakeholders.",
            self.system_description, losses
        );

        run_list_agent(ctx, "stakeholders", "ST", SYSTEM_PROMPT, &user_prompt, "description").await
    }
}
