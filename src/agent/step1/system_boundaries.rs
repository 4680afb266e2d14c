//! Ported from `original_source/.../step1_agents/system_boundary_agent.py`.

use async_trait::async_trait;

use crate::agent::step1::run_list_agent;
use crate::agent::traits::{Agent, AgentContext, AgentError, AgentOutcome};
use crate::state::AnalysisSnapshot;

const SYSTEM_PROMPT: &str = "You are identifying system boundaries for STPA-Sec Step 1 \
analysis. Describe what is inside the system-of-interest versus outside it (the environment) \
at a mission level, without naming concrete technical components. Respond with a JSON array \
of objects: [{\"name\": string, \"description\": string, \"boundary_type\": \"inside\"|\"outside\"|\"interface\"}].";

pub struct SystemBoundaryAgent {
    pub system_description: String,
}

#[async_trait]
impl Agent for SystemBoundaryAgent {
    fn agent_type(&self) -> &'static str {
        "system_boundary_agent"
    }

    async fn analyze(
        &self,
        _snapshot: &AnalysisSnapshot,
        ctx: &AgentContext,
    ) -> Result<AgentOutcome, AgentError> {
        let user_prompt = format!(
            "System description:\n{}\n\nIdentify the system boundaries.",
            self.system_description
        );

        run_list_agent(ctx, "system_boundaries", "B", SYSTEM_PROMPT, &user_prompt, "description").await
    }
}
