//! Ported from `original_source/.../step2_agents/trust_boundary.py`.

use async_trait::async_trait;

use crate::agent::step2::run_list_agent;
use crate::agent::traits::{Agent, AgentContext, AgentError, AgentOutcome};
use crate::state::AnalysisSnapshot;

const SYSTEM_PROMPT: &str = "You are identifying trust boundaries for STPA-Sec Step 2 \
analysis: points in the control structure where components of differing trust levels \
interact, such as an external actor communicating with an internal controller. Classify each \
boundary by the nature of the trust gap it crosses. Use only the component identifiers given \
in the context below. Respond with a JSON array of objects: [{\"name\": string, \
\"description\": string, \"components\": [string], \"boundary_type\": \"network\"|\
\"organizational\"|\"process\"|\"trust_level\"}].";

pub struct TrustBoundaryAgent {
    pub system_description: String,
}

#[async_trait]
impl Agent for TrustBoundaryAgent {
    fn agent_type(&self) -> &'static str {
        "trust_boundary"
    }

    async fn analyze(
        &self,
        _snapshot: &AnalysisSnapshot,
        ctx: &AgentContext,
    ) -> Result<AgentOutcome, AgentError> {
        let context = ctx.registry.prompt_context();
        let user_prompt = format!(
            "System description:\n{}\n\n{}\n\nIdentify the trust boundaries.",
            self.system_description, context
        );

        run_list_agent(ctx, "trust_boundaries", "TB", SYSTEM_PROMPT, &user_prompt).await
    }
}
