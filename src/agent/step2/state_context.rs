//! Ported from `original_source/.../step2_agents/control_context_analyst.py`
//! and `state_context_analysis.py`, merged into one agent since both
//! derive the same artifact shape — the context variables that determine
//! whether a control action is safe or unsafe to issue.

use async_trait::async_trait;

use crate::agent::step2::run_list_agent;
use crate::agent::traits::{Agent, AgentContext, AgentError, AgentOutcome};
use crate::state::AnalysisSnapshot;

const SYSTEM_PROMPT: &str = "You are identifying state and control contexts for STPA-Sec Step \
2 analysis: the context variables (process state, environmental conditions) under which a \
control action is safe or unsafe. Reference control action identifiers from the context \
below. Respond with a JSON array of objects: [{\"control_action\": string, \
\"context_variable\": string, \"safe_states\": [string], \"unsafe_states\": [string]}].";

pub struct StateContextAnalysisAgent {
    pub system_description: String,
}

#[async_trait]
impl Agent for StateContextAnalysisAgent {
    fn agent_type(&self) -> &'static str {
        "state_context_analysis"
    }

    async fn analyze(
        &self,
        snapshot: &AnalysisSnapshot,
        ctx: &AgentContext,
    ) -> Result<AgentOutcome, AgentError> {
        let control_actions = snapshot
            .items("control_actions")
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n");

        let user_prompt = format!(
            "System description:\n{}\n\nControl actions:\n{}\n\nIdentify the state/control contexts.",
            self.system_description, control_actions
        );

        run_list_agent(ctx, "state_contexts", "CTX", SYSTEM_PROMPT, &user_prompt).await
    }
}
