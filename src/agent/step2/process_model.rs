//! Ported from `original_source/.../step2_agents/process_model_analyst.py`.

use async_trait::async_trait;

use crate::agent::step2::run_list_agent;
use crate::agent::traits::{Agent, AgentContext, AgentError, AgentOutcome};
use crate::state::AnalysisSnapshot;

const SYSTEM_PROMPT: &str = "You are identifying process models for STPA-Sec Step 2 analysis. \
A process model is the set of beliefs a controller holds about the state of its controlled \
process, used to decide which control actions to issue. Use only the controller identifiers \
given in the context below. Respond with a JSON array of objects: [{\"controller\": string, \
\"beliefs\": [string], \"description\": string}].";

pub struct ProcessModelAnalystAgent {
    pub system_description: String,
}

#[async_trait]
impl Agent for ProcessModelAnalystAgent {
    fn agent_type(&self) -> &'static str {
        "process_model_analyst"
    }

    async fn analyze(
        &self,
        _snapshot: &AnalysisSnapshot,
        ctx: &AgentContext,
    ) -> Result<AgentOutcome, AgentError> {
        let context = ctx.registry.prompt_context();
        let user_prompt = format!(
            "System description:\n{}\n\n{}\n\nIdentify the process models.",
            self.system_description, context
        );

        run_list_agent(ctx, "process_models", "PM", SYSTEM_PROMPT, &user_prompt).await
    }
}
