//! Ported from `original_source/.../step1_agents/mission_analyst.py`.
//! Unlike the other Step 1 agents, mission analysis runs once per
//! analysis (not cognitive-style fanned, per
//! `step1_coordinator.py`'s `cognitive_styles_by_mode["standard"]`
//! treatment of the mission phase) and produces a single mission
//! statement rather than a list of findings.

use async_trait::async_trait;
use serde_json::json;

use crate::agent::traits::{Agent, AgentContext, AgentError, AgentOutcome};
use crate::state::AnalysisSnapshot;

const SYSTEM_PROMPT: &str = "You are a mission analyst performing STPA-Sec Step 1 analysis. \
Describe the system's mission, purpose, and the fundamental value it provides at a mission \
level of abstraction. Do not describe implementation mechanisms. Respond with a single JSON \
object: {\"mission_statement\": string, \"purpose\": string, \"value_provided\": string}.";

pub struct MissionAnalystAgent {
    pub system_description: String,
}

#[async_trait]
impl Agent for MissionAnalystAgent {
    fn agent_type(&self) -> &'static str {
        "mission_analyst"
    }

    async fn analyze(
        &self,
        _snapshot: &AnalysisSnapshot,
        ctx: &AgentContext,
    ) -> Result<AgentOutcome, AgentError> {
        let user_prompt = format!(
            "System description:\n{}\n\nProduce the mission statement JSON object.",
            self.system_description
        );

        let value = ctx.call_llm_structured(SYSTEM_PROMPT, &user_prompt).await?;
        if !value.is_object() {
            return Err(AgentError::UnexpectedShape(
                "expected a single mission statement object".into(),
            ));
        }

        let mut mission = value;
        if let Some(obj) = mission.as_object_mut() {
            obj.insert(
                "identifier".to_string(),
                serde_json::Value::String(ctx.next_id("MISSION")),
            );
        } else {
            mission = json!({ "identifier": ctx.next_id("MISSION") });
        }

        Ok(AgentOutcome::new().with_artifacts("mission", vec![mission]))
    }
}
