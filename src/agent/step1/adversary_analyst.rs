//! Ported from `original_source/.../step1_agents/stakeholder_analyst.py`'s
//! `_identify_adversaries`/`_analyze_adversary_profiles`. Split out as its
//! own artifact kind (spec data model's "Stakeholder / Adversary" pairing)
//! rather than folded into `StakeholderAnalystAgent`, since an adversary
//! profile has no description field to run through the mission-language
//! abstraction filter — it's a capability/interest assessment, not a prose
//! finding.

use async_trait::async_trait;
use serde_json::Value;

use crate::agent::traits::{Agent, AgentContext, AgentError, AgentOutcome};
use crate::state::AnalysisSnapshot;

const SYSTEM_PROMPT: &str = "You are identifying potential adversaries for STPA-Sec Step 1 \
analysis. An adversary is a class of actor who might target the system because of what the \
mission is worth to them, not a catalogue of attack techniques. Classify each adversary, \
assess its capability profile, and note why the mission is attractive to it. Respond with a \
JSON array of objects: [{\"adversary_class\": \"organized_crime\"|\"insider\"|\"nation_state\"\
|\"hacktivist\"|\"opportunist\", \"profile\": {\"sophistication\": string, \"resources\": \
string, \"persistence\": string, \"primary_interest\": string, \"geographic_scope\": string}, \
\"mission_targets\": {\"interested_in\": [string], \"value_perception\": string, \
\"historical_interest\": string}}].";

pub struct AdversaryAnalystAgent {
    pub system_description: String,
}

#[async_trait]
impl Agent for AdversaryAnalystAgent {
    fn agent_type(&self) -> &'static str {
        "adversary_analyst"
    }

    async fn analyze(
        &self,
        snapshot: &AnalysisSnapshot,
        ctx: &AgentContext,
    ) -> Result<AgentOutcome, AgentError> {
        let stakeholders = snapshot
            .items("stakeholders")
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n");

        let user_prompt = format!(
            "System description:\n{}\n\nIdentified stakeholders:\n{}\n\nIdentify the adversary \
classes that might target this system.",
            self.system_description, stakeholders
        );

        let value = ctx.call_llm_structured(SYSTEM_PROMPT, &user_prompt).await?;
        let findings = value
            .as_array()
            .cloned()
            .or_else(|| value.get("items").and_then(Value::as_array).cloned())
            .ok_or_else(|| AgentError::UnexpectedShape("expected a JSON array of adversary profiles".into()))?;

        let outcome = AgentOutcome::new();
        let mut artifacts = Vec::with_capacity(findings.len());
        for mut finding in findings {
            if let Some(obj) = finding.as_object_mut() {
                obj.insert("identifier".to_string(), Value::String(ctx.next_id("ADV")));
                obj.insert("cognitive_style".to_string(), Value::String(ctx.cognitive_style.to_string()));
            }
            artifacts.push(finding);
        }

        Ok(outcome.with_artifacts("adversaries", artifacts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_prompt_names_every_adversary_class() {
        for class in ["organized_crime", "insider", "nation_state", "hacktivist", "opportunist"] {
            assert!(SYSTEM_PROMPT.contains(class));
        }
    }
}
