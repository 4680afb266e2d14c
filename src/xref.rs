//! Cross-Reference Synthesizer (C9, Step 2): joins control actions,
//! feedback mechanisms, and trust boundaries produced by separate Step 2
//! agents into one coherent graph.
//!
//! Ported from
//! `original_source/.../step2_agents/synthesis_enhancement.py`'s
//! `Step2SynthesisEnhancer.enhance_synthesis`: the Python version mutates
//! a loosely-typed synthesis dict in place, this version builds a typed
//! [`CrossReferenceSynthesis`] from the four Step 2 artifact channels.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::state::AnalysisState;

fn str_field<'a>(value: &'a Value, field: &str) -> &'a str {
    value.get(field).and_then(Value::as_str).unwrap_or_default()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EnrichedControlAction {
    pub identifier: String,
    pub name: String,
    pub from_component: String,
    pub to_component: String,
    pub crosses_boundaries: Vec<String>,
    pub feedback_mechanisms: Vec<String>,
    pub closed_loop: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EnrichedTrustBoundary {
    pub identifier: String,
    pub name: String,
    pub crossing_actions: Vec<String>,
    pub risk_level: RiskLevel,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ControllerNode {
    pub sends_commands_to: BTreeSet<String>,
    pub receives_feedback_from: BTreeSet<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ProcessNode {
    pub controlled_by: BTreeSet<String>,
    pub sends_feedback_to: BTreeSet<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipKind {
    ControlAction,
    Feedback,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Relationship {
    pub kind: RelationshipKind,
    pub from: String,
    pub to: String,
    pub reference: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ComponentHierarchy {
    pub controllers: BTreeMap<String, ControllerNode>,
    pub controlled_processes: BTreeMap<String, ProcessNode>,
    pub relationships: Vec<Relationship>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CrossReferenceSummary {
    pub boundary_crossing_actions: usize,
    pub closed_loop_actions: usize,
    pub high_risk_boundaries: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CrossReferenceSynthesis {
    pub control_actions: Vec<EnrichedControlAction>,
    pub trust_boundaries: Vec<EnrichedTrustBoundary>,
    pub component_hierarchy: ComponentHierarchy,
    pub summary: CrossReferenceSummary,
}

/// Finds which trust boundaries a control action's `from -> to` edge
/// crosses: a boundary is crossed when exactly one of the two endpoints
/// is among its listed components.
fn find_boundary_crossings(from: &str, to: &str, boundaries: &[Value]) -> Vec<String> {
    boundaries
        .iter()
        .filter(|boundary| {
            let components: BTreeSet<&str> = boundary
                .get("components")
                .and_then(Value::as_array)
                .map(|arr| arr.iter().filter_map(Value::as_str).collect())
                .unwrap_or_default();
            let from_in = components.contains(from);
            let to_in = components.contains(to);
            from_in != to_in
        })
        .map(|boundary| str_field(boundary, "identifier").to_string())
        .collect()
}

/// Groups feedback mechanisms by `(source, target)` so a control action
/// from controller `c` to process `p` can look up feedback flowing
/// `p -> c` and report the loop as closed.
fn feedback_by_edge(feedbacks: &[Value]) -> BTreeMap<(String, String), Vec<String>> {
    let mut map: BTreeMap<(String, String), Vec<String>> = BTreeMap::new();
    for feedback in feedbacks {
        let source = str_field(feedback, "from_component");
        let target = str_field(feedback, "to_component");
        if source.is_empty() || target.is_empty() {
            continue;
        }
        map.entry((source.to_string(), target.to_string()))
            .or_default()
            .push(str_field(feedback, "identifier").to_string());
    }
    map
}

fn assess_boundary_risk(boundary: &Value, crossing_count: usize) -> RiskLevel {
    if crossing_count == 0 {
        return RiskLevel::Low;
    }
    if crossing_count > 3 {
        return RiskLevel::High;
    }
    let boundary_type = str_field(boundary, "boundary_type");
    if matches!(boundary_type, "network" | "organizational") {
        return RiskLevel::High;
    }
    RiskLevel::Medium
}

/// Runs the full cross-reference pass over a Step 2 analysis's channels:
/// `controllers`, `processes`, `control_actions`, `feedback_mechanisms`,
/// `trust_boundaries`.
#[must_use]
pub fn synthesize_cross_references(state: &AnalysisState) -> CrossReferenceSynthesis {
    let control_actions = state.items("control_actions");
    let feedback_mechanisms = state.items("feedback_mechanisms");
    let trust_boundaries = state.items("trust_boundaries");

    let feedback_map = feedback_by_edge(feedback_mechanisms);

    let enriched_actions: Vec<EnrichedControlAction> = control_actions
        .iter()
        .map(|action| {
            let from = str_field(action, "from_component").to_string();
            let to = str_field(action, "to_component").to_string();
            let crosses_boundaries = find_boundary_crossings(&from, &to, trust_boundaries);
            let feedback_loops = feedback_map
                .get(&(to.clone(), from.clone()))
                .cloned()
                .unwrap_or_default();
            let closed_loop = !feedback_loops.is_empty();

            EnrichedControlAction {
                identifier: str_field(action, "identifier").to_string(),
                name: str_field(action, "name").to_string(),
                from_component: from,
                to_component: to,
                crosses_boundaries,
                feedback_mechanisms: feedback_loops,
                closed_loop,
            }
        })
        .collect();

    let enriched_boundaries: Vec<EnrichedTrustBoundary> = trust_boundaries
        .iter()
        .map(|boundary| {
            let identifier = str_field(boundary, "identifier").to_string();
            let crossing_actions: Vec<String> = enriched_actions
                .iter()
                .filter(|action| action.crosses_boundaries.contains(&identifier))
                .map(|action| action.identifier.clone())
                .collect();
            let risk_level = assess_boundary_risk(boundary, crossing_actions.len());

            EnrichedTrustBoundary {
                identifier,
                name: str_field(boundary, "name").to_string(),
                crossing_actions,
                risk_level,
            }
        })
        .collect();

    let component_hierarchy = build_component_hierarchy(state, &enriched_actions, feedback_mechanisms);

    let summary = CrossReferenceSummary {
        boundary_crossing_actions: enriched_actions.iter().filter(|a| !a.crosses_boundaries.is_empty()).count(),
        closed_loop_actions: enriched_actions.iter().filter(|a| a.closed_loop).count(),
        high_risk_boundaries: enriched_boundaries.iter().filter(|b| b.risk_level == RiskLevel::High).count(),
    };

    CrossReferenceSynthesis {
        control_actions: enriched_actions,
        trust_boundaries: enriched_boundaries,
        component_hierarchy,
        summary,
    }
}

fn build_component_hierarchy(
    state: &AnalysisState,
    actions: &[EnrichedControlAction],
    feedback_mechanisms: &[Value],
) -> ComponentHierarchy {
    let mut hierarchy = ComponentHierarchy::default();

    for controller in state.items("controllers") {
        hierarchy
            .controllers
            .insert(str_field(controller, "identifier").to_string(), ControllerNode::default());
    }

    for action in actions {
        if let Some(controller) = hierarchy.controllers.get_mut(&action.from_component) {
            controller.sends_commands_to.insert(action.to_component.clone());
        }
        hierarchy
            .controlled_processes
            .entry(action.to_component.clone())
            .or_default()
            .controlled_by
            .insert(action.from_component.clone());
        hierarchy.relationships.push(Relationship {
            kind: RelationshipKind::ControlAction,
            from: action.from_component.clone(),
            to: action.to_component.clone(),
            reference: action.identifier.clone(),
        });
    }

    for feedback in feedback_mechanisms {
        let source = str_field(feedback, "from_component");
        let target = str_field(feedback, "to_component");
        if source.is_empty() || target.is_empty() {
            continue;
        }
        if let Some(controller) = hierarchy.controllers.get_mut(target) {
            controller.receives_feedback_from.insert(source.to_string());
        }
        if let Some(process) = hierarchy.controlled_processes.get_mut(source) {
            process.sends_feedback_to.insert(target.to_string());
        }
        hierarchy.relationships.push(Relationship {
            kind: RelationshipKind::Feedback,
            from: source.to_string(),
            to: target.to_string(),
            reference: str_field(feedback, "identifier").to_string(),
        });
    }

    hierarchy
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn populated_state() -> AnalysisState {
        let mut state = AnalysisState::new();
        state.extend("controllers", vec![json!({"identifier": "CTRL-1", "name": "Fraud Controller"})]);
        state.extend("processes", vec![json!({"identifier": "PROC-1", "name": "Payment Processor"})]);
        state.extend(
            "control_actions",
            vec![json!({"identifier": "CA-1", "name": "Block transaction", "from_component": "CTRL-1", "to_component": "PROC-1"})],
        );
        state.extend(
            "feedback_mechanisms",
            vec![json!({"identifier": "FB-1", "name": "Transaction outcome", "from_component": "PROC-1", "to_component": "CTRL-1"})],
        );
        state.extend(
            "trust_boundaries",
            vec![json!({"identifier": "TB-1", "name": "External gateway", "components": ["PROC-1"], "boundary_type": "network"})],
        );
        state
    }

    #[test]
    fn control_action_crossing_a_boundary_is_flagged() {
        let state = populated_state();
        let synthesis = synthesize_cross_references(&state);
        let action = &synthesis.control_actions[0];
        assert_eq!(action.crosses_boundaries, vec!["TB-1".to_string()]);
    }

    #[test]
    fn matching_feedback_closes_the_loop() {
        let state = populated_state();
        let synthesis = synthesize_cross_references(&state);
        assert!(synthesis.control_actions[0].closed_loop);
        assert_eq!(synthesis.summary.closed_loop_actions, 1);
    }

    #[test]
    fn network_boundary_with_a_crossing_is_high_risk() {
        let state = populated_state();
        let synthesis = synthesize_cross_references(&state);
        assert_eq!(synthesis.trust_boundaries[0].risk_level, RiskLevel::High);
        assert_eq!(synthesis.summary.high_risk_boundaries, 1);
    }

    #[test]
    fn component_hierarchy_tracks_commands_and_feedback() {
        let state = populated_state();
        let synthesis = synthesize_cross_references(&state);
        let controller = synthesis.component_hierarchy.controllers.get("CTRL-1").unwrap();
        assert!(controller.sends_commands_to.contains("PROC-1"));
        assert!(controller.receives_feedback_from.contains("PROC-1"));
        assert_eq!(synthesis.component_hierarchy.relationships.len(), 2);
    }

    #[test]
    fn boundary_with_no_crossings_is_low_risk() {
        let mut state = AnalysisState::new();
        state.extend("trust_boundaries", vec![json!({"identifier": "TB-2", "name": "Isolated", "components": ["X"], "boundary_type": "process"})]);
        let synthesis = synthesize_cross_references(&state);
        assert_eq!(synthesis.trust_boundaries[0].risk_level, RiskLevel::Low);
    }
}
