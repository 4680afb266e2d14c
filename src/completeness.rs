//! Deterministic completeness gate (spec §4.7), distinct from the
//! Validator's scored `validate_completeness` category: a pass/fail check
//! against minimum artifact counts, required sub-fields, and
//! cross-references, ported from
//! `step1_coordinator.py::_check_analysis_completeness`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::state::AnalysisState;
use crate::types::AnalysisStep;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ArtifactStatus {
    pub present: bool,
    pub complete: bool,
    pub issues: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CompletenessCheck {
    pub is_complete: bool,
    pub missing_artifacts: Vec<String>,
    pub validation_issues: Vec<String>,
    pub artifact_status: BTreeMap<String, ArtifactStatus>,
    pub summary: String,
}

struct Requirement {
    category: &'static str,
    minimum: usize,
    required_fields: &'static [&'static str],
}

const STEP1_REQUIREMENTS: &[Requirement] = &[
    Requirement {
        category: "mission",
        minimum: 1,
        required_fields: &["mission_statement", "purpose", "value_provided"],
    },
    Requirement {
        category: "losses",
        minimum: 3,
        required_fields: &["identifier", "description"],
    },
    Requirement {
        category: "hazards",
        minimum: 3,
        required_fields: &["identifier", "description"],
    },
    Requirement {
        category: "stakeholders",
        minimum: 5,
        required_fields: &["identifier", "name", "description"],
    },
    Requirement {
        category: "adversaries",
        minimum: 2,
        required_fields: &["identifier", "adversary_class", "profile", "mission_targets"],
    },
    Requirement {
        category: "security_constraints",
        minimum: 3,
        required_fields: &["identifier", "name", "addresses_hazard"],
    },
    Requirement {
        category: "system_boundaries",
        minimum: 1,
        required_fields: &["identifier"],
    },
];

const STEP2_REQUIREMENTS: &[Requirement] = &[
    Requirement {
        category: "controllers",
        minimum: 1,
        required_fields: &["identifier", "name", "role"],
    },
    Requirement {
        category: "processes",
        minimum: 1,
        required_fields: &["identifier", "name", "role"],
    },
    Requirement {
        category: "control_actions",
        minimum: 1,
        required_fields: &["identifier", "from_component", "to_component"],
    },
    Requirement {
        category: "feedback_mechanisms",
        minimum: 1,
        required_fields: &["identifier", "from_component", "to_component"],
    },
];

fn requirements_for(step: AnalysisStep) -> &'static [Requirement] {
    match step {
        AnalysisStep::Step1 => STEP1_REQUIREMENTS,
        AnalysisStep::Step2 => STEP2_REQUIREMENTS,
    }
}

/// Runs the completeness gate against a finished phase run's state.
/// Unlike `validator::validate_step1`'s weighted score, this produces a
/// single pass/fail verdict: any missing artifact kind, under-minimum
/// count, missing required field, or dangling cross-reference fails it.
#[must_use]
pub fn check_completeness(step: AnalysisStep, state: &AnalysisState) -> CompletenessCheck {
    let mut is_complete = true;
    let mut missing_artifacts = Vec::new();
    let mut validation_issues = Vec::new();
    let mut artifact_status = BTreeMap::new();

    for requirement in requirements_for(step) {
        let items = state.items(requirement.category);
        let mut issues = Vec::new();

        if items.is_empty() {
            is_complete = false;
            missing_artifacts.push(requirement.category.to_string());
            issues.push(format!("{} not found in results", requirement.category));
        } else {
            if items.len() < requirement.minimum {
                issues.push(format!(
                    "insufficient items: {} < {}",
                    items.len(),
                    requirement.minimum
                ));
            }
            for (index, item) in items.iter().enumerate() {
                for field in requirement.required_fields {
                    if item.get(field).is_none() {
                        issues.push(format!("{}[{index}] missing field: {field}", requirement.category));
                    }
                }
            }
        }

        for issue in &issues {
            validation_issues.push(format!("{}: {issue}", requirement.category));
        }

        let present = !items.is_empty();
        let complete = present && issues.is_empty();
        if present && !complete {
            is_complete = false;
        }

        artifact_status.insert(
            requirement.category.to_string(),
            ArtifactStatus {
                present,
                complete,
                issues,
            },
        );
    }

    if is_complete {
        check_cross_references(state, &mut validation_issues, &mut is_complete);
    }

    let summary = if is_complete {
        "all artifacts generated successfully".to_string()
    } else {
        let mut parts = Vec::new();
        if !missing_artifacts.is_empty() {
            parts.push(format!("{} missing artifacts", missing_artifacts.len()));
        }
        if !validation_issues.is_empty() {
            parts.push(format!("{} validation issues", validation_issues.len()));
        }
        parts.join(", ")
    };

    CompletenessCheck {
        is_complete,
        missing_artifacts,
        validation_issues,
        artifact_status,
        summary,
    }
}

fn check_cross_references(state: &AnalysisState, validation_issues: &mut Vec<String>, is_complete: &mut bool) {
    let loss_ids: std::collections::BTreeSet<&str> = state
        .items("losses")
        .iter()
        .filter_map(|loss| loss.get("identifier").and_then(Value::as_str))
        .collect();

    if !loss_ids.is_empty() {
        for hazard in state.items("hazards") {
            let Some(linked) = hazard.get("linked_losses").and_then(Value::as_array) else {
                continue;
            };
            for loss_id in linked.iter().filter_map(Value::as_str) {
                if !loss_ids.contains(loss_id) {
                    validation_issues.push(format!("hazard mapping references unknown loss: {loss_id}"));
                    *is_complete = false;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn full_step1_state() -> AnalysisState {
        let mut state = AnalysisState::new();
        state.extend(
            "mission",
            vec![json!({"mission_statement": "x", "purpose": "x", "value_provided": "x"})],
        );
        state.extend(
            "losses",
            vec![
                json!({"identifier": "L-1", "description": "a"}),
                json!({"identifier": "L-2", "description": "b"}),
                json!({"identifier": "L-3", "description": "c"}),
            ],
        );
        state.extend(
            "hazards",
            vec![
                json!({"identifier": "H-1", "description": "a", "linked_losses": ["L-1"]}),
                json!({"identifier": "H-2", "description": "b"}),
                json!({"identifier": "H-3", "description": "c"}),
            ],
        );
        state.extend(
            "stakeholders",
            (1..=5)
                .map(|n| json!({"identifier": format!("ST-{n}"), "name": "n", "description": "d"}))
                .collect(),
        );
        state.extend(
            "adversaries",
            vec![
                json!({"identifier": "ADV-1", "adversary_class": "insider", "profile": {}, "mission_targets": {}}),
                json!({"identifier": "ADV-2", "adversary_class": "opportunist", "profile": {}, "mission_targets": {}}),
            ],
        );
        state.extend(
            "security_constraints",
            vec![
                json!({"identifier": "SC-1", "name": "a", "addresses_hazard": "H-1"}),
                json!({"identifier": "SC-2", "name": "b", "addresses_hazard": "H-2"}),
                json!({"identifier": "SC-3", "name": "c", "addresses_hazard": "H-3"}),
            ],
        );
        state.extend("system_boundaries", vec![json!({"identifier": "SB-1"})]);
        state
    }

    #[test]
    fn fully_populated_step1_state_is_complete() {
        let state = full_step1_state();
        let check = check_completeness(AnalysisStep::Step1, &state);
        assert!(check.is_complete, "{check:?}");
        assert!(check.missing_artifacts.is_empty());
    }

    #[test]
    fn missing_adversaries_fails_the_gate() {
        let mut state = full_step1_state();
        state.replace_category("adversaries", vec![]);
        let check = check_completeness(AnalysisStep::Step1, &state);
        assert!(!check.is_complete);
        assert!(check.missing_artifacts.contains(&"adversaries".to_string()));
    }

    #[test]
    fn under_minimum_stakeholders_fails_the_gate() {
        let mut state = full_step1_state();
        state.replace_category(
            "stakeholders",
            vec![json!({"identifier": "ST-1", "name": "n", "description": "d"})],
        );
        let check = check_completeness(AnalysisStep::Step1, &state);
        assert!(!check.is_complete);
        assert!(!check.artifact_status["stakeholders"].complete);
    }

    fn full_step2_state() -> AnalysisState {
        let mut state = AnalysisState::new();
        state.extend(
            "controllers",
            vec![json!({"identifier": "CTRL-1", "name": "Operator", "description": "issues commands", "role": "controller"})],
        );
        state.extend(
            "processes",
            vec![json!({"identifier": "PROC-1", "name": "PaymentEngine", "description": "processes payments", "role": "process"})],
        );
        state.extend(
            "control_actions",
            vec![json!({"identifier": "CA-1", "name": "Authorize", "description": "authorize the transaction", "from_component": "CTRL-1", "to_component": "PROC-1"})],
        );
        state.extend(
            "feedback_mechanisms",
            vec![json!({"identifier": "FB-1", "name": "SettlementStatus", "description": "reports back", "from_component": "PROC-1", "to_component": "CTRL-1"})],
        );
        state
    }

    #[test]
    fn fully_populated_step2_state_is_complete() {
        let state = full_step2_state();
        let check = check_completeness(AnalysisStep::Step2, &state);
        assert!(check.is_complete, "{check:?}");
    }

    #[test]
    fn missing_control_actions_fails_the_step2_gate() {
        let mut state = full_step2_state();
        state.replace_category("control_actions", vec![]);
        let check = check_completeness(AnalysisStep::Step2, &state);
        assert!(!check.is_complete);
        assert!(check.missing_artifacts.contains(&"control_actions".to_string()));
    }

    #[test]
    fn dangling_hazard_loss_reference_fails_the_gate() {
        let mut state = full_step1_state();
        state.replace_category(
            "hazards",
            vec![
                json!({"identifier": "H-1", "description": "a", "linked_losses": ["L-99"]}),
                json!({"identifier": "H-2", "description": "b"}),
                json!({"identifier": "H-3", "description": "c"}),
            ],
        );
        let check = check_completeness(AnalysisStep::Step1, &state);
        assert!(!check.is_complete);
        assert!(check
            .validation_issues
            .iter()
            .any(|issue| issue.contains("unknown loss: L-99")));
    }
}
