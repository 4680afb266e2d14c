//! Static phase/agent/style schedule.
//!
//! `weavegraph::graphs::GraphBuilder` compiles a dynamic node graph with
//! conditional edges the scheduler walks at runtime; this system's phase
//! order is fixed ahead of time (mirroring `step1_coordinator.py`'s and
//! `step2_coordinator.py`'s hardcoded `phases`/execution lists), so a
//! plain ordered `Vec<PhaseGroup>` replaces the teacher's graph
//! compilation step entirely. Each `PhaseGroup` is one barrier: every
//! agent in it runs concurrently against the same snapshot, and the
//! coordinator only advances once the whole group has finished.

use crate::agent::step1::{
    AdversaryAnalystAgent, HazardIdentificationAgent, LossIdentificationAgent, MissionAnalystAgent,
    SecurityConstraintAgent, StakeholderAnalystAgent, SystemBoundaryAgent,
};
use crate::agent::step2::{
    ControlActionMappingAgent, ControlStructureAnalystAgent, FeedbackMechanismAgent,
    ProcessModelAnalystAgent, StateContextAnalysisAgent, TrustBoundaryAgent,
};
use crate::agent::Agent;
use crate::types::PhaseKind;

/// One agent's place in the schedule: its stable name (used to look up
/// per-mode cognitive styles), the phase it reports progress under, and
/// a constructor taking the run's system description.
pub struct AgentSpec {
    pub agent_name: &'static str,
    pub phase_kind: PhaseKind,
    /// Whether this agent fans out across the execution mode's cognitive
    /// styles. `false` pins it to `CognitiveStyle::Balanced` regardless of
    /// mode, matching `step1_coordinator.py`'s single-pass treatment of
    /// mission analysis and validation.
    pub multi_style: bool,
    pub build: fn(&str) -> Box<dyn Agent>,
}

/// A barrier group: every agent here runs concurrently before the
/// coordinator moves to the next group.
pub struct PhaseGroup {
    pub name: &'static str,
    pub agents: Vec<AgentSpec>,
}

#[must_use]
pub fn step1_phases() -> Vec<PhaseGroup> {
    vec![
        PhaseGroup {
            name: "mission_analysis",
            agents: vec![AgentSpec {
                agent_name: "mission_analyst",
                phase_kind: PhaseKind::MissionAnalysis,
                multi_style: false,
                build: |desc| {
                    Box::new(MissionAnalystAgent {
                        system_description: desc.to_string(),
                    })
                },
            }],
        },
        PhaseGroup {
            name: "loss_identification",
            agents: vec![AgentSpec {
                agent_name: "loss_identification",
                phase_kind: PhaseKind::LossIdentification,
                multi_style: true,
                build: |desc| {
                    Box::new(LossIdentificationAgent {
                        system_description: desc.to_string(),
                    })
                },
            }],
        },
        PhaseGroup {
            name: "hazard_and_stakeholder",
            agents: vec![
                AgentSpec {
                    agent_name: "hazard_identification",
                    phase_kind: PhaseKind::HazardIdentification,
                    multi_style: true,
                    build: |desc| {
                        Box::new(HazardIdentificationAgent {
                            system_description: desc.to_string(),
                        })
                    },
                },
                AgentSpec {
                    agent_name: "stakeholder_analyst",
                    phase_kind: PhaseKind::StakeholderAnalysis,
                    multi_style: true,
                    build: |desc| {
                        Box::new(StakeholderAnalystAgent {
                            system_description: desc.to_string(),
                        })
                    },
                },
            ],
        },
        PhaseGroup {
            name: "adversary_analysis",
            agents: vec![AgentSpec {
                agent_name: "adversary_analyst",
                phase_kind: PhaseKind::AdversaryAnalysis,
                multi_style: true,
                build: |desc| {
                    Box::new(AdversaryAnalystAgent {
                        system_description: desc.to_string(),
                    })
                },
            }],
        },
        PhaseGroup {
            name: "security_constraints",
            agents: vec![AgentSpec {
                agent_name: "security_constraints",
                phase_kind: PhaseKind::SecurityConstraints,
                multi_style: true,
                build: |desc| {
                    Box::new(SecurityConstraintAgent {
                        system_description: desc.to_string(),
                    })
                },
            }],
        },
        PhaseGroup {
            name: "system_boundaries",
            agents: vec![AgentSpec {
                agent_name: "system_boundaries",
                phase_kind: PhaseKind::SystemBoundaries,
                multi_style: true,
                build: |desc| {
                    Box::new(SystemBoundaryAgent {
                        system_description: desc.to_string(),
                    })
                },
            }],
        },
    ]
}

#[must_use]
pub fn step2_phases() -> Vec<PhaseGroup> {
    vec![
        PhaseGroup {
            name: "control_structure",
            agents: vec![AgentSpec {
                agent_name: "control_structure_analyst",
                phase_kind: PhaseKind::ControlStructureAnalysis,
                multi_style: true,
                build: |desc| {
                    Box::new(ControlStructureAnalystAgent {
                        system_description: desc.to_string(),
                    })
                },
            }],
        },
        PhaseGroup {
            name: "control_actions",
            agents: vec![AgentSpec {
                agent_name: "control_action_mapping",
                phase_kind: PhaseKind::ControlActionMapping,
                multi_style: true,
                build: |desc| {
                    Box::new(ControlActionMappingAgent {
                        system_description: desc.to_string(),
                    })
                },
            }],
        },
        PhaseGroup {
            name: "state_context",
            agents: vec![AgentSpec {
                agent_name: "state_context_analysis",
                phase_kind: PhaseKind::ControlContextAnalysis,
                multi_style: true,
                build: |desc| {
                    Box::new(StateContextAnalysisAgent {
                        system_description: desc.to_string(),
                    })
                },
            }],
        },
        PhaseGroup {
            name: "feedback_trust",
            agents: vec![
                AgentSpec {
                    agent_name: "feedback_mechanism",
                    phase_kind: PhaseKind::FeedbackMechanismAnalysis,
                    multi_style: true,
                    build: |desc| {
                        Box::new(FeedbackMechanismAgent {
                            system_description: desc.to_string(),
                        })
                    },
                },
                AgentSpec {
                    agent_name: "trust_boundary",
                    phase_kind: PhaseKind::TrustBoundaryAnalysis,
                    multi_style: true,
                    build: |desc| {
                        Box::new(TrustBoundaryAgent {
                            system_description: desc.to_string(),
                        })
                    },
                },
            ],
        },
        PhaseGroup {
            name: "process_models",
            agents: vec![AgentSpec {
                agent_name: "process_model_analyst",
                phase_kind: PhaseKind::ProcessModelAnalysis,
                multi_style: true,
                build: |desc| {
                    Box::new(ProcessModelAnalystAgent {
                        system_description: desc.to_string(),
                    })
                },
            }],
        },
    ]
}

/// Cognitive styles run for a given agent under a given execution mode,
/// ported from `step1_coordinator.py::cognitive_styles_by_mode` and
/// `step2_coordinator.py::agent_config`.
#[must_use]
pub fn styles_for(mode: super::ExecutionMode, agent_name: &str) -> Vec<crate::types::CognitiveStyle> {
    use crate::types::CognitiveStyle::{Balanced, Creative, Intuitive, Systematic, Technical};
    use super::ExecutionMode::{DreamTeam, Enhanced, Standard};

    match mode {
        Standard => match agent_name {
            "feedback_mechanism" => vec![Technical],
            "control_action_mapping"
            | "state_context_analysis"
            | "trust_boundary"
            | "process_model_analyst" => vec![Systematic],
            _ => vec![Balanced],
        },
        Enhanced => match agent_name {
            "loss_identification" => vec![Intuitive, Technical],
            "hazard_identification" => vec![Technical, Systematic],
            "stakeholder_analyst" => vec![Intuitive, Systematic],
            "adversary_analyst" => vec![Technical, Systematic],
            "security_constraints" => vec![Technical, Creative],
            "system_boundaries" => vec![Systematic, Technical],
            "control_structure_analyst" => vec![Intuitive, Systematic],
            "control_action_mapping" => vec![Technical, Systematic],
            "state_context_analysis" => vec![Systematic, Creative],
            "feedback_mechanism" => vec![Technical, Intuitive],
            "trust_boundary" => vec![Systematic, Creative],
            "process_model_analyst" => vec![Systematic, Technical],
            _ => vec![Balanced],
        },
        DreamTeam => vec![Intuitive, Technical, Creative, Systematic],
    }
}
