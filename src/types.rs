//! Core identifiers and enums shared across every component.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A validated `PREFIX-INT` artifact identifier, e.g. `L-3`, `H-7`, `CTRL-2`.
///
/// Construction is fallible: the prefix must be non-empty uppercase
/// ASCII and the numeric suffix must parse as a `u32`. Identifiers are
/// compared and hashed by their canonical string form.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ArtifactId {
    prefix: String,
    number: u32,
}

impl ArtifactId {
    pub fn new(prefix: impl Into<String>, number: u32) -> Self {
        Self {
            prefix: prefix.into(),
            number,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn number(&self) -> u32 {
        self.number
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.prefix, self.number)
    }
}

impl std::str::FromStr for ArtifactId {
    type Err = ArtifactIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() > 32 {
            return Err(ArtifactIdError::TooLong(s.to_string()));
        }
        let (prefix, rest) = s
            .rsplit_once('-')
            .ok_or_else(|| ArtifactIdError::Malformed(s.to_string()))?;
        if prefix.is_empty() || !prefix.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(ArtifactIdError::Malformed(s.to_string()));
        }
        let number = rest
            .parse::<u32>()
            .map_err(|_| ArtifactIdError::Malformed(s.to_string()))?;
        Ok(Self {
            prefix: prefix.to_string(),
            number,
        })
    }
}

impl TryFrom<String> for ArtifactId {
    type Error = ArtifactIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ArtifactId> for String {
    fn from(id: ArtifactId) -> Self {
        id.to_string()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ArtifactIdError {
    #[error("identifier `{0}` does not match PREFIX-INT form")]
    Malformed(String),
    #[error("identifier `{0}` exceeds 32 characters")]
    TooLong(String),
}

/// Cognitive styles ported from the ASI-ARCH "Dream Team" approach: each
/// style biases the agent's system prompt toward a different analytical
/// posture rather than changing the agent's logic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CognitiveStyle {
    Balanced,
    Intuitive,
    Technical,
    Creative,
    Systematic,
}

impl CognitiveStyle {
    /// Prompt text prepended to the agent's system prompt for this style.
    /// `Balanced` contributes nothing — it is the unmodified default voice.
    #[must_use]
    pub fn prompt_modifier(self) -> &'static str {
        match self {
            CognitiveStyle::Balanced => "",
            CognitiveStyle::Intuitive => {
                "Think like an intuitive pattern recognizer:\n\
                 - Trust your instincts about what \"feels\" wrong or dangerous\n\
                 - Look for non-obvious patterns and emergent risks\n\
                 - Consider the aesthetic and human aspects of the system\n\
                 - Identify risks that might not be immediately measurable\n\
                 - Focus on the \"big picture\" and systemic issues\n"
            }
            CognitiveStyle::Technical => {
                "Think like a pragmatic technical implementer:\n\
                 - Focus on concrete, measurable, and exploitable vulnerabilities\n\
                 - Consider practical attack vectors and failure modes\n\
                 - Emphasize technically feasible risks\n\
                 - Be specific about mechanisms and dependencies\n\
                 - Prioritize high-impact, high-likelihood scenarios\n"
            }
            CognitiveStyle::Creative => {
                "Think like a creative innovator:\n\
                 - Imagine novel and unexpected failure scenarios\n\
                 - Consider edge cases and unusual combinations\n\
                 - Think outside established patterns about potential risks\n\
                 - Explore unconventional attack vectors\n\
                 - Don't limit yourself to known patterns\n"
            }
            CognitiveStyle::Systematic => {
                "Think like a systematic validator:\n\
                 - Ensure comprehensive and complete coverage\n\
                 - Check for logical consistency and completeness\n\
                 - Validate that nothing important is missed\n\
                 - Be rigorous and methodical in your analysis\n\
                 - Ensure mutually exclusive, collectively exhaustive categorization\n"
            }
        }
    }

    #[must_use]
    pub fn emphasizes_novelty(self) -> bool {
        matches!(self, CognitiveStyle::Intuitive | CognitiveStyle::Creative)
    }

    #[must_use]
    pub fn emphasizes_rigor(self) -> bool {
        matches!(self, CognitiveStyle::Technical | CognitiveStyle::Systematic)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            CognitiveStyle::Balanced => "balanced",
            CognitiveStyle::Intuitive => "intuitive",
            CognitiveStyle::Technical => "technical",
            CognitiveStyle::Creative => "creative",
            CognitiveStyle::Systematic => "systematic",
        }
    }
}

impl fmt::Display for CognitiveStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Identifies a Step 1 or Step 2 analysis phase in the coordinator's
/// declared phase graph.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PhaseKind {
    MissionAnalysis,
    LossIdentification,
    HazardIdentification,
    StakeholderAnalysis,
    AdversaryAnalysis,
    SecurityConstraints,
    SystemBoundaries,
    Validation,
    ControlStructureAnalysis,
    ControlActionMapping,
    ControlContextAnalysis,
    ProcessModelAnalysis,
    FeedbackMechanismAnalysis,
    TrustBoundaryAnalysis,
    CrossReferenceSynthesis,
    Custom(String),
}

impl fmt::Display for PhaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhaseKind::MissionAnalysis => write!(f, "mission_analysis"),
            PhaseKind::LossIdentification => write!(f, "loss_identification"),
            PhaseKind::HazardIdentification => write!(f, "hazard_identification"),
            PhaseKind::StakeholderAnalysis => write!(f, "stakeholder_analysis"),
            PhaseKind::AdversaryAnalysis => write!(f, "adversary_analysis"),
            PhaseKind::SecurityConstraints => write!(f, "security_constraints"),
            PhaseKind::SystemBoundaries => write!(f, "system_boundaries"),
            PhaseKind::Validation => write!(f, "validation"),
            PhaseKind::ControlStructureAnalysis => write!(f, "control_structure_analysis"),
            PhaseKind::ControlActionMapping => write!(f, "control_action_mapping"),
            PhaseKind::ControlContextAnalysis => write!(f, "control_context_analysis"),
            PhaseKind::ProcessModelAnalysis => write!(f, "process_model_analysis"),
            PhaseKind::FeedbackMechanismAnalysis => write!(f, "feedback_mechanism_analysis"),
            PhaseKind::TrustBoundaryAnalysis => write!(f, "trust_boundary_analysis"),
            PhaseKind::CrossReferenceSynthesis => write!(f, "cross_reference_synthesis"),
            PhaseKind::Custom(name) => write!(f, "{name}"),
        }
    }
}

/// Identifies an analysis step (Step 1 problem framing vs Step 2 control
/// structure analysis).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStep {
    Step1,
    Step2,
}

impl fmt::Display for AnalysisStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisStep::Step1 => write!(f, "step1"),
            AnalysisStep::Step2 => write!(f, "step2"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifact_id_round_trips() {
        let id: ArtifactId = "L-3".parse().unwrap();
        assert_eq!(id.prefix(), "L");
        assert_eq!(id.number(), 3);
        assert_eq!(id.to_string(), "L-3");
    }

    #[test]
    fn artifact_id_rejects_lowercase_prefix() {
        assert!("loss-3".parse::<ArtifactId>().is_err());
    }

    #[test]
    fn artifact_id_rejects_missing_separator() {
        assert!("L3".parse::<ArtifactId>().is_err());
    }

    #[test]
    fn balanced_style_has_no_modifier() {
        assert_eq!(CognitiveStyle::Balanced.prompt_modifier(), "");
    }

    #[test]
    fn novelty_and_rigor_styles_are_disjoint() {
        for style in [
            CognitiveStyle::Balanced,
            CognitiveStyle::Intuitive,
            CognitiveStyle::Technical,
            CognitiveStyle::Creative,
            CognitiveStyle::Systematic,
        ] {
            assert!(!(style.emphasizes_novelty() && style.emphasizes_rigor()));
        }
    }
}
