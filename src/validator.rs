//! Validator (C10): scores a completed Step 1 analysis across six
//! categories, produces prioritized recommendations, and derives the
//! Step 1 -> Step 2 bridge.
//!
//! Ported from `original_source/.../step1_agents/validation_agent.py`
//! (the largest single agent file in the original, consistent with the
//! Validator being the most structurally complex component here too).
//! The category weights, score thresholds, and bridge shape are kept
//! exact; the individual checks are adapted to this crate's flatter
//! artifact shapes (a single JSON array per category rather than the
//! original's nested per-agent result dicts).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::agent::{is_implementation_detail, is_prevention_language};
use crate::registry::RegistryReport;
use crate::state::AnalysisState;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Minor,
    Major,
    Critical,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub location: String,
    pub issue: String,
    pub severity: Severity,
}

impl ValidationIssue {
    fn new(location: impl Into<String>, issue: impl Into<String>, severity: Severity) -> Self {
        Self {
            location: location.into(),
            issue: issue.into(),
            severity,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CategoryReport {
    pub score: f64,
    pub issues: Vec<ValidationIssue>,
}

impl CategoryReport {
    fn has_critical_or_major(&self) -> bool {
        self.issues
            .iter()
            .any(|i| matches!(i.severity, Severity::Critical | Severity::Major))
    }
}

const MECHANISM_INDICATORS: &[&str] = &[
    "attack", "exploit", "breach", "hack", "injection", "overflow", "bypass", "tampering",
    "spoofing",
];

const STATE_INDICATORS: &[&str] = &[
    "operates", "state", "condition", "mode", "status", "configuration", "posture", "situation",
];

const ACTION_INDICATORS: &[&str] = &[
    "performs", "executes", "runs", "processes", "handles", "manages", "controls", "directs",
];

const WEAK_CONSTRAINT_INDICATORS: &[&str] = &[
    "monitor", "review", "assess", "evaluate", "consider", "should", "may", "might", "could",
    "try",
];

fn contains_any(text: &str, indicators: &[&str]) -> bool {
    let lower = text.to_lowercase();
    indicators.iter().any(|i| lower.contains(i))
}

fn str_field<'a>(value: &'a Value, field: &str) -> &'a str {
    value.get(field).and_then(Value::as_str).unwrap_or_default()
}

fn identifiers(items: &[Value]) -> std::collections::HashSet<String> {
    items
        .iter()
        .filter_map(|v| v.get("identifier").and_then(Value::as_str))
        .map(str::to_string)
        .collect()
}

fn validate_abstraction(state: &AnalysisState) -> CategoryReport {
    let mut issues = Vec::new();

    if let Some(mission) = state.items("mission").first() {
        for field in ["mission_statement", "purpose", "value_provided"] {
            let text = str_field(mission, field);
            if text.is_empty() {
                continue;
            }
            if is_implementation_detail(text) {
                issues.push(ValidationIssue::new(
                    format!("mission.{field}"),
                    "contains implementation details",
                    Severity::Major,
                ));
            }
            if is_prevention_language(text) {
                issues.push(ValidationIssue::new(
                    format!("mission.{field}"),
                    "contains prevention language",
                    Severity::Minor,
                ));
            }
        }
    }

    for loss in state.items("losses") {
        let description = str_field(loss, "description");
        if contains_any(description, MECHANISM_INDICATORS) {
            issues.push(ValidationIssue::new(
                format!("loss.{}", str_field(loss, "identifier")),
                "describes a mechanism rather than an outcome",
                Severity::Major,
            ));
        }
    }

    for hazard in state.items("hazards") {
        let description = str_field(hazard, "description");
        if !description.is_empty() && !contains_any(description, STATE_INDICATORS) {
            issues.push(ValidationIssue::new(
                format!("hazard.{}", str_field(hazard, "identifier")),
                "not expressed as a system state",
                Severity::Major,
            ));
        }
        if contains_any(description, ACTION_INDICATORS) {
            issues.push(ValidationIssue::new(
                format!("hazard.{}", str_field(hazard, "identifier")),
                "contains action-oriented language",
                Severity::Warning,
            ));
        }
    }

    let violation_count = issues
        .iter()
        .filter(|i| matches!(i.severity, Severity::Critical | Severity::Major))
        .count();
    let warning_count = issues.len() - violation_count;
    let score = (100.0 - (violation_count as f64 * 10.0) - (warning_count as f64 * 5.0)).max(0.0);

    CategoryReport { score, issues }
}

fn validate_completeness(state: &AnalysisState) -> CategoryReport {
    let mut issues = Vec::new();
    let required: &[(&str, usize)] = &[
        ("mission", 1),
        ("losses", 3),
        ("hazards", 3),
        ("stakeholders", 5),
        ("security_constraints", 1),
        ("system_boundaries", 1),
    ];

    let mut missing = 0usize;
    let mut incomplete = 0usize;

    for (category, minimum) in required {
        let count = state.items(category).len();
        if count == 0 {
            missing += 1;
            issues.push(ValidationIssue::new(
                *category,
                format!("{category} analysis not performed"),
                Severity::Critical,
            ));
        } else if count < *minimum {
            incomplete += 1;
            issues.push(ValidationIssue::new(
                *category,
                format!("only {count} {category} identified (minimum {minimum} recommended)"),
                Severity::Major,
            ));
        }
    }

    let score = (100.0 - (missing as f64 * 30.0) - (incomplete as f64 * 10.0)).max(0.0);
    CategoryReport { score, issues }
}

fn validate_consistency(state: &AnalysisState) -> CategoryReport {
    let mut issues = Vec::new();
    let loss_ids = identifiers(state.items("losses"));

    for hazard in state.items("hazards") {
        let Some(linked) = hazard.get("linked_losses").and_then(Value::as_array) else {
            continue;
        };
        for loss_id in linked.iter().filter_map(Value::as_str) {
            if !loss_ids.contains(loss_id) {
                issues.push(ValidationIssue::new(
                    format!("hazard.{}", str_field(hazard, "identifier")),
                    format!("references non-existent loss {loss_id}"),
                    Severity::Major,
                ));
            }
        }
    }

    for stakeholder in state.items("stakeholders") {
        let Some(affected) = stakeholder.get("affected_by_losses").and_then(Value::as_array) else {
            continue;
        };
        for loss_id in affected.iter().filter_map(Value::as_str) {
            if !loss_ids.contains(loss_id) {
                issues.push(ValidationIssue::new(
                    format!("stakeholder.{}", str_field(stakeholder, "identifier")),
                    format!("references non-existent loss {loss_id}"),
                    Severity::Major,
                ));
            }
        }
    }

    for constraint in state.items("security_constraints") {
        let hazard_id = str_field(constraint, "addresses_hazard");
        if hazard_id.is_empty() {
            continue;
        }
        let known = state
            .items("hazards")
            .iter()
            .any(|h| str_field(h, "identifier") == hazard_id);
        if !known {
            issues.push(ValidationIssue::new(
                format!("security_constraint.{}", str_field(constraint, "identifier")),
                format!("references non-existent hazard {hazard_id}"),
                Severity::Major,
            ));
        }
    }

    let score = (100.0 - (issues.len() as f64 * 10.0)).max(0.0);
    CategoryReport { score, issues }
}

fn validate_coverage(state: &AnalysisState) -> CategoryReport {
    let mut issues = Vec::new();
    let mut percentages = Vec::new();

    let losses = state.items("losses");
    let covered_losses: std::collections::HashSet<&str> = state
        .items("hazards")
        .iter()
        .filter_map(|h| h.get("linked_losses").and_then(Value::as_array))
        .flat_map(|arr| arr.iter().filter_map(Value::as_str))
        .collect();
    let uncovered: Vec<&str> = losses
        .iter()
        .map(|l| str_field(l, "identifier"))
        .filter(|id| !covered_losses.contains(id))
        .collect();
    if !uncovered.is_empty() {
        issues.push(ValidationIssue::new(
            "losses",
            format!("losses without an associated hazard: {}", uncovered.join(", ")),
            Severity::Major,
        ));
    }
    if !losses.is_empty() {
        percentages.push(100.0 - (uncovered.len() as f64 / losses.len() as f64 * 100.0));
    }

    const EXPECTED_CATEGORIES: &[&str] = &[
        "integrity_compromised",
        "confidentiality_breached",
        "availability_degraded",
        "capability_loss",
    ];
    let covered_categories: std::collections::HashSet<&str> = state
        .items("hazards")
        .iter()
        .map(|h| str_field(h, "hazard_category"))
        .filter(|c| !c.is_empty())
        .collect();
    let missing_categories: Vec<&str> = EXPECTED_CATEGORIES
        .iter()
        .copied()
        .filter(|c| !covered_categories.contains(c))
        .collect();
    if !missing_categories.is_empty() {
        issues.push(ValidationIssue::new(
            "hazards",
            format!("hazard categories not covered: {}", missing_categories.join(", ")),
            Severity::Minor,
        ));
    }
    percentages.push(
        (EXPECTED_CATEGORIES.len() - missing_categories.len()) as f64 / EXPECTED_CATEGORIES.len() as f64
            * 100.0,
    );

    let score = if percentages.is_empty() {
        100.0
    } else {
        percentages.iter().sum::<f64>() / percentages.len() as f64
    };
    CategoryReport { score, issues }
}

fn validate_security_constraints(state: &AnalysisState) -> CategoryReport {
    let mut issues = Vec::new();
    let hazards = state.items("hazards");
    let constraints = state.items("security_constraints");

    let mut hazard_constraint_counts: BTreeMap<&str, usize> = BTreeMap::new();
    for constraint in constraints {
        let hazard_id = str_field(constraint, "addresses_hazard");
        if !hazard_id.is_empty() {
            *hazard_constraint_counts.entry(hazard_id).or_insert(0) += 1;
        }
    }

    for hazard in hazards {
        let identifier = str_field(hazard, "identifier");
        let count = hazard_constraint_counts.get(identifier).copied().unwrap_or(0);
        if count == 0 {
            issues.push(ValidationIssue::new(
                format!("hazard.{identifier}"),
                "no security constraints defined",
                Severity::Critical,
            ));
            continue;
        }
        let is_critical = state.items("losses").iter().any(|loss| {
            str_field(loss, "severity") == "catastrophic"
                && hazard
                    .get("linked_losses")
                    .and_then(Value::as_array)
                    .map(|arr| arr.iter().any(|v| v.as_str() == Some(str_field(loss, "identifier"))))
                    .unwrap_or(false)
        });
        if is_critical && count < 2 {
            issues.push(ValidationIssue::new(
                format!("hazard.{identifier}"),
                format!("critical hazard needs multiple constraints (has {count})"),
                Severity::Major,
            ));
        }
    }

    let mut weak_count = 0usize;
    let mut type_counts: BTreeMap<&str, usize> = [
        ("preventive", 0),
        ("detective", 0),
        ("corrective", 0),
        ("compensating", 0),
    ]
    .into_iter()
    .collect();
    for constraint in constraints {
        let constraint_type = str_field(constraint, "constraint_type");
        let constraint_type = if constraint_type.is_empty() { "preventive" } else { constraint_type };
        if let Some(slot) = type_counts.get_mut(constraint_type) {
            *slot += 1;
        }
        let description = str_field(constraint, "description");
        if contains_any(description, WEAK_CONSTRAINT_INDICATORS) {
            weak_count += 1;
            issues.push(ValidationIssue::new(
                format!("security_constraint.{}", str_field(constraint, "identifier")),
                "constraint may be too generic or weak",
                Severity::Minor,
            ));
        }
    }

    let balance = constraint_type_balance(&type_counts);
    let hazards_with_constraints = hazards
        .iter()
        .filter(|h| hazard_constraint_counts.get(str_field(h, "identifier")).copied().unwrap_or(0) > 0)
        .count();
    let coverage_ratio = if hazards.is_empty() {
        1.0
    } else {
        hazards_with_constraints as f64 / hazards.len() as f64
    };

    let missing_penalty = issues
        .iter()
        .filter(|i| i.severity == Severity::Critical)
        .count() as f64
        * 10.0;
    let score = if hazards.is_empty() {
        100.0
    } else {
        ((coverage_ratio * 60.0) + (balance * 40.0) - (weak_count as f64 * 5.0) - missing_penalty).max(0.0)
    };

    CategoryReport { score, issues }
}

/// Balance score (0-1) against the ideal preventive/detective/corrective/compensating
/// distribution of 40/30/20/10, mirroring `_calculate_constraint_balance`.
fn constraint_type_balance(type_counts: &BTreeMap<&str, usize>) -> f64 {
    let total: usize = type_counts.values().sum();
    if total == 0 {
        return 0.0;
    }
    let ideal: &[(&str, f64)] = &[
        ("preventive", 0.4),
        ("detective", 0.3),
        ("corrective", 0.2),
        ("compensating", 0.1),
    ];
    let mut balance = 1.0;
    for (constraint_type, ideal_ratio) in ideal {
        let actual_ratio = *type_counts.get(constraint_type).unwrap_or(&0) as f64 / total as f64;
        balance -= (actual_ratio - ideal_ratio).abs() * 0.5;
    }
    balance.max(0.0)
}

fn validate_system_boundaries(state: &AnalysisState) -> CategoryReport {
    let mut issues = Vec::new();
    let boundaries = state.items("system_boundaries");

    let mut counts: BTreeMap<&str, usize> = [("inside", 0), ("outside", 0), ("interface", 0)]
        .into_iter()
        .collect();
    for boundary in boundaries {
        let boundary_type = str_field(boundary, "boundary_type");
        if let Some(slot) = counts.get_mut(boundary_type) {
            *slot += 1;
        }
    }

    let thresholds: &[(&str, usize)] = &[("inside", 3), ("outside", 3), ("interface", 2)];
    for (boundary_type, minimum) in thresholds {
        let actual = counts.get(boundary_type).copied().unwrap_or(0);
        if actual < *minimum {
            issues.push(ValidationIssue::new(
                "system_boundaries",
                format!("only {actual} `{boundary_type}` boundary elements (minimum {minimum} recommended)"),
                Severity::Major,
            ));
        }
    }

    let satisfied = thresholds
        .iter()
        .filter(|(t, m)| counts.get(t).copied().unwrap_or(0) >= *m)
        .count();
    let coverage = satisfied as f64 / thresholds.len() as f64 * 100.0;
    let penalty = issues.len() as f64 * 10.0;
    let score = (coverage - penalty).max(0.0);

    CategoryReport { score, issues }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityLevel {
    Poor,
    NeedsImprovement,
    Adequate,
    Good,
    Excellent,
}

impl QualityLevel {
    fn from_score(score: f64) -> Self {
        if score >= 90.0 {
            QualityLevel::Excellent
        } else if score >= 80.0 {
            QualityLevel::Good
        } else if score >= 70.0 {
            QualityLevel::Adequate
        } else if score >= 60.0 {
            QualityLevel::NeedsImprovement
        } else {
            QualityLevel::Poor
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallStatus {
    ReadyForStep2,
    ReadyWithMinorIssues,
    ReviewRecommended,
    RevisionRequired,
}

impl OverallStatus {
    fn from_quality(level: QualityLevel) -> Self {
        match level {
            QualityLevel::Excellent => OverallStatus::ReadyForStep2,
            QualityLevel::Good => OverallStatus::ReadyWithMinorIssues,
            QualityLevel::Adequate => OverallStatus::ReviewRecommended,
            QualityLevel::NeedsImprovement | QualityLevel::Poor => OverallStatus::RevisionRequired,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Clone, Debug, Serialize)]
pub struct Recommendation {
    pub priority: Priority,
    pub category: &'static str,
    pub recommendation: String,
    pub specific_actions: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct QualityMetrics {
    pub abstraction_score: f64,
    pub completeness_score: f64,
    pub consistency_score: f64,
    pub coverage_score: f64,
    pub security_constraints_score: f64,
    pub system_boundaries_score: f64,
    pub overall_score: f64,
    pub quality_level: QualityLevel,
    pub strengths: Vec<&'static str>,
    pub weaknesses: Vec<&'static str>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Step2Bridge {
    pub control_needs: BTreeMap<String, String>,
    pub implied_boundaries: Vec<String>,
    pub constraint_buckets: BTreeMap<String, Vec<String>>,
    pub boundary_control_requirements: Vec<String>,
    pub transition_guidance: Vec<String>,
}

fn build_step2_bridge(state: &AnalysisState) -> Step2Bridge {
    let mut control_needs = BTreeMap::new();
    let category_needs: &[(&str, &str)] = &[
        ("integrity_compromised", "ensure the system operates with verified integrity"),
        ("confidentiality_breached", "protect information from unauthorized observation"),
        ("availability_degraded", "maintain service despite disruptions"),
        ("capability_loss", "preserve critical system capabilities"),
    ];
    let present_categories: std::collections::HashSet<&str> = state
        .items("hazards")
        .iter()
        .map(|h| str_field(h, "hazard_category"))
        .collect();
    for (category, need) in category_needs {
        if present_categories.contains(category) {
            control_needs.insert((*category).to_string(), (*need).to_string());
        }
    }

    let implied_boundaries = state
        .items("stakeholders")
        .iter()
        .map(|s| format!("{} <-> system", str_field(s, "name")))
        .collect();

    let mut constraint_buckets: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for constraint in state.items("security_constraints") {
        let constraint_type = str_field(constraint, "constraint_type");
        let constraint_type = if constraint_type.is_empty() { "preventive" } else { constraint_type };
        constraint_buckets
            .entry(constraint_type.to_string())
            .or_default()
            .push(str_field(constraint, "identifier").to_string());
    }

    let boundary_control_requirements = state
        .items("system_boundaries")
        .iter()
        .filter(|b| str_field(b, "boundary_type") == "interface")
        .map(|b| format!("{}: controller required at crossing point", str_field(b, "name")))
        .collect();

    Step2Bridge {
        control_needs,
        implied_boundaries,
        constraint_buckets,
        boundary_control_requirements,
        transition_guidance: vec![
            "Map control needs to control structure: each control need requires one or more controllers in Step 2".to_string(),
            "Define control boundaries: implied boundaries become explicit control interfaces".to_string(),
            "Implement security constraints as control actions and feedback loops".to_string(),
            "Establish boundary control points at critical boundary crossings".to_string(),
            "Allocate losses to controllers responsible for preventing them".to_string(),
            "Design control channels with secure and reliable command paths".to_string(),
        ],
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExecutiveSummary {
    pub losses_identified: usize,
    pub hazards_identified: usize,
    pub stakeholders_identified: usize,
    pub security_constraints_defined: usize,
    pub overall_quality: QualityLevel,
    pub quality_score: f64,
    pub next_steps: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ValidationReport {
    pub abstraction: CategoryReport,
    pub completeness: CategoryReport,
    pub consistency: CategoryReport,
    pub coverage: CategoryReport,
    pub security_constraints: CategoryReport,
    pub system_boundaries: CategoryReport,
    pub quality_metrics: QualityMetrics,
    pub recommendations: Vec<Recommendation>,
    pub step2_bridge: Step2Bridge,
    pub executive_summary: ExecutiveSummary,
    pub overall_status: OverallStatus,
}

/// Runs every category check against a completed Step 1 analysis and
/// assembles the weighted report, recommendations, bridge, and summary.
#[must_use]
pub fn validate_step1(state: &AnalysisState) -> ValidationReport {
    let abstraction = validate_abstraction(state);
    let completeness = validate_completeness(state);
    let consistency = validate_consistency(state);
    let coverage = validate_coverage(state);
    let security_constraints = validate_security_constraints(state);
    let system_boundaries = validate_system_boundaries(state);

    let overall_score = abstraction.score * 0.20
        + completeness.score * 0.20
        + consistency.score * 0.20
        + coverage.score * 0.15
        + security_constraints.score * 0.15
        + system_boundaries.score * 0.10;
    let quality_level = QualityLevel::from_score(overall_score);

    let mut strengths = Vec::new();
    let mut weaknesses = Vec::new();
    let scored: &[(f64, &'static str, &'static str)] = &[
        (abstraction.score, "excellent abstraction level maintenance", "abstraction level violations"),
        (completeness.score, "comprehensive analysis coverage", "missing required elements"),
        (consistency.score, "high internal consistency", "internal inconsistencies"),
        (coverage.score, "thorough loss and hazard coverage", "insufficient coverage"),
        (security_constraints.score, "robust security constraint coverage", "weak or missing security constraints"),
        (system_boundaries.score, "well-defined system boundaries", "poorly defined system boundaries"),
    ];
    for (score, strength, weakness) in scored {
        if *score >= 90.0 {
            strengths.push(*strength);
        } else if *score < 70.0 {
            weaknesses.push(*weakness);
        }
    }

    let quality_metrics = QualityMetrics {
        abstraction_score: abstraction.score,
        completeness_score: completeness.score,
        consistency_score: consistency.score,
        coverage_score: coverage.score,
        security_constraints_score: security_constraints.score,
        system_boundaries_score: system_boundaries.score,
        overall_score,
        quality_level,
        strengths,
        weaknesses,
    };

    let recommendations = build_recommendations(
        &abstraction,
        &completeness,
        &consistency,
        &coverage,
        &security_constraints,
        &system_boundaries,
    );

    let step2_bridge = build_step2_bridge(state);

    let executive_summary = ExecutiveSummary {
        losses_identified: state.items("losses").len(),
        hazards_identified: state.items("hazards").len(),
        stakeholders_identified: state.items("stakeholders").len(),
        security_constraints_defined: state.items("security_constraints").len(),
        overall_quality: quality_level,
        quality_score: (overall_score * 10.0).round() / 10.0,
        next_steps: next_steps(quality_level, &coverage, &security_constraints),
    };

    let overall_status = OverallStatus::from_quality(quality_level);

    ValidationReport {
        abstraction,
        completeness,
        consistency,
        coverage,
        security_constraints,
        system_boundaries,
        quality_metrics,
        recommendations,
        step2_bridge,
        executive_summary,
        overall_status,
    }
}

fn next_steps(level: QualityLevel, coverage: &CategoryReport, security: &CategoryReport) -> Vec<String> {
    let mut steps = Vec::new();
    if matches!(level, QualityLevel::Excellent | QualityLevel::Good) {
        steps.push("proceed to Step 2: control structure modeling".to_string());
    } else {
        steps.push("address quality issues before proceeding to Step 2".to_string());
    }
    if !coverage.issues.is_empty() {
        steps.push("review and address coverage gaps".to_string());
    }
    if security.has_critical_or_major() {
        steps.push("define security constraints for unconstrained hazards".to_string());
    }
    steps
}

fn build_recommendations(
    abstraction: &CategoryReport,
    completeness: &CategoryReport,
    consistency: &CategoryReport,
    coverage: &CategoryReport,
    security_constraints: &CategoryReport,
    system_boundaries: &CategoryReport,
) -> Vec<Recommendation> {
    let mut recommendations = Vec::new();

    if !abstraction.issues.is_empty() {
        recommendations.push(Recommendation {
            priority: Priority::High,
            category: "abstraction",
            recommendation: "review and revise content to remove implementation details".to_string(),
            specific_actions: abstraction.issues.iter().take(3).map(|i| format!("revise {}", i.location)).collect(),
        });
    }
    if completeness.has_critical_or_major() {
        recommendations.push(Recommendation {
            priority: Priority::Critical,
            category: "completeness",
            recommendation: "complete missing analysis elements".to_string(),
            specific_actions: completeness.issues.iter().map(|i| i.issue.clone()).collect(),
        });
    }
    if !consistency.issues.is_empty() {
        recommendations.push(Recommendation {
            priority: Priority::High,
            category: "consistency",
            recommendation: "resolve reference inconsistencies".to_string(),
            specific_actions: consistency.issues.iter().take(3).map(|i| i.issue.clone()).collect(),
        });
    }
    if !coverage.issues.is_empty() {
        recommendations.push(Recommendation {
            priority: Priority::High,
            category: "coverage",
            recommendation: "address coverage gaps".to_string(),
            specific_actions: coverage.issues.iter().map(|i| i.issue.clone()).collect(),
        });
    }
    if security_constraints.has_critical_or_major() {
        recommendations.push(Recommendation {
            priority: Priority::Critical,
            category: "security_constraints",
            recommendation: "define security constraints for all hazards".to_string(),
            specific_actions: security_constraints
                .issues
                .iter()
                .filter(|i| i.severity == Severity::Critical)
                .take(3)
                .map(|i| i.issue.clone())
                .collect(),
        });
    }
    if system_boundaries.has_critical_or_major() {
        recommendations.push(Recommendation {
            priority: Priority::High,
            category: "system_boundaries",
            recommendation: "define missing system boundary elements".to_string(),
            specific_actions: system_boundaries.issues.iter().map(|i| i.issue.clone()).collect(),
        });
    }

    recommendations.sort_by(|a, b| b.priority.cmp(&a.priority));
    recommendations
}

/// A Step 2 run additionally gates on the Component Registry carrying no
/// undefined references and no orphaned controllers.
#[must_use]
pub fn validate_step2_registry(report: &RegistryReport) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    for reference in &report.undefined_references {
        issues.push(ValidationIssue::new(
            "component_registry",
            format!("undefined reference to `{reference}`"),
            Severity::Critical,
        ));
    }
    for orphan in &report.orphaned_components {
        issues.push(ValidationIssue::new(
            "component_registry",
            format!("orphaned component `{orphan}` has no references in either direction"),
            Severity::Major,
        ));
    }
    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn populated_state() -> AnalysisState {
        let mut state = AnalysisState::new();
        state.extend(
            "mission",
            vec![json!({
                "mission_statement": "deliver payments reliably",
                "purpose": "move funds between accounts",
                "value_provided": "trusted settlement",
                "identifier": "MISSION-1"
            })],
        );
        state.extend(
            "losses",
            vec![
                json!({"identifier": "L-1", "description": "loss of customer funds", "severity": "catastrophic"}),
                json!({"identifier": "L-2", "description": "loss of regulatory standing", "severity": "major"}),
                json!({"identifier": "L-3", "description": "loss of customer trust", "severity": "moderate"}),
            ],
        );
        state.extend(
            "hazards",
            vec![
                json!({"identifier": "H-1", "description": "system operates in an unreconciled state", "linked_losses": ["L-1"], "hazard_category": "integrity_compromised"}),
                json!({"identifier": "H-2", "description": "system operates with degraded availability", "linked_losses": ["L-2"], "hazard_category": "availability_degraded"}),
                json!({"identifier": "H-3", "description": "system operates in a confidentiality-breached condition", "linked_losses": ["L-3"], "hazard_category": "confidentiality_breached"}),
            ],
        );
        state.extend(
            "stakeholders",
            (1..=5)
                .map(|n| json!({"identifier": format!("ST-{n}"), "name": format!("stakeholder {n}"), "affected_by_losses": ["L-1"]}))
                .collect(),
        );
        state.extend(
            "security_constraints",
            vec![
                json!({"identifier": "SC-1", "description": "the system shall reconcile every transaction", "addresses_hazard": "H-1", "constraint_type": "preventive"}),
                json!({"identifier": "SC-2", "description": "the system shall fail over within one second", "addresses_hazard": "H-2", "constraint_type": "corrective"}),
                json!({"identifier": "SC-3", "description": "the system shall encrypt data in transit", "addresses_hazard": "H-3", "constraint_type": "preventive"}),
            ],
        );
        state.extend(
            "system_boundaries",
            vec![
                json!({"identifier": "B-1", "name": "core ledger", "boundary_type": "inside"}),
                json!({"identifier": "B-2", "name": "accounts", "boundary_type": "inside"}),
                json!({"identifier": "B-3", "name": "fraud engine", "boundary_type": "inside"}),
                json!({"identifier": "B-4", "name": "card network", "boundary_type": "outside"}),
                json!({"identifier": "B-5", "name": "regulator feed", "boundary_type": "outside"}),
                json!({"identifier": "B-6", "name": "partner bank", "boundary_type": "outside"}),
                json!({"identifier": "B-7", "name": "payment api", "boundary_type": "interface"}),
                json!({"identifier": "B-8", "name": "settlement api", "boundary_type": "interface"}),
            ],
        );
        state
    }

    #[test]
    fn well_formed_analysis_scores_highly() {
        let state = populated_state();
        let report = validate_step1(&state);
        assert!(report.quality_metrics.overall_score >= 80.0, "{report:#?}");
        assert!(matches!(report.overall_status, OverallStatus::ReadyForStep2 | OverallStatus::ReadyWithMinorIssues));
    }

    #[test]
    fn empty_analysis_is_revision_required() {
        let state = AnalysisState::new();
        let report = validate_step1(&state);
        assert_eq!(report.overall_status, OverallStatus::RevisionRequired);
        assert!(!report.recommendations.is_empty());
    }

    #[test]
    fn mechanism_language_in_loss_description_is_flagged() {
        let mut state = populated_state();
        state.extend(
            "losses",
            vec![json!({"identifier": "L-4", "description": "attacker exploits a buffer overflow", "severity": "major"})],
        );
        let report = validate_step1(&state);
        assert!(report
            .abstraction
            .issues
            .iter()
            .any(|i| i.location == "loss.L-4"));
    }

    #[test]
    fn hazard_referencing_unknown_loss_is_inconsistent() {
        let mut state = populated_state();
        state.extend(
            "hazards",
            vec![json!({"identifier": "H-9", "description": "system operates in an unknown state", "linked_losses": ["L-999"], "hazard_category": "capability_loss"})],
        );
        let report = validate_step1(&state);
        assert!(report
            .consistency
            .issues
            .iter()
            .any(|i| i.issue.contains("L-999")));
    }

    #[test]
    fn hazard_without_constraint_is_missing_constraint() {
        let mut state = populated_state();
        state.extend(
            "hazards",
            vec![json!({"identifier": "H-9", "description": "system operates unprotected", "linked_losses": [], "hazard_category": "capability_loss"})],
        );
        let report = validate_step1(&state);
        assert!(report
            .security_constraints
            .issues
            .iter()
            .any(|i| i.location == "hazard.H-9"));
    }

    #[test]
    fn registry_validation_flags_undefined_and_orphaned() {
        use crate::registry::RegistryReport;
        let report = RegistryReport {
            total_components: 2,
            controllers: 1,
            processes: 1,
            dual_roles: 0,
            undefined_references: vec!["PROC-9".to_string()],
            orphaned_components: vec!["CTRL-1".to_string()],
            validation_errors: vec![],
            is_valid: false,
        };
        let issues = validate_step2_registry(&report);
        assert_eq!(issues.len(), 2);
    }
}
