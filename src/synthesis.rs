//! Cognitive Synthesis (C8): merges the outputs of every cognitive-style
//! fan-out agent run within a phase into one deduplicated artifact set
//! with a confidence score.
//!
//! Structurally grounded on `weavegraph::reducers`'s trait+registry split
//! (a small set of named merge operations applied over collected partial
//! updates), but the merge key here is domain identity — same finding
//! restated by different styles — rather than a fixed channel type, so
//! this lives as its own module instead of a `Reducer` impl.

use std::collections::HashSet;

use rustc_hash::FxHashMap;
use serde_json::Value;

use crate::types::CognitiveStyle;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Confidence {
    Medium,
    High,
    VeryHigh,
}

impl Confidence {
    /// Items found by 2 or more styles are `very_high` (corroborated
    /// across perspectives). A single-style item is `high` only when the
    /// phase itself ran more than one style — meaning the other styles
    /// looked and simply didn't surface this finding — and `medium` when
    /// the phase ran just the one style that found it.
    #[must_use]
    pub fn from_style_count(found_by_count: usize, styles_used: usize) -> Self {
        if found_by_count >= 2 {
            Confidence::VeryHigh
        } else if styles_used > 1 {
            Confidence::High
        } else {
            Confidence::Medium
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Confidence::Medium => "medium",
            Confidence::High => "high",
            Confidence::VeryHigh => "very_high",
        }
    }
}

#[derive(Clone, Debug)]
pub struct SynthesizedArtifact {
    pub value: Value,
    pub confidence: Confidence,
    pub found_by_styles: Vec<CognitiveStyle>,
}

/// One (category, style) contribution handed to the synthesizer.
pub struct StyleContribution {
    pub style: CognitiveStyle,
    pub items: Vec<Value>,
}

/// Normalizes a finding's identity text for deduplication: lowercase,
/// first 60 characters of its `description`/`name` field, whitespace
/// collapsed. Exact text rarely matches across styles, but the opening
/// clause of a restated finding usually does — this mirrors how the
/// original Python system's synthesis step groups near-duplicate
/// LLM phrasing without requiring semantic embeddings.
fn identity_key(value: &Value) -> String {
    let text = value
        .get("description")
        .or_else(|| value.get("name"))
        .and_then(Value::as_str)
        .unwrap_or_default();

    let normalized: String = text
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    normalized.chars().take(60).collect()
}

/// Merges contributions from every cognitive style that ran within a
/// phase for one category into a deduplicated, confidence-scored list.
/// `styles_used` is the number of distinct styles the phase ran with
/// (independent of how many of them happened to surface any given
/// finding), computed up front from the contributions themselves.
#[must_use]
pub fn synthesize(contributions: Vec<StyleContribution>) -> Vec<SynthesizedArtifact> {
    let styles_used = contributions
        .iter()
        .map(|c| c.style)
        .collect::<HashSet<_>>()
        .len();

    let mut grouped: FxHashMap<String, SynthesizedArtifact> = FxHashMap::default();
    let mut order: Vec<String> = Vec::new();

    for contribution in contributions {
        for item in contribution.items {
            let key = identity_key(&item);
            if key.is_empty() {
                // No identity text to dedup on; keep every such item distinct.
                let unique_key = format!("__no_identity_{}", order.len());
                order.push(unique_key.clone());
                grouped.insert(
                    unique_key,
                    SynthesizedArtifact {
                        value: item,
                        confidence: Confidence::from_style_count(1, styles_used),
                        found_by_styles: vec![contribution.style],
                    },
                );
                continue;
            }

            match grouped.get_mut(&key) {
                Some(existing) => {
                    if !existing.found_by_styles.contains(&contribution.style) {
                        existing.found_by_styles.push(contribution.style);
                        existing.confidence =
                            Confidence::from_style_count(existing.found_by_styles.len(), styles_used);
                    }
                }
                None => {
                    order.push(key.clone());
                    grouped.insert(
                        key,
                        SynthesizedArtifact {
                            value: item,
                            confidence: Confidence::from_style_count(1, styles_used),
                            found_by_styles: vec![contribution.style],
                        },
                    );
                }
            }
        }
    }

    order.into_iter().filter_map(|key| grouped.remove(&key)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn duplicate_findings_across_styles_raise_confidence_to_very_high() {
        let contributions = vec![
            StyleContribution {
                style: CognitiveStyle::Intuitive,
                items: vec![json!({"description": "Loss of patient safety during treatment"})],
            },
            StyleContribution {
                style: CognitiveStyle::Technical,
                items: vec![json!({"description": "Loss of patient safety during treatment delivery"})],
            },
        ];

        let merged = synthesize(contributions);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].confidence, Confidence::VeryHigh);
        assert_eq!(merged[0].found_by_styles.len(), 2);
    }

    /// Spec scenario S2: `intuitive` finds only the privacy loss,
    /// `technical` finds both the (restated) privacy loss and a distinct
    /// financial loss. The privacy loss is corroborated by both styles
    /// and reaches `very_high`; the financial loss was found by one
    /// style out of two that ran, so it lands at `high`, not `medium`.
    #[test]
    fn single_style_finding_is_high_when_other_styles_ran_and_missed_it() {
        let contributions = vec![
            StyleContribution {
                style: CognitiveStyle::Intuitive,
                items: vec![json!({"category": "privacy", "description": "Unauthorized exposure of customer records"})],
            },
            StyleContribution {
                style: CognitiveStyle::Technical,
                items: vec![
                    json!({"category": "privacy", "description": "Unauthorized exposure of customer records"}),
                    json!({"category": "financial", "description": "Direct monetary theft via fraudulent transactions"}),
                ],
            },
        ];

        let merged = synthesize(contributions);
        assert_eq!(merged.len(), 2);

        let privacy = merged.iter().find(|a| a.value["category"] == "privacy").unwrap();
        assert_eq!(privacy.confidence, Confidence::VeryHigh);
        assert_eq!(privacy.found_by_styles, vec![CognitiveStyle::Intuitive, CognitiveStyle::Technical]);

        let financial = merged.iter().find(|a| a.value["category"] == "financial").unwrap();
        assert_eq!(financial.confidence, Confidence::High);
        assert_eq!(financial.found_by_styles, vec![CognitiveStyle::Technical]);
    }

    #[test]
    fn three_or_more_styles_reach_very_high_confidence() {
        let contributions = vec![
            StyleContribution { style: CognitiveStyle::Intuitive, items: vec![json!({"description": "Loss of mission"})] },
            StyleContribution { style: CognitiveStyle::Technical, items: vec![json!({"description": "Loss of mission"})] },
            StyleContribution { style: CognitiveStyle::Systematic, items: vec![json!({"description": "Loss of mission"})] },
        ];
        let merged = synthesize(contributions);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].confidence, Confidence::VeryHigh);
    }

    #[test]
    fn distinct_findings_stay_separate() {
        let contributions = vec![StyleContribution {
            style: CognitiveStyle::Balanced,
            items: vec![
                json!({"description": "Loss of mission"}),
                json!({"description": "Loss of reputation due to public incident"}),
            ],
        }];
        let merged = synthesize(contributions);
        assert_eq!(merged.len(), 2);
        assert!(merged.iter().all(|a| a.confidence == Confidence::Medium));
    }
}
