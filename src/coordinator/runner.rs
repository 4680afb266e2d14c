//! Step Coordinator (C7): runs a phase schedule end to end, fanning each
//! agent out across its execution mode's cognitive styles, merging
//! duplicate findings through Cognitive Synthesis, and persisting the
//! resulting state through the Persistence Gateway.
//!
//! The concurrency shape mirrors `weavegraph::runtimes::runner::Runner`:
//! a `Semaphore`-capped `LlmAdapter` bounds total in-flight LLM calls,
//! `tokio::task::JoinSet` fans a barrier group out, and `tokio::time::timeout`
//! enforces per-agent and whole-run deadlines the way the teacher enforces
//! step and run budgets.

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::task::JoinSet;
use tracing::{info, instrument, warn};

use crate::agent::PriorResultLoader;
use crate::completeness::{self, CompletenessCheck};
use crate::config::ConcurrencyConfig;
use crate::errors::StpaSecError;
use crate::event_bus::{ProgressBus, ProgressEmitter, ProgressEvent};
use crate::llm::LlmAdapter;
use crate::llm::{PromptSaver, SharedProvider};
use crate::persistence::{AnalysisRecord, ArtifactRecord, PersistenceGateway, RunStatus};
use crate::registry::{ComponentRegistry, RegistryReport};
use crate::state::AnalysisState;
use crate::synthesis::{synthesize, StyleContribution};
use crate::types::{AnalysisStep, CognitiveStyle};
use crate::utils::IdGenerator;
use crate::validator::{self, ValidationIssue, ValidationReport};
use crate::xref::{self, CrossReferenceSynthesis};

use super::phase_graph::{self, PhaseGroup};

/// Selects which cognitive styles each multi-style agent runs with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExecutionMode {
    #[default]
    Standard,
    Enhanced,
    DreamTeam,
}

/// What a completed run leaves behind: the analysis identifier it was
/// persisted under, the final channel state, and (for Step 2) the
/// component registry's validation report.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub analysis_id: String,
    pub step: AnalysisStep,
    pub state: AnalysisState,
    pub registry_report: Option<RegistryReport>,
    /// Populated for Step 1 runs: the quality report and Step 2 bridge
    /// produced by the Validator (C10).
    pub validation_report: Option<ValidationReport>,
    /// Populated for Step 2 runs: registry-level issues (undefined
    /// references, orphaned components) surfaced by the Validator.
    pub registry_issues: Vec<ValidationIssue>,
    /// Populated for Step 2 runs: the enriched control-action/trust-
    /// boundary graph produced by the Cross-Reference Synthesizer (C9).
    pub cross_reference_synthesis: Option<CrossReferenceSynthesis>,
    /// The deterministic post-phase completeness gate (spec §4.7):
    /// minimum artifact counts, required sub-fields, and cross-reference
    /// resolution, distinct from the Validator's weighted score.
    pub completeness_check: CompletenessCheck,
    /// Every `AgentOutcome::validation_errors` message raised by any agent
    /// across the run (dropped findings, registry rejections), in
    /// completion order. Distinct from `registry_issues`, which is the
    /// Validator's pass over the Component Registry's own ledger.
    pub validation_errors: Vec<String>,
}

#[derive(Default)]
pub struct CoordinatorBuilder {
    provider: Option<SharedProvider>,
    gateway: Option<Arc<dyn PersistenceGateway>>,
    mode: ExecutionMode,
    concurrency: ConcurrencyConfig,
    prompt_saver: Option<Arc<PromptSaver>>,
}

impl CoordinatorBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_execution_mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn with_provider(mut self, provider: SharedProvider) -> Self {
        self.provider = Some(provider);
        self
    }

    #[must_use]
    pub fn with_gateway(mut self, gateway: Arc<dyn PersistenceGateway>) -> Self {
        self.gateway = Some(gateway);
        self
    }

    #[must_use]
    pub fn with_concurrency(mut self, concurrency: ConcurrencyConfig) -> Self {
        self.concurrency = concurrency;
        self
    }

    #[must_use]
    pub fn with_prompt_saver(mut self, saver: Arc<PromptSaver>) -> Self {
        self.prompt_saver = Some(saver);
        self
    }

    pub fn build(self) -> Result<Coordinator, StpaSecError> {
        let provider = self
            .provider
            .ok_or_else(|| StpaSecError::Config("a provider is required".to_string()))?;
        let gateway = self
            .gateway
            .ok_or_else(|| StpaSecError::Config("a persistence gateway is required".to_string()))?;

        let mut adapter = LlmAdapter::new(provider, self.concurrency.max_llm_calls)
            .with_call_deadline(self.concurrency.llm_call_deadline());
        if let Some(saver) = self.prompt_saver {
            adapter = adapter.with_prompt_saver(saver);
        }

        Ok(Coordinator {
            adapter: Arc::new(adapter),
            gateway,
            bus: ProgressBus::new(),
            mode: self.mode,
            concurrency: self.concurrency,
        })
    }
}

pub struct Coordinator {
    adapter: Arc<LlmAdapter>,
    gateway: Arc<dyn PersistenceGateway>,
    bus: ProgressBus,
    mode: ExecutionMode,
    concurrency: ConcurrencyConfig,
}

impl Coordinator {
    #[must_use]
    pub fn subscribe(&self) -> flume::Receiver<ProgressEvent> {
        self.bus.subscribe()
    }

    #[instrument(skip(self, system_description))]
    pub async fn run_step1(&self, system_description: &str) -> Result<RunOutcome, StpaSecError> {
        let analysis_id = uuid::Uuid::new_v4().to_string();
        let registry = Arc::new(ComponentRegistry::new());
        self.run(AnalysisStep::Step1, analysis_id, system_description, phase_graph::step1_phases(), registry, Vec::new())
            .await
    }

    /// Runs Step 2, bridging off the most recently persisted Step 1
    /// analysis if one exists: its stakeholder, adversary, and loss
    /// artifacts seed the initial state so Step 2 agents' prompts can
    /// reference what Step 1 already established, mirroring the
    /// `Analysis.parent_id` link spec §3 describes for Step 2 → Step 1.
    #[instrument(skip(self, system_description))]
    pub async fn run_step2(&self, system_description: &str) -> Result<RunOutcome, StpaSecError> {
        let analysis_id = uuid::Uuid::new_v4().to_string();
        let registry = Arc::new(ComponentRegistry::new());
        let seed = self.load_step1_bridge().await?;
        self.run(AnalysisStep::Step2, analysis_id, system_description, phase_graph::step2_phases(), registry, seed)
            .await
    }

    async fn load_step1_bridge(&self) -> Result<Vec<(String, Vec<Value>)>, StpaSecError> {
        let Some(parent) = self.gateway.fetch_latest_step1_for_db().await? else {
            return Ok(Vec::new());
        };

        let loader = PriorResultLoader::new(self.gateway.clone());
        let mut seed = Vec::new();
        for (kind, agent_types) in [
            ("stakeholders", &["stakeholder_analyst"][..]),
            ("adversaries", &["adversary_analyst"][..]),
            ("losses", &["loss_identification"][..]),
        ] {
            let records = loader.load(&parent.analysis_id, kind, agent_types).await?;
            if !records.is_empty() {
                seed.push((kind.to_string(), records.into_iter().map(|r| r.data).collect()));
            }
        }
        Ok(seed)
    }

    async fn run(
        &self,
        step: AnalysisStep,
        analysis_id: String,
        system_description: &str,
        phases: Vec<PhaseGroup>,
        registry: Arc<ComponentRegistry>,
        seed: Vec<(String, Vec<Value>)>,
    ) -> Result<RunOutcome, StpaSecError> {
        let emitter = self.bus.emitter();
        let id_generator = Arc::new(Mutex::new(IdGenerator::new()));
        let mut state = AnalysisState::new();
        for (category, items) in seed {
            state.extend(&category, items);
        }
        let mut validation_errors = Vec::new();

        let run_future = self.run_phases(
            step,
            &analysis_id,
            system_description,
            &phases,
            &mut state,
            &registry,
            &id_generator,
            &emitter,
            &mut validation_errors,
        );

        match tokio::time::timeout(self.concurrency.analysis_deadline(), run_future).await {
            Ok(result) => result?,
            Err(_) => return Err(StpaSecError::RunDeadlineExceeded),
        }

        let mut record = AnalysisRecord::new(&analysis_id, step);
        record.state = state.clone();
        record.status = RunStatus::Completed;
        record.touch();
        self.gateway.insert_analysis(record).await?;

        emitter.emit(ProgressEvent::run_completed(step)).ok();
        info!(%analysis_id, %step, "analysis run completed");

        let completeness_check = completeness::check_completeness(step, &state);
        if !completeness_check.is_complete {
            warn!(%analysis_id, summary = %completeness_check.summary, "analysis incomplete");
        }

        let (registry_report, registry_issues, validation_report, cross_reference_synthesis) = match step {
            AnalysisStep::Step2 => {
                let report = registry.report();
                let issues = validator::validate_step2_registry(&report);
                let synthesis = xref::synthesize_cross_references(&state);
                (Some(report), issues, None, Some(synthesis))
            }
            AnalysisStep::Step1 => (None, Vec::new(), Some(validator::validate_step1(&state)), None),
        };

        Ok(RunOutcome {
            analysis_id,
            step,
            state,
            registry_report,
            validation_report,
            registry_issues,
            cross_reference_synthesis,
            completeness_check,
            validation_errors,
        })
    }

    async fn run_phases(
        &self,
        step: AnalysisStep,
        analysis_id: &str,
        system_description: &str,
        phases: &[PhaseGroup],
        state: &mut AnalysisState,
        registry: &Arc<ComponentRegistry>,
        id_generator: &Arc<Mutex<IdGenerator>>,
        emitter: &Arc<dyn ProgressEmitter>,
        validation_errors: &mut Vec<String>,
    ) -> Result<(), StpaSecError> {
        for group in phases {
            let snapshot = state.snapshot();
            let mut join_set: JoinSet<(String, Vec<(String, Vec<Value>)>, Vec<String>)> = JoinSet::new();

            for agent_spec in &group.agents {
                let styles = if agent_spec.multi_style {
                    phase_graph::styles_for(self.mode, agent_spec.agent_name)
                } else {
                    vec![CognitiveStyle::Balanced]
                };

                let adapter = self.adapter.clone();
                let registry = registry.clone();
                let id_generator = id_generator.clone();
                let emitter = emitter.clone();
                let agent_deadline = self.concurrency.agent_deadline();
                let system_description = system_description.to_string();
                let snapshot = snapshot.clone();
                let agent_name = agent_spec.agent_name;
                let phase_kind = agent_spec.phase_kind.clone();
                let build = agent_spec.build;

                emitter.emit(ProgressEvent::phase_started(step, &phase_kind)).ok();

                join_set.spawn(async move {
                    let agent: Arc<dyn crate::agent::Agent> =
                        Arc::from(build(&system_description));

                    let mut contributions = Vec::with_capacity(styles.len());
                    let mut errors = Vec::new();

                    for style in styles {
                        emitter
                            .emit(ProgressEvent::agent_started(&phase_kind, agent_name, style))
                            .ok();

                        let ctx = crate::agent::AgentContext {
                            agent_type: agent_name,
                            phase: phase_kind.clone(),
                            cognitive_style: style,
                            adapter: adapter.clone(),
                            registry: registry.clone(),
                            id_generator: id_generator.clone(),
                            emitter: emitter.clone(),
                        };

                        let call = tokio::time::timeout(agent_deadline, agent.analyze(&snapshot, &ctx)).await;
                        match call {
                            Ok(Ok(outcome)) => {
                                emitter
                                    .emit(ProgressEvent::agent_completed(
                                        &phase_kind,
                                        agent_name,
                                        style,
                                        outcome.artifact_count(),
                                    ))
                                    .ok();
                                errors.extend(outcome.validation_errors.clone());
                                contributions.push((style, outcome.artifacts));
                            }
                            Ok(Err(err)) => {
                                emitter
                                    .emit(ProgressEvent::agent_failed(&phase_kind, agent_name, style, err.to_string()))
                                    .ok();
                                errors.push(format!("{agent_name} ({style}) failed: {err}"));
                            }
                            Err(_) => {
                                emitter
                                    .emit(ProgressEvent::agent_failed(
                                        &phase_kind,
                                        agent_name,
                                        style,
                                        "agent deadline exceeded",
                                    ))
                                    .ok();
                                errors.push(format!("{agent_name} ({style}) exceeded its deadline"));
                            }
                        }
                    }

                    let merged = merge_contributions(contributions);
                    emitter.emit(ProgressEvent::phase_completed(step, &phase_kind)).ok();
                    (agent_name.to_string(), merged, errors)
                });
            }

            while let Some(joined) = join_set.join_next().await {
                let (agent_name, artifacts, errors) = joined.map_err(StpaSecError::from)?;
                for error in &errors {
                    warn!(agent = %agent_name, %error, "agent reported a validation error");
                }
                validation_errors.extend(errors);
                for (category, items) in artifacts {
                    for item in &items {
                        let identifier = item.get("identifier").and_then(Value::as_str).unwrap_or_default();
                        if identifier.is_empty() {
                            continue;
                        }
                        let record = ArtifactRecord::new(analysis_id, category.clone(), agent_name.clone(), identifier, item.clone());
                        self.gateway.insert_artifact(&category, record).await?;
                    }
                    state.extend(&category, items);
                }
            }
        }

        Ok(())
    }
}

/// Merges every cognitive style's contribution for one agent through
/// Cognitive Synthesis, stamping `confidence` and `found_by_styles` onto
/// each surviving artifact the way `step1_coordinator.py`'s per-finding
/// maps do.
fn merge_contributions(
    contributions: Vec<(CognitiveStyle, Vec<(String, Vec<Value>)>)>,
) -> Vec<(String, Vec<Value>)> {
    let mut by_category: std::collections::BTreeMap<String, Vec<StyleContribution>> =
        std::collections::BTreeMap::new();

    for (style, artifacts) in contributions {
        for (category, items) in artifacts {
            by_category
                .entry(category)
                .or_default()
                .push(StyleContribution { style, items });
        }
    }

    by_category
        .into_iter()
        .map(|(category, contributions)| {
            let synthesized = synthesize(contributions);
            let items = synthesized
                .into_iter()
                .map(|artifact| {
                    let mut value = artifact.value;
                    if let Some(obj) = value.as_object_mut() {
                        obj.insert("confidence".to_string(), Value::String(artifact.confidence.as_str().to_string()));
                        obj.insert(
                            "found_by_styles".to_string(),
                            Value::Array(
                                artifact
                                    .found_by_styles
                                    .iter()
                                    .map(|s| Value::String(s.to_string()))
                                    .collect(),
                            ),
                        );
                    }
                    value
                })
                .collect();
            (category, items)
        })
        .collect()
}
