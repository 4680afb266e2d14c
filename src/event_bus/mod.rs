//! Progress event transport.
//!
//! Generalizes `weavegraph::event_bus`'s hub/sink split: a single
//! broadcast-backed [`ProgressBus`] hands out cheap [`ProgressEmitter`]
//! handles to every in-flight agent, and any number of [`ProgressSink`]s can
//! subscribe independently (an in-process UI, a test harness capturing
//! events, stdout for a CLI). Unlike the teacher's bus, there is only one
//! event shape ([`ProgressEvent`]) since the coordinator's progress model
//! (spec §6.6) is flatter than a full node/LLM-streaming event taxonomy.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{AnalysisStep, CognitiveStyle, PhaseKind};

/// A progress notification emitted by the coordinator as an analysis run
/// proceeds. Corresponds to spec §6.6's progress event stream.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ProgressEvent {
    PhaseStarted {
        step: AnalysisStep,
        phase: String,
        when: DateTime<Utc>,
    },
    AgentStarted {
        phase: String,
        agent: String,
        style: CognitiveStyle,
        when: DateTime<Utc>,
    },
    AgentRetrying {
        phase: String,
        agent: String,
        attempt: u32,
        when: DateTime<Utc>,
    },
    AgentCompleted {
        phase: String,
        agent: String,
        style: CognitiveStyle,
        artifact_count: usize,
        when: DateTime<Utc>,
    },
    AgentFailed {
        phase: String,
        agent: String,
        style: CognitiveStyle,
        message: String,
        when: DateTime<Utc>,
    },
    PhaseCompleted {
        step: AnalysisStep,
        phase: String,
        when: DateTime<Utc>,
    },
    RunCompleted {
        step: AnalysisStep,
        when: DateTime<Utc>,
    },
}

impl ProgressEvent {
    pub fn phase_started(step: AnalysisStep, phase: &PhaseKind) -> Self {
        ProgressEvent::PhaseStarted {
            step,
            phase: phase.to_string(),
            when: Utc::now(),
        }
    }

    pub fn phase_completed(step: AnalysisStep, phase: &PhaseKind) -> Self {
        ProgressEvent::PhaseCompleted {
            step,
            phase: phase.to_string(),
            when: Utc::now(),
        }
    }

    pub fn agent_started(phase: &PhaseKind, agent: &str, style: CognitiveStyle) -> Self {
        ProgressEvent::AgentStarted {
            phase: phase.to_string(),
            agent: agent.to_string(),
            style,
            when: Utc::now(),
        }
    }

    pub fn agent_retrying(phase: &PhaseKind, agent: &str, attempt: u32) -> Self {
        ProgressEvent::AgentRetrying {
            phase: phase.to_string(),
            agent: agent.to_string(),
            attempt,
            when: Utc::now(),
        }
    }

    pub fn agent_completed(
        phase: &PhaseKind,
        agent: &str,
        style: CognitiveStyle,
        artifact_count: usize,
    ) -> Self {
        ProgressEvent::AgentCompleted {
            phase: phase.to_string(),
            agent: agent.to_string(),
            style,
            artifact_count,
            when: Utc::now(),
        }
    }

    pub fn agent_failed(
        phase: &PhaseKind,
        agent: &str,
        style: CognitiveStyle,
        message: impl Into<String>,
    ) -> Self {
        ProgressEvent::AgentFailed {
            phase: phase.to_string(),
            agent: agent.to_string(),
            style,
            message: message.into(),
            when: Utc::now(),
        }
    }

    pub fn run_completed(step: AnalysisStep) -> Self {
        ProgressEvent::RunCompleted {
            step,
            when: Utc::now(),
        }
    }
}

impl fmt::Display for ProgressEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgressEvent::PhaseStarted { phase, .. } => write!(f, "phase `{phase}` started"),
            ProgressEvent::AgentStarted { phase, agent, style, .. } => {
                write!(f, "[{phase}] agent `{agent}` ({style}) started")
            }
            ProgressEvent::AgentRetrying { phase, agent, attempt, .. } => {
                write!(f, "[{phase}] agent `{agent}` retry {attempt}")
            }
            ProgressEvent::AgentCompleted { phase, agent, style, artifact_count, .. } => write!(
                f,
                "[{phase}] agent `{agent}` ({style}) completed with {artifact_count} artifacts"
            ),
            ProgressEvent::AgentFailed { phase, agent, style, message, .. } => {
                write!(f, "[{phase}] agent `{agent}` ({style}) failed: {message}")
            }
            ProgressEvent::PhaseCompleted { phase, .. } => write!(f, "phase `{phase}` completed"),
            ProgressEvent::RunCompleted { step, .. } => write!(f, "{step} run completed"),
        }
    }
}

#[derive(Debug, Error)]
pub enum EmitterError {
    #[error("progress bus closed")]
    Closed,
}

/// Handle given to agents and the coordinator for emitting progress
/// events, mirroring `weavegraph::event_bus::EventEmitter`.
pub trait ProgressEmitter: Send + Sync + fmt::Debug {
    fn emit(&self, event: ProgressEvent) -> Result<(), EmitterError>;
}

#[derive(Debug)]
pub struct FlumeEmitter {
    sender: flume::Sender<ProgressEvent>,
}

impl ProgressEmitter for FlumeEmitter {
    fn emit(&self, event: ProgressEvent) -> Result<(), EmitterError> {
        self.sender.send(event).map_err(|_| EmitterError::Closed)
    }
}

/// A broadcast-free, single-consumer progress channel. For the common case
/// of one coordinator run consumed by one subscriber (a CLI progress bar,
/// a test harness), an unbounded mpmc `flume` channel is simpler than the
/// teacher's broadcast hub and needs no sink worker tasks.
pub struct ProgressBus {
    sender: flume::Sender<ProgressEvent>,
    receiver: flume::Receiver<ProgressEvent>,
}

impl Default for ProgressBus {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressBus {
    #[must_use]
    pub fn new() -> Self {
        let (sender, receiver) = flume::unbounded();
        Self { sender, receiver }
    }

    #[must_use]
    pub fn emitter(&self) -> Arc<dyn ProgressEmitter> {
        Arc::new(FlumeEmitter {
            sender: self.sender.clone(),
        })
    }

    #[must_use]
    pub fn subscribe(&self) -> flume::Receiver<ProgressEvent> {
        self.receiver.clone()
    }
}

/// A capturing sink for tests, grounded on `weavegraph::event_bus::MemorySink`.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: parking_lot::Mutex<Vec<ProgressEvent>>,
}

impl MemorySink {
    pub fn drain(&self, receiver: &flume::Receiver<ProgressEvent>) {
        let mut events = self.events.lock();
        while let Ok(event) = receiver.try_recv() {
            events.push(event);
        }
    }

    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emitted_events_are_received() {
        let bus = ProgressBus::new();
        let emitter = bus.emitter();
        let rx = bus.subscribe();

        emitter
            .emit(ProgressEvent::run_completed(AnalysisStep::Step1))
            .unwrap();

        let event = rx.try_recv().unwrap();
        assert!(matches!(event, ProgressEvent::RunCompleted { .. }));
    }

    #[test]
    fn memory_sink_captures_drained_events() {
        let bus = ProgressBus::new();
        let emitter = bus.emitter();
        let rx = bus.subscribe();
        let sink = MemorySink::default();

        emitter
            .emit(ProgressEvent::run_completed(AnalysisStep::Step2))
            .unwrap();
        sink.drain(&rx);

        assert_eq!(sink.events().len(), 1);
    }
}
