//! Component Registry (C5): the shared identifier ledger every Step 2
//! agent reads from and writes to.
//!
//! Ported close to 1:1 from
//! `original_source/apps/backend/core/agents/step2_agents/component_registry.py`,
//! since that file's behavior — first-register-wins conflicts, bidirectional
//! reference bookkeeping, orphan detection excluding processes, and the
//! exact prompt-context Markdown shape — is load-bearing for every
//! downstream Step 2 agent's prompt. Made concurrency-safe with
//! `parking_lot::RwLock`, grounded on the teacher's dependency on
//! `parking_lot` for shared mutable state.

use std::collections::{BTreeMap, BTreeSet};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Controller,
    Process,
    DualRole,
}

impl ComponentKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ComponentKind::Controller => "controller",
            ComponentKind::Process => "process",
            ComponentKind::DualRole => "dual_role",
        }
    }
}

impl std::fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Component {
    pub identifier: String,
    pub name: String,
    pub kind: ComponentKind,
    pub description: String,
    pub source: String,
    #[serde(default)]
    pub references: BTreeSet<String>,
    #[serde(default)]
    pub referenced_by: BTreeSet<String>,
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("component `{0}` is already registered")]
    DuplicateIdentifier(String),
    #[error("reference from `{from}` to `{to}` touches an undefined component")]
    UndefinedReference { from: String, to: String },
}

/// Outcome of [`ComponentRegistry::register`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegisterOutcome {
    Ok,
    Duplicate,
}

impl RegisterOutcome {
    #[must_use]
    pub fn is_ok(self) -> bool {
        self == RegisterOutcome::Ok
    }
}

/// Outcome of [`ComponentRegistry::add_reference`], distinguishing which
/// endpoint was undefined the way `component_registry.py`'s
/// `add_reference` emits separate "Reference from"/"Reference to"
/// errors rather than one generic message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReferenceOutcome {
    Ok,
    UndefinedSource,
    UndefinedTarget,
}

impl ReferenceOutcome {
    #[must_use]
    pub fn is_ok(self) -> bool {
        self == ReferenceOutcome::Ok
    }
}

#[derive(Debug, Default)]
struct RegistryInner {
    components: BTreeMap<String, Component>,
    undefined_references: BTreeSet<String>,
    validation_errors: Vec<String>,
}

/// Concurrency-safe component ledger. `register`/`add_reference` take the
/// write lock for the duration of a single atomic check-and-set so the
/// first-register-wins policy never races.
#[derive(Debug, Default)]
pub struct ComponentRegistry {
    inner: RwLock<RegistryInner>,
}

impl ComponentRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a component. Returns [`RegisterOutcome::Duplicate`] (and
    /// records a validation error) if the identifier is already taken —
    /// first registration wins, later ones are rejected rather than
    /// overwriting.
    pub fn register(
        &self,
        identifier: impl Into<String>,
        name: impl Into<String>,
        kind: ComponentKind,
        description: impl Into<String>,
        source: impl Into<String>,
    ) -> RegisterOutcome {
        let identifier = identifier.into();
        let mut inner = self.inner.write();
        if inner.components.contains_key(&identifier) {
            inner
                .validation_errors
                .push(format!("Component {identifier} already registered"));
            return RegisterOutcome::Duplicate;
        }
        inner.components.insert(
            identifier.clone(),
            Component {
                identifier,
                name: name.into(),
                kind,
                description: description.into(),
                source: source.into(),
                references: BTreeSet::new(),
                referenced_by: BTreeSet::new(),
            },
        );
        RegisterOutcome::Ok
    }

    /// Records a bidirectional reference between two already-registered
    /// components. Checks `from` before `to`, matching the original
    /// system's precedence, so a reference with both endpoints undefined
    /// reports `UndefinedSource`.
    pub fn add_reference(&self, from: &str, to: &str) -> ReferenceOutcome {
        let mut inner = self.inner.write();
        if !inner.components.contains_key(from) {
            inner.undefined_references.insert(from.to_string());
            inner
                .validation_errors
                .push(format!("Reference from undefined component: {from}"));
            return ReferenceOutcome::UndefinedSource;
        }
        if !inner.components.contains_key(to) {
            inner.undefined_references.insert(to.to_string());
            inner
                .validation_errors
                .push(format!("Reference to undefined component: {to}"));
            return ReferenceOutcome::UndefinedTarget;
        }
        if let Some(component) = inner.components.get_mut(from) {
            component.references.insert(to.to_string());
        }
        if let Some(component) = inner.components.get_mut(to) {
            component.referenced_by.insert(from.to_string());
        }
        ReferenceOutcome::Ok
    }

    #[must_use]
    pub fn contains(&self, identifier: &str) -> bool {
        self.inner.read().components.contains_key(identifier)
    }

    #[must_use]
    pub fn get(&self, identifier: &str) -> Option<Component> {
        self.inner.read().components.get(identifier).cloned()
    }

    #[must_use]
    pub fn by_kind(&self, kind: ComponentKind) -> Vec<Component> {
        self.inner
            .read()
            .components
            .values()
            .filter(|c| c.kind == kind)
            .cloned()
            .collect()
    }

    /// Builds the validation report: totals by kind, undefined references,
    /// orphaned components (no references either direction, excluding
    /// `Process` components — a controlled process with no recorded
    /// control action is still a legitimate, if incomplete, entry).
    #[must_use]
    pub fn report(&self) -> RegistryReport {
        let inner = self.inner.read();
        let mut controllers = 0;
        let mut processes = 0;
        let mut dual_roles = 0;
        let mut orphaned = Vec::new();

        for component in inner.components.values() {
            match component.kind {
                ComponentKind::Controller => controllers += 1,
                ComponentKind::Process => processes += 1,
                ComponentKind::DualRole => dual_roles += 1,
            }
            let is_orphan = component.references.is_empty() && component.referenced_by.is_empty();
            if is_orphan && component.kind != ComponentKind::Process {
                orphaned.push(component.identifier.clone());
            }
        }

        RegistryReport {
            total_components: inner.components.len(),
            controllers,
            processes,
            dual_roles,
            undefined_references: inner.undefined_references.iter().cloned().collect(),
            orphaned_components: orphaned,
            validation_errors: inner.validation_errors.clone(),
            is_valid: inner.undefined_references.is_empty() && inner.validation_errors.is_empty(),
        }
    }

    /// Builds the Markdown prompt-context block agents are instructed to
    /// treat as the closed set of valid identifiers. The section layout
    /// and closing instruction are carried verbatim from the original
    /// Python system since downstream agent prompts depend on this exact
    /// wording.
    #[must_use]
    pub fn prompt_context(&self) -> String {
        let inner = self.inner.read();
        let mut out = String::from("## Existing Components in Control Structure\n\n");

        let mut section = |title: &str, kind: ComponentKind| {
            let mut entries: Vec<&Component> = inner
                .components
                .values()
                .filter(|c| c.kind == kind)
                .collect();
            entries.sort_by(|a, b| a.identifier.cmp(&b.identifier));
            if entries.is_empty() {
                return;
            }
            out.push_str(&format!("### {title}:\n"));
            for component in entries {
                out.push_str(&format!(
                    "- {}: {} - {}\n",
                    component.identifier, component.name, component.description
                ));
            }
            out.push('\n');
        };

        section("Controllers", ComponentKind::Controller);
        section("Controlled Processes", ComponentKind::Process);
        section("Dual-Role Components", ComponentKind::DualRole);

        out.push_str(
            "**IMPORTANT**: Only reference the component identifiers listed above. Do NOT create new component identifiers.\n",
        );
        out
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RegistryReport {
    pub total_components: usize,
    pub controllers: usize,
    pub processes: usize,
    pub dual_roles: usize,
    pub undefined_references: Vec<String>,
    pub orphaned_components: Vec<String>,
    pub validation_errors: Vec<String>,
    pub is_valid: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_register_wins_on_duplicate_identifier() {
        let registry = ComponentRegistry::new();
        assert_eq!(
            registry.register("CTRL-1", "Payment Controller", ComponentKind::Controller, "desc", "agent"),
            RegisterOutcome::Ok
        );
        assert_eq!(
            registry.register("CTRL-1", "Duplicate", ComponentKind::Controller, "desc", "agent"),
            RegisterOutcome::Duplicate
        );
        assert_eq!(registry.get("CTRL-1").unwrap().name, "Payment Controller");
    }

    #[test]
    fn add_reference_requires_both_endpoints() {
        let registry = ComponentRegistry::new();
        registry.register("CTRL-1", "Controller", ComponentKind::Controller, "d", "agent");
        assert_eq!(registry.add_reference("CTRL-1", "PROC-1"), ReferenceOutcome::UndefinedTarget);
        let report = registry.report();
        assert!(report.undefined_references.contains(&"PROC-1".to_string()));
        assert!(!report.is_valid);
    }

    #[test]
    fn add_reference_reports_undefined_source_before_target() {
        let registry = ComponentRegistry::new();
        assert_eq!(registry.add_reference("CTRL-9", "PROC-9"), ReferenceOutcome::UndefinedSource);
    }

    #[test]
    fn add_reference_updates_both_directions() {
        let registry = ComponentRegistry::new();
        registry.register("CTRL-1", "Controller", ComponentKind::Controller, "d", "agent");
        registry.register("PROC-1", "Process", ComponentKind::Process, "d", "agent");
        assert_eq!(registry.add_reference("CTRL-1", "PROC-1"), ReferenceOutcome::Ok);

        let ctrl = registry.get("CTRL-1").unwrap();
        let proc = registry.get("PROC-1").unwrap();
        assert!(ctrl.references.contains("PROC-1"));
        assert!(proc.referenced_by.contains("CTRL-1"));
    }

    #[test]
    fn orphan_detection_excludes_processes() {
        let registry = ComponentRegistry::new();
        registry.register("CTRL-1", "Controller", ComponentKind::Controller, "d", "agent");
        registry.register("PROC-1", "Process", ComponentKind::Process, "d", "agent");
        let report = registry.report();
        assert!(report.orphaned_components.contains(&"CTRL-1".to_string()));
        assert!(!report.orphaned_components.contains(&"PROC-1".to_string()));
    }

    #[test]
    fn prompt_context_lists_sorted_entries_by_section() {
        let registry = ComponentRegistry::new();
        registry.register("CTRL-2", "Second", ComponentKind::Controller, "d2", "agent");
        registry.register("CTRL-1", "First", ComponentKind::Controller, "d1", "agent");
        let context = registry.prompt_context();
        let first_pos = context.find("CTRL-1").unwrap();
        let second_pos = context.find("CTRL-2").unwrap();
        assert!(first_pos < second_pos);
        assert!(context.contains("Do NOT create new component identifiers"));
    }
}
