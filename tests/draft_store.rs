//! Integration coverage for the Draft/Version Store's public API: a
//! draft accumulates edits across multiple calls and a commit lands them
//! onto a new version without disturbing the version it was based on.

use serde_json::json;

use stpasec_core::draft::{DraftError, DraftStore, VersionType};
use stpasec_core::state::AnalysisState;

fn seeded_store() -> (DraftStore, String) {
    let store = DraftStore::new();
    let mut state = AnalysisState::new();
    state.extend(
        "hazards",
        vec![json!({"identifier": "H-1", "description": "payment authorization bypassed under load"})],
    );
    store.seed_version("an-e2e", state, "coordinator", VersionType::Commit);
    (store, "an-e2e".to_string())
}

#[test]
fn draft_lifecycle_from_creation_to_commit() {
    let (store, analysis_id) = seeded_store();

    let draft = store.get_or_create_draft(&analysis_id, "reviewer-1").unwrap();
    store
        .accumulate_edit(
            &draft.draft_id,
            "hazards",
            "H-1",
            json!({"description": "payment authorization bypassed or delayed under peak load"}),
            false,
        )
        .unwrap();
    store
        .accumulate_edit(
            &draft.draft_id,
            "hazards",
            "H-2",
            json!({"description": "settlement ledger diverges from processor records"}),
            true,
        )
        .unwrap();

    let version_number = store.commit(&draft.draft_id, "broaden hazard wording", "reviewer-1").unwrap();
    assert_eq!(version_number, 2);

    let latest = store.latest_version(&analysis_id).unwrap();
    assert_eq!(latest.version_number, 2);

    let hazards = latest.state_snapshot.items("hazards");
    assert_eq!(hazards.len(), 2);
    let existing = hazards.iter().find(|h| h["identifier"] == "H-1").unwrap();
    assert_eq!(existing["description"], "payment authorization bypassed or delayed under peak load");
    let added = hazards.iter().find(|h| h["identifier"] == "H-2").unwrap();
    assert_eq!(added["frozen"], true);
}

#[test]
fn two_users_get_independent_drafts() {
    let (store, analysis_id) = seeded_store();
    let reviewer = store.get_or_create_draft(&analysis_id, "reviewer-1").unwrap();
    let analyst = store.get_or_create_draft(&analysis_id, "analyst-2").unwrap();
    assert_ne!(reviewer.draft_id, analyst.draft_id);
}

#[test]
fn drafting_against_an_unknown_analysis_fails() {
    let store = DraftStore::new();
    let err = store.get_or_create_draft("does-not-exist", "reviewer-1").unwrap_err();
    assert!(matches!(err, DraftError::NoBaseVersion(_)));
}

#[test]
fn impact_reports_scale_with_dependents() {
    let (store, _analysis_id) = seeded_store();
    store.register_dependency("H-1", "CA-1");
    let report = store.impact("H-1");
    assert_eq!(report.dependents, vec!["CA-1".to_string()]);
}
