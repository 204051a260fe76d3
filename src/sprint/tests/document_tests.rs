//! Reading and writing YAML sprint documents.

use crate::sprint::domain::{
    PhaseStatus, SprintDocument, SprintDocumentError, SprintDomainError, TaskKey, TrackerId,
};
use rstest::rstest;

const PLAN: &str = r##"
sprint: payments-hardening
labels: ["sprint:payments"]
phases:
  - name: Infra
    status: in-progress
    tasks:
      - title: Add healthcheck
        description: Expose /healthz
        labels: ["priority:high"]
        issue: 50
      - title: Wire alerts
        depends_on: [Add healthcheck]
        issue: "#51"
  - name: Rollout
    tasks:
      - title: Enable in production
"##;

#[rstest]
fn documents_parse_into_plans() {
    let model = SprintDocument::from_yaml_str(PLAN).expect("plan should parse");

    assert_eq!(model.sprint(), "payments-hardening");
    assert!(model.labels().contains("sprint:payments"));
    let statuses: Vec<PhaseStatus> = model.phases().iter().map(|phase| phase.status()).collect();
    assert_eq!(statuses, vec![PhaseStatus::InProgress, PhaseStatus::Pending]);

    let links = model.linked_ids();
    assert_eq!(
        links.get(&TrackerId::from(50)),
        Some(&TaskKey::new("Infra", "Add healthcheck"))
    );
    assert_eq!(
        links.get(&TrackerId::from(51)),
        Some(&TaskKey::new("Infra", "Wire alerts"))
    );
    let alerts = model
        .task(&TaskKey::new("Infra", "Wire alerts"))
        .expect("task should exist");
    assert!(alerts.dependencies().contains("Add healthcheck"));
}

#[rstest]
fn rendered_documents_keep_links() {
    let model = SprintDocument::from_yaml_str(PLAN).expect("plan should parse");
    let rendered = SprintDocument::to_yaml_string(&model).expect("plan should render");
    let reparsed = SprintDocument::from_yaml_str(&rendered).expect("render should parse");

    assert_eq!(reparsed, model);
    assert!(rendered.contains("status: in_progress"));
}

#[rstest]
fn unknown_status_is_invalid() {
    let text = "sprint: s\nphases:\n  - name: Infra\n    status: someday\n";
    assert!(matches!(
        SprintDocument::from_yaml_str(text),
        Err(SprintDocumentError::Invalid(
            SprintDomainError::UnknownPhaseStatus(_)
        ))
    ));
}

#[rstest]
fn duplicate_titles_are_invalid() {
    let text = "sprint: s\nphases:\n  - name: Infra\n    tasks:\n      - title: A\n      - title: A\n";
    assert!(matches!(
        SprintDocument::from_yaml_str(text),
        Err(SprintDocumentError::Invalid(
            SprintDomainError::DuplicateTask { .. }
        ))
    ));
}

#[rstest]
#[case("phases: []\n")]
#[case("sprint: [not, a, name]\n")]
fn malformed_documents_fail_to_parse(#[case] text: &str) {
    assert!(matches!(
        SprintDocument::from_yaml_str(text),
        Err(SprintDocumentError::Parse(_))
    ));
}
