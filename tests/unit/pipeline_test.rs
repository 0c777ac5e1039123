//! Tests for the per-repository pipeline driven through the orchestrator
//!
//! Uses the recording hosting API so the order and number of remote
//! operations can be checked.

use std::fs;

use image_updater::adapters::FileAuditStore;
use image_updater::core::models::DeprecationRegistry;
use image_updater::core::ports::FixedTag;
use image_updater::core::services::{
    Orchestrator, PublicationState, PublishSettings, RepoOutcome, RunError,
};
use tempfile::TempDir;

use crate::common::fixtures::{
    ALIASED_DEPRECATED, ANNOTATED_DEPRECATED, CURRENT_IMAGE, DOCKER_ONLY, NESTED_DEPRECATED, TOP_LEVEL_DEPRECATED, WITH_ANOMALY, yaml_str,
};
use crate::common::mocks::{Call, RecordingHost, ScriptedTags};

fn settings() -> PublishSettings {
    PublishSettings {
        branch: "ImageUpdates".to_string(),
        config_path: ".circleci/config.yml".to_string(),
        commit_message: "Automatic image update for deprecated images.".to_string(),
        pr_title: "Update deprecated image tags".to_string(),
        pr_body: "Bulk update of deprecated image tags.".to_string(),
    }
}

// =============================================================================
// END-TO-END
// =============================================================================

#[test]
fn test_svc_a_end_to_end() {
    let temp = TempDir::new().unwrap();
    let host = RecordingHost::new().with_repo("svc-a", Some(NESTED_DEPRECATED));
    let audit = FileAuditStore::new(temp.path());
    let registry = DeprecationRegistry::default();
    let settings = settings();
    let mut tags = ScriptedTags::new(&["2024.01.1"]);

    let report = Orchestrator::new(&host, &audit, &registry, &settings)
        .run("acme", &mut tags)
        .unwrap();

    // Local audit file holds the patched document at the same position
    let saved = fs::read_to_string(temp.path().join("svc-a.yml")).unwrap();
    assert_eq!(
        yaml_str(&saved, &["jobs", "build", "machine", "image"]).as_deref(),
        Some("ubuntu-2204:2024.01.1")
    );
    assert_eq!(yaml_str(&saved, &["jobs", "build", "image"]), None);

    // Branch, commit and PR each requested exactly once, in that order
    let calls = host.calls_for("svc-a");
    let writes: Vec<&Call> = calls.iter().filter(|c| c.is_write()).collect();
    assert_eq!(writes.len(), 3);
    assert!(matches!(
        writes[0],
        Call::CreateBranch { branch, sha, .. } if branch == "ImageUpdates" && sha == "svc-a-main-head"
    ));
    let Call::UpdateFile { update, .. } = writes[1] else {
        panic!("expected commit second, got {:?}", writes[1]);
    };
    assert_eq!(update.base_sha, "svc-a-blob");
    assert_eq!(update.branch, "ImageUpdates");
    assert_eq!(update.path, ".circleci/config.yml");
    assert_eq!(update.content, saved);
    let Call::CreatePullRequest { draft, .. } = writes[2] else {
        panic!("expected pull request third, got {:?}", writes[2]);
    };
    assert_eq!(draft.head, "ImageUpdates");
    assert_eq!(draft.base, "main");

    assert_eq!(tags.asked, vec![(
        "svc-a".to_string(),
        "build".to_string(),
        "ubuntu-2204:2023.08.1".to_string()
    )]);
    assert!(matches!(
        &report.repositories[0].outcome,
        RepoOutcome::Published { pr_url, .. } if pr_url == "https://github.com/acme/svc-a/pull/1"
    ));
}

#[test]
fn test_top_level_image_stays_top_level() {
    let temp = TempDir::new().unwrap();
    let host = RecordingHost::new().with_repo("mobile", Some(TOP_LEVEL_DEPRECATED));
    let audit = FileAuditStore::new(temp.path());
    let registry = DeprecationRegistry::default();
    let settings = settings();

    Orchestrator::new(&host, &audit, &registry, &settings)
        .run("acme", &mut ScriptedTags::new(&[""]))
        .unwrap();

    let saved = fs::read_to_string(temp.path().join("mobile.yml")).unwrap();
    assert_eq!(
        yaml_str(&saved, &["jobs", "mobile", "image"]).as_deref(),
        Some("android:default")
    );
    let doc: serde_yaml::Value = serde_yaml::from_str(&saved).unwrap();
    assert_eq!(doc["jobs"]["mobile"]["machine"], serde_yaml::Value::Bool(true));
}

// =============================================================================
// NO-OP AND SKIPS
// =============================================================================

#[test]
fn test_no_deprecated_image_short_circuits() {
    let temp = TempDir::new().unwrap();
    let host = RecordingHost::new().with_repo("svc-current", Some(CURRENT_IMAGE));
    let audit = FileAuditStore::new(temp.path());
    let registry = DeprecationRegistry::default();
    let settings = settings();
    let mut tags = ScriptedTags::new(&[]);

    let report = Orchestrator::new(&host, &audit, &registry, &settings)
        .run("acme", &mut tags)
        .unwrap();

    assert_eq!(report.repositories[0].outcome, RepoOutcome::Unchanged { anomalies: 0 });
    assert!(tags.asked.is_empty());
    assert!(host.calls().iter().all(|c| !c.is_write()));
    assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 0);
}

#[test]
fn test_absent_and_docker_only_configs_are_skipped() {
    let temp = TempDir::new().unwrap();
    let host = RecordingHost::new()
        .with_repo("no-ci", None)
        .with_repo("docker", Some(DOCKER_ONLY))
        .with_repo("svc-a", Some(NESTED_DEPRECATED));
    let audit = FileAuditStore::new(temp.path());
    let registry = DeprecationRegistry::default();
    let settings = settings();

    let report = Orchestrator::new(&host, &audit, &registry, &settings)
        .run("acme", &mut FixedTag::default())
        .unwrap();

    assert!(matches!(report.repositories[0].outcome, RepoOutcome::Skipped { .. }));
    assert!(matches!(report.repositories[1].outcome, RepoOutcome::Skipped { .. }));
    assert!(matches!(report.repositories[2].outcome, RepoOutcome::Published { .. }));
    assert_eq!(report.untouched(), 2);
}

#[test]
fn test_anomalous_job_skipped_other_jobs_patched() {
    let temp = TempDir::new().unwrap();
    let host = RecordingHost::new().with_repo("svc-a", Some(WITH_ANOMALY));
    let audit = FileAuditStore::new(temp.path());
    let registry = DeprecationRegistry::default();
    let settings = settings();

    let report = Orchestrator::new(&host, &audit, &registry, &settings)
        .run("acme", &mut FixedTag::default())
        .unwrap();

    let RepoOutcome::Published { changes, .. } = &report.repositories[0].outcome else {
        panic!("expected publication, got {:?}", report.repositories[0].outcome);
    };
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].job, "build");
    assert_eq!(changes[0].new_image, "ubuntu-2204:default");
}

// =============================================================================
// PUBLICATION FAILURES
// =============================================================================

#[test]
fn test_fatal_enumeration_failure() {
    let host = RecordingHost::new().failing_enumeration(404);
    let audit = FileAuditStore::new(TempDir::new().unwrap().path());
    let registry = DeprecationRegistry::default();
    let settings = settings();

    let err = Orchestrator::new(&host, &audit, &registry, &settings)
        .run("ghost-org", &mut FixedTag::default())
        .unwrap_err();

    assert!(matches!(err, RunError::Authorization { ref organization, .. } if organization == "ghost-org"));
    assert_eq!(host.calls().len(), 1);
}

#[test]
fn test_branch_conflict_stops_repo_not_run() {
    let temp = TempDir::new().unwrap();
    let host = RecordingHost::new()
        .with_repo("svc-a", Some(NESTED_DEPRECATED))
        .with_repo("svc-b", Some(NESTED_DEPRECATED))
        .failing_branch("svc-a", 422);
    let audit = FileAuditStore::new(temp.path());
    let registry = DeprecationRegistry::default();
    let settings = settings();

    let report = Orchestrator::new(&host, &audit, &registry, &settings)
        .run("acme", &mut FixedTag::new("2024.01.1"))
        .unwrap();

    let svc_a_writes: Vec<Call> = host.calls_for("svc-a").into_iter().filter(Call::is_write).collect();
    assert_eq!(svc_a_writes.len(), 1);
    assert!(matches!(
        report.repositories[0].outcome,
        RepoOutcome::Aborted {
            stage: PublicationState::BranchPending,
            http_status: Some(422),
            ..
        }
    ));
    // The audit copy is kept even though publication failed
    assert!(temp.path().join("svc-a.yml").exists());
    assert!(matches!(report.repositories[1].outcome, RepoOutcome::Published { .. }));
}

#[test]
fn test_content_conflict_prevents_pull_request() {
    let temp = TempDir::new().unwrap();
    let host = RecordingHost::new()
        .with_repo("svc-a", Some(NESTED_DEPRECATED))
        .failing_update("svc-a", 409);
    let audit = FileAuditStore::new(temp.path());
    let registry = DeprecationRegistry::default();
    let settings = settings();

    let report = Orchestrator::new(&host, &audit, &registry, &settings)
        .run("acme", &mut FixedTag::default())
        .unwrap();

    assert!(
        !host
            .calls()
            .iter()
            .any(|c| matches!(c, Call::CreatePullRequest { .. }))
    );
    let RepoOutcome::Aborted { stage, error, .. } = &report.repositories[0].outcome else {
        panic!("expected abort");
    };
    assert_eq!(*stage, PublicationState::CommitPending);
    assert!(error.contains("changed since it was read"));
}

#[test]
fn test_pull_request_failure_reported() {
    let temp = TempDir::new().unwrap();
    let host = RecordingHost::new()
        .with_repo("svc-a", Some(NESTED_DEPRECATED))
        .failing_pull_request("svc-a", 422);
    let audit = FileAuditStore::new(temp.path());
    let registry = DeprecationRegistry::default();
    let settings = settings();

    let report = Orchestrator::new(&host, &audit, &registry, &settings)
        .run("acme", &mut FixedTag::default())
        .unwrap();

    assert_eq!(report.failed(), 1);
    assert!(matches!(
        report.repositories[0].outcome,
        RepoOutcome::Aborted {
            stage: PublicationState::PrPending,
            ..
        }
    ));
}

#[test]
fn test_dry_run_makes_no_remote_writes() {
    let temp = TempDir::new().unwrap();
    let host = RecordingHost::new().with_repo("svc-a", Some(NESTED_DEPRECATED));
    let audit = FileAuditStore::new(temp.path());
    let registry = DeprecationRegistry::default();
    let settings = settings();

    let report = Orchestrator::new(&host, &audit, &registry, &settings)
        .dry_run(true)
        .run("acme", &mut FixedTag::default())
        .unwrap();

    assert!(report.dry_run);
    assert!(host.calls().iter().all(|c| !c.is_write()));
    assert!(temp.path().join("svc-a.yml").exists());
}

#[test]
fn test_tag_source_failure_is_per_repo() {
    let temp = TempDir::new().unwrap();
    let host = RecordingHost::new()
        .with_repo("svc-a", Some(NESTED_DEPRECATED))
        .with_repo("svc-b", Some(CURRENT_IMAGE));
    let audit = FileAuditStore::new(temp.path());
    let registry = DeprecationRegistry::default();
    let settings = settings();

    let report = Orchestrator::new(&host, &audit, &registry, &settings)
        .run("acme", &mut ScriptedTags::new(&[]))
        .unwrap();

    assert!(matches!(report.repositories[0].outcome, RepoOutcome::Failed { .. }));
    assert_eq!(report.repositories[1].outcome, RepoOutcome::Unchanged { anomalies: 0 });
}

// =============================================================================
// SOURCE FIDELITY
// =============================================================================

#[test]
fn test_commit_changes_only_the_image_scalar() {
    let temp = TempDir::new().unwrap();
    let host = RecordingHost::new().with_repo("svc-a", Some(ANNOTATED_DEPRECATED));
    let audit = FileAuditStore::new(temp.path());
    let registry = DeprecationRegistry::default();
    let settings = settings();

    Orchestrator::new(&host, &audit, &registry, &settings)
        .run("acme", &mut FixedTag::new("2024.01.1"))
        .unwrap();

    let expected = ANNOTATED_DEPRECATED.replace("2023.08.1 # pinned", "2024.01.1 # pinned");
    let committed = host.calls_for("svc-a").into_iter().find_map(|call| match call {
        Call::UpdateFile { update, .. } => Some(update.content),
        _ => None,
    });
    assert_eq!(committed.as_deref(), Some(expected.as_str()));
    assert_eq!(fs::read_to_string(temp.path().join("svc-a.yml")).unwrap(), expected);
}

#[test]
fn test_aliased_image_fails_repo_without_writes() {
    let temp = TempDir::new().unwrap();
    let host = RecordingHost::new()
        .with_repo("svc-a", Some(ALIASED_DEPRECATED))
        .with_repo("svc-b", Some(NESTED_DEPRECATED));
    let audit = FileAuditStore::new(temp.path());
    let registry = DeprecationRegistry::default();
    let settings = settings();

    let report = Orchestrator::new(&host, &audit, &registry, &settings)
        .run("acme", &mut FixedTag::new("2024.01.1"))
        .unwrap();

    assert!(matches!(&report.repositories[0].outcome, RepoOutcome::Failed { .. }));
    assert!(host.calls_for("svc-a").iter().all(|c| !c.is_write()));
    assert!(!temp.path().join("svc-a.yml").exists());
    assert!(matches!(&report.repositories[1].outcome, RepoOutcome::Published { .. }));
}
