//! End-to-end reconciliation against an in-memory realm.

use kc_role_mapper::apply::apply;
use kc_role_mapper::engine::plan;
use kc_role_mapper::model::Group;
use kc_role_mapper::report::{render_text, OutputFormat, NO_CHANGES};
use kc_role_mapper::run::{run, RunOptions, RunOutcome};
use kc_role_mapper::store::{InMemoryStore, StoreCall};
use kc_role_mapper::{ChangeSet, MapperError, MapperResult};

// =============================================================================
// Test Helpers
// =============================================================================

fn options(dry_run: bool) -> RunOptions {
    RunOptions {
        dry_run,
        assume_yes: false,
        format: OutputFormat::Text,
    }
}

async fn run_quietly<F>(
    store: &InMemoryStore,
    options: &RunOptions,
    confirm: F,
) -> MapperResult<RunOutcome>
where
    F: FnOnce() -> MapperResult<bool>,
{
    run(store, options, &mut Vec::new(), &mut Vec::new(), confirm).await
}

fn nested_realm() -> InMemoryStore {
    InMemoryStore::new("acme")
        .with_group(
            Group::new("g-eng", "engineers")
                .with_sub_group(Group::new("g-be", "backend").with_realm_role("backend"))
                .with_sub_group(
                    Group::new("g-fe", "frontend").with_sub_group(Group::new("g-web", "web")),
                ),
        )
        .with_group(Group::new("g-ops", "ops").with_realm_role("ops"))
        .with_group(Group::new("g-sec", "security"))
        .with_role("ops")
        .with_role("security")
}

fn write_position(calls: &[StoreCall], matches: impl Fn(&StoreCall) -> bool) -> Vec<usize> {
    calls
        .iter()
        .enumerate()
        .filter(|(_, c)| matches(c))
        .map(|(i, _)| i)
        .collect()
}

// =============================================================================
// Scenarios
// =============================================================================

#[tokio::test]
async fn scenario_a_unmapped_and_mapped_siblings() {
    let store = InMemoryStore::new("acme")
        .with_group(Group::new("engineers-id", "engineers"))
        .with_group(Group::new("ops-id", "ops").with_realm_role("ops"));

    let changes = plan(&store).await.unwrap();

    assert_eq!(changes.missing_roles().collect::<Vec<_>>(), vec!["engineers"]);
    assert_eq!(
        changes.missing_mappings().collect::<Vec<_>>(),
        vec![("engineers-id", "engineers")]
    );
    assert_eq!(changes.mapping_for("ops-id"), None);
}

#[tokio::test]
async fn scenario_b_mapped_sub_group_still_visited() {
    let store = InMemoryStore::new("acme").with_group(
        Group::new("qa-id", "qa")
            .with_sub_group(Group::new("qa-leads-id", "qa-leads").with_realm_role("qa-leads")),
    );

    let changes = plan(&store).await.unwrap();

    assert_eq!(changes.missing_roles().collect::<Vec<_>>(), vec!["qa"]);
    assert_eq!(
        changes.missing_mappings().collect::<Vec<_>>(),
        vec![("qa-id", "qa")]
    );
    assert!(store
        .calls()
        .contains(&StoreCall::GetGroup("qa-leads-id".to_string())));
}

#[tokio::test]
async fn scenario_c_empty_realm() {
    let store = InMemoryStore::new("acme");

    let changes = plan(&store).await.unwrap();
    assert!(changes.is_empty());
    assert_eq!(render_text(&changes).trim(), NO_CHANGES);

    let outcome = run_quietly(&store, &options(false), || {
        panic!("nothing to confirm for an empty realm")
    })
    .await
    .unwrap();
    assert_eq!(outcome, RunOutcome::NoChanges);
    assert!(store.calls().iter().all(|c| !c.is_write()));
}

#[tokio::test]
async fn mapped_parent_with_unmapped_children() {
    let changes = plan(&nested_realm()).await.unwrap();

    assert_eq!(
        changes.missing_roles().collect::<Vec<_>>(),
        vec!["engineers", "frontend", "web"]
    );
    assert_eq!(changes.mapping_count(), 4);
    assert_eq!(changes.mapping_for("g-sec"), Some("security"));
    assert!(!changes.is_role_missing("security"));
    assert_eq!(changes.mapping_for("g-be"), None);
    assert_eq!(changes.mapping_for("g-ops"), None);
}

#[tokio::test]
async fn case_differing_role_is_not_a_mapping() {
    let store = InMemoryStore::new("acme")
        .with_group(Group::new("g1", "Admins").with_realm_role("admins"))
        .with_role("admins");

    let changes = plan(&store).await.unwrap();
    assert!(changes.is_role_missing("Admins"));
    assert_eq!(changes.mapping_for("g1"), Some("Admins"));
}

#[tokio::test]
async fn duplicate_names_create_one_role() {
    let store = InMemoryStore::new("acme")
        .with_group(Group::new("g1", "team").with_sub_group(Group::new("g2", "leads")))
        .with_group(Group::new("g3", "other").with_sub_group(Group::new("g4", "leads")));

    let changes = plan(&store).await.unwrap();
    assert_eq!(changes.missing_roles().filter(|r| *r == "leads").count(), 1);
    assert_eq!(changes.mapping_for("g2"), Some("leads"));
    assert_eq!(changes.mapping_for("g4"), Some("leads"));

    let report = apply(&store, changes, true).await.unwrap();
    assert_eq!(report.roles_created, 3);
    assert_eq!(report.mappings_created, 4);
    assert!(plan(&store).await.unwrap().is_empty());
}

// =============================================================================
// Properties
// =============================================================================

#[tokio::test]
async fn planning_twice_is_stable() {
    let store = nested_realm();

    let first = plan(&store).await.unwrap();
    let second = plan(&store).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn apply_then_replan_is_empty() {
    let store = nested_realm();

    let changes = plan(&store).await.unwrap();
    apply(&store, changes, true).await.unwrap();

    assert_eq!(plan(&store).await.unwrap(), ChangeSet::new());
}

#[tokio::test]
async fn roles_created_before_any_mapping() {
    let store = nested_realm();
    let changes = plan(&store).await.unwrap();
    store.clear_calls();

    apply(&store, changes, true).await.unwrap();
    let calls = store.calls();

    let creates = write_position(&calls, |c| matches!(c, StoreCall::CreateRole(_)));
    let mappings = write_position(&calls, |c| matches!(c, StoreCall::AddRealmRoles(..)));
    assert_eq!(creates.len(), 3);
    assert_eq!(mappings.len(), 4);
    assert!(creates.iter().max() < mappings.iter().min());
}

#[tokio::test]
async fn never_removes_mappings() {
    let store = nested_realm();
    let changes = plan(&store).await.unwrap();
    apply(&store, changes, true).await.unwrap();

    assert!(!store
        .calls()
        .iter()
        .any(|c| matches!(c, StoreCall::RemoveRealmRoles(..))));
}

// =============================================================================
// Runs
// =============================================================================

#[tokio::test]
async fn declined_run_writes_nothing() {
    let store = nested_realm();

    let outcome = run_quietly(&store, &options(false), || Ok(false)).await.unwrap();
    assert_eq!(outcome, RunOutcome::Declined);
    assert!(store.calls().iter().all(|c| !c.is_write()));
}

#[tokio::test]
async fn dry_run_never_asks() {
    let store = nested_realm();

    let outcome = run_quietly(&store, &options(true), || panic!("dry run must not prompt"))
        .await
        .unwrap();
    assert_eq!(outcome, RunOutcome::DryRun);
    assert!(store.calls().iter().all(|c| !c.is_write()));
}

#[tokio::test]
async fn confirmed_run_applies() {
    let store = nested_realm();

    let outcome = run_quietly(&store, &options(false), || Ok(true)).await.unwrap();
    match outcome {
        RunOutcome::Applied(report) => {
            assert_eq!(report.roles_created, 3);
            assert_eq!(report.mappings_created, 4);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }

    let again = run_quietly(&store, &options(false), || panic!("nothing left to confirm"))
        .await
        .unwrap();
    assert_eq!(again, RunOutcome::NoChanges);
}

#[tokio::test]
async fn assume_yes_skips_prompt() {
    let store = nested_realm();
    let mut opts = options(false);
    opts.assume_yes = true;

    let outcome = run_quietly(&store, &opts, || panic!("--yes must not prompt")).await.unwrap();
    assert!(matches!(outcome, RunOutcome::Applied(_)));
}

#[tokio::test]
async fn unknown_realm_stops_before_walk() {
    let store = nested_realm().with_target_realm("missing");

    let err = run_quietly(&store, &options(false), || Ok(true))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(store.calls(), vec![StoreCall::GetRealm("missing".to_string())]);
}

#[tokio::test]
async fn failed_role_creation_is_partial_and_rerunnable() {
    let failing = InMemoryStore::new("acme")
        .with_group(Group::new("g1", "alpha"))
        .with_group(Group::new("g2", "beta"))
        .failing_role_creation("beta");

    let err = run_quietly(&failing, &options(false), || Ok(true)).await.unwrap_err();
    assert!(matches!(
        err,
        MapperError::PartialApply {
            roles_created: 1,
            mappings_created: 0,
            ..
        }
    ));

    // The next run only plans what is still missing.
    let changes = plan(&failing).await.unwrap();
    assert!(!changes.is_role_missing("alpha"));
    assert!(changes.is_role_missing("beta"));
    assert_eq!(changes.mapping_count(), 2);
}

#[tokio::test]
async fn json_run_keeps_stdout_parseable() {
    let store = nested_realm();
    let mut opts = options(true);
    opts.format = OutputFormat::Json;
    let (mut out, mut status) = (Vec::new(), Vec::new());

    let outcome = run(&store, &opts, &mut out, &mut status, || {
        panic!("dry run must not prompt")
    })
    .await
    .unwrap();
    assert_eq!(outcome, RunOutcome::DryRun);

    let out = String::from_utf8(out).unwrap();
    let parsed: ChangeSet = serde_json::from_str(&out).unwrap();
    assert_eq!(parsed, plan(&store).await.unwrap());

    let status = String::from_utf8(status).unwrap();
    assert!(status.contains("Found realm: acme"));
    assert!(status.contains("Dry run only"));
}

#[tokio::test]
async fn json_apply_reports_on_status_only() {
    let store = nested_realm();
    let mut opts = options(false);
    opts.format = OutputFormat::Json;
    opts.assume_yes = true;
    let (mut out, mut status) = (Vec::new(), Vec::new());

    run(&store, &opts, &mut out, &mut status, || panic!("--yes must not prompt"))
        .await
        .unwrap();

    let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert!(value.is_object());
    assert!(String::from_utf8(status)
        .unwrap()
        .contains("Created 3 role(s) and 4 mapping(s)"));
}
