//! Contract Test: Convergence & Idempotence
//!
//! Verifies the observable behaviour of `ensure_matches` / `ensure_absent`
//! against a stateful in-memory provider.
//!
//! Constraints verified:
//! - A converged record is left alone (no mutating request)
//! - Any single-field drift is corrected with exactly one update
//! - Absence is idempotent
//! - Dry-run never changes provider state
//! - Name and type compare case-insensitively, content does not
//!
//! If this test fails, the engine either does too much or too little.

mod common;

use common::*;
use ionos_dns_core::{
    DnsProvider, DnsRecordResource, DnsRecordSpec, Lookup, Method, ObservedRecord,
    OperationOutcome, RecordType, SyncEngine,
};

async fn lookup(
    client: &ionos_dns_core::IonosClient<ionos_dns_core::transport::MemoryIonosApi>,
    name: &str,
    record_type: RecordType,
) -> Option<ObservedRecord> {
    match tokio_test::assert_ok!(client.lookup_record(ZONE, name, record_type).await) {
        Lookup::Found(record) => Some(record),
        Lookup::Absent => None,
        Lookup::Refused(outcome) => panic!("lookup refused: {}", outcome),
    }
}

#[tokio::test]
async fn concrete_scenario_walks_full_lifecycle() {
    let (api, client) = setup().await;
    let record = cname();

    assert_eq!(
        client.ensure_matches(&record, false).await.unwrap(),
        OperationOutcome::Created
    );
    assert_eq!(
        client.ensure_matches(&record, false).await.unwrap(),
        OperationOutcome::Unchanged
    );

    let changed = record.clone().with_content("other.com");
    assert_eq!(
        client.ensure_matches(&changed, false).await.unwrap(),
        OperationOutcome::Updated
    );

    assert_eq!(
        client.ensure_absent(&changed, false).await.unwrap(),
        OperationOutcome::Deleted
    );
    assert_eq!(
        client.ensure_absent(&changed, false).await.unwrap(),
        OperationOutcome::AlreadyAbsent
    );

    // POST, PUT, DELETE
    assert_eq!(api.mutation_count().await, 3);
    assert!(api.records(ZONE_ID).await.is_empty());
}

#[tokio::test]
async fn repeated_apply_issues_no_mutation() {
    let (api, client) = setup().await;
    let record = cname();

    client.ensure_matches(&record, false).await.unwrap();
    let after_first = api.mutation_count().await;

    for _ in 0..3 {
        assert_eq!(
            client.ensure_matches(&record, false).await.unwrap(),
            OperationOutcome::Unchanged
        );
    }

    assert_eq!(after_first, 1);
    assert_eq!(api.mutation_count().await, after_first);
}

#[tokio::test]
async fn created_record_matches_declaration() {
    let (_api, client) = setup().await;
    let record = cname().with_ttl(300);

    client.ensure_matches(&record, false).await.unwrap();

    let observed = lookup(&client, "test.example.com", RecordType::Cname)
        .await
        .expect("record exists after Created");
    assert!(observed.matches(&record));
    assert_eq!(observed.root_name, ZONE);
    assert!(observed.change_date.is_some());
}

#[tokio::test]
async fn content_drift_is_corrected() {
    let (api, client) = setup().await;
    client.ensure_matches(&cname(), false).await.unwrap();

    let changed = cname().with_content("other.com");
    assert_eq!(
        client.ensure_matches(&changed, false).await.unwrap(),
        OperationOutcome::Updated
    );

    let observed = lookup(&client, "test.example.com", RecordType::Cname)
        .await
        .unwrap();
    assert_eq!(observed.content, "other.com");
    assert_eq!(api.records(ZONE_ID).await.len(), 1);
}

#[tokio::test]
async fn every_compared_field_triggers_update() {
    let base = cname().with_prio(Some(10));
    let variants = vec![
        ("content", base.clone().with_content("other.com")),
        ("ttl", base.clone().with_ttl(60)),
        ("prio changed", base.clone().with_prio(Some(20))),
        ("prio set to unset", base.clone().with_prio(None)),
        ("disabled", base.clone().with_disabled(true)),
    ];

    for (label, variant) in variants {
        let (api, client) = setup().await;
        client.ensure_matches(&base, false).await.unwrap();

        assert_eq!(
            client.ensure_matches(&variant, false).await.unwrap(),
            OperationOutcome::Updated,
            "{} change should update",
            label
        );
        assert_eq!(
            client.ensure_matches(&variant, false).await.unwrap(),
            OperationOutcome::Unchanged,
            "{} change should converge",
            label
        );
        assert_eq!(api.mutation_count().await, 2, "{}", label);
    }
}

#[tokio::test]
async fn unset_prio_to_set_triggers_update() {
    let (_api, client) = setup().await;
    client.ensure_matches(&cname(), false).await.unwrap();

    assert_eq!(
        client
            .ensure_matches(&cname().with_prio(Some(5)), false)
            .await
            .unwrap(),
        OperationOutcome::Updated
    );
}

#[tokio::test]
async fn externally_drifted_record_is_updated() {
    let (api, client) = setup().await;
    api.seed_record(ZONE_ID, "test.example.com", "CNAME", "stale.com", 3600, None)
        .await
        .unwrap();

    assert_eq!(
        client.ensure_matches(&cname(), false).await.unwrap(),
        OperationOutcome::Updated
    );
    assert_eq!(api.mutation_count().await, 1);
}

#[tokio::test]
async fn absence_is_idempotent() {
    let (api, client) = setup().await;

    assert_eq!(
        client.ensure_absent(&cname(), false).await.unwrap(),
        OperationOutcome::AlreadyAbsent
    );
    assert_eq!(api.mutation_count().await, 0);

    client.ensure_matches(&cname(), false).await.unwrap();
    assert_eq!(
        client.ensure_absent(&cname(), false).await.unwrap(),
        OperationOutcome::Deleted
    );
    assert_eq!(
        client.ensure_absent(&cname(), false).await.unwrap(),
        OperationOutcome::AlreadyAbsent
    );
    assert!(lookup(&client, "test.example.com", RecordType::Cname).await.is_none());
}

#[tokio::test]
async fn absent_only_removes_the_targeted_type() {
    let (api, client) = setup().await;
    api.seed_record(ZONE_ID, "test.example.com", "TXT", "keep me", 3600, None)
        .await
        .unwrap();
    client.ensure_matches(&cname(), false).await.unwrap();

    client.ensure_absent(&cname(), false).await.unwrap();

    let remaining = api.records(ZONE_ID).await;
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].record_type, "TXT");
}

#[tokio::test]
async fn dry_run_reports_without_mutating() {
    let (api, client) = setup().await;

    assert_eq!(
        client.ensure_matches(&cname(), true).await.unwrap(),
        OperationOutcome::Created
    );
    assert!(lookup(&client, "test.example.com", RecordType::Cname).await.is_none());

    client.ensure_matches(&cname(), false).await.unwrap();
    let before = api.mutation_count().await;

    let changed = cname().with_content("other.com");
    assert_eq!(
        client.ensure_matches(&changed, true).await.unwrap(),
        OperationOutcome::Updated
    );
    assert_eq!(
        client.ensure_absent(&cname(), true).await.unwrap(),
        OperationOutcome::Deleted
    );

    assert_eq!(api.mutation_count().await, before);
    let observed = lookup(&client, "test.example.com", RecordType::Cname)
        .await
        .unwrap();
    assert_eq!(observed.content, "target.com");
}

#[tokio::test]
async fn dry_run_absence_of_missing_record_is_already_absent() {
    let (api, client) = setup().await;

    assert_eq!(
        client.ensure_absent(&cname(), true).await.unwrap(),
        OperationOutcome::AlreadyAbsent
    );
    assert_eq!(api.mutation_count().await, 0);
}

#[tokio::test]
async fn dry_run_against_missing_zone_is_not_found() {
    // A dry-run never predicts Created for a record it could not place
    let (api, client) = setup().await;
    let mut record = cname();
    record.root_name = "missing.org".to_string();
    record.name = "www.missing.org".to_string();

    assert_eq!(
        client.ensure_matches(&record, true).await.unwrap(),
        OperationOutcome::NotFound
    );
    assert_eq!(api.mutation_count().await, 0);
}

#[tokio::test]
async fn dry_run_on_converged_record_is_unchanged() {
    let (_api, client) = setup().await;
    client.ensure_matches(&cname(), false).await.unwrap();
    assert_eq!(
        client.ensure_matches(&cname(), true).await.unwrap(),
        OperationOutcome::Unchanged
    );
}

#[tokio::test]
async fn name_case_resolves_to_same_target() {
    let (api, client) = setup().await;
    api.seed_record(ZONE_ID, "TEST.Example.COM", "CNAME", "target.com", 3600, None)
        .await
        .unwrap();

    assert_eq!(
        client.ensure_matches(&cname(), false).await.unwrap(),
        OperationOutcome::Unchanged
    );
    assert_eq!(api.mutation_count().await, 0);
}

#[tokio::test]
async fn type_case_resolves_to_same_target() {
    let (api, client) = setup().await;

    // Provider reports the type in lower case
    api.inject_response(
        Method::Get,
        200,
        r#"[{"id":"zone-1","name":"example.com","type":"NATIVE"}]"#,
    )
    .await;
    api.inject_response(
        Method::Get,
        200,
        r#"{"id":"zone-1","name":"example.com","type":"NATIVE","records":[
            {"id":"r1","name":"test.example.com","rootName":"example.com","type":"cname",
             "content":"target.com","ttl":3600,"prio":null,"disabled":false}
        ]}"#,
    )
    .await;

    assert_eq!(
        client.ensure_matches(&cname(), false).await.unwrap(),
        OperationOutcome::Unchanged
    );
}

#[tokio::test]
async fn zone_name_case_resolves_to_same_zone() {
    let (_api, client) = setup().await;
    let mut record = cname();
    record.root_name = "EXAMPLE.COM".to_string();

    assert_eq!(
        client.ensure_matches(&record, false).await.unwrap(),
        OperationOutcome::Created
    );
}

#[tokio::test]
async fn hostname_content_is_compared_verbatim() {
    // Trailing dots and letter case are not normalised: each variant below
    // is a different value from "target.com" and is rewritten.
    for stored in ["target.com.", "Target.com"] {
        let (api, client) = setup().await;
        api.seed_record(ZONE_ID, "test.example.com", "CNAME", stored, 3600, None)
            .await
            .unwrap();

        assert_eq!(
            client.ensure_matches(&cname(), false).await.unwrap(),
            OperationOutcome::Updated,
            "stored content {:?}",
            stored
        );
    }
}

#[tokio::test]
async fn missing_zone_is_not_found() {
    let (api, client) = setup().await;
    let mut record = cname();
    record.root_name = "missing.org".to_string();
    record.name = "www.missing.org".to_string();

    assert_eq!(
        client.ensure_matches(&record, false).await.unwrap(),
        OperationOutcome::NotFound
    );
    assert_eq!(
        client.ensure_absent(&record, false).await.unwrap(),
        OperationOutcome::NotFound
    );
    assert_eq!(api.mutation_count().await, 0);
}

#[tokio::test]
async fn engine_drives_resource_lifecycle() {
    let (api, client) = setup().await;
    let engine = SyncEngine::new(Box::new(client));
    assert_eq!(engine.provider_name(), "ionos");

    let mut resource = DnsRecordResource::new(
        "test-cname",
        DnsRecordSpec {
            root_name: ZONE.to_string(),
            name: "test.example.com".to_string(),
            record_type: RecordType::Cname,
            content: "target.com".to_string(),
            ttl: None,
            prio: None,
            disabled: false,
        },
    );

    let result = engine.ensure_created(&resource, false).await.unwrap();
    assert_eq!(result.outcome, OperationOutcome::Created);
    assert!(result.is_converged());

    let stored = api.records(ZONE_ID).await;
    assert_eq!(stored[0].ttl, 3600);

    resource.spec.content = "other.com".to_string();
    let result = engine.ensure_created(&resource, false).await.unwrap();
    assert_eq!(result.outcome, OperationOutcome::Updated);

    let result = engine.ensure_deleted(&resource, false).await.unwrap();
    assert_eq!(result.outcome, OperationOutcome::Deleted);

    let result = engine.ensure_deleted(&resource, false).await.unwrap();
    assert_eq!(result.outcome, OperationOutcome::AlreadyAbsent);
    assert!(result.is_converged());
}
