//! Contract Test: Idempotent Reconciliation
//!
//! Verifies that an out-of-date record is written exactly once: a second
//! pass with no external change between the two performs no write.
//!
//! Constraints verified:
//! - The write is a full single-value replace with the computed TTL
//! - A second pass (same or fresh reconciler) observes the write and stays quiet
//! - An up-to-date record is never written

mod common;

use common::*;
use r53_ddns_core::UpdaterConfig;
use r53_ddns_core::traits::RecordUpsert;
use std::net::IpAddr;

#[tokio::test]
async fn second_pass_does_not_write() {
    let directory = InMemoryDirectory::single_zone().with_a_record("home.example.com", 300, &["198.51.100.20"]);
    let lookup = ScriptedLookup::always("203.0.113.7\n");
    let reconciler = reconciler(&directory, &lookup, None, UpdaterConfig::new("home.example.com"));

    let first = reconciler.reconcile().await.expect("first pass succeeds");
    assert!(first.updated);
    assert_eq!(first.applied_ip, "203.0.113.7".parse::<IpAddr>().unwrap());
    assert_eq!(first.applied_ttl, 300);

    let second = reconciler.reconcile().await.expect("second pass succeeds");
    assert!(!second.updated, "second pass must be a no-op");

    assert_eq!(
        directory.upserts(),
        vec![(
            ZONE_ID.to_string(),
            RecordUpsert {
                name: "home.example.com".to_string(),
                record_type: "A".to_string(),
                ttl: 300,
                values: vec!["203.0.113.7".to_string()],
            }
        )]
    );
    assert_eq!(directory.zone_list_calls(), 1, "zones are cached for the run");
}

#[tokio::test]
async fn fresh_run_after_update_does_not_write() {
    // Two separate invocations: nothing is carried over except the provider's records
    let directory = InMemoryDirectory::single_zone();
    let lookup = ScriptedLookup::always("203.0.113.7");

    let first = reconciler(&directory, &lookup, None, UpdaterConfig::new("home.example.com"))
        .reconcile()
        .await
        .expect("first run succeeds");
    assert!(first.updated);
    assert!(!first.previous.exists());

    let second = reconciler(&directory, &lookup, None, UpdaterConfig::new("home.example.com"))
        .reconcile()
        .await
        .expect("second run succeeds");
    assert!(!second.updated);
    assert_eq!(second.applied_ttl, 60);
    assert_eq!(directory.upserts().len(), 1);
}

#[tokio::test]
async fn up_to_date_record_is_left_alone() {
    let directory = InMemoryDirectory::single_zone().with_a_record("home.example.com", 300, &["203.0.113.7"]);
    let lookup = ScriptedLookup::always("203.0.113.7");
    let reconciler = reconciler(&directory, &lookup, None, UpdaterConfig::new("home.example.com"));

    let outcome = reconciler.reconcile().await.expect("pass succeeds");

    assert!(!outcome.updated);
    assert_eq!(outcome.applied_ttl, 300);
    assert!(directory.upserts().is_empty());
}

#[tokio::test]
async fn trailing_dot_in_target_is_normalized() {
    let directory = InMemoryDirectory::single_zone().with_a_record("home.example.com", 300, &["203.0.113.7"]);
    let lookup = ScriptedLookup::always("203.0.113.7");
    let reconciler = reconciler(&directory, &lookup, None, UpdaterConfig::new("home.example.com."));

    let outcome = reconciler.reconcile().await.expect("pass succeeds");

    assert_eq!(outcome.record_name, "home.example.com");
    assert!(!outcome.updated);
}

#[tokio::test]
async fn dry_run_reads_but_never_writes() {
    let directory = InMemoryDirectory::single_zone().with_a_record("home.example.com", 300, &["198.51.100.20"]);
    let lookup = ScriptedLookup::always("203.0.113.7");
    let reconciler = reconciler(
        &directory,
        &lookup,
        None,
        UpdaterConfig::new("home.example.com").with_dry_run(true),
    );

    let outcome = reconciler.reconcile().await.expect("dry run succeeds");

    assert!(!outcome.updated);
    assert!(outcome.dry_run);
    assert_eq!(directory.record_list_calls(), 1);
    assert!(directory.upserts().is_empty());
}

#[tokio::test]
async fn provider_write_failure_is_reported() {
    let directory = InMemoryDirectory::single_zone().with_failing_upserts();
    let lookup = ScriptedLookup::always("203.0.113.7");
    let reconciler = reconciler(&directory, &lookup, None, UpdaterConfig::new("home.example.com"));

    let err = reconciler.reconcile().await.unwrap_err();

    assert!(matches!(err, r53_ddns_core::Error::Provider { .. }));
    assert!(!err.is_fatal_guard());
}
