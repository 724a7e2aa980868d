//! Report cache validity rules: expiry, integrity hash, TTL selection

use chrono::{Duration, Utc};
use serde_json::json;
use uuid::Uuid;

use ledger_rs::repos::report_repo::{Report, ReportStatus, ReportType};
use ledger_rs::services::report_cache_service::{
    self, LARGE_REPORT_THRESHOLD_BYTES,
};

fn completed_report() -> Report {
    let payload = json!({"rows": [], "total_debit_minor": 0});
    let hash = report_cache_service::compute_data_hash(&payload).unwrap();
    let now = Utc::now();

    Report {
        id: Uuid::new_v4(),
        tenant_id: "acme".to_string(),
        report_number: "RPT-2024-0001".to_string(),
        report_type: ReportType::TrialBalance,
        period_start: "2024-01-01".parse().unwrap(),
        period_end: "2024-03-31".parse().unwrap(),
        comparison_period_start: None,
        comparison_period_end: None,
        filters: json!({}),
        status: ReportStatus::Completed,
        cached_data: Some(payload),
        summary_totals: Some(json!({"total_debit_minor": 0})),
        data_hash: Some(hash),
        cache_key: Some("report:acme:test".to_string()),
        cache_expires_at: Some(now + Duration::hours(24)),
        generation_error: None,
        version: 1,
        parent_report_id: None,
        is_latest: true,
        generation_started_at: now,
        generation_completed_at: Some(now),
    }
}

#[test]
fn fresh_cache_is_valid() {
    let report = completed_report();
    assert!(report_cache_service::is_cache_valid(&report, Utc::now()));
}

#[test]
fn expired_cache_is_invalid() {
    let report = completed_report();
    let later = Utc::now() + Duration::hours(25);
    assert!(!report_cache_service::is_cache_valid(&report, later));
}

#[test]
fn cleared_cache_key_is_invalid() {
    let mut report = completed_report();
    report.cache_key = None;
    assert!(!report_cache_service::is_cache_valid(&report, Utc::now()));
}

#[test]
fn tampered_payload_fails_hash_check() {
    let mut report = completed_report();
    report.cached_data = Some(json!({"rows": [], "total_debit_minor": 999}));
    assert!(!report_cache_service::is_cache_valid(&report, Utc::now()));
}

#[test]
fn hash_is_stable_across_key_order() {
    let a = json!({"b": 2, "a": 1});
    let b = json!({"a": 1, "b": 2});
    assert_eq!(
        report_cache_service::compute_data_hash(&a).unwrap(),
        report_cache_service::compute_data_hash(&b).unwrap()
    );
}

#[test]
fn large_payloads_get_extended_ttl() {
    let now = Utc::now();
    let small = report_cache_service::cache_expiry(now, 1_024, 24, 48);
    let large =
        report_cache_service::cache_expiry(now, LARGE_REPORT_THRESHOLD_BYTES + 1, 24, 48);

    assert_eq!(small, now + Duration::hours(24));
    assert_eq!(large, now + Duration::hours(48));
}
