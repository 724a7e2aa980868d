//! Database-backed report cache
//!
//! Cache state lives on the report row itself: cached_data holds the payload,
//! data_hash its SHA-256, cache_key/cache_expires_at the validity window.
//! A hash mismatch on read is treated as corruption: the cache entry is
//! cleared and the read reports a miss, so the payload gets regenerated.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde_json::Value;
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::repos::report_repo::{self, Report, ReportRepoError};
use crate::tenant::TenantId;

/// Payload size above which the long TTL applies
pub const LARGE_REPORT_THRESHOLD_BYTES: usize = 100_000;

/// Default cache lifetime in hours
pub const DEFAULT_TTL_HOURS: i64 = 24;

/// Cache lifetime in hours for payloads over the size threshold
pub const LARGE_TTL_HOURS: i64 = 48;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error(transparent)]
    Repo(#[from] ReportRepoError),

    #[error("Payload serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// SHA-256 hex digest of a report payload
///
/// serde_json object keys serialize in sorted order (the map is a BTreeMap),
/// so equal payloads always hash equally regardless of construction order.
pub fn compute_data_hash(payload: &Value) -> Result<String, serde_json::Error> {
    let bytes = serde_json::to_vec(payload)?;
    let digest = Sha256::digest(&bytes);
    Ok(format!("{:x}", digest))
}

/// Pick the cache lifetime for a payload of the given serialized size
pub fn choose_ttl_hours(payload_bytes: usize, default_hours: i64, large_hours: i64) -> i64 {
    if payload_bytes > LARGE_REPORT_THRESHOLD_BYTES {
        large_hours
    } else {
        default_hours
    }
}

/// Compute the cache expiry timestamp for a payload
pub fn cache_expiry(
    now: DateTime<Utc>,
    payload_bytes: usize,
    default_hours: i64,
    large_hours: i64,
) -> DateTime<Utc> {
    now + Duration::hours(choose_ttl_hours(payload_bytes, default_hours, large_hours))
}

/// Whether a report's cache entry is currently valid
///
/// Valid means: a cache key is set, the expiry is in the future, and the
/// stored payload still hashes to data_hash.
pub fn is_cache_valid(report: &Report, now: DateTime<Utc>) -> bool {
    let (Some(_), Some(expires_at), Some(data), Some(hash)) = (
        report.cache_key.as_ref(),
        report.cache_expires_at,
        report.cached_data.as_ref(),
        report.data_hash.as_ref(),
    ) else {
        return false;
    };

    if expires_at <= now {
        return false;
    }

    match compute_data_hash(data) {
        Ok(computed) => computed == *hash,
        Err(_) => false,
    }
}

/// Fetch a report's cached payload, verifying expiry and integrity
///
/// Returns None on miss. A hash mismatch clears the cache entry before
/// reporting the miss so the next generation starts clean.
pub async fn get_cached_payload(
    pool: &PgPool,
    tenant: &TenantId,
    report_id: Uuid,
) -> Result<Option<Value>, CacheError> {
    let Some(report) = report_repo::find_by_id(pool, tenant, report_id).await? else {
        return Ok(None);
    };

    let now = Utc::now();

    if report.cache_key.is_none() || report.cache_expires_at.map_or(true, |t| t <= now) {
        return Ok(None);
    }

    let (Some(data), Some(hash)) = (report.cached_data.clone(), report.data_hash.as_ref()) else {
        return Ok(None);
    };

    let computed = compute_data_hash(&data)?;
    if computed != *hash {
        tracing::warn!(
            tenant_id = %tenant,
            report_id = %report_id,
            "Cached report payload failed hash verification, invalidating"
        );
        report_repo::clear_cache(pool, tenant, report_id).await?;
        return Ok(None);
    }

    tracing::debug!(tenant_id = %tenant, report_id = %report_id, "Report cache hit");

    Ok(Some(data))
}

/// Invalidate cached reports whose period intersects [start, end]
///
/// Returns the number of reports invalidated.
pub async fn invalidate_by_date_range(
    pool: &PgPool,
    tenant: &TenantId,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<u64, CacheError> {
    let count = report_repo::clear_cache_by_date_range(pool, tenant, start, end).await?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_hash_is_order_independent() {
        let a = json!({"total": 100, "rows": [1, 2, 3]});
        let b = json!({"rows": [1, 2, 3], "total": 100});
        assert_eq!(
            compute_data_hash(&a).unwrap(),
            compute_data_hash(&b).unwrap()
        );
    }

    #[test]
    fn test_hash_detects_mutation() {
        let a = json!({"total": 100});
        let b = json!({"total": 101});
        assert_ne!(
            compute_data_hash(&a).unwrap(),
            compute_data_hash(&b).unwrap()
        );
    }

    #[test]
    fn test_ttl_threshold() {
        assert_eq!(choose_ttl_hours(1_000, 24, 48), 24);
        assert_eq!(choose_ttl_hours(LARGE_REPORT_THRESHOLD_BYTES, 24, 48), 24);
        assert_eq!(
            choose_ttl_hours(LARGE_REPORT_THRESHOLD_BYTES + 1, 24, 48),
            48
        );
    }

    #[test]
    fn test_cache_expiry_uses_selected_ttl() {
        let now = Utc::now();
        let small = cache_expiry(now, 10, 24, 48);
        let large = cache_expiry(now, 200_000, 24, 48);
        assert_eq!(small, now + Duration::hours(24));
        assert_eq!(large, now + Duration::hours(48));
    }
}
