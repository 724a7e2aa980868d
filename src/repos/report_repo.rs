use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use thiserror::Error;
use uuid::Uuid;

use crate::tenant::TenantId;

/// Report type enum matching database report_type
///
/// Closed set: dispatch over this enum is exhaustive, and unknown type
/// strings are rejected when the request DTO is deserialized.
#[derive(Debug, Clone, Copy, sqlx::Type, PartialEq, Eq, Serialize, Deserialize)]
#[sqlx(type_name = "report_type", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportType {
    IncomeStatement,
    BalanceSheet,
    GeneralLedger,
    SubLedger,
    TrialBalance,
    ExpenseReport,
}

/// Report status enum matching database report_status
#[derive(Debug, Clone, Copy, sqlx::Type, PartialEq, Eq, Serialize, Deserialize)]
#[sqlx(type_name = "report_status", rename_all = "lowercase")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportStatus {
    Generating,
    Completed,
    Failed,
}

/// Generated report record, including embedded cache state
#[derive(Debug, Clone, FromRow)]
pub struct Report {
    pub id: Uuid,
    pub tenant_id: String,
    pub report_number: String,
    pub report_type: ReportType,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub comparison_period_start: Option<NaiveDate>,
    pub comparison_period_end: Option<NaiveDate>,
    pub filters: Value,
    pub status: ReportStatus,
    pub cached_data: Option<Value>,
    pub summary_totals: Option<Value>,
    pub data_hash: Option<String>,
    pub cache_key: Option<String>,
    pub cache_expires_at: Option<DateTime<Utc>>,
    pub generation_error: Option<String>,
    pub version: i32,
    pub parent_report_id: Option<Uuid>,
    pub is_latest: bool,
    pub generation_started_at: DateTime<Utc>,
    pub generation_completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Error)]
pub enum ReportRepoError {
    #[error("Report not found: tenant_id={tenant_id}, id={id}")]
    NotFound { tenant_id: String, id: Uuid },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

const REPORT_COLUMNS: &str = "id, tenant_id, report_number, report_type, period_start, \
     period_end, comparison_period_start, comparison_period_end, filters, status, \
     cached_data, summary_totals, data_hash, cache_key, cache_expires_at, \
     generation_error, version, parent_report_id, is_latest, \
     generation_started_at, generation_completed_at";

/// Allocate the next report number for a tenant: RPT-{year}-{NNNN}
pub async fn next_report_number(
    pool: &PgPool,
    tenant: &TenantId,
    now: DateTime<Utc>,
) -> Result<String, ReportRepoError> {
    let year = now.year();
    let prefix = format!("RPT-{year}-%");

    let count: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM reports
        WHERE tenant_id = $1 AND report_number LIKE $2
        "#,
    )
    .bind(tenant.as_str())
    .bind(&prefix)
    .fetch_one(pool)
    .await?;

    Ok(format!("RPT-{}-{:04}", year, count + 1))
}

/// Insert parameters for a new report record
#[derive(Debug, Clone)]
pub struct NewReport {
    pub id: Uuid,
    pub report_number: String,
    pub report_type: ReportType,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub comparison_period_start: Option<NaiveDate>,
    pub comparison_period_end: Option<NaiveDate>,
    pub filters: Value,
    pub version: i32,
    pub parent_report_id: Option<Uuid>,
}

/// Insert a report record in generating status
pub async fn insert_generating(
    pool: &PgPool,
    tenant: &TenantId,
    report: &NewReport,
) -> Result<(), ReportRepoError> {
    sqlx::query(
        r#"
        INSERT INTO reports
            (id, tenant_id, report_number, report_type, period_start, period_end,
             comparison_period_start, comparison_period_end, filters,
             status, version, parent_report_id)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 'generating', $10, $11)
        "#,
    )
    .bind(report.id)
    .bind(tenant.as_str())
    .bind(&report.report_number)
    .bind(report.report_type)
    .bind(report.period_start)
    .bind(report.period_end)
    .bind(report.comparison_period_start)
    .bind(report.comparison_period_end)
    .bind(&report.filters)
    .bind(report.version)
    .bind(report.parent_report_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Completion parameters: payload, headline totals, hash, cache lifetime
#[derive(Debug, Clone)]
pub struct CompletedReport {
    pub cached_data: Value,
    pub summary_totals: Value,
    pub data_hash: String,
    pub cache_key: String,
    pub cache_expires_at: DateTime<Utc>,
}

/// Mark a report completed and store its payload and cache state
pub async fn mark_completed(
    pool: &PgPool,
    tenant: &TenantId,
    id: Uuid,
    completed: &CompletedReport,
) -> Result<(), ReportRepoError> {
    let result = sqlx::query(
        r#"
        UPDATE reports
        SET status = 'completed',
            cached_data = $3,
            summary_totals = $4,
            data_hash = $5,
            cache_key = $6,
            cache_expires_at = $7,
            generation_error = NULL,
            generation_completed_at = NOW()
        WHERE tenant_id = $1 AND id = $2
        "#,
    )
    .bind(tenant.as_str())
    .bind(id)
    .bind(&completed.cached_data)
    .bind(&completed.summary_totals)
    .bind(&completed.data_hash)
    .bind(&completed.cache_key)
    .bind(completed.cache_expires_at)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(ReportRepoError::NotFound {
            tenant_id: tenant.as_str().to_string(),
            id,
        });
    }

    Ok(())
}

/// Mark a report failed, recording the error on the row
///
/// Generation runs asynchronously, so failures are recorded rather than
/// raised to a caller.
pub async fn mark_failed(
    pool: &PgPool,
    tenant: &TenantId,
    id: Uuid,
    error: &str,
) -> Result<(), ReportRepoError> {
    let result = sqlx::query(
        r#"
        UPDATE reports
        SET status = 'failed',
            generation_error = $3,
            generation_completed_at = NOW()
        WHERE tenant_id = $1 AND id = $2
        "#,
    )
    .bind(tenant.as_str())
    .bind(id)
    .bind(error)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(ReportRepoError::NotFound {
            tenant_id: tenant.as_str().to_string(),
            id,
        });
    }

    Ok(())
}

/// Find a report by id
pub async fn find_by_id(
    pool: &PgPool,
    tenant: &TenantId,
    id: Uuid,
) -> Result<Option<Report>, ReportRepoError> {
    let report = sqlx::query_as::<_, Report>(&format!(
        r#"
        SELECT {REPORT_COLUMNS}
        FROM reports
        WHERE tenant_id = $1 AND id = $2
        "#
    ))
    .bind(tenant.as_str())
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(report)
}

/// Retire a prior version before inserting its successor
///
/// Flips is_latest off within the regeneration transaction so exactly one
/// version per lineage carries the flag.
pub async fn tx_retire_version(
    tx: &mut Transaction<'_, Postgres>,
    tenant: &TenantId,
    id: Uuid,
) -> Result<(), ReportRepoError> {
    let result = sqlx::query(
        r#"
        UPDATE reports
        SET is_latest = FALSE
        WHERE tenant_id = $1 AND id = $2 AND is_latest
        "#,
    )
    .bind(tenant.as_str())
    .bind(id)
    .execute(&mut **tx)
    .await?;

    if result.rows_affected() == 0 {
        return Err(ReportRepoError::NotFound {
            tenant_id: tenant.as_str().to_string(),
            id,
        });
    }

    Ok(())
}

/// Insert a successor version row in generating status, within a transaction
pub async fn tx_insert_generating(
    tx: &mut Transaction<'_, Postgres>,
    tenant: &TenantId,
    report: &NewReport,
) -> Result<(), ReportRepoError> {
    sqlx::query(
        r#"
        INSERT INTO reports
            (id, tenant_id, report_number, report_type, period_start, period_end,
             comparison_period_start, comparison_period_end, filters,
             status, version, parent_report_id)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 'generating', $10, $11)
        "#,
    )
    .bind(report.id)
    .bind(tenant.as_str())
    .bind(&report.report_number)
    .bind(report.report_type)
    .bind(report.period_start)
    .bind(report.period_end)
    .bind(report.comparison_period_start)
    .bind(report.comparison_period_end)
    .bind(&report.filters)
    .bind(report.version)
    .bind(report.parent_report_id)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// Clear the cache fields of a single report
pub async fn clear_cache(
    pool: &PgPool,
    tenant: &TenantId,
    id: Uuid,
) -> Result<(), ReportRepoError> {
    sqlx::query(
        r#"
        UPDATE reports
        SET cache_key = NULL, cache_expires_at = NULL
        WHERE tenant_id = $1 AND id = $2
        "#,
    )
    .bind(tenant.as_str())
    .bind(id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Clear the cache of every report whose period intersects [start, end]
///
/// Returns the number of invalidated reports. Intersection test:
/// period_start <= end AND period_end >= start.
pub async fn clear_cache_by_date_range(
    pool: &PgPool,
    tenant: &TenantId,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<u64, ReportRepoError> {
    let result = sqlx::query(
        r#"
        UPDATE reports
        SET cache_key = NULL, cache_expires_at = NULL
        WHERE tenant_id = $1
          AND cache_key IS NOT NULL
          AND period_start <= $3
          AND period_end >= $2
        "#,
    )
    .bind(tenant.as_str())
    .bind(start)
    .bind(end)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_type_serde_shape() {
        let json = serde_json::to_string(&ReportType::IncomeStatement).unwrap();
        assert_eq!(json, "\"INCOME_STATEMENT\"");
        let back: ReportType = serde_json::from_str("\"SUB_LEDGER\"").unwrap();
        assert_eq!(back, ReportType::SubLedger);
    }

    #[test]
    fn test_unknown_report_type_rejected() {
        let result: Result<ReportType, _> = serde_json::from_str("\"CASH_FLOW\"");
        assert!(result.is_err());
    }
}
