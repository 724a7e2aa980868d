//! Report generation orchestration
//!
//! Creates the report record, dispatches to the per-type computation, and
//! lands the result on the row: COMPLETED with payload, summary totals, hash
//! and cache lifetime, or FAILED with the error recorded. Dispatch is an
//! exhaustive match over the closed report type enum.

use chrono::{NaiveDate, Utc};
use serde_json::{json, Value};
use sqlx::PgPool;
use uuid::Uuid;

use crate::config::Config;
use crate::contracts::report_request::ReportRequest;
use crate::repos::contact_repo::{self, ContactError};
use crate::repos::report_query_repo::{self, ReportQueryError};
use crate::repos::report_repo::{
    self, CompletedReport, NewReport, Report, ReportRepoError, ReportType,
};
use crate::services::balance_sheet_service;
use crate::services::expense_report_service;
use crate::services::general_ledger_service;
use crate::services::income_statement_service::{self, FlatRatePolicy};
use crate::services::report_cache_service;
use crate::services::sub_ledger_service;
use crate::services::trial_balance_service;
use crate::tenant::TenantId;

/// Generation settings lifted from the service configuration
#[derive(Debug, Clone)]
pub struct ReportSettings {
    pub tax_rate_bps: u32,
    pub cache_ttl_hours: i64,
    pub cache_ttl_large_hours: i64,
}

impl ReportSettings {
    pub fn from_config(config: &Config) -> Self {
        ReportSettings {
            tax_rate_bps: config.tax_rate_bps,
            cache_ttl_hours: config.cache_ttl_hours,
            cache_ttl_large_hours: config.cache_ttl_large_hours,
        }
    }
}

/// Errors that can occur during report generation
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Report not found: {0}")]
    NotFound(Uuid),

    #[error(transparent)]
    Query(#[from] ReportQueryError),

    #[error(transparent)]
    Repo(#[from] ReportRepoError),

    #[error(transparent)]
    Contact(#[from] ContactError),

    #[error("Payload serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Parsed and validated report parameters
#[derive(Debug, Clone)]
pub struct ReportParams {
    pub report_type: ReportType,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub comparison: Option<(NaiveDate, NaiveDate)>,
    pub account_codes: Vec<String>,
}

fn parse_date(raw: &str) -> Result<NaiveDate, GenerateError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|e| GenerateError::InvalidDate(format!("{raw}: {e}")))
}

/// Parse a report request into validated parameters
pub fn parse_params(request: &ReportRequest) -> Result<ReportParams, GenerateError> {
    let period_start = parse_date(&request.period_start)?;
    let period_end = parse_date(&request.period_end)?;
    if period_start > period_end {
        return Err(GenerateError::InvalidDate(format!(
            "period_start {period_start} is after period_end {period_end}"
        )));
    }

    let comparison = match (
        request.comparison_period_start.as_deref(),
        request.comparison_period_end.as_deref(),
    ) {
        (Some(start), Some(end)) => Some((parse_date(start)?, parse_date(end)?)),
        (None, None) => None,
        _ => {
            return Err(GenerateError::InvalidDate(
                "comparison period requires both start and end".to_string(),
            ))
        }
    };

    Ok(ReportParams {
        report_type: request.report_type,
        period_start,
        period_end,
        comparison,
        account_codes: request.account_codes.clone(),
    })
}

/// Create the report record in generating status
///
/// Generation itself runs separately (the HTTP layer spawns [`run`]); the
/// returned id is what callers poll.
pub async fn start(
    pool: &PgPool,
    tenant: &TenantId,
    params: &ReportParams,
) -> Result<Uuid, GenerateError> {
    let id = Uuid::new_v4();
    let report_number = report_repo::next_report_number(pool, tenant, Utc::now()).await?;

    report_repo::insert_generating(
        pool,
        tenant,
        &NewReport {
            id,
            report_number: report_number.clone(),
            report_type: params.report_type,
            period_start: params.period_start,
            period_end: params.period_end,
            comparison_period_start: params.comparison.map(|(s, _)| s),
            comparison_period_end: params.comparison.map(|(_, e)| e),
            filters: json!({ "account_codes": params.account_codes }),
            version: 1,
            parent_report_id: None,
        },
    )
    .await?;

    tracing::info!(
        tenant_id = %tenant,
        report_id = %id,
        report_number = %report_number,
        report_type = ?params.report_type,
        "Report generation started"
    );

    Ok(id)
}

/// Run generation for an existing report record
///
/// Computation failures are recorded on the row as FAILED rather than
/// returned; only failures to reach the database at all propagate.
pub async fn run(
    pool: &PgPool,
    tenant: &TenantId,
    report_id: Uuid,
    settings: &ReportSettings,
) -> Result<(), GenerateError> {
    let report = report_repo::find_by_id(pool, tenant, report_id)
        .await?
        .ok_or(GenerateError::NotFound(report_id))?;

    match build_payload(pool, tenant, &report, settings).await {
        Ok((payload, summary)) => {
            complete(pool, tenant, report_id, payload, summary, settings).await?;
            tracing::info!(tenant_id = %tenant, report_id = %report_id, "Report generation completed");
        }
        Err(e) => {
            tracing::warn!(tenant_id = %tenant, report_id = %report_id, error = %e, "Report generation failed");
            report_repo::mark_failed(pool, tenant, report_id, &e.to_string()).await?;
        }
    }

    Ok(())
}

async fn complete(
    pool: &PgPool,
    tenant: &TenantId,
    report_id: Uuid,
    payload: Value,
    summary: Value,
    settings: &ReportSettings,
) -> Result<(), GenerateError> {
    let data_hash = report_cache_service::compute_data_hash(&payload)?;
    let payload_bytes = serde_json::to_vec(&payload)?.len();
    let cache_expires_at = report_cache_service::cache_expiry(
        Utc::now(),
        payload_bytes,
        settings.cache_ttl_hours,
        settings.cache_ttl_large_hours,
    );

    report_repo::mark_completed(
        pool,
        tenant,
        report_id,
        &CompletedReport {
            cached_data: payload,
            summary_totals: summary,
            data_hash,
            cache_key: format!("report:{}:{}", tenant, report_id),
            cache_expires_at,
        },
    )
    .await?;

    Ok(())
}

/// Compute the payload and summary totals for a report record
async fn build_payload(
    pool: &PgPool,
    tenant: &TenantId,
    report: &Report,
    settings: &ReportSettings,
) -> Result<(Value, Value), GenerateError> {
    let account_codes: Vec<String> = report
        .filters
        .get("account_codes")
        .and_then(|v| v.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|v| v.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default();

    match report.report_type {
        ReportType::TrialBalance => {
            let sums =
                report_query_repo::query_account_period_sums(pool, tenant, None, report.period_end)
                    .await?;
            let computed = trial_balance_service::compute(report.period_end, &sums);
            let summary = json!({
                "total_debit_minor": computed.total_debit_minor,
                "total_credit_minor": computed.total_credit_minor,
                "is_balanced": computed.is_balanced,
            });
            Ok((serde_json::to_value(computed)?, summary))
        }
        ReportType::IncomeStatement => {
            let current = report_query_repo::query_account_period_sums(
                pool,
                tenant,
                Some(report.period_start),
                report.period_end,
            )
            .await?;
            let comparison = match (report.comparison_period_start, report.comparison_period_end) {
                (Some(start), Some(end)) => Some(
                    report_query_repo::query_account_period_sums(pool, tenant, Some(start), end)
                        .await?,
                ),
                _ => None,
            };
            let policy = FlatRatePolicy {
                rate_bps: settings.tax_rate_bps,
            };
            let computed = income_statement_service::compute(
                report.period_start,
                report.period_end,
                &current,
                comparison.as_deref(),
                &policy,
            );
            let summary = json!({
                "total_revenue_minor": computed.revenue.total_minor,
                "income_before_tax_minor": computed.income_before_tax_minor,
                "net_income_minor": computed.net_income_minor,
            });
            Ok((serde_json::to_value(computed)?, summary))
        }
        ReportType::BalanceSheet => {
            let sums =
                report_query_repo::query_account_period_sums(pool, tenant, None, report.period_end)
                    .await?;
            let computed = balance_sheet_service::compute(report.period_end, &sums);
            let summary = json!({
                "total_assets_minor": computed.total_assets_minor,
                "total_liabilities_minor": computed.total_liabilities_minor,
                "total_equity_minor": computed.total_equity_minor,
                "is_balanced": computed.is_balanced,
            });
            Ok((serde_json::to_value(computed)?, summary))
        }
        ReportType::GeneralLedger => {
            let pre_sums = pre_period_sums(pool, tenant, report.period_start).await?;
            let lines = report_query_repo::query_ledger_lines(
                pool,
                tenant,
                &account_codes,
                report.period_start,
                report.period_end,
            )
            .await?;
            let computed = general_ledger_service::compute(
                report.period_start,
                report.period_end,
                &pre_sums,
                lines,
            );
            let summary = json!({
                "total_debit_minor": computed.total_debit_minor,
                "total_credit_minor": computed.total_credit_minor,
                "account_count": computed.accounts.len(),
            });
            Ok((serde_json::to_value(computed)?, summary))
        }
        ReportType::SubLedger => {
            let contacts = contact_repo::list_active(pool, tenant, None).await?;
            let pre_sums = pre_period_sums(pool, tenant, report.period_start).await?;
            let lines = report_query_repo::query_ledger_lines(
                pool,
                tenant,
                &[],
                report.period_start,
                report.period_end,
            )
            .await?;
            let computed = sub_ledger_service::compute(
                report.period_start,
                report.period_end,
                &contacts,
                &pre_sums,
                &lines,
            );
            let summary = json!({
                "total_receivable_minor": computed.total_receivable_minor,
                "total_payable_minor": computed.total_payable_minor,
            });
            Ok((serde_json::to_value(computed)?, summary))
        }
        ReportType::ExpenseReport => {
            let lines = report_query_repo::query_ledger_lines(
                pool,
                tenant,
                &[],
                report.period_start,
                report.period_end,
            )
            .await?;
            let computed =
                expense_report_service::compute(report.period_start, report.period_end, &lines);
            let summary = json!({
                "total_minor": computed.total_minor,
                "line_count": computed.lines.len(),
            });
            Ok((serde_json::to_value(computed)?, summary))
        }
    }
}

/// Inception-to-day-before-period sums, seeding opening balances
async fn pre_period_sums(
    pool: &PgPool,
    tenant: &TenantId,
    period_start: NaiveDate,
) -> Result<Vec<report_query_repo::AccountPeriodSums>, GenerateError> {
    let day_before = period_start.pred_opt().ok_or_else(|| {
        GenerateError::InvalidDate(format!("no day precedes {period_start}"))
    })?;
    Ok(report_query_repo::query_account_period_sums(pool, tenant, None, day_before).await?)
}

/// Create a successor version of an existing report
///
/// The prior version keeps its payload but loses is_latest; the new row
/// starts in generating status with version + 1 and a fresh report number.
pub async fn regenerate(
    pool: &PgPool,
    tenant: &TenantId,
    report_id: Uuid,
) -> Result<Uuid, GenerateError> {
    let prior = report_repo::find_by_id(pool, tenant, report_id)
        .await?
        .ok_or(GenerateError::NotFound(report_id))?;

    let new_id = Uuid::new_v4();
    let report_number = report_repo::next_report_number(pool, tenant, Utc::now()).await?;

    let mut tx = pool.begin().await?;
    report_repo::tx_retire_version(&mut tx, tenant, prior.id).await?;
    report_repo::tx_insert_generating(
        &mut tx,
        tenant,
        &NewReport {
            id: new_id,
            report_number,
            report_type: prior.report_type,
            period_start: prior.period_start,
            period_end: prior.period_end,
            comparison_period_start: prior.comparison_period_start,
            comparison_period_end: prior.comparison_period_end,
            filters: prior.filters.clone(),
            version: prior.version + 1,
            parent_report_id: Some(prior.id),
        },
    )
    .await?;
    tx.commit().await?;

    tracing::info!(
        tenant_id = %tenant,
        prior_report_id = %prior.id,
        report_id = %new_id,
        version = prior.version + 1,
        "Report regeneration started"
    );

    Ok(new_id)
}

/// Fetch a report's payload, serving from cache when valid
///
/// On a cache miss for a completed report the payload is recomputed on
/// demand and re-cached.
pub async fn get_payload(
    pool: &PgPool,
    tenant: &TenantId,
    report_id: Uuid,
    settings: &ReportSettings,
) -> Result<Option<Value>, GenerateError> {
    if let Some(payload) =
        report_cache_service::get_cached_payload(pool, tenant, report_id)
            .await
            .map_err(|e| match e {
                report_cache_service::CacheError::Repo(e) => GenerateError::Repo(e),
                report_cache_service::CacheError::Serialization(e) => {
                    GenerateError::Serialization(e)
                }
            })?
    {
        return Ok(Some(payload));
    }

    let report = report_repo::find_by_id(pool, tenant, report_id)
        .await?
        .ok_or(GenerateError::NotFound(report_id))?;

    // Only completed reports are recomputed on a cache miss; a report that
    // is still generating or has failed stays unavailable.
    if report.status != report_repo::ReportStatus::Completed {
        return Ok(None);
    }

    let (payload, summary) = build_payload(pool, tenant, &report, settings).await?;
    complete(pool, tenant, report_id, payload.clone(), summary, settings).await?;

    tracing::debug!(tenant_id = %tenant, report_id = %report_id, "Report payload recomputed on demand");

    Ok(Some(payload))
}
