//! Read-only queries feeding the report generators
//!
//! Two query shapes cover all report types: per-account posted sums over a
//! date window (trial balance, income statement, balance sheet) and the flat
//! posted line stream in replay order (general ledger, sub-ledger, expense
//! report). All queries are tenant-scoped and see POSTED entries only.

use chrono::NaiveDate;
use sqlx::{FromRow, PgPool};
use thiserror::Error;
use uuid::Uuid;

use crate::repos::account_repo::{AccountSubtype, AccountType, NormalBalance};
use crate::tenant::TenantId;

#[derive(Debug, Error)]
pub enum ReportQueryError {
    #[error("Invalid date range: start {start} is after end {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Per-account debit/credit sums over a window, with account metadata
///
/// Every active account appears, including those with no activity.
#[derive(Debug, Clone, FromRow)]
pub struct AccountPeriodSums {
    pub account_code: String,
    pub account_name: String,
    #[sqlx(rename = "type")]
    pub account_type: AccountType,
    pub subtype: AccountSubtype,
    pub normal_balance: NormalBalance,
    pub opening_balance_minor: i64,
    pub debit_minor: i64,
    pub credit_minor: i64,
}

/// Sum posted debits and credits per active account
///
/// `start` is inclusive when given; `end` is inclusive. Pass `start = None`
/// for inception-to-date sums (balance sheet, trial balance).
pub async fn query_account_period_sums(
    pool: &PgPool,
    tenant: &TenantId,
    start: Option<NaiveDate>,
    end: NaiveDate,
) -> Result<Vec<AccountPeriodSums>, ReportQueryError> {
    if let Some(start) = start {
        if start > end {
            return Err(ReportQueryError::InvalidDateRange { start, end });
        }
    }

    let rows = sqlx::query_as::<_, AccountPeriodSums>(
        r#"
        SELECT
            a.code AS account_code,
            a.name AS account_name,
            a.type,
            a.subtype,
            a.normal_balance,
            a.opening_balance_minor,
            COALESCE(s.debit_minor, 0)::BIGINT AS debit_minor,
            COALESCE(s.credit_minor, 0)::BIGINT AS credit_minor
        FROM accounts a
        LEFT JOIN (
            SELECT
                jl.account_code,
                SUM(jl.debit_minor) AS debit_minor,
                SUM(jl.credit_minor) AS credit_minor
            FROM journal_entries je
            INNER JOIN journal_lines jl ON jl.journal_entry_id = je.id
            WHERE je.tenant_id = $1
              AND je.status = 'posted'
              AND ($2::date IS NULL OR je.date >= $2)
              AND je.date <= $3
            GROUP BY jl.account_code
        ) s ON s.account_code = a.code
        WHERE a.tenant_id = $1 AND a.is_active
        ORDER BY a.code ASC
        "#,
    )
    .bind(tenant.as_str())
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// One posted journal line in replay order, with account metadata
#[derive(Debug, Clone, FromRow)]
pub struct LedgerLineRow {
    pub account_code: String,
    pub account_name: String,
    #[sqlx(rename = "type")]
    pub account_type: AccountType,
    pub subtype: AccountSubtype,
    pub normal_balance: NormalBalance,
    pub entry_id: Uuid,
    pub entry_number: String,
    pub date: NaiveDate,
    pub entry_description: String,
    pub line_description: Option<String>,
    pub line_no: i32,
    pub debit_minor: i64,
    pub credit_minor: i64,
    pub contact_id: Option<Uuid>,
}

/// Fetch posted lines in replay order: (date, entry_number, line_no)
///
/// The ordering is load-bearing: running balances replay deterministically
/// in exactly this order. An empty `account_codes` slice means all accounts.
pub async fn query_ledger_lines(
    pool: &PgPool,
    tenant: &TenantId,
    account_codes: &[String],
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<LedgerLineRow>, ReportQueryError> {
    if start > end {
        return Err(ReportQueryError::InvalidDateRange { start, end });
    }

    let rows = sqlx::query_as::<_, LedgerLineRow>(
        r#"
        SELECT
            jl.account_code,
            a.name AS account_name,
            a.type,
            a.subtype,
            a.normal_balance,
            je.id AS entry_id,
            je.entry_number,
            je.date,
            je.description AS entry_description,
            jl.description AS line_description,
            jl.line_no,
            jl.debit_minor,
            jl.credit_minor,
            je.contact_id
        FROM journal_entries je
        INNER JOIN journal_lines jl ON jl.journal_entry_id = je.id
        INNER JOIN accounts a ON a.tenant_id = je.tenant_id AND a.code = jl.account_code
        WHERE je.tenant_id = $1
          AND je.status = 'posted'
          AND je.date >= $2
          AND je.date <= $3
          AND (cardinality($4::text[]) = 0 OR jl.account_code = ANY($4))
        ORDER BY je.date ASC, je.entry_number ASC, jl.line_no ASC
        "#,
    )
    .bind(tenant.as_str())
    .bind(start)
    .bind(end)
    .bind(account_codes)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
