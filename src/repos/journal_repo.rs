use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use thiserror::Error;
use uuid::Uuid;

use crate::tenant::TenantId;

/// Entry status enum matching database entry_status
///
/// Transitions are one-way: draft -> posted -> voided.
#[derive(Debug, Clone, Copy, sqlx::Type, PartialEq, Eq, Serialize, Deserialize)]
#[sqlx(type_name = "entry_status", rename_all = "lowercase")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryStatus {
    Draft,
    Posted,
    Voided,
}

/// Journal entry header
#[derive(Debug, Clone, FromRow)]
pub struct JournalEntry {
    pub id: Uuid,
    pub tenant_id: String,
    pub entry_number: String,
    pub date: NaiveDate,
    pub description: String,
    pub reference: Option<String>,
    pub currency: String,
    pub contact_id: Option<Uuid>,
    pub status: EntryStatus,
    pub total_debit_minor: i64,
    pub total_credit_minor: i64,
    pub posted_at: Option<DateTime<Utc>>,
    pub void_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Journal line as stored
#[derive(Debug, Clone, FromRow)]
pub struct JournalLine {
    pub id: Uuid,
    pub journal_entry_id: Uuid,
    pub line_no: i32,
    pub account_code: String,
    pub debit_minor: i64,
    pub credit_minor: i64,
    pub description: Option<String>,
}

/// Insert parameters for a journal line
#[derive(Debug, Clone)]
pub struct JournalLineInsert {
    pub id: Uuid,
    pub line_no: i32,
    pub account_code: String,
    pub debit_minor: i64,
    pub credit_minor: i64,
    pub description: Option<String>,
}

/// Insert parameters for a journal entry header
#[derive(Debug, Clone)]
pub struct JournalEntryInsert {
    pub id: Uuid,
    pub entry_number: String,
    pub date: NaiveDate,
    pub description: String,
    pub reference: Option<String>,
    pub currency: String,
    pub contact_id: Option<Uuid>,
    pub total_debit_minor: i64,
    pub total_credit_minor: i64,
}

#[derive(Debug, Error)]
pub enum JournalRepoError {
    #[error("Journal entry not found: tenant_id={tenant_id}, id={id}")]
    NotFound { tenant_id: String, id: Uuid },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

const ENTRY_COLUMNS: &str = "id, tenant_id, entry_number, date, description, reference, \
     currency, contact_id, status, total_debit_minor, total_credit_minor, \
     posted_at, void_reason, created_at";

/// Insert a journal entry header in draft status, within a transaction
pub async fn insert_entry(
    tx: &mut Transaction<'_, Postgres>,
    tenant: &TenantId,
    entry: &JournalEntryInsert,
) -> Result<(), JournalRepoError> {
    sqlx::query(
        r#"
        INSERT INTO journal_entries
            (id, tenant_id, entry_number, date, description, reference,
             currency, contact_id, status, total_debit_minor, total_credit_minor)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'draft', $9, $10)
        "#,
    )
    .bind(entry.id)
    .bind(tenant.as_str())
    .bind(&entry.entry_number)
    .bind(entry.date)
    .bind(&entry.description)
    .bind(&entry.reference)
    .bind(&entry.currency)
    .bind(entry.contact_id)
    .bind(entry.total_debit_minor)
    .bind(entry.total_credit_minor)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// Bulk insert journal lines for an entry, within a transaction
pub async fn bulk_insert_lines(
    tx: &mut Transaction<'_, Postgres>,
    entry_id: Uuid,
    lines: Vec<JournalLineInsert>,
) -> Result<(), JournalRepoError> {
    for line in lines {
        sqlx::query(
            r#"
            INSERT INTO journal_lines
                (id, journal_entry_id, line_no, account_code, debit_minor, credit_minor, description)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(line.id)
        .bind(entry_id)
        .bind(line.line_no)
        .bind(&line.account_code)
        .bind(line.debit_minor)
        .bind(line.credit_minor)
        .bind(&line.description)
        .execute(&mut **tx)
        .await?;
    }

    Ok(())
}

/// Find a journal entry header by id
pub async fn find_entry(
    pool: &PgPool,
    tenant: &TenantId,
    id: Uuid,
) -> Result<Option<JournalEntry>, JournalRepoError> {
    let entry = sqlx::query_as::<_, JournalEntry>(&format!(
        r#"
        SELECT {ENTRY_COLUMNS}
        FROM journal_entries
        WHERE tenant_id = $1 AND id = $2
        "#
    ))
    .bind(tenant.as_str())
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(entry)
}

/// Find a journal entry header by id, locking the row for update
///
/// Serializes concurrent post/void attempts on the same entry.
pub async fn find_entry_for_update(
    tx: &mut Transaction<'_, Postgres>,
    tenant: &TenantId,
    id: Uuid,
) -> Result<Option<JournalEntry>, JournalRepoError> {
    let entry = sqlx::query_as::<_, JournalEntry>(&format!(
        r#"
        SELECT {ENTRY_COLUMNS}
        FROM journal_entries
        WHERE tenant_id = $1 AND id = $2
        FOR UPDATE
        "#
    ))
    .bind(tenant.as_str())
    .bind(id)
    .fetch_optional(&mut **tx)
    .await?;

    Ok(entry)
}

/// Fetch the lines of a journal entry, ordered by line number
pub async fn fetch_lines(
    pool: &PgPool,
    entry_id: Uuid,
) -> Result<Vec<JournalLine>, JournalRepoError> {
    let lines = sqlx::query_as::<_, JournalLine>(
        r#"
        SELECT id, journal_entry_id, line_no, account_code, debit_minor, credit_minor, description
        FROM journal_lines
        WHERE journal_entry_id = $1
        ORDER BY line_no ASC
        "#,
    )
    .bind(entry_id)
    .fetch_all(pool)
    .await?;

    Ok(lines)
}

/// Fetch the lines of a journal entry within a transaction
pub async fn fetch_lines_tx(
    tx: &mut Transaction<'_, Postgres>,
    entry_id: Uuid,
) -> Result<Vec<JournalLine>, JournalRepoError> {
    let lines = sqlx::query_as::<_, JournalLine>(
        r#"
        SELECT id, journal_entry_id, line_no, account_code, debit_minor, credit_minor, description
        FROM journal_lines
        WHERE journal_entry_id = $1
        ORDER BY line_no ASC
        "#,
    )
    .bind(entry_id)
    .fetch_all(&mut **tx)
    .await?;

    Ok(lines)
}

/// Mark an entry as posted, within the posting transaction
pub async fn set_posted(
    tx: &mut Transaction<'_, Postgres>,
    tenant: &TenantId,
    id: Uuid,
    posted_at: DateTime<Utc>,
) -> Result<(), JournalRepoError> {
    let result = sqlx::query(
        r#"
        UPDATE journal_entries
        SET status = 'posted', posted_at = $3
        WHERE tenant_id = $1 AND id = $2
        "#,
    )
    .bind(tenant.as_str())
    .bind(id)
    .bind(posted_at)
    .execute(&mut **tx)
    .await?;

    if result.rows_affected() == 0 {
        return Err(JournalRepoError::NotFound {
            tenant_id: tenant.as_str().to_string(),
            id,
        });
    }

    Ok(())
}

/// Mark an entry as voided, within the voiding transaction
pub async fn set_voided(
    tx: &mut Transaction<'_, Postgres>,
    tenant: &TenantId,
    id: Uuid,
    reason: &str,
) -> Result<(), JournalRepoError> {
    let result = sqlx::query(
        r#"
        UPDATE journal_entries
        SET status = 'voided', void_reason = $3
        WHERE tenant_id = $1 AND id = $2
        "#,
    )
    .bind(tenant.as_str())
    .bind(id)
    .bind(reason)
    .execute(&mut **tx)
    .await?;

    if result.rows_affected() == 0 {
        return Err(JournalRepoError::NotFound {
            tenant_id: tenant.as_str().to_string(),
            id,
        });
    }

    Ok(())
}
