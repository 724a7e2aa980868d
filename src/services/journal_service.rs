//! Journal entry lifecycle: create draft, post, void
//!
//! Posting and voiding run inside a single database transaction with the
//! entry row locked, so balance updates are all-or-nothing and concurrent
//! attempts on the same entry serialize.

use chrono::{NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::contracts::journal_entry_request::JournalEntryRequest;
use crate::repos::account_repo::{self, AccountError};
use crate::repos::contact_repo;
use crate::repos::journal_repo::{
    self, EntryStatus, JournalEntry, JournalEntryInsert, JournalLine, JournalLineInsert,
    JournalRepoError,
};
use crate::services::balance_deltas::{self, DeltaError, JournalLineInput};
use crate::services::report_cache_service;
use crate::tenant::TenantId;
use crate::validation::{to_minor_units, validate_journal_entry_request, ValidationError};

/// Errors that can occur during journal entry processing
#[derive(Debug, thiserror::Error)]
pub enum JournalError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Invalid account: {0}")]
    InvalidAccount(#[from] AccountError),

    #[error("Contact not found: {0}")]
    ContactNotFound(Uuid),

    #[error("Journal entry not found: {0}")]
    NotFound(Uuid),

    #[error("Invalid transition: cannot {action} an entry in {from:?} status")]
    InvalidTransition {
        from: EntryStatus,
        action: &'static str,
    },

    #[error("Entry is unbalanced: debits={debit_minor}, credits={credit_minor}")]
    Unbalanced { debit_minor: i64, credit_minor: i64 },

    #[error("Invalid posting date: {0}")]
    InvalidDate(String),

    #[error("Delta computation failed: {0}")]
    Delta(#[from] DeltaError),

    #[error(transparent)]
    Repo(#[from] JournalRepoError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Result type for journal operations
pub type JournalResult<T> = Result<T, JournalError>;

/// Generate an entry number: JE-YYYYMMDD-XXXXXX
///
/// The suffix is six hex characters from a fresh v4 uuid, uppercased.
/// Uniqueness per tenant is enforced by the database constraint.
pub fn generate_entry_number(date: NaiveDate) -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!(
        "JE-{}-{}",
        date.format("%Y%m%d"),
        id[..6].to_uppercase()
    )
}

/// Create a journal entry in draft status
///
/// Validates the payload, checks every referenced account exists and is
/// active for the tenant, then inserts header and lines in one transaction.
/// Draft entries touch no balances.
pub async fn create_entry(
    pool: &PgPool,
    tenant: &TenantId,
    payload: &JournalEntryRequest,
) -> JournalResult<JournalEntry> {
    validate_journal_entry_request(payload)?;

    let date = NaiveDate::parse_from_str(&payload.date, "%Y-%m-%d")
        .map_err(|e| JournalError::InvalidDate(format!("{}: {}", payload.date, e)))?;

    if let Some(contact_id) = payload.contact_id {
        if contact_repo::find_by_id(pool, tenant, contact_id)
            .await
            .map_err(|e| match e {
                contact_repo::ContactError::Database(e) => JournalError::Database(e),
                contact_repo::ContactError::NotFound { id, .. } => {
                    JournalError::ContactNotFound(id)
                }
            })?
            .is_none()
        {
            return Err(JournalError::ContactNotFound(contact_id));
        }
    }

    let mut tx = pool.begin().await?;

    // Validate accounts inside the transaction so a concurrent deactivation
    // cannot slip between check and insert
    for line in &payload.lines {
        account_repo::find_active_by_code_tx(&mut tx, tenant, &line.account_code).await?;
    }

    let entry_id = Uuid::new_v4();
    let lines: Vec<JournalLineInsert> = payload
        .lines
        .iter()
        .enumerate()
        .map(|(idx, line)| JournalLineInsert {
            id: Uuid::new_v4(),
            line_no: (idx + 1) as i32,
            account_code: line.account_code.clone(),
            debit_minor: to_minor_units(line.debit),
            credit_minor: to_minor_units(line.credit),
            description: line.description.clone(),
        })
        .collect();

    let total_debit_minor: i64 = lines.iter().map(|l| l.debit_minor).sum();
    let total_credit_minor: i64 = lines.iter().map(|l| l.credit_minor).sum();

    let insert = JournalEntryInsert {
        id: entry_id,
        entry_number: generate_entry_number(date),
        date,
        description: payload.description.clone(),
        reference: payload.reference.clone(),
        currency: payload.currency.clone(),
        contact_id: payload.contact_id,
        total_debit_minor,
        total_credit_minor,
    };

    journal_repo::insert_entry(&mut tx, tenant, &insert).await?;
    journal_repo::bulk_insert_lines(&mut tx, entry_id, lines).await?;

    tx.commit().await?;

    tracing::info!(
        tenant_id = %tenant,
        entry_id = %entry_id,
        entry_number = %insert.entry_number,
        total_debit_minor,
        "Draft journal entry created"
    );

    let entry = journal_repo::find_entry(pool, tenant, entry_id)
        .await?
        .ok_or(JournalError::NotFound(entry_id))?;

    Ok(entry)
}

/// Post a draft entry, applying its deltas to account balances
///
/// Only draft entries can be posted. The whole operation is one transaction:
/// the entry row is locked, totals are re-verified from the stored lines,
/// every affected balance is adjusted, and the status flips to posted.
pub async fn post_entry(pool: &PgPool, tenant: &TenantId, id: Uuid) -> JournalResult<()> {
    let mut tx = pool.begin().await?;

    let entry = journal_repo::find_entry_for_update(&mut tx, tenant, id)
        .await?
        .ok_or(JournalError::NotFound(id))?;

    if entry.status != EntryStatus::Draft {
        return Err(JournalError::InvalidTransition {
            from: entry.status,
            action: "post",
        });
    }

    let lines = journal_repo::fetch_lines_tx(&mut tx, id).await?;
    let total_debit: i64 = lines.iter().map(|l| l.debit_minor).sum();
    let total_credit: i64 = lines.iter().map(|l| l.credit_minor).sum();
    if total_debit != total_credit {
        return Err(JournalError::Unbalanced {
            debit_minor: total_debit,
            credit_minor: total_credit,
        });
    }

    let deltas = balance_deltas::compute_deltas(&to_delta_inputs(&lines))?;

    for delta in &deltas {
        let account =
            account_repo::find_active_by_code_tx(&mut tx, tenant, &delta.account_code).await?;
        account_repo::tx_adjust_balance(
            &mut tx,
            tenant,
            &delta.account_code,
            delta.signed_delta(account.normal_balance),
        )
        .await?;
    }

    journal_repo::set_posted(&mut tx, tenant, id, Utc::now()).await?;

    tx.commit().await?;

    tracing::info!(
        tenant_id = %tenant,
        entry_id = %id,
        entry_number = %entry.entry_number,
        accounts_touched = deltas.len(),
        "Journal entry posted"
    );

    invalidate_report_caches(pool, tenant, entry.date).await;

    Ok(())
}

/// Void a posted entry, reversing its balance effect exactly
///
/// Only posted entries can be voided. The entry remains queryable with its
/// lines; it just stops contributing to balances and reports.
pub async fn void_entry(
    pool: &PgPool,
    tenant: &TenantId,
    id: Uuid,
    reason: &str,
) -> JournalResult<()> {
    let mut tx = pool.begin().await?;

    let entry = journal_repo::find_entry_for_update(&mut tx, tenant, id)
        .await?
        .ok_or(JournalError::NotFound(id))?;

    if entry.status != EntryStatus::Posted {
        return Err(JournalError::InvalidTransition {
            from: entry.status,
            action: "void",
        });
    }

    let lines = journal_repo::fetch_lines_tx(&mut tx, id).await?;
    let deltas = balance_deltas::compute_deltas(&to_delta_inputs(&lines))?;

    for delta in &deltas {
        // Voiding an inactive account's line is allowed: the balance must be
        // reversed regardless of current account state
        let account = account_repo::find_by_code_tx(&mut tx, tenant, &delta.account_code)
            .await?
            .ok_or_else(|| {
                JournalError::InvalidAccount(AccountError::NotFound {
                    tenant_id: tenant.as_str().to_string(),
                    code: delta.account_code.clone(),
                })
            })?;
        account_repo::tx_adjust_balance(
            &mut tx,
            tenant,
            &delta.account_code,
            delta.negated().signed_delta(account.normal_balance),
        )
        .await?;
    }

    journal_repo::set_voided(&mut tx, tenant, id, reason).await?;

    tx.commit().await?;

    tracing::info!(
        tenant_id = %tenant,
        entry_id = %id,
        entry_number = %entry.entry_number,
        reason = %reason,
        "Journal entry voided"
    );

    invalidate_report_caches(pool, tenant, entry.date).await;

    Ok(())
}

/// Fetch an entry with its lines (audit view; any status)
pub async fn get_entry_with_lines(
    pool: &PgPool,
    tenant: &TenantId,
    id: Uuid,
) -> JournalResult<(JournalEntry, Vec<JournalLine>)> {
    let entry = journal_repo::find_entry(pool, tenant, id)
        .await?
        .ok_or(JournalError::NotFound(id))?;
    let lines = journal_repo::fetch_lines(pool, id).await?;

    Ok((entry, lines))
}

fn to_delta_inputs(lines: &[JournalLine]) -> Vec<JournalLineInput> {
    lines
        .iter()
        .map(|l| JournalLineInput {
            account_code: l.account_code.clone(),
            debit_minor: l.debit_minor,
            credit_minor: l.credit_minor,
        })
        .collect()
}

/// Invalidate cached reports whose period covers the entry date
///
/// Runs after the posting/voiding transaction has committed. A failure here
/// is logged rather than returned: the ledger change is already durable, and
/// stale caches self-heal on the next hash check.
async fn invalidate_report_caches(pool: &PgPool, tenant: &TenantId, date: NaiveDate) {
    match report_cache_service::invalidate_by_date_range(pool, tenant, date, date).await {
        Ok(count) if count > 0 => {
            tracing::info!(tenant_id = %tenant, %date, invalidated = count, "Report caches invalidated");
        }
        Ok(_) => {}
        Err(e) => {
            tracing::error!(tenant_id = %tenant, %date, error = %e, "Report cache invalidation failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_number_format() {
        let date = NaiveDate::parse_from_str("2024-02-11", "%Y-%m-%d").unwrap();
        let number = generate_entry_number(date);

        assert!(number.starts_with("JE-20240211-"));
        let suffix = &number["JE-20240211-".len()..];
        assert_eq!(suffix.len(), 6);
        assert!(suffix
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }

    #[test]
    fn test_entry_numbers_are_distinct() {
        let date = NaiveDate::parse_from_str("2024-02-11", "%Y-%m-%d").unwrap();
        let a = generate_entry_number(date);
        let b = generate_entry_number(date);
        assert_ne!(a, b);
    }
}
