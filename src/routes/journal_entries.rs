//! Journal entry API routes

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::contracts::journal_entry_request::JournalEntryRequest;
use crate::repos::account_repo::AccountError;
use crate::repos::journal_repo::{EntryStatus, JournalEntry, JournalLine};
use crate::routes::{ApiError, AppState};
use crate::services::journal_service::{self, JournalError};
use crate::tenant::resolve_tenant;

/// Response for entry creation and transitions
#[derive(Debug, Serialize)]
pub struct EntryStatusResponse {
    pub entry_id: Uuid,
    pub entry_number: String,
    pub status: EntryStatus,
}

/// Request body for voiding an entry
#[derive(Debug, Deserialize)]
pub struct VoidEntryBody {
    pub reason: String,
}

/// Journal line response DTO
#[derive(Debug, Serialize)]
pub struct JournalLineResponse {
    pub line_no: i32,
    pub account_code: String,
    pub debit_minor: i64,
    pub credit_minor: i64,
    pub description: Option<String>,
}

/// Full entry response with lines (audit view)
#[derive(Debug, Serialize)]
pub struct JournalEntryResponse {
    pub entry_id: Uuid,
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
    pub lines: Vec<JournalLineResponse>,
}

fn to_entry_response(entry: JournalEntry, lines: Vec<JournalLine>) -> JournalEntryResponse {
    JournalEntryResponse {
        entry_id: entry.id,
        entry_number: entry.entry_number,
        date: entry.date,
        description: entry.description,
        reference: entry.reference,
        currency: entry.currency,
        contact_id: entry.contact_id,
        status: entry.status,
        total_debit_minor: entry.total_debit_minor,
        total_credit_minor: entry.total_credit_minor,
        posted_at: entry.posted_at,
        void_reason: entry.void_reason,
        lines: lines
            .into_iter()
            .map(|l| JournalLineResponse {
                line_no: l.line_no,
                account_code: l.account_code,
                debit_minor: l.debit_minor,
                credit_minor: l.credit_minor,
                description: l.description,
            })
            .collect(),
    }
}

/// Handler for POST /api/ledger/entries
pub async fn create_entry(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<JournalEntryRequest>,
) -> Result<(StatusCode, Json<EntryStatusResponse>), ApiError> {
    let tenant = resolve_tenant(&headers)?;

    let entry = journal_service::create_entry(&state.pool, &tenant, &body)
        .await
        .map_err(map_journal_error)?;

    Ok((
        StatusCode::CREATED,
        Json(EntryStatusResponse {
            entry_id: entry.id,
            entry_number: entry.entry_number,
            status: entry.status,
        }),
    ))
}

/// Handler for POST /api/ledger/entries/{id}/post
pub async fn post_entry(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<EntryStatusResponse>, ApiError> {
    let tenant = resolve_tenant(&headers)?;

    journal_service::post_entry(&state.pool, &tenant, id)
        .await
        .map_err(map_journal_error)?;

    let (entry, _) = journal_service::get_entry_with_lines(&state.pool, &tenant, id)
        .await
        .map_err(map_journal_error)?;

    Ok(Json(EntryStatusResponse {
        entry_id: entry.id,
        entry_number: entry.entry_number,
        status: entry.status,
    }))
}

/// Handler for POST /api/ledger/entries/{id}/void
pub async fn void_entry(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(body): Json<VoidEntryBody>,
) -> Result<Json<EntryStatusResponse>, ApiError> {
    let tenant = resolve_tenant(&headers)?;

    if body.reason.trim().is_empty() {
        return Err(ApiError::bad_request("Void reason cannot be empty"));
    }

    journal_service::void_entry(&state.pool, &tenant, id, &body.reason)
        .await
        .map_err(map_journal_error)?;

    let (entry, _) = journal_service::get_entry_with_lines(&state.pool, &tenant, id)
        .await
        .map_err(map_journal_error)?;

    Ok(Json(EntryStatusResponse {
        entry_id: entry.id,
        entry_number: entry.entry_number,
        status: entry.status,
    }))
}

/// Handler for GET /api/ledger/entries/{id}
pub async fn get_entry(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<JournalEntryResponse>, ApiError> {
    let tenant = resolve_tenant(&headers)?;

    let (entry, lines) = journal_service::get_entry_with_lines(&state.pool, &tenant, id)
        .await
        .map_err(map_journal_error)?;

    Ok(Json(to_entry_response(entry, lines)))
}

fn map_journal_error(e: JournalError) -> ApiError {
    match e {
        JournalError::Validation(_)
        | JournalError::InvalidDate(_)
        | JournalError::Unbalanced { .. }
        | JournalError::ContactNotFound(_)
        | JournalError::Delta(_) => ApiError::bad_request(e.to_string()),
        // A database failure during the account lookup is not a client error
        JournalError::InvalidAccount(AccountError::Database(_))
        | JournalError::Repo(_)
        | JournalError::Database(_) => {
            tracing::error!(error = %e, "Journal operation failed");
            ApiError::internal("Journal operation failed")
        }
        JournalError::InvalidAccount(_) => ApiError::bad_request(e.to_string()),
        JournalError::NotFound(_) => ApiError::not_found(e.to_string()),
        JournalError::InvalidTransition { .. } => ApiError::conflict(e.to_string()),
    }
}
