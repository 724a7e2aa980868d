//! Contact API routes
//!
//! Counterparties feed the sub-ledger report; the linked control accounts
//! must exist in the Chart of Accounts before the contact references them.

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::repos::account_repo;
use crate::repos::contact_repo::{self, Contact, ContactType, NewContact};
use crate::routes::{ApiError, AppState};
use crate::tenant::resolve_tenant;

/// Request body for creating a contact
#[derive(Debug, Deserialize)]
pub struct CreateContactBody {
    pub name: String,
    pub contact_type: ContactType,
    pub receivable_account_code: Option<String>,
    pub payable_account_code: Option<String>,
}

/// Contact response DTO
#[derive(Debug, Serialize)]
pub struct ContactResponse {
    pub id: Uuid,
    pub name: String,
    pub contact_type: ContactType,
    pub receivable_account_code: Option<String>,
    pub payable_account_code: Option<String>,
    pub is_active: bool,
}

impl From<Contact> for ContactResponse {
    fn from(contact: Contact) -> Self {
        ContactResponse {
            id: contact.id,
            name: contact.name,
            contact_type: contact.contact_type,
            receivable_account_code: contact.receivable_account_code,
            payable_account_code: contact.payable_account_code,
            is_active: contact.is_active,
        }
    }
}

/// Query parameters for listing contacts
#[derive(Debug, Deserialize)]
pub struct ListContactsQuery {
    #[serde(rename = "type")]
    pub contact_type: Option<ContactType>,
}

/// Handler for POST /api/contacts
pub async fn create_contact(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<CreateContactBody>,
) -> Result<(StatusCode, Json<ContactResponse>), ApiError> {
    let tenant = resolve_tenant(&headers)?;

    if body.name.trim().is_empty() {
        return Err(ApiError::bad_request("Contact name cannot be empty"));
    }

    for code in [&body.receivable_account_code, &body.payable_account_code]
        .into_iter()
        .flatten()
    {
        let exists = account_repo::find_by_code(&state.pool, &tenant, code)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Contact account lookup failed");
                ApiError::internal("Contact account lookup failed")
            })?
            .is_some();
        if !exists {
            return Err(ApiError::bad_request(format!(
                "Linked account not found: {code}"
            )));
        }
    }

    let contact = contact_repo::insert(
        &state.pool,
        &tenant,
        &NewContact {
            name: body.name,
            contact_type: body.contact_type,
            receivable_account_code: body.receivable_account_code,
            payable_account_code: body.payable_account_code,
        },
    )
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "Contact creation failed");
        ApiError::internal("Contact creation failed")
    })?;

    Ok((StatusCode::CREATED, Json(contact.into())))
}

/// Handler for GET /api/contacts
pub async fn list_contacts(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<ListContactsQuery>,
) -> Result<Json<Vec<ContactResponse>>, ApiError> {
    let tenant = resolve_tenant(&headers)?;

    let contacts = contact_repo::list_active(&state.pool, &tenant, params.contact_type)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Contact listing failed");
            ApiError::internal("Contact listing failed")
        })?;

    Ok(Json(contacts.into_iter().map(Into::into).collect()))
}
