use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use thiserror::Error;
use uuid::Uuid;

use crate::tenant::TenantId;

/// Contact type enum matching database contact_type
#[derive(Debug, Clone, Copy, sqlx::Type, PartialEq, Eq, Serialize, Deserialize)]
#[sqlx(type_name = "contact_type", rename_all = "lowercase")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContactType {
    Customer,
    Vendor,
    Both,
}

/// Counterparty model for sub-ledger grouping
#[derive(Debug, Clone, FromRow)]
pub struct Contact {
    pub id: Uuid,
    pub tenant_id: String,
    pub name: String,
    pub contact_type: ContactType,
    pub receivable_account_code: Option<String>,
    pub payable_account_code: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum ContactError {
    #[error("Contact not found: tenant_id={tenant_id}, id={id}")]
    NotFound { tenant_id: String, id: Uuid },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Insert parameters for a new contact
#[derive(Debug, Clone)]
pub struct NewContact {
    pub name: String,
    pub contact_type: ContactType,
    pub receivable_account_code: Option<String>,
    pub payable_account_code: Option<String>,
}

/// Insert a new contact
pub async fn insert(
    pool: &PgPool,
    tenant: &TenantId,
    contact: &NewContact,
) -> Result<Contact, ContactError> {
    let inserted = sqlx::query_as::<_, Contact>(
        r#"
        INSERT INTO contacts
            (id, tenant_id, name, contact_type, receivable_account_code, payable_account_code)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, tenant_id, name, contact_type, receivable_account_code,
                  payable_account_code, is_active, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(tenant.as_str())
    .bind(&contact.name)
    .bind(contact.contact_type)
    .bind(&contact.receivable_account_code)
    .bind(&contact.payable_account_code)
    .fetch_one(pool)
    .await?;

    Ok(inserted)
}

/// Find a contact by id
pub async fn find_by_id(
    pool: &PgPool,
    tenant: &TenantId,
    id: Uuid,
) -> Result<Option<Contact>, ContactError> {
    let contact = sqlx::query_as::<_, Contact>(
        r#"
        SELECT id, tenant_id, name, contact_type, receivable_account_code,
               payable_account_code, is_active, created_at
        FROM contacts
        WHERE tenant_id = $1 AND id = $2
        "#,
    )
    .bind(tenant.as_str())
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(contact)
}

/// List active contacts for a tenant, optionally filtered by type
///
/// A `Both` contact matches either filter.
pub async fn list_active(
    pool: &PgPool,
    tenant: &TenantId,
    contact_type: Option<ContactType>,
) -> Result<Vec<Contact>, ContactError> {
    let contacts = sqlx::query_as::<_, Contact>(
        r#"
        SELECT id, tenant_id, name, contact_type, receivable_account_code,
               payable_account_code, is_active, created_at
        FROM contacts
        WHERE tenant_id = $1
          AND is_active
          AND ($2::contact_type IS NULL OR contact_type = $2 OR contact_type = 'both')
        ORDER BY name ASC
        "#,
    )
    .bind(tenant.as_str())
    .bind(contact_type)
    .fetch_all(pool)
    .await?;

    Ok(contacts)
}
