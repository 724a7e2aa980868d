//! Chart of Accounts API routes

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::repos::account_repo::{Account, AccountError, AccountSubtype, AccountType, NormalBalance};
use crate::routes::{ApiError, AppState};
use crate::services::account_service::{self, AccountServiceError, CreateAccountInput};
use crate::tenant::resolve_tenant;

/// Request body for creating an account
#[derive(Debug, Deserialize)]
pub struct CreateAccountBody {
    pub code: String,
    pub name: String,
    pub account_type: AccountType,
    pub subtype: AccountSubtype,
    pub parent_code: Option<String>,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub opening_balance: f64,
}

fn default_currency() -> String {
    "USD".to_string()
}

/// Account response DTO
#[derive(Debug, Serialize)]
pub struct AccountResponse {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub account_type: AccountType,
    pub subtype: AccountSubtype,
    pub normal_balance: NormalBalance,
    pub parent_code: Option<String>,
    pub currency: String,
    pub opening_balance_minor: i64,
    pub current_balance_minor: i64,
    pub is_active: bool,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        AccountResponse {
            id: account.id,
            code: account.code,
            name: account.name,
            account_type: account.account_type,
            subtype: account.subtype,
            normal_balance: account.normal_balance,
            parent_code: account.parent_code,
            currency: account.currency,
            opening_balance_minor: account.opening_balance_minor,
            current_balance_minor: account.current_balance_minor,
            is_active: account.is_active,
        }
    }
}

/// Query parameters for listing accounts
#[derive(Debug, Deserialize)]
pub struct ListAccountsQuery {
    #[serde(rename = "type")]
    pub account_type: Option<AccountType>,
    #[serde(default)]
    pub active_only: bool,
}

/// Handler for POST /api/accounts
pub async fn create_account(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<CreateAccountBody>,
) -> Result<(StatusCode, Json<AccountResponse>), ApiError> {
    let tenant = resolve_tenant(&headers)?;

    let account = account_service::create_account(
        &state.pool,
        &tenant,
        CreateAccountInput {
            code: body.code,
            name: body.name,
            account_type: body.account_type,
            subtype: body.subtype,
            parent_code: body.parent_code,
            currency: body.currency,
            opening_balance: body.opening_balance,
        },
    )
    .await
    .map_err(map_account_error)?;

    Ok((StatusCode::CREATED, Json(account.into())))
}

/// Handler for GET /api/accounts
pub async fn list_accounts(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<ListAccountsQuery>,
) -> Result<Json<Vec<AccountResponse>>, ApiError> {
    let tenant = resolve_tenant(&headers)?;

    let accounts = account_service::list_accounts(
        &state.pool,
        &tenant,
        params.account_type,
        params.active_only,
    )
    .await
    .map_err(map_account_error)?;

    Ok(Json(accounts.into_iter().map(Into::into).collect()))
}

/// Handler for GET /api/accounts/{code}
pub async fn get_account(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(code): Path<String>,
) -> Result<Json<AccountResponse>, ApiError> {
    let tenant = resolve_tenant(&headers)?;

    let account = account_service::get_account(&state.pool, &tenant, &code)
        .await
        .map_err(map_account_error)?;

    Ok(Json(account.into()))
}

/// Handler for DELETE /api/accounts/{code} (deactivation, not deletion)
pub async fn deactivate_account(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(code): Path<String>,
) -> Result<StatusCode, ApiError> {
    let tenant = resolve_tenant(&headers)?;

    account_service::deactivate_account(&state.pool, &tenant, &code)
        .await
        .map_err(map_account_error)?;

    Ok(StatusCode::NO_CONTENT)
}

fn map_account_error(e: AccountServiceError) -> ApiError {
    match e {
        AccountServiceError::Account(AccountError::DuplicateCode { .. }) => {
            ApiError::conflict(e.to_string())
        }
        AccountServiceError::Account(AccountError::NotFound { .. }) => {
            ApiError::not_found(e.to_string())
        }
        AccountServiceError::Account(AccountError::Inactive { .. })
        | AccountServiceError::EmptyCode
        | AccountServiceError::EmptyName
        | AccountServiceError::InvalidCurrency(_)
        | AccountServiceError::ParentNotFound(_)
        | AccountServiceError::OpeningBalanceOutOfRange(_) => ApiError::bad_request(e.to_string()),
        AccountServiceError::Account(AccountError::Database(_)) => {
            tracing::error!(error = %e, "Account operation failed");
            ApiError::internal("Account operation failed")
        }
    }
}
