//! Chart of Accounts business logic

use sqlx::PgPool;

use crate::repos::account_repo::{self, Account, AccountError, AccountSubtype, AccountType, NewAccount};
use crate::tenant::TenantId;
use crate::validation::{to_minor_units, MAX_AMOUNT_MAJOR};

/// Errors that can occur during account operations
#[derive(Debug, thiserror::Error)]
pub enum AccountServiceError {
    #[error("Account code cannot be empty")]
    EmptyCode,

    #[error("Account name cannot be empty")]
    EmptyName,

    #[error("Currency must be a 3-letter uppercase code (ISO 4217), got: {0}")]
    InvalidCurrency(String),

    #[error("Parent account not found: {0}")]
    ParentNotFound(String),

    #[error("Opening balance out of range: {0}")]
    OpeningBalanceOutOfRange(f64),

    #[error(transparent)]
    Account(#[from] AccountError),
}

/// Input for creating an account, amounts in major units
#[derive(Debug, Clone)]
pub struct CreateAccountInput {
    pub code: String,
    pub name: String,
    pub account_type: AccountType,
    pub subtype: AccountSubtype,
    pub parent_code: Option<String>,
    pub currency: String,
    pub opening_balance: f64,
}

/// Create an account in the Chart of Accounts
///
/// The normal balance side is derived from the account type; a duplicate
/// code for the tenant surfaces as `AccountError::DuplicateCode`.
pub async fn create_account(
    pool: &PgPool,
    tenant: &TenantId,
    input: CreateAccountInput,
) -> Result<Account, AccountServiceError> {
    if input.code.trim().is_empty() {
        return Err(AccountServiceError::EmptyCode);
    }
    if input.name.trim().is_empty() {
        return Err(AccountServiceError::EmptyName);
    }
    if input.currency.len() != 3 || !input.currency.chars().all(|c| c.is_ascii_uppercase()) {
        return Err(AccountServiceError::InvalidCurrency(input.currency));
    }
    if !input.opening_balance.is_finite() || input.opening_balance.abs() > MAX_AMOUNT_MAJOR {
        return Err(AccountServiceError::OpeningBalanceOutOfRange(
            input.opening_balance,
        ));
    }

    if let Some(ref parent_code) = input.parent_code {
        if account_repo::find_by_code(pool, tenant, parent_code)
            .await?
            .is_none()
        {
            return Err(AccountServiceError::ParentNotFound(parent_code.clone()));
        }
    }

    let account = account_repo::insert(
        pool,
        tenant,
        &NewAccount {
            code: input.code,
            name: input.name,
            account_type: input.account_type,
            subtype: input.subtype,
            parent_code: input.parent_code,
            currency: input.currency,
            opening_balance_minor: to_minor_units(input.opening_balance),
        },
    )
    .await?;

    tracing::info!(
        tenant_id = %tenant,
        account_code = %account.code,
        account_type = ?account.account_type,
        "Account created"
    );

    Ok(account)
}

/// Fetch an account by code
pub async fn get_account(
    pool: &PgPool,
    tenant: &TenantId,
    code: &str,
) -> Result<Account, AccountServiceError> {
    let account = account_repo::find_by_code(pool, tenant, code)
        .await?
        .ok_or_else(|| AccountError::NotFound {
            tenant_id: tenant.as_str().to_string(),
            code: code.to_string(),
        })?;

    Ok(account)
}

/// List accounts with optional filters
pub async fn list_accounts(
    pool: &PgPool,
    tenant: &TenantId,
    account_type: Option<AccountType>,
    active_only: bool,
) -> Result<Vec<Account>, AccountServiceError> {
    Ok(account_repo::list(pool, tenant, account_type, active_only).await?)
}

/// Deactivate an account
///
/// The account stays on every historical report; it just stops accepting
/// new journal lines.
pub async fn deactivate_account(
    pool: &PgPool,
    tenant: &TenantId,
    code: &str,
) -> Result<(), AccountServiceError> {
    account_repo::deactivate(pool, tenant, code).await?;

    tracing::info!(tenant_id = %tenant, account_code = %code, "Account deactivated");

    Ok(())
}
