use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use thiserror::Error;
use uuid::Uuid;

use crate::tenant::TenantId;

/// Account type enum matching database account_type
#[derive(Debug, Clone, Copy, sqlx::Type, PartialEq, Eq, Serialize, Deserialize)]
#[sqlx(type_name = "account_type", rename_all = "lowercase")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountType {
    Asset,
    Liability,
    Equity,
    Revenue,
    Expense,
}

/// Account subtype enum matching database account_subtype
///
/// Subtypes drive report classification: balance sheet bucketing, income
/// statement sections, and sub-ledger control account selection.
#[derive(Debug, Clone, Copy, sqlx::Type, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[sqlx(type_name = "account_subtype", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountSubtype {
    Cash,
    Bank,
    AccountsReceivable,
    Inventory,
    FixedAsset,
    OtherAsset,
    AccountsPayable,
    CreditCard,
    TaxPayable,
    Loan,
    OtherLiability,
    RetainedEarnings,
    ShareCapital,
    Sales,
    Service,
    OtherIncome,
    CostOfGoods,
    Operating,
    Payroll,
    Rent,
    Utilities,
    OtherExpense,
}

/// Normal balance enum matching database normal_balance
#[derive(Debug, Clone, Copy, sqlx::Type, PartialEq, Eq, Serialize, Deserialize)]
#[sqlx(type_name = "normal_balance", rename_all = "lowercase")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NormalBalance {
    Debit,
    Credit,
}

/// Derive the normal balance side from the account type
///
/// Asset and expense accounts increase on the debit side; liability, equity,
/// and revenue accounts increase on the credit side.
pub fn normal_balance_for(account_type: AccountType) -> NormalBalance {
    match account_type {
        AccountType::Asset | AccountType::Expense => NormalBalance::Debit,
        AccountType::Liability | AccountType::Equity | AccountType::Revenue => {
            NormalBalance::Credit
        }
    }
}

/// Account model representing a Chart of Accounts entry
#[derive(Debug, Clone, FromRow)]
pub struct Account {
    pub id: Uuid,
    pub tenant_id: String,
    pub code: String,
    pub name: String,
    #[sqlx(rename = "type")]
    pub account_type: AccountType,
    pub subtype: AccountSubtype,
    pub normal_balance: NormalBalance,
    pub parent_code: Option<String>,
    pub currency: String,
    pub opening_balance_minor: i64,
    pub current_balance_minor: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Errors that can occur during account repository operations
#[derive(Debug, Error)]
pub enum AccountError {
    #[error("Account not found: tenant_id={tenant_id}, code={code}")]
    NotFound { tenant_id: String, code: String },

    #[error("Account is inactive: tenant_id={tenant_id}, code={code}")]
    Inactive { tenant_id: String, code: String },

    #[error("Duplicate account code: tenant_id={tenant_id}, code={code}")]
    DuplicateCode { tenant_id: String, code: String },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// New account parameters
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub code: String,
    pub name: String,
    pub account_type: AccountType,
    pub subtype: AccountSubtype,
    pub parent_code: Option<String>,
    pub currency: String,
    pub opening_balance_minor: i64,
}

const ACCOUNT_COLUMNS: &str = "id, tenant_id, code, name, type, subtype, normal_balance, \
     parent_code, currency, opening_balance_minor, current_balance_minor, is_active, created_at";

/// Insert a new account
///
/// The normal balance side is derived from the account type. A unique
/// violation on (tenant_id, code) maps to `DuplicateCode`.
pub async fn insert(
    pool: &PgPool,
    tenant: &TenantId,
    account: &NewAccount,
) -> Result<Account, AccountError> {
    let normal_balance = normal_balance_for(account.account_type);

    let result = sqlx::query_as::<_, Account>(&format!(
        r#"
        INSERT INTO accounts
            (id, tenant_id, code, name, type, subtype, normal_balance,
             parent_code, currency, opening_balance_minor, current_balance_minor)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10)
        RETURNING {ACCOUNT_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(tenant.as_str())
    .bind(&account.code)
    .bind(&account.name)
    .bind(account.account_type)
    .bind(account.subtype)
    .bind(normal_balance)
    .bind(&account.parent_code)
    .bind(&account.currency)
    .bind(account.opening_balance_minor)
    .fetch_one(pool)
    .await;

    match result {
        Ok(acc) => Ok(acc),
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            Err(AccountError::DuplicateCode {
                tenant_id: tenant.as_str().to_string(),
                code: account.code.clone(),
            })
        }
        Err(e) => Err(AccountError::Database(e)),
    }
}

/// Find an account by code
/// Returns None if account doesn't exist
pub async fn find_by_code(
    pool: &PgPool,
    tenant: &TenantId,
    code: &str,
) -> Result<Option<Account>, AccountError> {
    let account = sqlx::query_as::<_, Account>(&format!(
        r#"
        SELECT {ACCOUNT_COLUMNS}
        FROM accounts
        WHERE tenant_id = $1 AND code = $2
        "#
    ))
    .bind(tenant.as_str())
    .bind(code)
    .fetch_optional(pool)
    .await?;

    Ok(account)
}

/// Find an account by code within a transaction
pub async fn find_by_code_tx(
    tx: &mut Transaction<'_, Postgres>,
    tenant: &TenantId,
    code: &str,
) -> Result<Option<Account>, AccountError> {
    let account = sqlx::query_as::<_, Account>(&format!(
        r#"
        SELECT {ACCOUNT_COLUMNS}
        FROM accounts
        WHERE tenant_id = $1 AND code = $2
        "#
    ))
    .bind(tenant.as_str())
    .bind(code)
    .fetch_optional(&mut **tx)
    .await?;

    Ok(account)
}

/// Find an active account by code
/// Returns error if account doesn't exist or is inactive
pub async fn find_active_by_code(
    pool: &PgPool,
    tenant: &TenantId,
    code: &str,
) -> Result<Account, AccountError> {
    let account = find_by_code(pool, tenant, code).await?;
    require_active(tenant, code, account)
}

/// Find an active account by code within a transaction
pub async fn find_active_by_code_tx(
    tx: &mut Transaction<'_, Postgres>,
    tenant: &TenantId,
    code: &str,
) -> Result<Account, AccountError> {
    let account = find_by_code_tx(tx, tenant, code).await?;
    require_active(tenant, code, account)
}

fn require_active(
    tenant: &TenantId,
    code: &str,
    account: Option<Account>,
) -> Result<Account, AccountError> {
    match account {
        Some(acc) if acc.is_active => Ok(acc),
        Some(_) => Err(AccountError::Inactive {
            tenant_id: tenant.as_str().to_string(),
            code: code.to_string(),
        }),
        None => Err(AccountError::NotFound {
            tenant_id: tenant.as_str().to_string(),
            code: code.to_string(),
        }),
    }
}

/// List accounts for a tenant, optionally filtered by type and active flag
pub async fn list(
    pool: &PgPool,
    tenant: &TenantId,
    account_type: Option<AccountType>,
    active_only: bool,
) -> Result<Vec<Account>, AccountError> {
    let accounts = sqlx::query_as::<_, Account>(&format!(
        r#"
        SELECT {ACCOUNT_COLUMNS}
        FROM accounts
        WHERE tenant_id = $1
          AND ($2::account_type IS NULL OR type = $2)
          AND (NOT $3 OR is_active)
        ORDER BY code ASC
        "#
    ))
    .bind(tenant.as_str())
    .bind(account_type)
    .bind(active_only)
    .fetch_all(pool)
    .await?;

    Ok(accounts)
}

/// Mark an account inactive
///
/// Accounts are never deleted; historical journal lines keep referencing
/// the code.
pub async fn deactivate(
    pool: &PgPool,
    tenant: &TenantId,
    code: &str,
) -> Result<(), AccountError> {
    let result = sqlx::query(
        r#"
        UPDATE accounts
        SET is_active = FALSE
        WHERE tenant_id = $1 AND code = $2
        "#,
    )
    .bind(tenant.as_str())
    .bind(code)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AccountError::NotFound {
            tenant_id: tenant.as_str().to_string(),
            code: code.to_string(),
        });
    }

    Ok(())
}

/// Apply a signed delta to an account's running balance, within a transaction
///
/// The delta is already expressed in the account's natural sign convention.
/// This is the only code path that mutates current_balance_minor; posting and
/// voiding both go through it.
pub async fn tx_adjust_balance(
    tx: &mut Transaction<'_, Postgres>,
    tenant: &TenantId,
    code: &str,
    signed_delta_minor: i64,
) -> Result<(), AccountError> {
    let result = sqlx::query(
        r#"
        UPDATE accounts
        SET current_balance_minor = current_balance_minor + $3
        WHERE tenant_id = $1 AND code = $2
        "#,
    )
    .bind(tenant.as_str())
    .bind(code)
    .bind(signed_delta_minor)
    .execute(&mut **tx)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AccountError::NotFound {
            tenant_id: tenant.as_str().to_string(),
            code: code.to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normal_balance_for_debit_types() {
        assert_eq!(normal_balance_for(AccountType::Asset), NormalBalance::Debit);
        assert_eq!(
            normal_balance_for(AccountType::Expense),
            NormalBalance::Debit
        );
    }

    #[test]
    fn test_normal_balance_for_credit_types() {
        assert_eq!(
            normal_balance_for(AccountType::Liability),
            NormalBalance::Credit
        );
        assert_eq!(
            normal_balance_for(AccountType::Equity),
            NormalBalance::Credit
        );
        assert_eq!(
            normal_balance_for(AccountType::Revenue),
            NormalBalance::Credit
        );
    }

    #[test]
    fn test_account_subtype_serde_shape() {
        let json = serde_json::to_string(&AccountSubtype::AccountsReceivable).unwrap();
        assert_eq!(json, "\"ACCOUNTS_RECEIVABLE\"");
        let back: AccountSubtype = serde_json::from_str("\"COST_OF_GOODS\"").unwrap();
        assert_eq!(back, AccountSubtype::CostOfGoods);
    }
}
