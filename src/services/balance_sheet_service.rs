//! Balance sheet computation
//!
//! As-of snapshot from inception-to-date sums. Retained earnings is derived
//! as the balancing figure (assets minus liabilities minus contributed
//! equity) rather than read from an account, so accumulated profit that was
//! never formally closed into equity still lands on the statement.

use chrono::NaiveDate;
use serde::Serialize;

use crate::repos::account_repo::{AccountSubtype, AccountType};
use crate::repos::report_query_repo::AccountPeriodSums;
use crate::services::ledger_replay::line_movement;

/// One account row on the balance sheet
#[derive(Debug, Clone, Serialize)]
pub struct BalanceSheetRow {
    pub account_code: String,
    pub account_name: String,
    pub balance_minor: i64,
}

/// A balance sheet section with its subtotal
#[derive(Debug, Clone, Serialize)]
pub struct BalanceSheetSection {
    pub rows: Vec<BalanceSheetRow>,
    pub total_minor: i64,
}

/// Computed balance sheet
#[derive(Debug, Clone, Serialize)]
pub struct BalanceSheetReport {
    pub as_of: NaiveDate,
    pub current_assets: BalanceSheetSection,
    pub fixed_assets: BalanceSheetSection,
    pub other_assets: BalanceSheetSection,
    pub total_assets_minor: i64,
    pub current_liabilities: BalanceSheetSection,
    pub long_term_liabilities: BalanceSheetSection,
    pub total_liabilities_minor: i64,
    pub equity: BalanceSheetSection,
    pub retained_earnings_minor: i64,
    pub total_equity_minor: i64,
    pub is_balanced: bool,
}

fn section_rows(
    sums: &[AccountPeriodSums],
    predicate: impl Fn(&AccountPeriodSums) -> bool,
) -> BalanceSheetSection {
    let mut rows = Vec::new();
    let mut total = 0i64;

    for account in sums {
        if !predicate(account) {
            continue;
        }
        let balance = account.opening_balance_minor
            + line_movement(account.debit_minor, account.credit_minor, account.normal_balance);
        if balance == 0 && account.debit_minor == 0 && account.credit_minor == 0 {
            continue;
        }
        total += balance;
        rows.push(BalanceSheetRow {
            account_code: account.account_code.clone(),
            account_name: account.account_name.clone(),
            balance_minor: balance,
        });
    }

    BalanceSheetSection {
        rows,
        total_minor: total,
    }
}

/// Compute the balance sheet as of a date from inception-to-date sums
pub fn compute(as_of: NaiveDate, sums: &[AccountPeriodSums]) -> BalanceSheetReport {
    let current_assets = section_rows(sums, |a| {
        a.account_type == AccountType::Asset
            && a.subtype != AccountSubtype::FixedAsset
            && a.subtype != AccountSubtype::OtherAsset
    });
    let fixed_assets = section_rows(sums, |a| {
        a.account_type == AccountType::Asset && a.subtype == AccountSubtype::FixedAsset
    });
    let other_assets = section_rows(sums, |a| {
        a.account_type == AccountType::Asset && a.subtype == AccountSubtype::OtherAsset
    });
    let total_assets =
        current_assets.total_minor + fixed_assets.total_minor + other_assets.total_minor;

    let current_liabilities = section_rows(sums, |a| {
        a.account_type == AccountType::Liability && a.subtype != AccountSubtype::Loan
    });
    let long_term_liabilities = section_rows(sums, |a| {
        a.account_type == AccountType::Liability && a.subtype == AccountSubtype::Loan
    });
    let total_liabilities = current_liabilities.total_minor + long_term_liabilities.total_minor;

    let equity = section_rows(sums, |a| a.account_type == AccountType::Equity);

    // Balancing figure: profit accumulated in revenue/expense accounts that
    // was never closed into an equity account
    let retained_earnings = total_assets - total_liabilities - equity.total_minor;
    let total_equity = equity.total_minor + retained_earnings;

    let is_balanced = (total_assets - total_liabilities - total_equity).abs() <= 1;

    BalanceSheetReport {
        as_of,
        current_assets,
        fixed_assets,
        other_assets,
        total_assets_minor: total_assets,
        current_liabilities,
        long_term_liabilities,
        total_liabilities_minor: total_liabilities,
        equity,
        retained_earnings_minor: retained_earnings,
        total_equity_minor: total_equity,
        is_balanced,
    }
}
