//! Trial balance computation
//!
//! Classifies every account's natural-side balance into a debit or credit
//! column. A balance that has gone negative on its natural side flips to the
//! opposite column as a positive figure, so both columns stay non-negative.

use chrono::NaiveDate;
use serde::Serialize;

use crate::repos::account_repo::NormalBalance;
use crate::repos::report_query_repo::AccountPeriodSums;
use crate::services::ledger_replay::line_movement;

/// One account row in the trial balance
#[derive(Debug, Clone, Serialize)]
pub struct TrialBalanceRow {
    pub account_code: String,
    pub account_name: String,
    pub account_type: String,
    pub debit_balance_minor: i64,
    pub credit_balance_minor: i64,
}

/// Computed trial balance report
#[derive(Debug, Clone, Serialize)]
pub struct TrialBalanceReport {
    pub period_end: NaiveDate,
    pub rows: Vec<TrialBalanceRow>,
    pub total_debit_minor: i64,
    pub total_credit_minor: i64,
    pub is_balanced: bool,
    pub difference_minor: i64,
}

/// Compute the trial balance from inception-to-date account sums
///
/// Accounts with no activity and a zero balance are omitted. The balance
/// check is exact: minor units, no epsilon.
pub fn compute(period_end: NaiveDate, sums: &[AccountPeriodSums]) -> TrialBalanceReport {
    let mut rows = Vec::new();
    let mut total_debit = 0i64;
    let mut total_credit = 0i64;

    for account in sums {
        let balance = account.opening_balance_minor
            + line_movement(account.debit_minor, account.credit_minor, account.normal_balance);

        if balance == 0 && account.debit_minor == 0 && account.credit_minor == 0 {
            continue;
        }

        let (debit_balance, credit_balance) = classify(balance, account.normal_balance);
        total_debit += debit_balance;
        total_credit += credit_balance;

        rows.push(TrialBalanceRow {
            account_code: account.account_code.clone(),
            account_name: account.account_name.clone(),
            account_type: format!("{:?}", account.account_type).to_lowercase(),
            debit_balance_minor: debit_balance,
            credit_balance_minor: credit_balance,
        });
    }

    TrialBalanceReport {
        period_end,
        rows,
        total_debit_minor: total_debit,
        total_credit_minor: total_credit,
        is_balanced: total_debit == total_credit,
        difference_minor: total_debit - total_credit,
    }
}

/// Place a natural-side balance into the (debit, credit) columns
fn classify(natural_balance_minor: i64, side: NormalBalance) -> (i64, i64) {
    match side {
        NormalBalance::Debit if natural_balance_minor >= 0 => (natural_balance_minor, 0),
        NormalBalance::Debit => (0, -natural_balance_minor),
        NormalBalance::Credit if natural_balance_minor >= 0 => (0, natural_balance_minor),
        NormalBalance::Credit => (-natural_balance_minor, 0),
    }
}
