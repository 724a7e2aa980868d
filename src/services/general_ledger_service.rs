//! General ledger report computation
//!
//! Per-account activity detail: opening balance as of period start, every
//! posted line replayed in (date, entry_number) order with a running balance,
//! and a closing balance per account.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::repos::report_query_repo::{AccountPeriodSums, LedgerLineRow};
use crate::services::ledger_replay::{self, line_movement, ReplayInput, ReplayedLine};

/// One account's activity section
#[derive(Debug, Clone, Serialize)]
pub struct GeneralLedgerAccount {
    pub account_code: String,
    pub account_name: String,
    pub opening_balance_minor: i64,
    pub lines: Vec<ReplayedLine>,
    pub closing_balance_minor: i64,
    pub total_debit_minor: i64,
    pub total_credit_minor: i64,
    pub entry_count: usize,
}

/// Computed general ledger report
#[derive(Debug, Clone, Serialize)]
pub struct GeneralLedgerReport {
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub accounts: Vec<GeneralLedgerAccount>,
    pub total_debit_minor: i64,
    pub total_credit_minor: i64,
}

/// Compute the general ledger report
///
/// `pre_period_sums` are inception-to-day-before-period sums per account and
/// seed each opening balance. Accounts with no period activity and a zero
/// opening balance are skipped.
pub fn compute(
    period_start: NaiveDate,
    period_end: NaiveDate,
    pre_period_sums: &[AccountPeriodSums],
    lines: Vec<LedgerLineRow>,
) -> GeneralLedgerReport {
    let mut lines_by_account: BTreeMap<String, Vec<LedgerLineRow>> = BTreeMap::new();
    for line in lines {
        lines_by_account
            .entry(line.account_code.clone())
            .or_default()
            .push(line);
    }

    let mut accounts = Vec::new();
    let mut grand_debit = 0i64;
    let mut grand_credit = 0i64;

    for account in pre_period_sums {
        let opening = account.opening_balance_minor
            + line_movement(account.debit_minor, account.credit_minor, account.normal_balance);

        let account_lines = lines_by_account
            .remove(&account.account_code)
            .unwrap_or_default();

        if account_lines.is_empty() && opening == 0 {
            continue;
        }

        let total_debit: i64 = account_lines.iter().map(|l| l.debit_minor).sum();
        let total_credit: i64 = account_lines.iter().map(|l| l.credit_minor).sum();
        let entry_count = account_lines.len();

        let replay_inputs: Vec<ReplayInput> = account_lines
            .into_iter()
            .map(|l| ReplayInput {
                entry_number: l.entry_number,
                date: l.date,
                description: l.line_description.unwrap_or(l.entry_description),
                line_no: l.line_no,
                debit_minor: l.debit_minor,
                credit_minor: l.credit_minor,
            })
            .collect();

        let (replayed, closing) =
            ledger_replay::replay(opening, account.normal_balance, replay_inputs);

        grand_debit += total_debit;
        grand_credit += total_credit;

        accounts.push(GeneralLedgerAccount {
            account_code: account.account_code.clone(),
            account_name: account.account_name.clone(),
            opening_balance_minor: opening,
            lines: replayed,
            closing_balance_minor: closing,
            total_debit_minor: total_debit,
            total_credit_minor: total_credit,
            entry_count,
        });
    }

    GeneralLedgerReport {
        period_start,
        period_end,
        accounts,
        total_debit_minor: grand_debit,
        total_credit_minor: grand_credit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repos::account_repo::{AccountSubtype, AccountType, NormalBalance};
    use uuid::Uuid;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn pre_sums(code: &str, opening: i64, debit: i64, credit: i64) -> AccountPeriodSums {
        AccountPeriodSums {
            account_code: code.to_string(),
            account_name: format!("Account {code}"),
            account_type: AccountType::Asset,
            subtype: AccountSubtype::Cash,
            normal_balance: NormalBalance::Debit,
            opening_balance_minor: opening,
            debit_minor: debit,
            credit_minor: credit,
        }
    }

    fn line(code: &str, entry: &str, d: &str, debit: i64, credit: i64) -> LedgerLineRow {
        LedgerLineRow {
            account_code: code.to_string(),
            account_name: format!("Account {code}"),
            account_type: AccountType::Asset,
            subtype: AccountSubtype::Cash,
            normal_balance: NormalBalance::Debit,
            entry_id: Uuid::new_v4(),
            entry_number: entry.to_string(),
            date: date(d),
            entry_description: "entry".to_string(),
            line_description: None,
            line_no: 1,
            debit_minor: debit,
            credit_minor: credit,
            contact_id: None,
        }
    }

    #[test]
    fn test_running_balance_sequence() {
        // Opening 100.00, then debit 50.00 and credit 20.00
        let pre = vec![pre_sums("1000", 10_000, 0, 0)];
        let lines = vec![
            line("1000", "JE-20240201-AAAAAA", "2024-02-01", 5_000, 0),
            line("1000", "JE-20240202-BBBBBB", "2024-02-02", 0, 2_000),
        ];

        let report = compute(date("2024-02-01"), date("2024-02-29"), &pre, lines);

        assert_eq!(report.accounts.len(), 1);
        let account = &report.accounts[0];
        assert_eq!(account.opening_balance_minor, 10_000);
        assert_eq!(account.lines[0].running_balance_minor, 15_000);
        assert_eq!(account.lines[1].running_balance_minor, 13_000);
        assert_eq!(account.closing_balance_minor, 13_000);
        assert_eq!(account.entry_count, 2);
    }

    #[test]
    fn test_opening_includes_pre_period_activity() {
        // Opening balance 100.00 plus pre-period net debit 30.00
        let pre = vec![pre_sums("1000", 10_000, 5_000, 2_000)];
        let lines = vec![line("1000", "JE-20240205-CCCCCC", "2024-02-05", 1_000, 0)];

        let report = compute(date("2024-02-01"), date("2024-02-29"), &pre, lines);

        assert_eq!(report.accounts[0].opening_balance_minor, 13_000);
        assert_eq!(report.accounts[0].closing_balance_minor, 14_000);
    }

    #[test]
    fn test_dormant_accounts_skipped() {
        let pre = vec![pre_sums("1000", 0, 0, 0), pre_sums("1100", 500, 0, 0)];
        let lines = vec![];

        let report = compute(date("2024-02-01"), date("2024-02-29"), &pre, lines);

        // Zero opening and no activity is skipped; nonzero opening stays
        assert_eq!(report.accounts.len(), 1);
        assert_eq!(report.accounts[0].account_code, "1100");
    }

    #[test]
    fn test_grand_totals_sum_all_accounts() {
        let pre = vec![pre_sums("1000", 0, 0, 0), pre_sums("1100", 0, 0, 0)];
        let lines = vec![
            line("1000", "JE-20240201-AAAAAA", "2024-02-01", 5_000, 0),
            line("1100", "JE-20240201-AAAAAA", "2024-02-01", 0, 5_000),
        ];

        let report = compute(date("2024-02-01"), date("2024-02-29"), &pre, lines);

        assert_eq!(report.total_debit_minor, 5_000);
        assert_eq!(report.total_credit_minor, 5_000);
    }
}
