//! Expense report computation
//!
//! Derived entirely from posted expense-account lines: one detail line per
//! journal line, with rollups by account and by subtype. Net amount per line
//! is debit minus credit, so expense refunds reduce the totals.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::repos::account_repo::{AccountSubtype, AccountType};
use crate::repos::report_query_repo::LedgerLineRow;

/// One expense detail line
#[derive(Debug, Clone, Serialize)]
pub struct ExpenseLine {
    pub date: NaiveDate,
    pub entry_number: String,
    pub account_code: String,
    pub account_name: String,
    pub subtype: AccountSubtype,
    pub description: String,
    pub amount_minor: i64,
}

/// Per-account rollup
#[derive(Debug, Clone, Serialize)]
pub struct ExpenseByAccount {
    pub account_code: String,
    pub account_name: String,
    pub total_minor: i64,
}

/// Per-subtype rollup
#[derive(Debug, Clone, Serialize)]
pub struct ExpenseBySubtype {
    pub subtype: AccountSubtype,
    pub total_minor: i64,
}

/// Computed expense report
#[derive(Debug, Clone, Serialize)]
pub struct ExpenseReport {
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub lines: Vec<ExpenseLine>,
    pub by_account: Vec<ExpenseByAccount>,
    pub by_subtype: Vec<ExpenseBySubtype>,
    pub total_minor: i64,
}

/// Compute the expense report from the posted line stream
///
/// Non-expense lines are ignored; the input may be the unfiltered period
/// stream.
pub fn compute(
    period_start: NaiveDate,
    period_end: NaiveDate,
    lines: &[LedgerLineRow],
) -> ExpenseReport {
    let mut detail = Vec::new();
    let mut by_account: BTreeMap<String, (String, i64)> = BTreeMap::new();
    let mut by_subtype: BTreeMap<String, (AccountSubtype, i64)> = BTreeMap::new();
    let mut total = 0i64;

    for line in lines {
        if line.account_type != AccountType::Expense {
            continue;
        }

        let amount = line.debit_minor - line.credit_minor;
        total += amount;

        by_account
            .entry(line.account_code.clone())
            .or_insert_with(|| (line.account_name.clone(), 0))
            .1 += amount;

        by_subtype
            .entry(format!("{:?}", line.subtype))
            .or_insert((line.subtype, 0))
            .1 += amount;

        detail.push(ExpenseLine {
            date: line.date,
            entry_number: line.entry_number.clone(),
            account_code: line.account_code.clone(),
            account_name: line.account_name.clone(),
            subtype: line.subtype,
            description: line
                .line_description
                .clone()
                .unwrap_or_else(|| line.entry_description.clone()),
            amount_minor: amount,
        });
    }

    ExpenseReport {
        period_start,
        period_end,
        lines: detail,
        by_account: by_account
            .into_iter()
            .map(|(account_code, (account_name, total_minor))| ExpenseByAccount {
                account_code,
                account_name,
                total_minor,
            })
            .collect(),
        by_subtype: by_subtype
            .into_values()
            .map(|(subtype, total_minor)| ExpenseBySubtype {
                subtype,
                total_minor,
            })
            .collect(),
        total_minor: total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repos::account_repo::NormalBalance;
    use uuid::Uuid;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn line(
        code: &str,
        account_type: AccountType,
        subtype: AccountSubtype,
        d: &str,
        debit: i64,
        credit: i64,
    ) -> LedgerLineRow {
        LedgerLineRow {
            account_code: code.to_string(),
            account_name: format!("Account {code}"),
            account_type,
            subtype,
            normal_balance: NormalBalance::Debit,
            entry_id: Uuid::new_v4(),
            entry_number: format!("JE-{}-AAAAAA", d.replace('-', "")),
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
    fn test_only_expense_lines_included() {
        let lines = vec![
            line("6000", AccountType::Expense, AccountSubtype::Rent, "2024-02-01", 5_000, 0),
            line("1000", AccountType::Asset, AccountSubtype::Cash, "2024-02-01", 0, 5_000),
        ];

        let report = compute(date("2024-02-01"), date("2024-02-29"), &lines);

        assert_eq!(report.lines.len(), 1);
        assert_eq!(report.total_minor, 5_000);
    }

    #[test]
    fn test_refund_reduces_totals() {
        let lines = vec![
            line("6000", AccountType::Expense, AccountSubtype::Rent, "2024-02-01", 5_000, 0),
            line("6000", AccountType::Expense, AccountSubtype::Rent, "2024-02-10", 0, 1_000),
        ];

        let report = compute(date("2024-02-01"), date("2024-02-29"), &lines);

        assert_eq!(report.total_minor, 4_000);
        assert_eq!(report.by_account[0].total_minor, 4_000);
    }

    #[test]
    fn test_rollups_group_by_account_and_subtype() {
        let lines = vec![
            line("6000", AccountType::Expense, AccountSubtype::Rent, "2024-02-01", 5_000, 0),
            line("6100", AccountType::Expense, AccountSubtype::Utilities, "2024-02-02", 2_000, 0),
            line("6100", AccountType::Expense, AccountSubtype::Utilities, "2024-02-03", 1_000, 0),
        ];

        let report = compute(date("2024-02-01"), date("2024-02-29"), &lines);

        assert_eq!(report.by_account.len(), 2);
        assert_eq!(report.by_subtype.len(), 2);
        let utilities = report
            .by_account
            .iter()
            .find(|a| a.account_code == "6100")
            .unwrap();
        assert_eq!(utilities.total_minor, 3_000);
        assert_eq!(report.total_minor, 8_000);
    }
}
