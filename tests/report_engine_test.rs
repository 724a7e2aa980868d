//! Cross-report consistency over a shared scenario
//!
//! Builds one quarter of activity as plain rows and checks that the report
//! computations agree with each other: the trial balance stays balanced, the
//! income statement's pre-tax profit equals the balance sheet's retained
//! earnings figure, and the general ledger totals match the line stream.

use chrono::NaiveDate;
use uuid::Uuid;

use ledger_rs::repos::account_repo::{AccountSubtype, AccountType, NormalBalance};
use ledger_rs::repos::report_query_repo::{AccountPeriodSums, LedgerLineRow};
use ledger_rs::services::{
    balance_sheet_service, expense_report_service, general_ledger_service,
    income_statement_service::{self, FlatRatePolicy},
    trial_balance_service,
};

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn normal_balance(account_type: AccountType) -> NormalBalance {
    match account_type {
        AccountType::Asset | AccountType::Expense => NormalBalance::Debit,
        _ => NormalBalance::Credit,
    }
}

fn sums(
    code: &str,
    name: &str,
    account_type: AccountType,
    subtype: AccountSubtype,
    debit: i64,
    credit: i64,
) -> AccountPeriodSums {
    AccountPeriodSums {
        account_code: code.to_string(),
        account_name: name.to_string(),
        account_type,
        subtype,
        normal_balance: normal_balance(account_type),
        opening_balance_minor: 0,
        debit_minor: debit,
        credit_minor: credit,
    }
}

fn line(
    code: &str,
    account_type: AccountType,
    subtype: AccountSubtype,
    entry: &str,
    d: &str,
    line_no: i32,
    debit: i64,
    credit: i64,
) -> LedgerLineRow {
    LedgerLineRow {
        account_code: code.to_string(),
        account_name: format!("Account {code}"),
        account_type,
        subtype,
        normal_balance: normal_balance(account_type),
        entry_id: Uuid::new_v4(),
        entry_number: entry.to_string(),
        date: date(d),
        entry_description: "entry".to_string(),
        line_description: None,
        line_no,
        debit_minor: debit,
        credit_minor: credit,
        contact_id: None,
    }
}

/// Quarter scenario: 500.00 cash sale, 120.00 rent paid, 80.00 of inventory
/// sold at cost. Every entry is balanced, so all derived reports must agree.
fn quarter_sums() -> Vec<AccountPeriodSums> {
    vec![
        sums("1000", "Cash", AccountType::Asset, AccountSubtype::Cash, 50_000, 12_000),
        sums("1200", "Inventory", AccountType::Asset, AccountSubtype::Inventory, 0, 8_000),
        sums("4000", "Sales", AccountType::Revenue, AccountSubtype::Sales, 0, 50_000),
        sums("5000", "Cost of Goods Sold", AccountType::Expense, AccountSubtype::CostOfGoods, 8_000, 0),
        sums("6000", "Rent", AccountType::Expense, AccountSubtype::Rent, 12_000, 0),
    ]
}

#[test]
fn trial_balance_is_balanced_for_balanced_postings() {
    let report = trial_balance_service::compute(date("2024-03-31"), &quarter_sums());

    assert!(report.is_balanced);
    assert_eq!(report.difference_minor, 0);
    // Cash 380.00 debit, inventory is a credit-column flip (0 - 80.00)
    let cash = report.rows.iter().find(|r| r.account_code == "1000").unwrap();
    assert_eq!(cash.debit_balance_minor, 38_000);
    let inventory = report.rows.iter().find(|r| r.account_code == "1200").unwrap();
    assert_eq!(inventory.credit_balance_minor, 8_000);
}

#[test]
fn income_statement_profit_matches_balance_sheet_plug() {
    let sums = quarter_sums();
    // Tax is a statement-level figure; the ledger holds no tax entry, so the
    // comparison against the balance sheet plug is pre-tax
    let no_tax = FlatRatePolicy { rate_bps: 0 };
    let income = income_statement_service::compute(
        date("2024-01-01"),
        date("2024-03-31"),
        &sums,
        None,
        &no_tax,
    );
    let sheet = balance_sheet_service::compute(date("2024-03-31"), &sums);

    // 500.00 revenue - 80.00 COGS - 120.00 rent = 300.00
    assert_eq!(income.income_before_tax_minor, 30_000);
    assert_eq!(sheet.retained_earnings_minor, 30_000);
    assert!(sheet.is_balanced);
}

#[test]
fn income_statement_tax_applies_after_profit_chain() {
    let policy = FlatRatePolicy { rate_bps: 2000 };
    let income = income_statement_service::compute(
        date("2024-01-01"),
        date("2024-03-31"),
        &quarter_sums(),
        None,
        &policy,
    );

    assert_eq!(income.gross_profit_minor, 42_000);
    assert_eq!(income.operating_income_minor, 30_000);
    assert_eq!(income.tax_minor, 6_000);
    assert_eq!(income.net_income_minor, 24_000);
}

#[test]
fn general_ledger_totals_match_line_stream() {
    let pre = quarter_sums()
        .into_iter()
        .map(|mut s| {
            // No pre-period activity in this scenario
            s.debit_minor = 0;
            s.credit_minor = 0;
            s
        })
        .collect::<Vec<_>>();

    let lines = vec![
        line("1000", AccountType::Asset, AccountSubtype::Cash, "JE-20240110-AAAAAA", "2024-01-10", 1, 50_000, 0),
        line("4000", AccountType::Revenue, AccountSubtype::Sales, "JE-20240110-AAAAAA", "2024-01-10", 2, 0, 50_000),
        line("6000", AccountType::Expense, AccountSubtype::Rent, "JE-20240201-BBBBBB", "2024-02-01", 1, 12_000, 0),
        line("1000", AccountType::Asset, AccountSubtype::Cash, "JE-20240201-BBBBBB", "2024-02-01", 2, 0, 12_000),
        line("5000", AccountType::Expense, AccountSubtype::CostOfGoods, "JE-20240215-CCCCCC", "2024-02-15", 1, 8_000, 0),
        line("1200", AccountType::Asset, AccountSubtype::Inventory, "JE-20240215-CCCCCC", "2024-02-15", 2, 0, 8_000),
    ];

    let report =
        general_ledger_service::compute(date("2024-01-01"), date("2024-03-31"), &pre, lines);

    assert_eq!(report.total_debit_minor, 70_000);
    assert_eq!(report.total_credit_minor, 70_000);

    let cash = report
        .accounts
        .iter()
        .find(|a| a.account_code == "1000")
        .unwrap();
    assert_eq!(cash.lines[0].running_balance_minor, 50_000);
    assert_eq!(cash.lines[1].running_balance_minor, 38_000);
    assert_eq!(cash.closing_balance_minor, 38_000);
}

#[test]
fn expense_report_total_matches_income_statement_expenses() {
    let lines = vec![
        line("5000", AccountType::Expense, AccountSubtype::CostOfGoods, "JE-20240215-CCCCCC", "2024-02-15", 1, 8_000, 0),
        line("6000", AccountType::Expense, AccountSubtype::Rent, "JE-20240201-BBBBBB", "2024-02-01", 1, 12_000, 0),
        line("1000", AccountType::Asset, AccountSubtype::Cash, "JE-20240201-BBBBBB", "2024-02-01", 2, 0, 12_000),
    ];

    let expenses =
        expense_report_service::compute(date("2024-01-01"), date("2024-03-31"), &lines);

    let no_tax = FlatRatePolicy { rate_bps: 0 };
    let income = income_statement_service::compute(
        date("2024-01-01"),
        date("2024-03-31"),
        &quarter_sums(),
        None,
        &no_tax,
    );

    let statement_expenses = income.cost_of_goods.total_minor
        + income.operating_expenses.total_minor
        + income.other_expenses.total_minor;
    assert_eq!(expenses.total_minor, statement_expenses);
}
