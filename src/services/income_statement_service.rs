//! Income statement computation with pluggable tax policy
//!
//! Revenue and expense accounts are partitioned by subtype into the report
//! sections; the tax line comes from a [`TaxPolicy`] so jurisdictions can be
//! swapped without touching the report math.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;

use crate::repos::account_repo::{AccountSubtype, AccountType};
use crate::repos::report_query_repo::AccountPeriodSums;

/// Tax computation over income before tax, in minor units
pub trait TaxPolicy: Send + Sync {
    fn tax_minor(&self, income_before_tax_minor: i64) -> i64;
}

/// Flat-rate tax at a configured rate in basis points, floored at zero
///
/// A loss produces no tax credit.
#[derive(Debug, Clone)]
pub struct FlatRatePolicy {
    pub rate_bps: u32,
}

impl TaxPolicy for FlatRatePolicy {
    fn tax_minor(&self, income_before_tax_minor: i64) -> i64 {
        let tax = income_before_tax_minor * self.rate_bps as i64 / 10_000;
        tax.max(0)
    }
}

/// One account line, with optional comparison figures
#[derive(Debug, Clone, Serialize)]
pub struct StatementLine {
    pub account_code: String,
    pub account_name: String,
    pub amount_minor: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comparison_amount_minor: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variance_minor: Option<i64>,
    /// Omitted when the comparison amount is zero
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variance_percent: Option<f64>,
}

/// A report section with its subtotal
#[derive(Debug, Clone, Serialize)]
pub struct StatementSection {
    pub lines: Vec<StatementLine>,
    pub total_minor: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comparison_total_minor: Option<i64>,
}

/// Computed income statement
#[derive(Debug, Clone, Serialize)]
pub struct IncomeStatementReport {
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub revenue: StatementSection,
    pub cost_of_goods: StatementSection,
    pub gross_profit_minor: i64,
    pub operating_expenses: StatementSection,
    pub operating_income_minor: i64,
    pub other_income: StatementSection,
    pub other_expenses: StatementSection,
    pub income_before_tax_minor: i64,
    pub tax_minor: i64,
    pub net_income_minor: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Section {
    Revenue,
    OtherIncome,
    CostOfGoods,
    OtherExpenses,
    OperatingExpenses,
}

fn section_for(account_type: AccountType, subtype: AccountSubtype) -> Option<Section> {
    match account_type {
        AccountType::Revenue => match subtype {
            AccountSubtype::OtherIncome => Some(Section::OtherIncome),
            _ => Some(Section::Revenue),
        },
        AccountType::Expense => match subtype {
            AccountSubtype::CostOfGoods => Some(Section::CostOfGoods),
            AccountSubtype::OtherExpense => Some(Section::OtherExpenses),
            _ => Some(Section::OperatingExpenses),
        },
        _ => None,
    }
}

/// Period amount for a P&L account: credit-led for revenue, debit-led for expense
fn period_amount(account: &AccountPeriodSums) -> i64 {
    match account.account_type {
        AccountType::Revenue => account.credit_minor - account.debit_minor,
        _ => account.debit_minor - account.credit_minor,
    }
}

/// Compute the income statement for a period
///
/// `comparison` carries the same account sums for the comparison period when
/// one was requested; variance figures only appear on lines with comparison
/// data, and variance_percent is omitted when the comparison amount is zero.
pub fn compute(
    period_start: NaiveDate,
    period_end: NaiveDate,
    current: &[AccountPeriodSums],
    comparison: Option<&[AccountPeriodSums]>,
    tax_policy: &dyn TaxPolicy,
) -> IncomeStatementReport {
    let comparison_amounts: Option<HashMap<&str, i64>> = comparison.map(|sums| {
        sums.iter()
            .map(|a| (a.account_code.as_str(), period_amount(a)))
            .collect()
    });

    let mut sections: HashMap<Section, Vec<StatementLine>> = HashMap::new();

    for account in current {
        let Some(section) = section_for(account.account_type, account.subtype) else {
            continue;
        };

        let amount = period_amount(account);
        let comparison_amount = comparison_amounts
            .as_ref()
            .map(|m| m.get(account.account_code.as_str()).copied().unwrap_or(0));

        if amount == 0 && comparison_amount.unwrap_or(0) == 0 {
            continue;
        }

        let (variance, variance_percent) = match comparison_amount {
            Some(comp) => {
                let variance = amount - comp;
                let percent = if comp != 0 {
                    Some(variance as f64 / comp.abs() as f64 * 100.0)
                } else {
                    None
                };
                (Some(variance), percent)
            }
            None => (None, None),
        };

        sections.entry(section).or_default().push(StatementLine {
            account_code: account.account_code.clone(),
            account_name: account.account_name.clone(),
            amount_minor: amount,
            comparison_amount_minor: comparison_amount,
            variance_minor: variance,
            variance_percent,
        });
    }

    let has_comparison = comparison.is_some();
    let mut take = |section: Section| -> StatementSection {
        let mut lines = sections.remove(&section).unwrap_or_default();
        lines.sort_by(|a, b| a.account_code.cmp(&b.account_code));
        let total = lines.iter().map(|l| l.amount_minor).sum();
        let comparison_total = has_comparison
            .then(|| lines.iter().filter_map(|l| l.comparison_amount_minor).sum());
        StatementSection {
            lines,
            total_minor: total,
            comparison_total_minor: comparison_total,
        }
    };

    let revenue = take(Section::Revenue);
    let cost_of_goods = take(Section::CostOfGoods);
    let operating_expenses = take(Section::OperatingExpenses);
    let other_income = take(Section::OtherIncome);
    let other_expenses = take(Section::OtherExpenses);

    let gross_profit = revenue.total_minor - cost_of_goods.total_minor;
    let operating_income = gross_profit - operating_expenses.total_minor;
    let income_before_tax =
        operating_income + other_income.total_minor - other_expenses.total_minor;
    let tax = tax_policy.tax_minor(income_before_tax);
    let net_income = income_before_tax - tax;

    IncomeStatementReport {
        period_start,
        period_end,
        revenue,
        cost_of_goods,
        gross_profit_minor: gross_profit,
        operating_expenses,
        operating_income_minor: operating_income,
        other_income,
        other_expenses,
        income_before_tax_minor: income_before_tax,
        tax_minor: tax,
        net_income_minor: net_income,
    }
}
