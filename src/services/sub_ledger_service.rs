//! Sub-ledger report computation
//!
//! Groups control-account activity by counterparty. Receivable balances grow
//! with debits (customers owe more), payable balances grow with credits (we
//! owe vendors more). A line belongs to a contact when it hits the contact's
//! control account or the entry is attached to the contact and touches it.

use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use crate::repos::account_repo::NormalBalance;
use crate::repos::contact_repo::{Contact, ContactType};
use crate::repos::report_query_repo::{AccountPeriodSums, LedgerLineRow};
use crate::services::ledger_replay::{self, line_movement, ReplayInput, ReplayedLine};

/// Which side of the sub-ledger a section belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubLedgerSide {
    Receivable,
    Payable,
}

impl SubLedgerSide {
    /// Sign convention for running balances on this side
    pub fn balance_side(self) -> NormalBalance {
        match self {
            // Customers owe us: debits increase the receivable
            SubLedgerSide::Receivable => NormalBalance::Debit,
            // We owe vendors: credits increase the payable
            SubLedgerSide::Payable => NormalBalance::Credit,
        }
    }
}

/// One contact's activity section
#[derive(Debug, Clone, Serialize)]
pub struct SubLedgerContact {
    pub contact_id: Uuid,
    pub contact_name: String,
    pub side: SubLedgerSide,
    pub control_account_code: String,
    pub opening_balance_minor: i64,
    pub lines: Vec<ReplayedLine>,
    pub closing_balance_minor: i64,
}

/// Computed sub-ledger report
#[derive(Debug, Clone, Serialize)]
pub struct SubLedgerReport {
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub receivables: Vec<SubLedgerContact>,
    pub total_receivable_minor: i64,
    pub payables: Vec<SubLedgerContact>,
    pub total_payable_minor: i64,
}

/// Compute the sub-ledger report
///
/// `pre_period_sums` seed control-account opening balances (inception to the
/// day before the period). Contacts with no activity and a zero opening
/// balance are skipped. A `Both`-typed contact can appear on either side.
pub fn compute(
    period_start: NaiveDate,
    period_end: NaiveDate,
    contacts: &[Contact],
    pre_period_sums: &[AccountPeriodSums],
    lines: &[LedgerLineRow],
) -> SubLedgerReport {
    let mut receivables = Vec::new();
    let mut payables = Vec::new();
    let mut total_receivable = 0i64;
    let mut total_payable = 0i64;

    for contact in contacts {
        if matches!(contact.contact_type, ContactType::Customer | ContactType::Both) {
            if let Some(section) = contact_section(
                contact,
                SubLedgerSide::Receivable,
                contact.receivable_account_code.as_deref(),
                pre_period_sums,
                lines,
            ) {
                total_receivable += section.closing_balance_minor;
                receivables.push(section);
            }
        }
        if matches!(contact.contact_type, ContactType::Vendor | ContactType::Both) {
            if let Some(section) = contact_section(
                contact,
                SubLedgerSide::Payable,
                contact.payable_account_code.as_deref(),
                pre_period_sums,
                lines,
            ) {
                total_payable += section.closing_balance_minor;
                payables.push(section);
            }
        }
    }

    receivables.sort_by(|a, b| a.contact_name.cmp(&b.contact_name));
    payables.sort_by(|a, b| a.contact_name.cmp(&b.contact_name));

    SubLedgerReport {
        period_start,
        period_end,
        receivables,
        total_receivable_minor: total_receivable,
        payables,
        total_payable_minor: total_payable,
    }
}

fn contact_section(
    contact: &Contact,
    side: SubLedgerSide,
    control_account: Option<&str>,
    pre_period_sums: &[AccountPeriodSums],
    lines: &[LedgerLineRow],
) -> Option<SubLedgerContact> {
    let control_account = control_account?;
    let balance_side = side.balance_side();

    let opening = pre_period_sums
        .iter()
        .find(|s| s.account_code == control_account)
        .map(|s| {
            s.opening_balance_minor + line_movement(s.debit_minor, s.credit_minor, balance_side)
        })
        .unwrap_or(0);

    let contact_lines: Vec<ReplayInput> = lines
        .iter()
        .filter(|l| {
            l.account_code == control_account
                && (l.contact_id.is_none() || l.contact_id == Some(contact.id))
        })
        .map(|l| ReplayInput {
            entry_number: l.entry_number.clone(),
            date: l.date,
            description: l
                .line_description
                .clone()
                .unwrap_or_else(|| l.entry_description.clone()),
            line_no: l.line_no,
            debit_minor: l.debit_minor,
            credit_minor: l.credit_minor,
        })
        .collect();

    if contact_lines.is_empty() && opening == 0 {
        return None;
    }

    let (replayed, closing) = ledger_replay::replay(opening, balance_side, contact_lines);

    Some(SubLedgerContact {
        contact_id: contact.id,
        contact_name: contact.name.clone(),
        side,
        control_account_code: control_account.to_string(),
        opening_balance_minor: opening,
        lines: replayed,
        closing_balance_minor: closing,
    })
}
