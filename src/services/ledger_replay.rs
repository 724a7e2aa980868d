//! Running-balance replay over posted journal lines
//!
//! Shared by the general ledger and sub-ledger reports. The replay order is
//! (date asc, entry_number asc, line_no asc) and is re-asserted here even
//! though the repository already fetches in that order.

use chrono::NaiveDate;
use serde::Serialize;

use crate::repos::account_repo::NormalBalance;

/// A line entering the replay
#[derive(Debug, Clone)]
pub struct ReplayInput {
    pub entry_number: String,
    pub date: NaiveDate,
    pub description: String,
    pub line_no: i32,
    pub debit_minor: i64,
    pub credit_minor: i64,
}

/// A replayed line carrying its post-line running balance
#[derive(Debug, Clone, Serialize)]
pub struct ReplayedLine {
    pub entry_number: String,
    pub date: NaiveDate,
    pub description: String,
    pub debit_minor: i64,
    pub credit_minor: i64,
    pub running_balance_minor: i64,
}

/// Signed movement of one line in the given sign convention
pub fn line_movement(debit_minor: i64, credit_minor: i64, side: NormalBalance) -> i64 {
    match side {
        NormalBalance::Debit => debit_minor - credit_minor,
        NormalBalance::Credit => credit_minor - debit_minor,
    }
}

/// Replay lines against an opening balance, producing per-line balances
///
/// Returns the replayed lines and the closing balance. Input order does not
/// matter; lines are sorted into replay order first.
pub fn replay(
    opening_balance_minor: i64,
    side: NormalBalance,
    mut lines: Vec<ReplayInput>,
) -> (Vec<ReplayedLine>, i64) {
    lines.sort_by(|a, b| {
        a.date
            .cmp(&b.date)
            .then_with(|| a.entry_number.cmp(&b.entry_number))
            .then_with(|| a.line_no.cmp(&b.line_no))
    });

    let mut balance = opening_balance_minor;
    let replayed = lines
        .into_iter()
        .map(|line| {
            balance += line_movement(line.debit_minor, line.credit_minor, side);
            ReplayedLine {
                entry_number: line.entry_number,
                date: line.date,
                description: line.description,
                debit_minor: line.debit_minor,
                credit_minor: line.credit_minor,
                running_balance_minor: balance,
            }
        })
        .collect();

    (replayed, balance)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn line(entry: &str, d: &str, line_no: i32, debit: i64, credit: i64) -> ReplayInput {
        ReplayInput {
            entry_number: entry.to_string(),
            date: date(d),
            description: "test".to_string(),
            line_no,
            debit_minor: debit,
            credit_minor: credit,
        }
    }

    #[test]
    fn test_replay_debit_normal_running_balance() {
        // Opening 100.00, debit 50.00, credit 20.00 on a debit-normal account
        let lines = vec![
            line("JE-20240201-AAAAAA", "2024-02-01", 1, 5000, 0),
            line("JE-20240202-BBBBBB", "2024-02-02", 1, 0, 2000),
        ];

        let (replayed, closing) = replay(10000, NormalBalance::Debit, lines);

        assert_eq!(replayed.len(), 2);
        assert_eq!(replayed[0].running_balance_minor, 15000);
        assert_eq!(replayed[1].running_balance_minor, 13000);
        assert_eq!(closing, 13000);
    }

    #[test]
    fn test_replay_credit_normal_running_balance() {
        let lines = vec![
            line("JE-20240201-AAAAAA", "2024-02-01", 1, 0, 5000),
            line("JE-20240202-BBBBBB", "2024-02-02", 1, 3000, 0),
        ];

        let (replayed, closing) = replay(0, NormalBalance::Credit, lines);

        assert_eq!(replayed[0].running_balance_minor, 5000);
        assert_eq!(replayed[1].running_balance_minor, 2000);
        assert_eq!(closing, 2000);
    }

    #[test]
    fn test_replay_orders_by_date_then_entry_number() {
        // Supplied out of order: the replay must sort before accumulating
        let lines = vec![
            line("JE-20240203-CCCCCC", "2024-02-03", 1, 1000, 0),
            line("JE-20240201-BBBBBB", "2024-02-01", 1, 2000, 0),
            line("JE-20240201-AAAAAA", "2024-02-01", 1, 4000, 0),
        ];

        let (replayed, closing) = replay(0, NormalBalance::Debit, lines);

        assert_eq!(replayed[0].entry_number, "JE-20240201-AAAAAA");
        assert_eq!(replayed[0].running_balance_minor, 4000);
        assert_eq!(replayed[1].entry_number, "JE-20240201-BBBBBB");
        assert_eq!(replayed[1].running_balance_minor, 6000);
        assert_eq!(replayed[2].entry_number, "JE-20240203-CCCCCC");
        assert_eq!(replayed[2].running_balance_minor, 7000);
        assert_eq!(closing, 7000);
    }

    #[test]
    fn test_replay_empty_lines_returns_opening() {
        let (replayed, closing) = replay(4200, NormalBalance::Debit, vec![]);
        assert!(replayed.is_empty());
        assert_eq!(closing, 4200);
    }

    #[test]
    fn test_line_movement_signs() {
        assert_eq!(line_movement(5000, 0, NormalBalance::Debit), 5000);
        assert_eq!(line_movement(0, 5000, NormalBalance::Debit), -5000);
        assert_eq!(line_movement(5000, 0, NormalBalance::Credit), -5000);
        assert_eq!(line_movement(0, 5000, NormalBalance::Credit), 5000);
    }
}
