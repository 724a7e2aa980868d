//! Balance delta computation from journal lines
//!
//! Deterministic aggregation of journal lines into per-account deltas,
//! applied to running balances when an entry is posted or voided.

use std::collections::HashMap;
use thiserror::Error;

use crate::repos::account_repo::NormalBalance;

/// Aggregated delta for a single account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceDelta {
    pub account_code: String,
    pub debit_delta: i64,
    pub credit_delta: i64,
}

impl BalanceDelta {
    /// Signed delta in the account's natural sign convention
    ///
    /// Debit-normal accounts grow with debits; credit-normal accounts grow
    /// with credits.
    pub fn signed_delta(&self, normal_balance: NormalBalance) -> i64 {
        match normal_balance {
            NormalBalance::Debit => self.debit_delta - self.credit_delta,
            NormalBalance::Credit => self.credit_delta - self.debit_delta,
        }
    }

    /// The delta that exactly reverses this one
    pub fn negated(&self) -> BalanceDelta {
        BalanceDelta {
            account_code: self.account_code.clone(),
            debit_delta: self.credit_delta,
            credit_delta: self.debit_delta,
        }
    }
}

/// Errors that can occur during delta computation
#[derive(Debug, Error)]
pub enum DeltaError {
    #[error("Empty journal lines: cannot compute deltas from empty line set")]
    EmptyLines,
}

/// Input journal line for delta computation
#[derive(Debug, Clone)]
pub struct JournalLineInput {
    pub account_code: String,
    pub debit_minor: i64,
    pub credit_minor: i64,
}

/// Compute balance deltas from journal lines
///
/// Groups debits and credits by account code. Output is sorted by account
/// code for deterministic ordering.
///
/// # Errors
/// * `DeltaError::EmptyLines` - If lines vector is empty
pub fn compute_deltas(lines: &[JournalLineInput]) -> Result<Vec<BalanceDelta>, DeltaError> {
    if lines.is_empty() {
        return Err(DeltaError::EmptyLines);
    }

    let mut delta_map: HashMap<String, (i64, i64)> = HashMap::new();

    for line in lines {
        let (debit_sum, credit_sum) = delta_map.entry(line.account_code.clone()).or_insert((0, 0));
        *debit_sum += line.debit_minor;
        *credit_sum += line.credit_minor;
    }

    let mut deltas: Vec<BalanceDelta> = delta_map
        .into_iter()
        .map(|(account_code, (debit_delta, credit_delta))| BalanceDelta {
            account_code,
            debit_delta,
            credit_delta,
        })
        .collect();

    // Sort for deterministic ordering (important for testing and audit)
    deltas.sort_by(|a, b| a.account_code.cmp(&b.account_code));

    Ok(deltas)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_deltas_single_account() {
        let lines = vec![JournalLineInput {
            account_code: "1000".to_string(),
            debit_minor: 10000,
            credit_minor: 0,
        }];

        let deltas = compute_deltas(&lines).unwrap();

        assert_eq!(deltas.len(), 1);
        assert_eq!(deltas[0].account_code, "1000");
        assert_eq!(deltas[0].debit_delta, 10000);
        assert_eq!(deltas[0].credit_delta, 0);
    }

    #[test]
    fn test_compute_deltas_multiple_accounts() {
        let lines = vec![
            JournalLineInput {
                account_code: "1000".to_string(),
                debit_minor: 10000,
                credit_minor: 0,
            },
            JournalLineInput {
                account_code: "4000".to_string(),
                debit_minor: 0,
                credit_minor: 10000,
            },
        ];

        let deltas = compute_deltas(&lines).unwrap();

        assert_eq!(deltas.len(), 2);
        assert_eq!(deltas[0].account_code, "1000");
        assert_eq!(deltas[0].debit_delta, 10000);
        assert_eq!(deltas[1].account_code, "4000");
        assert_eq!(deltas[1].credit_delta, 10000);
    }

    #[test]
    fn test_compute_deltas_same_account_multiple_lines() {
        // Multiple lines affecting the same account should be summed
        let lines = vec![
            JournalLineInput {
                account_code: "1000".to_string(),
                debit_minor: 10000,
                credit_minor: 0,
            },
            JournalLineInput {
                account_code: "1000".to_string(),
                debit_minor: 5000,
                credit_minor: 0,
            },
            JournalLineInput {
                account_code: "1000".to_string(),
                debit_minor: 0,
                credit_minor: 3000,
            },
        ];

        let deltas = compute_deltas(&lines).unwrap();

        assert_eq!(deltas.len(), 1);
        assert_eq!(deltas[0].debit_delta, 15000);
        assert_eq!(deltas[0].credit_delta, 3000);
    }

    #[test]
    fn test_compute_deltas_empty_lines() {
        let lines: Vec<JournalLineInput> = vec![];
        let result = compute_deltas(&lines);
        assert!(matches!(result, Err(DeltaError::EmptyLines)));
    }

    #[test]
    fn test_delta_deterministic_ordering() {
        let lines = vec![
            JournalLineInput {
                account_code: "3000".to_string(),
                debit_minor: 1000,
                credit_minor: 0,
            },
            JournalLineInput {
                account_code: "1000".to_string(),
                debit_minor: 2000,
                credit_minor: 0,
            },
            JournalLineInput {
                account_code: "2000".to_string(),
                debit_minor: 3000,
                credit_minor: 0,
            },
        ];

        let deltas = compute_deltas(&lines).unwrap();

        assert_eq!(deltas.len(), 3);
        assert_eq!(deltas[0].account_code, "1000");
        assert_eq!(deltas[1].account_code, "2000");
        assert_eq!(deltas[2].account_code, "3000");
    }

    #[test]
    fn test_signed_delta_by_normal_balance() {
        let delta = BalanceDelta {
            account_code: "1000".to_string(),
            debit_delta: 10000,
            credit_delta: 4000,
        };

        assert_eq!(delta.signed_delta(NormalBalance::Debit), 6000);
        assert_eq!(delta.signed_delta(NormalBalance::Credit), -6000);
    }

    #[test]
    fn test_negated_delta_reverses_posting() {
        let delta = BalanceDelta {
            account_code: "4000".to_string(),
            debit_delta: 0,
            credit_delta: 10000,
        };

        let negated = delta.negated();
        assert_eq!(negated.debit_delta, 10000);
        assert_eq!(negated.credit_delta, 0);

        // Posting then voiding nets to zero on every side
        assert_eq!(
            delta.signed_delta(NormalBalance::Credit) + negated.signed_delta(NormalBalance::Credit),
            0
        );
    }
}
