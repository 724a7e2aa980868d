//! Validation logic for journal entry requests
//!
//! Validates journal entry creation payloads before any database work.
//! Balance checks are performed in minor units so they are exact.

use crate::contracts::journal_entry_request::{JournalEntryRequest, JournalLineRequest};
use thiserror::Error;

/// Validation errors for journal entry requests
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("Currency must be a 3-letter uppercase code (ISO 4217), got: {0}")]
    InvalidCurrency(String),

    #[error("Description must be between 1 and 500 characters, got {0} characters")]
    InvalidDescriptionLength(usize),

    #[error("Lines must have at least 2 items, got {0}")]
    InsufficientLines(usize),

    #[error("Line {0}: account_code cannot be empty")]
    EmptyAccountCode(usize),

    #[error("Line {0}: debit must be non-negative, got {1}")]
    NegativeDebit(usize, f64),

    #[error("Line {0}: credit must be non-negative, got {1}")]
    NegativeCredit(usize, f64),

    #[error("Line {0}: amount out of range, got {1}")]
    AmountOutOfRange(usize, f64),

    #[error("Line {0}: a line must carry either a debit or a credit, not both")]
    BothSidesSet(usize),

    #[error("Line {0}: a line must carry a non-zero debit or credit")]
    ZeroLine(usize),

    #[error("Line {0}: description exceeds 500 characters, got {1}")]
    LineDescriptionTooLong(usize, usize),

    #[error("Total debits ({0}) must equal total credits ({1}) in minor units")]
    UnbalancedEntry(i64, i64),
}

/// Largest accepted major-unit amount: 15 digits with 2 decimal places
///
/// Amounts beyond this would lose integer precision in f64 and saturate the
/// minor-unit cast, so they are rejected before conversion.
pub const MAX_AMOUNT_MAJOR: f64 = 9_999_999_999_999.99;

/// Convert a major-unit amount to minor units (cents)
pub fn to_minor_units(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

/// Validate a journal entry creation request
///
/// # Validation Rules
///
/// - `currency`: 3-letter uppercase code (ISO 4217)
/// - `description`: 1-500 characters
/// - `lines`: at least 2 items
/// - Each line: non-empty account code, finite amounts within the 15-digit
///   range, non-negative, exactly one non-zero side, line description <= 500
///   characters
/// - Total debits must equal total credits exactly in minor units
pub fn validate_journal_entry_request(
    payload: &JournalEntryRequest,
) -> Result<(), ValidationError> {
    if !is_valid_currency(&payload.currency) {
        return Err(ValidationError::InvalidCurrency(payload.currency.clone()));
    }

    let desc_len = payload.description.len();
    if desc_len == 0 || desc_len > 500 {
        return Err(ValidationError::InvalidDescriptionLength(desc_len));
    }

    if payload.lines.len() < 2 {
        return Err(ValidationError::InsufficientLines(payload.lines.len()));
    }

    let mut total_debits_minor = 0i64;
    let mut total_credits_minor = 0i64;

    for (idx, line) in payload.lines.iter().enumerate() {
        validate_journal_line(line, idx)?;
        total_debits_minor += to_minor_units(line.debit);
        total_credits_minor += to_minor_units(line.credit);
    }

    if total_debits_minor != total_credits_minor {
        return Err(ValidationError::UnbalancedEntry(
            total_debits_minor,
            total_credits_minor,
        ));
    }

    Ok(())
}

/// Validate a single journal line
fn validate_journal_line(line: &JournalLineRequest, index: usize) -> Result<(), ValidationError> {
    if line.account_code.is_empty() {
        return Err(ValidationError::EmptyAccountCode(index));
    }

    // Non-finite values fall through every ordering comparison, so range
    // check both sides before anything else
    if !line.debit.is_finite() || line.debit > MAX_AMOUNT_MAJOR {
        return Err(ValidationError::AmountOutOfRange(index, line.debit));
    }

    if !line.credit.is_finite() || line.credit > MAX_AMOUNT_MAJOR {
        return Err(ValidationError::AmountOutOfRange(index, line.credit));
    }

    if line.debit < 0.0 {
        return Err(ValidationError::NegativeDebit(index, line.debit));
    }

    if line.credit < 0.0 {
        return Err(ValidationError::NegativeCredit(index, line.credit));
    }

    let debit_minor = to_minor_units(line.debit);
    let credit_minor = to_minor_units(line.credit);

    if debit_minor > 0 && credit_minor > 0 {
        return Err(ValidationError::BothSidesSet(index));
    }

    if debit_minor == 0 && credit_minor == 0 {
        return Err(ValidationError::ZeroLine(index));
    }

    if let Some(ref desc) = line.description {
        if desc.len() > 500 {
            return Err(ValidationError::LineDescriptionTooLong(index, desc.len()));
        }
    }

    Ok(())
}

/// Check if currency code is valid (3 uppercase letters)
fn is_valid_currency(currency: &str) -> bool {
    currency.len() == 3 && currency.chars().all(|c| c.is_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_valid_payload() -> JournalEntryRequest {
        JournalEntryRequest {
            date: "2024-02-11".to_string(),
            currency: "USD".to_string(),
            description: "Office supplies".to_string(),
            reference: None,
            contact_id: None,
            lines: vec![
                JournalLineRequest {
                    account_code: "6100".to_string(),
                    debit: 100.0,
                    credit: 0.0,
                    description: None,
                },
                JournalLineRequest {
                    account_code: "1000".to_string(),
                    debit: 0.0,
                    credit: 100.0,
                    description: None,
                },
            ],
        }
    }

    #[test]
    fn test_valid_payload() {
        let payload = create_valid_payload();
        assert!(validate_journal_entry_request(&payload).is_ok());
    }

    #[test]
    fn test_invalid_currency_too_short() {
        let mut payload = create_valid_payload();
        payload.currency = "US".to_string();
        assert_eq!(
            validate_journal_entry_request(&payload),
            Err(ValidationError::InvalidCurrency("US".to_string()))
        );
    }

    #[test]
    fn test_invalid_currency_lowercase() {
        let mut payload = create_valid_payload();
        payload.currency = "usd".to_string();
        assert_eq!(
            validate_journal_entry_request(&payload),
            Err(ValidationError::InvalidCurrency("usd".to_string()))
        );
    }

    #[test]
    fn test_empty_description() {
        let mut payload = create_valid_payload();
        payload.description = "".to_string();
        assert_eq!(
            validate_journal_entry_request(&payload),
            Err(ValidationError::InvalidDescriptionLength(0))
        );
    }

    #[test]
    fn test_insufficient_lines() {
        let mut payload = create_valid_payload();
        payload.lines.truncate(1);
        assert_eq!(
            validate_journal_entry_request(&payload),
            Err(ValidationError::InsufficientLines(1))
        );
    }

    #[test]
    fn test_empty_account_code() {
        let mut payload = create_valid_payload();
        payload.lines[0].account_code = "".to_string();
        assert_eq!(
            validate_journal_entry_request(&payload),
            Err(ValidationError::EmptyAccountCode(0))
        );
    }

    #[test]
    fn test_negative_debit() {
        let mut payload = create_valid_payload();
        payload.lines[0].debit = -50.0;
        assert_eq!(
            validate_journal_entry_request(&payload),
            Err(ValidationError::NegativeDebit(0, -50.0))
        );
    }

    #[test]
    fn test_oversized_amount_rejected_before_conversion() {
        // 1e17 on both sides would saturate the minor-unit cast and slip
        // through the balance check
        let mut payload = create_valid_payload();
        payload.lines[0].debit = 1e17;
        payload.lines[1].credit = 1e17;
        assert_eq!(
            validate_journal_entry_request(&payload),
            Err(ValidationError::AmountOutOfRange(0, 1e17))
        );
    }

    #[test]
    fn test_non_finite_amounts_rejected() {
        let mut payload = create_valid_payload();
        payload.lines[0].debit = f64::NAN;
        assert!(matches!(
            validate_journal_entry_request(&payload),
            Err(ValidationError::AmountOutOfRange(0, _))
        ));

        let mut payload = create_valid_payload();
        payload.lines[1].credit = f64::INFINITY;
        assert!(matches!(
            validate_journal_entry_request(&payload),
            Err(ValidationError::AmountOutOfRange(1, _))
        ));
    }

    #[test]
    fn test_max_amount_accepted() {
        let mut payload = create_valid_payload();
        payload.lines[0].debit = MAX_AMOUNT_MAJOR;
        payload.lines[1].credit = MAX_AMOUNT_MAJOR;
        assert!(validate_journal_entry_request(&payload).is_ok());
    }

    #[test]
    fn test_line_with_both_sides() {
        let mut payload = create_valid_payload();
        payload.lines[0].credit = 25.0;
        assert_eq!(
            validate_journal_entry_request(&payload),
            Err(ValidationError::BothSidesSet(0))
        );
    }

    #[test]
    fn test_zero_line() {
        let mut payload = create_valid_payload();
        payload.lines[0].debit = 0.0;
        assert_eq!(
            validate_journal_entry_request(&payload),
            Err(ValidationError::ZeroLine(0))
        );
    }

    #[test]
    fn test_unbalanced_entry() {
        let mut payload = create_valid_payload();
        payload.lines[1].credit = 50.0;
        assert_eq!(
            validate_journal_entry_request(&payload),
            Err(ValidationError::UnbalancedEntry(10000, 5000))
        );
    }

    #[test]
    fn test_sub_cent_rounding_is_exact() {
        // 0.1 + 0.2 style float noise must not produce a false imbalance
        let mut payload = create_valid_payload();
        payload.lines[0].debit = 10.01;
        payload.lines[1].credit = 10.01;
        assert!(validate_journal_entry_request(&payload).is_ok());
    }

    #[test]
    fn test_balanced_entry_with_multiple_lines() {
        let mut payload = create_valid_payload();
        payload.lines.push(JournalLineRequest {
            account_code: "6200".to_string(),
            debit: 50.0,
            credit: 0.0,
            description: None,
        });
        payload.lines.push(JournalLineRequest {
            account_code: "2000".to_string(),
            debit: 0.0,
            credit: 50.0,
            description: None,
        });
        assert!(validate_journal_entry_request(&payload).is_ok());
    }

    #[test]
    fn test_to_minor_units_rounding() {
        assert_eq!(to_minor_units(100.0), 10000);
        assert_eq!(to_minor_units(10.01), 1001);
        assert_eq!(to_minor_units(0.005), 1);
    }
}
