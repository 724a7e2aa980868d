//! Journal entry creation request contract
//!
//! Boundary DTO for creating draft journal entries. Amounts arrive as
//! decimal major units and are converted to minor units at ingress.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single journal line in a creation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalLineRequest {
    /// Chart of Accounts code (e.g. "1000")
    pub account_code: String,
    /// Debit amount in major units; mutually exclusive with credit
    #[serde(default)]
    pub debit: f64,
    /// Credit amount in major units; mutually exclusive with debit
    #[serde(default)]
    pub credit: f64,
    /// Optional line memo
    pub description: Option<String>,
}

/// Request payload for creating a draft journal entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntryRequest {
    /// Business date, ISO format (YYYY-MM-DD)
    pub date: String,
    /// ISO 4217 currency code
    pub currency: String,
    pub description: String,
    /// Optional external reference (invoice number, etc.)
    pub reference: Option<String>,
    /// Optional counterparty attachment for sub-ledger association
    pub contact_id: Option<Uuid>,
    pub lines: Vec<JournalLineRequest>,
}
