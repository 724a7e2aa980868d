//! Report generation request contract

use serde::{Deserialize, Serialize};

use crate::repos::report_repo::ReportType;

/// Request payload for generating a report
///
/// `report_type` deserializes into the closed [`ReportType`] enum, so an
/// unknown type string is rejected at the boundary rather than reaching the
/// dispatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportRequest {
    pub report_type: ReportType,
    /// Period start, ISO format (YYYY-MM-DD)
    pub period_start: String,
    /// Period end, ISO format (YYYY-MM-DD)
    pub period_end: String,
    /// Optional comparison period (income statement)
    pub comparison_period_start: Option<String>,
    pub comparison_period_end: Option<String>,
    /// Optional account code filter (general ledger)
    #[serde(default)]
    pub account_codes: Vec<String>,
}
