pub mod journal_entry_request;
pub mod report_request;
