pub mod account_service;
pub mod balance_deltas;
pub mod balance_sheet_service;
pub mod expense_report_service;
pub mod general_ledger_service;
pub mod income_statement_service;
pub mod journal_service;
pub mod ledger_replay;
pub mod report_cache_service;
pub mod report_generator;
pub mod sub_ledger_service;
pub mod trial_balance_service;
