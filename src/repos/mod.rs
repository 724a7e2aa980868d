pub mod account_repo;
pub mod contact_repo;
pub mod journal_repo;
pub mod report_query_repo;
pub mod report_repo;
