pub mod list_view;
pub mod report;
pub mod scenarios;
