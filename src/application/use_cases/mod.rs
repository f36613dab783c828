pub mod analyze;
pub mod auth;
pub mod report;
pub mod session;
