pub mod analysis;
pub mod error;
pub mod report;
pub mod session;
pub mod upload_record;
pub mod user;
