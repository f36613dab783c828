pub mod connection;
pub mod upload_records;
pub mod users;
