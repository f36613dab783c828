#[path = "config/mod.rs"]
pub mod config_mod;
pub use config_mod as config;
pub mod api_client;
pub mod bootstrap;
pub mod csv;
pub mod db;
pub mod pdf;
pub mod storage;
