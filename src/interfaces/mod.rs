pub mod desktop;
pub mod http;
