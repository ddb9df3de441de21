pub mod cache;
pub mod config;
pub mod dispatch;
pub mod http;
pub mod provider;
