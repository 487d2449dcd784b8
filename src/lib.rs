pub mod browser;
pub mod config;
pub mod error;
pub mod http;
pub mod launcher;
pub mod store;
pub mod supervisor;
