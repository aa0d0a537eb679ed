//! I/O adapters for listing commands and the UI server.

pub mod config;
pub mod init;
pub mod notify;
pub mod store;
