pub mod access;
pub mod config;
pub mod error;
pub mod files;
pub mod server;
pub mod storage;
