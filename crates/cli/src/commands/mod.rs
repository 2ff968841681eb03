//! CLI command implementations.

pub mod connection;
pub mod export;
pub mod import;
