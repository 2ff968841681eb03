//! Storebridge Core - Shared types library.
//!
//! This crate provides common types used across all Storebridge components:
//! - `engine` - The reconciliation engine (import/export pipelines)
//! - `cli` - Command-line entry points for sync operations
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no store access, no remote
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs and entity state enums

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
