//! Core types for Storebridge.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod state;

pub use id::*;
pub use state::*;
