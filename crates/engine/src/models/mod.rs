//! Domain models for the reconciliation engine.
//!
//! These are the slices of the local system of record the engine reads and
//! annotates. The engine never owns their lifecycle beyond the identity
//! links and watermarks it maintains.

pub mod catalog;
pub mod channel;
pub mod hierarchy;
pub mod order;

pub use catalog::*;
pub use channel::*;
pub use hierarchy::*;
pub use order::*;
