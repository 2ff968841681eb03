//! Storebridge Engine - channel reconciliation library.
//!
//! This crate synchronizes a merchant system of record with a remote
//! storefront platform over its RPC API:
//!
//! - [`models`] - Channel, hierarchy, catalog, order, and shipment records
//! - [`store`] - The [`store::LocalStore`] persistence trait and an
//!   in-memory implementation for tests and tooling
//! - [`remote`] - Remote session traits, wire DTOs, and the fault taxonomy
//! - [`identity`] - The append-only map between local and remote ids
//! - [`resolver`] - Idempotent find-or-create resolution of remote records
//! - [`watermark`] - Persisted per-view sync windows
//! - [`import`] / [`export`] - The pipelines, all driven by [`SyncEngine`]
//!
//! # Sessions
//!
//! The engine never holds a connection open between operations. Every
//! pipeline opens a session for the smallest unit of work it can and
//! drops it before touching the next record, so a half-finished run
//! never pins remote resources.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod engine;
pub mod error;
pub mod export;
pub mod identity;
pub mod import;
pub mod models;
pub mod remote;
pub mod resolver;
pub mod store;
pub mod watermark;

pub use config::ChannelConfig;
pub use engine::SyncEngine;
pub use error::{DataError, SyncError};
pub use export::ExportSummary;
pub use import::{CatalogImport, HierarchyImport, OrderImport};
