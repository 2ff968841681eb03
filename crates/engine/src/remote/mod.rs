//! Remote platform API surface.
//!
//! The engine talks to the remote storefront through [`RemoteApi`] and
//! [`RemoteSession`]. A session wraps one authenticated API session on the
//! remote side and is opened per smallest unit of work (one product's
//! inventory push, one order fetch), never held across a whole pipeline run.
//! Dropping the boxed session ends it, so an early return from a failing
//! branch cannot leak a remote session.

use std::collections::BTreeMap;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use storebridge_core::RemoteId;

use crate::models::Channel;

pub mod filter;
pub mod types;

pub use filter::{Filter, FilterOp, FilterValue, Predicate};
pub use types::{
    InventoryUpdate, NewRemoteProduct, RemoteCarrier, RemoteCategory, RemoteCategoryTree,
    RemoteOrder, RemoteOrderLine, RemoteOrderState, RemoteOrderSummary, RemoteProduct,
    RemoteStoreGroup, RemoteStoreView, RemoteWebsite, TierPriceEntry, TrackingInfo,
};

/// Remote fault code raised when a shipment already exists for an order.
pub const FAULT_SHIPMENT_EXISTS: i32 = 102;

/// A failed call to the remote platform.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteFault {
    /// The endpoint could not be reached.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The call did not complete in time.
    #[error("timed out: {0}")]
    Timeout(String),

    /// The response could not be decoded.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The remote side rejected the call with an API fault.
    #[error("remote fault {code}: {message}")]
    Api {
        /// Remote fault code.
        code: i32,
        /// Remote fault message.
        message: String,
    },
}

/// How a pipeline should react to a fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultClass {
    /// The remote side already holds the state being pushed. Record and
    /// move on.
    BenignConflict,
    /// Likely to succeed on retry. Abort the batch, keep local state intact.
    Transient,
    /// Will not succeed on retry without intervention.
    Fatal,
}

impl RemoteFault {
    /// Classify the fault for pipeline control flow.
    #[must_use]
    pub const fn class(&self) -> FaultClass {
        match self {
            Self::Api {
                code: FAULT_SHIPMENT_EXISTS,
                ..
            } => FaultClass::BenignConflict,
            Self::Transport(_) | Self::Timeout(_) | Self::Protocol(_) => FaultClass::Transient,
            Self::Api { .. } => FaultClass::Fatal,
        }
    }

    /// Whether the fault means the remote side already holds this state.
    #[must_use]
    pub const fn is_benign_conflict(&self) -> bool {
        matches!(self.class(), FaultClass::BenignConflict)
    }

    /// Whether the fault is worth retrying.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self.class(), FaultClass::Transient)
    }
}

/// Outcome of probing the remote endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum ConnectionStatus {
    /// A session was opened and closed successfully.
    Connected,
    /// The endpoint could not be reached.
    Unreachable {
        /// Transport-level detail.
        detail: String,
    },
    /// The endpoint answered but rejected the credentials or call.
    Rejected {
        /// Remote-side detail.
        detail: String,
    },
}

/// Connection factory for the remote platform.
#[async_trait]
pub trait RemoteApi: Send + Sync {
    /// Open an authenticated session against the channel's endpoint.
    ///
    /// # Errors
    ///
    /// Returns a [`RemoteFault`] when the endpoint is unreachable or the
    /// credentials are rejected.
    async fn connect(&self, channel: &Channel) -> Result<Box<dyn RemoteSession>, RemoteFault>;
}

/// One authenticated session on the remote platform.
///
/// Every method maps to one remote API call. All methods return
/// [`RemoteFault`] on failure; pipelines classify the fault via
/// [`RemoteFault::class`] to decide between skip, abort and fail.
#[async_trait]
pub trait RemoteSession: Send + Sync {
    /// List all websites of the deployment.
    async fn list_websites(&self) -> Result<Vec<RemoteWebsite>, RemoteFault>;

    /// List the store groups of a website.
    async fn list_stores(&self, website: RemoteId) -> Result<Vec<RemoteStoreGroup>, RemoteFault>;

    /// List the store views of a store group.
    async fn list_store_views(&self, store: RemoteId) -> Result<Vec<RemoteStoreView>, RemoteFault>;

    /// List the order state codes the deployment knows.
    async fn order_states(&self) -> Result<Vec<RemoteOrderState>, RemoteFault>;

    /// List the shipping carriers the deployment knows.
    async fn shipping_carriers(&self) -> Result<Vec<RemoteCarrier>, RemoteFault>;

    /// Fetch the category tree rooted at `root`.
    async fn category_tree(&self, root: RemoteId) -> Result<RemoteCategoryTree, RemoteFault>;

    /// Fetch one category record.
    async fn category_info(&self, category: RemoteId) -> Result<RemoteCategory, RemoteFault>;

    /// List all products of the deployment.
    async fn list_products(&self) -> Result<Vec<RemoteProduct>, RemoteFault>;

    /// Fetch one product record.
    async fn product_info(&self, product: RemoteId) -> Result<RemoteProduct, RemoteFault>;

    /// Create a product and return its remote id.
    async fn create_product(&self, product: NewRemoteProduct) -> Result<RemoteId, RemoteFault>;

    /// List orders matching `filter`.
    async fn list_orders(&self, filter: &Filter) -> Result<Vec<RemoteOrderSummary>, RemoteFault>;

    /// Fetch one order with its lines.
    async fn order_info(&self, increment_id: &str) -> Result<RemoteOrder, RemoteFault>;

    /// Push inventory for one product.
    async fn update_inventory(
        &self,
        product: RemoteId,
        update: InventoryUpdate,
    ) -> Result<(), RemoteFault>;

    /// Replace the tier prices of one product.
    async fn update_tier_prices(
        &self,
        product: RemoteId,
        tiers: &[TierPriceEntry],
    ) -> Result<(), RemoteFault>;

    /// Set the status of one order.
    async fn update_order_status(
        &self,
        increment_id: &str,
        status: &str,
    ) -> Result<(), RemoteFault>;

    /// Create a shipment for an order and return its remote reference.
    ///
    /// `quantities` maps remote line item ids to shipped quantities.
    async fn create_shipment(
        &self,
        increment_id: &str,
        quantities: &BTreeMap<String, Decimal>,
    ) -> Result<String, RemoteFault>;

    /// Attach tracking details to a previously created shipment.
    async fn add_shipment_tracking(
        &self,
        shipment_ref: &str,
        tracking: TrackingInfo,
    ) -> Result<(), RemoteFault>;
}
