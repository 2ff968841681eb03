//! Unified error handling for the reconciliation engine.

use thiserror::Error;

use storebridge_core::{CategoryId, ChannelId, ProductId, RemoteId};

use crate::remote::RemoteFault;
use crate::store::StoreError;

/// Engine-level error type returned by every import/export entry point.
#[derive(Debug, Error)]
pub enum SyncError {
    /// No remote order states are flagged import-eligible for the channel.
    ///
    /// Raised before any remote call so a misconfigured channel fails loudly
    /// instead of importing nothing.
    #[error(
        "no import-eligible order states configured for channel {0}; \
         run the order-state import and flag the states to import"
    )]
    NoImportableStates(ChannelId),

    /// A record failed validation and cannot cross the boundary.
    #[error("data error: {0}")]
    Data(#[from] DataError),

    /// The remote API reported a fault.
    #[error("remote fault: {0}")]
    Remote(#[from] RemoteFault),

    /// The local store failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Validation failures on individual records.
///
/// These are hard stops for the affected entity's operation, not silent
/// skips: the caller decides whether the surrounding batch continues.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataError {
    /// A remote product payload carried no SKU.
    #[error("remote product {remote_id} has no SKU")]
    MissingSku {
        /// Remote product id in the offending payload.
        remote_id: RemoteId,
    },

    /// A local product selected for catalog export has no product code.
    #[error("product {product_id} has no code; a code is required to list it remotely")]
    MissingProductCode {
        /// The local product.
        product_id: ProductId,
    },

    /// A product is already listed on the channel.
    #[error("product {product_id} is already listed on channel {channel_id}")]
    AlreadyListed {
        /// The local product.
        product_id: ProductId,
        /// The channel carrying the existing listing.
        channel_id: ChannelId,
    },

    /// A category selected for catalog export has no remote counterpart.
    #[error("category {category_id} has no remote link on channel {channel_id}")]
    CategoryNotLinked {
        /// The local category.
        category_id: CategoryId,
        /// The channel the link was expected on.
        channel_id: ChannelId,
    },

    /// An order reference does not start with the channel's order prefix.
    #[error("order reference {reference:?} does not carry the channel prefix {prefix:?}")]
    ReferenceMismatch {
        /// The stored order reference.
        reference: String,
        /// The channel's configured prefix.
        prefix: String,
    },
}
