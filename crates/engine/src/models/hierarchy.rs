//! Website, store and store-view models.
//!
//! The remote platform organizes a deployment as websites containing store
//! groups containing store views. Each level is mirrored locally with its
//! remote id so re-imports find existing rows instead of duplicating them.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use storebridge_core::{ChannelId, PriceListId, RemoteId, StoreId, StoreViewId, TaxId, WebsiteId};

/// A remote website mirrored locally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Website {
    /// Local website id.
    pub id: WebsiteId,
    /// Channel this website belongs to.
    pub channel_id: ChannelId,
    /// Remote website id.
    pub remote_id: RemoteId,
    /// Display name from the remote side.
    pub name: String,
    /// Remote website code.
    pub code: String,
}

/// A remote store group mirrored locally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Store {
    /// Local store id.
    pub id: StoreId,
    /// Website this store belongs to.
    pub website_id: WebsiteId,
    /// Channel this store belongs to, denormalized from the website.
    pub channel_id: ChannelId,
    /// Remote store group id.
    pub remote_id: RemoteId,
    /// Display name from the remote side.
    pub name: String,
    /// Price list used when pricing store-level tier defaults.
    pub price_list_id: PriceListId,
}

/// A remote store view mirrored locally.
///
/// Store views are the unit of order synchronization: order import and the
/// status/shipment exports each run per view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreView {
    /// Local store view id.
    pub id: StoreViewId,
    /// Store this view belongs to.
    pub store_id: StoreId,
    /// Website this view belongs to, denormalized from the store.
    pub website_id: WebsiteId,
    /// Channel this view belongs to, denormalized from the website.
    pub channel_id: ChannelId,
    /// Remote store view id.
    pub remote_id: RemoteId,
    /// Display name from the remote side.
    pub name: String,
    /// Remote store view code.
    pub code: String,
    /// Whether shipment export also pushes tracking numbers.
    pub export_tracking: bool,
    /// Mapping from remote tax percentages to local tax ids.
    pub taxes: Vec<TaxRule>,
}

impl StoreView {
    /// Local tax ids configured for a remote tax percentage.
    ///
    /// Returns an empty list when no rule matches; imported order lines
    /// then carry no taxes, which mirrors an unconfigured view.
    #[must_use]
    pub fn taxes_for_rate(&self, rate: Decimal) -> Vec<TaxId> {
        self.taxes
            .iter()
            .find(|rule| rule.rate == rate)
            .map(|rule| rule.taxes.clone())
            .unwrap_or_default()
    }
}

/// Maps one remote tax percentage to the local taxes applied for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxRule {
    /// Remote tax percentage, e.g. `19.00`.
    pub rate: Decimal,
    /// Local tax ids applied to lines taxed at this rate.
    pub taxes: Vec<TaxId>,
}

/// Input for creating a website.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateWebsiteInput {
    /// Channel the website belongs to.
    pub channel_id: ChannelId,
    /// Remote website id.
    pub remote_id: RemoteId,
    /// Display name.
    pub name: String,
    /// Remote website code.
    pub code: String,
}

/// Input for creating a store.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateStoreInput {
    /// Website the store belongs to.
    pub website_id: WebsiteId,
    /// Channel the store belongs to.
    pub channel_id: ChannelId,
    /// Remote store group id.
    pub remote_id: RemoteId,
    /// Display name.
    pub name: String,
    /// Price list for store-level tier defaults.
    pub price_list_id: PriceListId,
}

/// Input for creating a store view.
///
/// New views start with tracking export off and no tax rules; both are
/// operator configuration, not remote data.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateStoreViewInput {
    /// Store the view belongs to.
    pub store_id: StoreId,
    /// Website the view belongs to.
    pub website_id: WebsiteId,
    /// Channel the view belongs to.
    pub channel_id: ChannelId,
    /// Remote store view id.
    pub remote_id: RemoteId,
    /// Display name.
    pub name: String,
    /// Remote store view code.
    pub code: String,
}
