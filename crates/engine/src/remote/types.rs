//! Wire types exchanged with the remote platform.
//!
//! Field names follow the remote API payloads so a transport can pass these
//! through serde without per-call mapping tables.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use storebridge_core::RemoteId;

/// A website as returned by the remote side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteWebsite {
    /// Remote website id.
    pub website_id: RemoteId,
    /// Display name.
    pub name: String,
    /// Website code.
    pub code: String,
}

/// A store group as returned by the remote side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteStoreGroup {
    /// Remote store group id.
    pub group_id: RemoteId,
    /// Display name.
    pub name: String,
}

/// A store view as returned by the remote side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteStoreView {
    /// Remote store view id.
    pub store_id: RemoteId,
    /// Display name.
    pub name: String,
    /// Store view code.
    pub code: String,
}

/// One node of the remote category tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteCategoryTree {
    /// Remote category id.
    pub category_id: RemoteId,
    /// Display name.
    pub name: String,
    /// Child categories.
    #[serde(default)]
    pub children: Vec<RemoteCategoryTree>,
}

/// A single category record as returned by the remote side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteCategory {
    /// Remote category id.
    pub category_id: RemoteId,
    /// Display name.
    pub name: String,
    /// Remote parent category id.
    pub parent_id: Option<RemoteId>,
}

/// A product as returned by the remote side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteProduct {
    /// Remote product id.
    pub product_id: RemoteId,
    /// Stock keeping unit.
    pub sku: Option<String>,
    /// Display name.
    pub name: Option<String>,
    /// Long description.
    pub description: Option<String>,
    /// Remote product type, e.g. `simple`.
    #[serde(rename = "type")]
    pub product_type: String,
    /// Regular price.
    pub price: Option<Decimal>,
    /// Promotional price overriding the regular price when set.
    pub special_price: Option<Decimal>,
    /// Cost price.
    pub cost: Option<Decimal>,
    /// Remote categories the product files under.
    #[serde(default)]
    pub categories: Vec<RemoteId>,
}

/// An order list entry as returned by the remote side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteOrderSummary {
    /// Remote increment id, the customer-facing order number.
    pub increment_id: String,
    /// Remote order state code.
    pub state: String,
}

/// A full order as returned by the remote side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteOrder {
    /// Remote order id.
    pub order_id: RemoteId,
    /// Remote increment id, the customer-facing order number.
    pub increment_id: String,
    /// Remote order state code.
    pub state: String,
    /// Remote store view the order was placed in.
    pub store_id: RemoteId,
    /// Order line items.
    #[serde(default)]
    pub lines: Vec<RemoteOrderLine>,
}

/// One line item of a remote order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteOrderLine {
    /// Remote line item id.
    pub item_id: RemoteId,
    /// Remote product id, absent for non-product lines.
    pub product_id: Option<RemoteId>,
    /// Stock keeping unit.
    pub sku: Option<String>,
    /// Line description.
    pub name: String,
    /// Quantity ordered.
    pub qty_ordered: Decimal,
    /// Unit price.
    pub price: Decimal,
    /// Tax percentage applied to the line.
    pub tax_percent: Option<Decimal>,
}

/// An order state code as returned by the remote configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteOrderState {
    /// Remote state code.
    pub code: String,
    /// Human-readable label.
    pub name: String,
}

/// A shipping carrier as returned by the remote configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteCarrier {
    /// Remote carrier code.
    pub code: String,
    /// Human-readable label.
    pub label: String,
}

/// Inventory payload pushed to the remote side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryUpdate {
    /// Quantity on hand.
    pub qty: Decimal,
    /// Whether the product is purchasable.
    pub is_in_stock: bool,
}

/// One tier price pushed to the remote side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierPriceEntry {
    /// Quantity threshold the tier starts at.
    pub quantity: Decimal,
    /// Unit price at the tier.
    pub price: Decimal,
}

/// Payload for creating a product on the remote side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRemoteProduct {
    /// Remote product type, e.g. `simple`.
    #[serde(rename = "type")]
    pub product_type: String,
    /// Remote attribute set the product uses.
    pub attribute_set: RemoteId,
    /// Stock keeping unit.
    pub sku: String,
    /// Display name.
    pub name: String,
    /// Long description.
    pub description: String,
    /// Short description shown in listings.
    pub short_description: String,
    /// Regular price.
    pub price: Decimal,
    /// Remote categories the product files under.
    pub categories: Vec<RemoteId>,
    /// Remote websites the product is visible on.
    pub websites: Vec<RemoteId>,
}

/// Tracking details attached to an exported shipment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingInfo {
    /// Remote carrier code.
    pub carrier_code: String,
    /// Carrier title shown to the customer.
    pub title: String,
    /// Carrier tracking number.
    pub tracking_number: String,
}
