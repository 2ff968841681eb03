//! Order and shipment models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use storebridge_core::{
    CarrierId, ChannelId, FulfillmentState, OrderId, OrderLineId, OrderWorkflowState, ProductId,
    RemoteId, ShipmentId, ShipmentState, StoreViewId, TaxId,
};

/// A sale order, locally created or imported from the remote platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Local order id.
    pub id: OrderId,
    /// Channel the order belongs to.
    pub channel_id: ChannelId,
    /// Store view the order was placed in.
    pub store_view_id: StoreViewId,
    /// Order reference, prefixed for imported orders.
    pub reference: String,
    /// Remote order id, set for imported orders.
    pub remote_id: Option<RemoteId>,
    /// Workflow state.
    pub state: OrderWorkflowState,
    /// Fulfillment progress across the order's shipments.
    pub fulfillment_state: FulfillmentState,
    /// Last local modification time.
    pub updated_at: DateTime<Utc>,
    /// Order lines.
    pub lines: Vec<OrderLine>,
}

/// One line of a sale order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLine {
    /// Local line id.
    pub id: OrderLineId,
    /// Product sold, `None` for description-only lines.
    pub product_id: Option<ProductId>,
    /// Remote line item id, set for imported lines.
    pub remote_line_id: Option<RemoteId>,
    /// Line description.
    pub description: String,
    /// Quantity ordered.
    pub quantity: Decimal,
    /// Unit price.
    pub unit_price: Decimal,
    /// Taxes applied to the line.
    pub taxes: Vec<TaxId>,
}

/// An outgoing shipment fulfilling part of an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shipment {
    /// Local shipment id.
    pub id: ShipmentId,
    /// Order the shipment fulfills.
    pub order_id: OrderId,
    /// Warehouse workflow state.
    pub state: ShipmentState,
    /// Carrier moving the shipment.
    pub carrier_id: Option<CarrierId>,
    /// Carrier tracking number.
    pub tracking_number: Option<String>,
    /// Remote shipment reference, set once the shipment was exported.
    pub remote_ref: Option<String>,
    /// Whether the tracking number was pushed to the remote side.
    pub tracking_exported: bool,
    /// Shipped quantities per order line.
    pub lines: Vec<ShipmentLine>,
}

/// Shipped quantity of one order line within a shipment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipmentLine {
    /// Order line the quantity counts against.
    pub order_line_id: OrderLineId,
    /// Quantity shipped.
    pub quantity: Decimal,
}

/// Input for creating an order with its lines.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrderInput {
    /// Channel the order belongs to.
    pub channel_id: ChannelId,
    /// Store view the order was placed in.
    pub store_view_id: StoreViewId,
    /// Order reference, unique per channel.
    pub reference: String,
    /// Remote order id.
    pub remote_id: Option<RemoteId>,
    /// Initial workflow state.
    pub state: OrderWorkflowState,
    /// Order lines.
    pub lines: Vec<CreateOrderLineInput>,
}

/// Input for one line of a new order.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrderLineInput {
    /// Product sold, `None` for description-only lines.
    pub product_id: Option<ProductId>,
    /// Remote line item id.
    pub remote_line_id: Option<RemoteId>,
    /// Line description.
    pub description: String,
    /// Quantity ordered.
    pub quantity: Decimal,
    /// Unit price.
    pub unit_price: Decimal,
    /// Taxes applied to the line.
    pub taxes: Vec<TaxId>,
}

/// Filter criteria for listing orders of a store view.
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    /// Only orders modified at or after this time.
    pub modified_since: Option<DateTime<Utc>>,
    /// Only orders in this fulfillment state.
    pub fulfillment_state: Option<FulfillmentState>,
    /// Only orders holding a remote id.
    pub has_remote_id: bool,
    /// Only orders with at least one shipment.
    pub has_shipments: bool,
}
