//! Channel model and per-channel vocabulary records.

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use url::Url;

use storebridge_core::{
    CarrierId, ChannelId, IssueId, OrderId, OrderLineId, OrderStateId, PriceListId, ProductId,
    RemoteId, ShipmentId,
};

use crate::error::DataError;

/// Default prefix for locally stored order references.
pub const DEFAULT_ORDER_PREFIX: &str = "mag_";

/// Default unit of measure for imported products.
pub const DEFAULT_UOM: &str = "Unit";

/// Default remote root category id for catalog import.
pub const DEFAULT_ROOT_CATEGORY: RemoteId = RemoteId::new(1);

/// A configured connection to one remote storefront instance.
///
/// One channel owns zero or more websites and the identity namespaces for
/// category and product links.
#[derive(Debug, Clone)]
pub struct Channel {
    /// Local channel id.
    pub id: ChannelId,
    /// Display name.
    pub name: String,
    /// Remote platform API endpoint.
    pub endpoint: Url,
    /// Remote API user name.
    pub api_user: String,
    /// Remote API key.
    pub api_key: SecretString,
    /// Prefix prepended to remote increment ids when storing order references.
    pub order_prefix: String,
    /// Unit of measure applied to imported products.
    pub default_uom: String,
    /// Expense account applied to imported products.
    pub account_expense: String,
    /// Revenue account applied to imported products.
    pub account_revenue: String,
    /// Remote root category id for catalog import.
    pub root_category: RemoteId,
    /// Price list used when pricing product-level tiers.
    pub price_list_id: PriceListId,
}

impl Channel {
    /// Build the local reference stored for a remote order.
    #[must_use]
    pub fn order_reference(&self, increment_id: &str) -> String {
        format!("{}{}", self.order_prefix, increment_id)
    }

    /// Recover the remote increment id from a stored order reference.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::ReferenceMismatch`] if the reference does not
    /// start with this channel's prefix.
    pub fn external_order_id<'a>(&self, reference: &'a str) -> Result<&'a str, DataError> {
        reference
            .strip_prefix(&self.order_prefix)
            .ok_or_else(|| DataError::ReferenceMismatch {
                reference: reference.to_string(),
                prefix: self.order_prefix.clone(),
            })
    }
}

/// A remote order-state code known to a channel.
///
/// Imported from the remote order configuration; the `import_eligible` flag
/// decides which remote states the order import filter asks for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderStateRecord {
    /// Local record id.
    pub id: OrderStateId,
    /// Channel owning the vocabulary entry.
    pub channel_id: ChannelId,
    /// Remote state code (e.g. `processing`).
    pub code: String,
    /// Human-readable label from the remote side.
    pub name: String,
    /// Whether orders in this remote state are imported.
    pub import_eligible: bool,
}

impl OrderStateRecord {
    /// Default eligibility for a freshly imported state code.
    ///
    /// Orders are picked up while they are open; closed or exceptional
    /// states stay out of the import filter until a user opts in.
    #[must_use]
    pub fn default_import_eligible(code: &str) -> bool {
        matches!(code, "new" | "processing")
    }
}

/// A shipping method known to a channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarrierRecord {
    /// Local record id.
    pub id: CarrierId,
    /// Channel owning the vocabulary entry.
    pub channel_id: ChannelId,
    /// Remote carrier code (e.g. `ups`).
    pub code: String,
    /// Human-readable label from the remote side.
    pub title: String,
}

/// What a sync issue was recorded against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueOrigin {
    /// An order-level problem.
    Order(OrderId),
    /// A problem on one order line.
    OrderLine(OrderLineId),
    /// A product-level problem.
    Product(ProductId),
    /// A shipment-level problem.
    Shipment(ShipmentId),
}

/// A journal entry for a record the pipelines skipped or failed on.
///
/// Benign conflicts and per-item export failures land here so an operator
/// can review them without digging through logs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncIssue {
    /// Local record id.
    pub id: IssueId,
    /// What the issue was recorded against.
    pub origin: IssueOrigin,
    /// Description of what happened.
    pub log: String,
    /// When the issue was recorded.
    pub recorded_at: DateTime<Utc>,
}

/// Input for recording an order state code.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrderStateInput {
    /// Channel owning the vocabulary entry.
    pub channel_id: ChannelId,
    /// Remote state code.
    pub code: String,
    /// Human-readable label.
    pub name: String,
    /// Whether orders in this state are imported.
    pub import_eligible: bool,
}

/// Input for recording a shipping carrier.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCarrierInput {
    /// Channel owning the vocabulary entry.
    pub channel_id: ChannelId,
    /// Remote carrier code.
    pub code: String,
    /// Human-readable label.
    pub title: String,
}

/// Input for recording a sync issue.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateIssueInput {
    /// What the issue is recorded against.
    pub origin: IssueOrigin,
    /// Description of what happened.
    pub log: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel_with_prefix(prefix: &str) -> Channel {
        Channel {
            id: ChannelId::new(1),
            name: "test".to_string(),
            endpoint: "https://shop.example.com/api".parse().expect("url"),
            api_user: "bridge".to_string(),
            api_key: SecretString::from("k9!mK2@nL5#pQ7&rT0"),
            order_prefix: prefix.to_string(),
            default_uom: DEFAULT_UOM.to_string(),
            account_expense: "Main Expense".to_string(),
            account_revenue: "Main Revenue".to_string(),
            root_category: DEFAULT_ROOT_CATEGORY,
            price_list_id: PriceListId::new(1),
        }
    }

    #[test]
    fn test_order_reference_round_trip() {
        let channel = channel_with_prefix("mag_");
        let reference = channel.order_reference("000123");
        assert_eq!(reference, "mag_000123");
        assert_eq!(channel.external_order_id(&reference).expect("id"), "000123");
    }

    #[test]
    fn test_external_order_id_rejects_foreign_reference() {
        let channel = channel_with_prefix("mag_");
        let err = channel
            .external_order_id("web_000123")
            .expect_err("must reject");
        assert_eq!(
            err,
            DataError::ReferenceMismatch {
                reference: "web_000123".to_string(),
                prefix: "mag_".to_string(),
            }
        );
    }

    #[test]
    fn test_default_import_eligible() {
        assert!(OrderStateRecord::default_import_eligible("new"));
        assert!(OrderStateRecord::default_import_eligible("processing"));
        assert!(!OrderStateRecord::default_import_eligible("complete"));
        assert!(!OrderStateRecord::default_import_eligible("holded"));
        assert!(!OrderStateRecord::default_import_eligible("canceled"));
    }
}
