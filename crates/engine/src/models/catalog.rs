//! Category, product, pricing and stock models.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use storebridge_core::{
    CategoryId, ChannelId, ListingId, PriceListId, ProductId, RemoteId, StockLocationId,
};

/// Name of the fallback category for products imported without one.
pub const UNCLASSIFIED_CATEGORY: &str = "Unclassified Products";

/// A product category in the local tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    /// Local category id.
    pub id: CategoryId,
    /// Display name.
    pub name: String,
    /// Parent category, `None` for a root.
    pub parent_id: Option<CategoryId>,
}

/// Links a local category to its remote id within one channel.
///
/// Links are append-only: a category is linked at most once per channel and
/// existing links are never rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryLink {
    /// Channel owning the link.
    pub channel_id: ChannelId,
    /// Remote category id.
    pub remote_id: RemoteId,
    /// Local category the remote id maps to.
    pub category_id: CategoryId,
}

/// A product in the local catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// Local product id.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Product code (SKU), unique when present.
    pub code: Option<String>,
    /// Long description.
    pub description: Option<String>,
    /// Category the product files under.
    pub category_id: CategoryId,
    /// Sale list price.
    pub list_price: Decimal,
    /// Cost price.
    pub cost_price: Decimal,
    /// Unit of measure.
    pub uom: String,
    /// Expense account.
    pub account_expense: String,
    /// Revenue account.
    pub account_revenue: String,
    /// Whether the product can be sold.
    pub salable: bool,
}

/// Links a local product to its remote id within one channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listing {
    /// Local listing id.
    pub id: ListingId,
    /// Channel owning the listing.
    pub channel_id: ChannelId,
    /// Local product the listing points at.
    pub product_id: ProductId,
    /// Remote product id.
    pub remote_id: RemoteId,
    /// Remote product type, e.g. `simple`.
    pub product_type: String,
}

/// A quantity-break price list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceList {
    /// Local price list id.
    pub id: PriceListId,
    /// Display name.
    pub name: String,
    /// Discount rules, evaluated by quantity threshold.
    pub rules: Vec<PriceRule>,
}

impl PriceList {
    /// Unit price for `quantity` units of a product listed at `list_price`.
    ///
    /// The rule with the highest threshold not exceeding `quantity` wins;
    /// without a matching rule the list price stands.
    #[must_use]
    pub fn compute(&self, list_price: Decimal, quantity: Decimal) -> Decimal {
        let best = self
            .rules
            .iter()
            .filter(|rule| rule.min_quantity <= quantity)
            .max_by(|a, b| a.min_quantity.cmp(&b.min_quantity));
        best.map_or(list_price, |rule| {
            list_price * (Decimal::ONE - rule.percent_discount / Decimal::ONE_HUNDRED)
        })
    }
}

/// One quantity-break rule of a price list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceRule {
    /// Quantity from which the rule applies.
    pub min_quantity: Decimal,
    /// Discount off the list price, in percent.
    pub percent_discount: Decimal,
}

/// A tier-price quantity break configured on a product or store.
///
/// Only the quantity is stored; the price at each tier is computed from the
/// applicable price list at export time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceTier {
    /// Quantity threshold the tier starts at.
    pub quantity: Decimal,
}

/// What a stock location is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationKind {
    /// A warehouse grouping other locations.
    Warehouse,
    /// A storage location counted toward sellable inventory.
    Storage,
    /// A virtual customer location.
    Customer,
    /// A virtual supplier location.
    Supplier,
    /// An organizational location holding no stock itself.
    View,
}

/// A stock location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockLocation {
    /// Local location id.
    pub id: StockLocationId,
    /// Display name.
    pub name: String,
    /// What the location is used for.
    pub kind: LocationKind,
}

/// Quantity of one product at one location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLevel {
    /// Location holding the stock.
    pub location_id: StockLocationId,
    /// Product the quantity is for.
    pub product_id: ProductId,
    /// Quantity on hand.
    pub quantity: Decimal,
}

/// Input for creating a category.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCategoryInput {
    /// Display name.
    pub name: String,
    /// Parent category, `None` for a root.
    pub parent_id: Option<CategoryId>,
}

/// Input for creating a product with its listing in one step.
///
/// The listing is created atomically with the product, so a concurrent
/// import of the same remote product either sees both rows or neither.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProductInput {
    /// Display name.
    pub name: String,
    /// Product code (SKU).
    pub code: Option<String>,
    /// Long description.
    pub description: Option<String>,
    /// Category the product files under.
    pub category_id: CategoryId,
    /// Sale list price.
    pub list_price: Decimal,
    /// Cost price.
    pub cost_price: Decimal,
    /// Unit of measure.
    pub uom: String,
    /// Expense account.
    pub account_expense: String,
    /// Revenue account.
    pub account_revenue: String,
    /// Whether the product can be sold.
    pub salable: bool,
    /// Channel owning the listing.
    pub channel_id: ChannelId,
    /// Remote product id for the listing.
    pub remote_id: RemoteId,
    /// Remote product type.
    pub product_type: String,
}

/// Input for listing an existing product on a channel.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateListingInput {
    /// Channel owning the listing.
    pub channel_id: ChannelId,
    /// Product being listed.
    pub product_id: ProductId,
    /// Remote product id.
    pub remote_id: RemoteId,
    /// Remote product type.
    pub product_type: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list_with_rules(rules: Vec<PriceRule>) -> PriceList {
        PriceList {
            id: PriceListId::new(1),
            name: "Wholesale".to_string(),
            rules,
        }
    }

    #[test]
    fn test_compute_without_rules_keeps_list_price() {
        let list = list_with_rules(vec![]);
        assert_eq!(
            list.compute(Decimal::new(1000, 2), Decimal::from(5)),
            Decimal::new(1000, 2)
        );
    }

    #[test]
    fn test_compute_picks_highest_matching_threshold() {
        let list = list_with_rules(vec![
            PriceRule {
                min_quantity: Decimal::from(10),
                percent_discount: Decimal::from(10),
            },
            PriceRule {
                min_quantity: Decimal::from(50),
                percent_discount: Decimal::from(20),
            },
        ]);
        // 100.00 list price, 60 units: the 50+ rule applies.
        assert_eq!(
            list.compute(Decimal::new(10000, 2), Decimal::from(60)),
            Decimal::new(800000, 4)
        );
        // 10 units: the 10+ rule applies.
        assert_eq!(
            list.compute(Decimal::new(10000, 2), Decimal::from(10)),
            Decimal::new(900000, 4)
        );
        // Below every threshold: list price stands.
        assert_eq!(
            list.compute(Decimal::new(10000, 2), Decimal::from(5)),
            Decimal::new(10000, 2)
        );
    }
}
