//! Local system-of-record access.
//!
//! [`LocalStore`] is the persistence seam of the engine: pipelines read and
//! write entities through it and never touch a backend directly. The
//! in-memory implementation in [`memory`] backs the test suites and the
//! demo CLI.

pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

use storebridge_core::{
    CarrierId, CategoryId, ChannelId, OrderId, PriceListId, ProductId, RemoteId, StoreId,
    StoreViewId, WebsiteId,
};

use crate::models::{
    CarrierRecord, Category, CategoryLink, CreateCarrierInput, CreateCategoryInput,
    CreateIssueInput, CreateListingInput, CreateOrderInput, CreateOrderStateInput,
    CreateProductInput, CreateStoreInput, CreateStoreViewInput, CreateWebsiteInput, Listing,
    Order, OrderFilter, OrderStateRecord, PriceList, PriceTier, Product, Shipment, Store,
    StoreView, SyncIssue, Website,
};
use crate::watermark::{SyncScope, WatermarkKind};

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Backend failure, e.g. a lost connection.
    #[error("backend error: {0}")]
    Backend(String),

    /// Data in the store is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate remote id).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// The local system of record.
///
/// Lookups scoped by remote id return `Ok(None)` when no row matches;
/// lookups by local id return [`StoreError::NotFound`], since a dangling
/// local id means the caller holds a stale reference. Creates enforcing a
/// uniqueness constraint return [`StoreError::Conflict`] when the row
/// already exists, which the upsert resolver turns into a re-find.
#[async_trait]
pub trait LocalStore: Send + Sync {
    // ==========================================================================
    // Hierarchy
    // ==========================================================================

    /// Find a website by its remote id.
    async fn website_by_remote(
        &self,
        channel: ChannelId,
        remote: RemoteId,
    ) -> Result<Option<Website>, StoreError>;

    /// Create a website. Conflicts on a duplicate (channel, remote id).
    async fn create_website(&self, input: CreateWebsiteInput) -> Result<Website, StoreError>;

    /// All websites of a channel.
    async fn websites(&self, channel: ChannelId) -> Result<Vec<Website>, StoreError>;

    /// Find a store by its remote id.
    async fn store_by_remote(
        &self,
        website: WebsiteId,
        remote: RemoteId,
    ) -> Result<Option<Store>, StoreError>;

    /// Create a store. Conflicts on a duplicate (website, remote id).
    async fn create_store(&self, input: CreateStoreInput) -> Result<Store, StoreError>;

    /// Fetch a store by local id.
    async fn store(&self, store: StoreId) -> Result<Store, StoreError>;

    /// Find a store view by its remote id.
    async fn store_view_by_remote(
        &self,
        store: StoreId,
        remote: RemoteId,
    ) -> Result<Option<StoreView>, StoreError>;

    /// Create a store view. Conflicts on a duplicate (store, remote id).
    async fn create_store_view(&self, input: CreateStoreViewInput) -> Result<StoreView, StoreError>;

    /// All store views of a channel.
    async fn store_views(&self, channel: ChannelId) -> Result<Vec<StoreView>, StoreError>;

    /// Fetch a store view by local id.
    async fn store_view(&self, view: StoreViewId) -> Result<StoreView, StoreError>;

    // ==========================================================================
    // Categories
    // ==========================================================================

    /// Fetch a category by local id.
    async fn category(&self, category: CategoryId) -> Result<Category, StoreError>;

    /// Find a category by exact name.
    async fn category_by_name(&self, name: &str) -> Result<Option<Category>, StoreError>;

    /// Create a category.
    async fn create_category(&self, input: CreateCategoryInput) -> Result<Category, StoreError>;

    /// Create a category and link it to a remote id in one step.
    ///
    /// Conflicts on a duplicate (channel, remote id), leaving neither row
    /// behind.
    async fn create_linked_category(
        &self,
        channel: ChannelId,
        remote: RemoteId,
        input: CreateCategoryInput,
    ) -> Result<Category, StoreError>;

    /// Find the category link for a remote id.
    async fn category_link(
        &self,
        channel: ChannelId,
        remote: RemoteId,
    ) -> Result<Option<CategoryLink>, StoreError>;

    /// Find the category link pointing at a local category.
    async fn category_link_for(
        &self,
        channel: ChannelId,
        category: CategoryId,
    ) -> Result<Option<CategoryLink>, StoreError>;

    /// Record a category link. Conflicts on a duplicate (channel, remote id).
    async fn create_category_link(&self, link: CategoryLink) -> Result<CategoryLink, StoreError>;

    // ==========================================================================
    // Products
    // ==========================================================================

    /// Fetch a product by local id.
    async fn product(&self, product: ProductId) -> Result<Product, StoreError>;

    /// Create a product together with its channel listing.
    ///
    /// Conflicts on a duplicate (channel, remote id), leaving neither row
    /// behind.
    async fn create_product(&self, input: CreateProductInput) -> Result<Product, StoreError>;

    /// Persist changed product fields.
    async fn update_product(&self, product: &Product) -> Result<(), StoreError>;

    /// Find a listing by its remote id.
    async fn listing(
        &self,
        channel: ChannelId,
        remote: RemoteId,
    ) -> Result<Option<Listing>, StoreError>;

    /// Find the listing of a product on a channel.
    async fn listing_for_product(
        &self,
        channel: ChannelId,
        product: ProductId,
    ) -> Result<Option<Listing>, StoreError>;

    /// All listings of a channel.
    async fn listings(&self, channel: ChannelId) -> Result<Vec<Listing>, StoreError>;

    /// Create a listing. Conflicts on a duplicate (channel, remote id) or
    /// (channel, product).
    async fn create_listing(&self, input: CreateListingInput) -> Result<Listing, StoreError>;

    // ==========================================================================
    // Pricing and stock
    // ==========================================================================

    /// Fetch a price list by local id.
    async fn price_list(&self, list: PriceListId) -> Result<PriceList, StoreError>;

    /// Tier quantity breaks configured on a product.
    async fn product_tiers(&self, product: ProductId) -> Result<Vec<PriceTier>, StoreError>;

    /// Tier quantity breaks configured as store defaults.
    async fn store_tiers(&self, store: StoreId) -> Result<Vec<PriceTier>, StoreError>;

    /// Salable quantity of a product, summed over storage locations.
    async fn quantity_on_hand(&self, product: ProductId) -> Result<Decimal, StoreError>;

    // ==========================================================================
    // Order vocabulary
    // ==========================================================================

    /// All order state codes of a channel.
    async fn order_states(&self, channel: ChannelId) -> Result<Vec<OrderStateRecord>, StoreError>;

    /// Find an order state by code.
    async fn order_state_by_code(
        &self,
        channel: ChannelId,
        code: &str,
    ) -> Result<Option<OrderStateRecord>, StoreError>;

    /// Record an order state code. Conflicts on a duplicate (channel, code).
    async fn create_order_state(
        &self,
        input: CreateOrderStateInput,
    ) -> Result<OrderStateRecord, StoreError>;

    /// Fetch a carrier by local id.
    async fn carrier(&self, carrier: CarrierId) -> Result<CarrierRecord, StoreError>;

    /// Find a carrier by code.
    async fn carrier_by_code(
        &self,
        channel: ChannelId,
        code: &str,
    ) -> Result<Option<CarrierRecord>, StoreError>;

    /// Record a carrier. Conflicts on a duplicate (channel, code).
    async fn create_carrier(&self, input: CreateCarrierInput) -> Result<CarrierRecord, StoreError>;

    // ==========================================================================
    // Orders
    // ==========================================================================

    /// Find an order by its reference.
    async fn order_by_reference(
        &self,
        channel: ChannelId,
        reference: &str,
    ) -> Result<Option<Order>, StoreError>;

    /// Create an order with its lines. Conflicts on a duplicate
    /// (channel, reference).
    async fn create_order(&self, input: CreateOrderInput) -> Result<Order, StoreError>;

    /// Orders of a store view matching a filter.
    async fn orders(
        &self,
        view: StoreViewId,
        filter: &OrderFilter,
    ) -> Result<Vec<Order>, StoreError>;

    /// Shipments fulfilling an order.
    async fn shipments_for_order(&self, order: OrderId) -> Result<Vec<Shipment>, StoreError>;

    /// Persist changed shipment fields.
    async fn update_shipment(&self, shipment: &Shipment) -> Result<(), StoreError>;

    // ==========================================================================
    // Watermarks
    // ==========================================================================

    /// Read a watermark.
    async fn watermark(
        &self,
        scope: SyncScope,
        kind: WatermarkKind,
    ) -> Result<Option<DateTime<Utc>>, StoreError>;

    /// Write a watermark.
    async fn set_watermark(
        &self,
        scope: SyncScope,
        kind: WatermarkKind,
        mark: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    // ==========================================================================
    // Issues
    // ==========================================================================

    /// Record a sync issue for operator review.
    async fn record_issue(&self, input: CreateIssueInput) -> Result<SyncIssue, StoreError>;
}
