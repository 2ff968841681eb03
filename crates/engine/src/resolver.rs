//! Generic find-or-create resolution of remote entities.
//!
//! Every import follows the same shape: look the remote id up in the
//! identity map, create the local entity if it is missing, and tolerate a
//! concurrent import creating it first. [`EntityKind`] captures that shape
//! per entity type; [`resolve`] and [`resolve_updating`] drive it.
//!
//! A create that loses a concurrent race surfaces as
//! [`StoreError::Conflict`]. The resolver then re-finds: exactly one import
//! wins the insert and every loser converges on the winner's row.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::debug;

use storebridge_core::{CategoryId, ChannelId, OrderWorkflowState, RemoteId};

use crate::error::{DataError, SyncError};
use crate::identity::IdentityMap;
use crate::models::{
    Category, Channel, CreateCategoryInput, CreateOrderInput, CreateOrderLineInput,
    CreateProductInput, CreateStoreInput, CreateStoreViewInput, CreateWebsiteInput, Order, Product,
    Store, StoreView, UNCLASSIFIED_CATEGORY, Website,
};
use crate::remote::{
    RemoteCategory, RemoteCategoryTree, RemoteOrder, RemoteProduct, RemoteSession,
    RemoteStoreGroup, RemoteStoreView, RemoteWebsite,
};
use crate::store::{LocalStore, StoreError};

/// Shared context for one resolution pass.
#[derive(Clone, Copy)]
pub struct ResolveCtx<'a> {
    /// Local system of record.
    pub store: &'a Arc<dyn LocalStore>,
    /// Identity map over the same store.
    pub identity: &'a IdentityMap,
    /// Channel being synchronized.
    pub channel: &'a Channel,
    /// Open remote session.
    pub session: &'a dyn RemoteSession,
}

/// One resolvable entity type.
///
/// `find` must locate the entity created by a concurrent resolution of the
/// same payload, since the resolver re-finds after losing a create race.
#[async_trait]
pub trait EntityKind {
    /// Parent the entity resolves under.
    type Scope: Sync;
    /// Remote data the entity is built from.
    type Payload: Sync;
    /// The resolved local entity.
    type Entity: Send;

    /// Name used in logs and corruption reports.
    const NAME: &'static str;

    /// Look the entity up locally.
    async fn find(
        ctx: &ResolveCtx<'_>,
        scope: &Self::Scope,
        payload: &Self::Payload,
    ) -> Result<Option<Self::Entity>, SyncError>;

    /// Create the entity locally.
    async fn create(
        ctx: &ResolveCtx<'_>,
        scope: &Self::Scope,
        payload: &Self::Payload,
    ) -> Result<Self::Entity, SyncError>;

    /// Refresh a found entity from the payload. Defaults to a no-op.
    async fn update(
        _ctx: &ResolveCtx<'_>,
        entity: Self::Entity,
        _payload: &Self::Payload,
    ) -> Result<Self::Entity, SyncError> {
        Ok(entity)
    }
}

/// How an entity was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution<T> {
    /// The entity already existed.
    Found(T),
    /// The entity was created by this resolution.
    Created(T),
    /// The entity existed and was refreshed from the payload.
    Updated(T),
}

impl<T> Resolution<T> {
    /// The resolved entity.
    #[must_use]
    pub fn into_inner(self) -> T {
        match self {
            Self::Found(entity) | Self::Created(entity) | Self::Updated(entity) => entity,
        }
    }

    /// Whether this resolution created the entity.
    #[must_use]
    pub const fn was_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}

/// Find the entity or create it, tolerating a concurrent create.
///
/// # Errors
///
/// Returns [`SyncError`] when a lookup or create fails for a reason other
/// than losing the create race.
pub async fn resolve<K: EntityKind>(
    ctx: &ResolveCtx<'_>,
    scope: &K::Scope,
    payload: &K::Payload,
) -> Result<Resolution<K::Entity>, SyncError> {
    if let Some(found) = K::find(ctx, scope, payload).await? {
        return Ok(Resolution::Found(found));
    }
    create_or_refind::<K>(ctx, scope, payload).await
}

/// Like [`resolve`], but a found entity is refreshed from the payload.
///
/// # Errors
///
/// Returns [`SyncError`] when a lookup, create or update fails.
pub async fn resolve_updating<K: EntityKind + Send>(
    ctx: &ResolveCtx<'_>,
    scope: &K::Scope,
    payload: &K::Payload,
) -> Result<Resolution<K::Entity>, SyncError> {
    if let Some(found) = K::find(ctx, scope, payload).await? {
        let updated = K::update(ctx, found, payload).await?;
        return Ok(Resolution::Updated(updated));
    }
    create_or_refind::<K>(ctx, scope, payload).await
}

async fn create_or_refind<K: EntityKind>(
    ctx: &ResolveCtx<'_>,
    scope: &K::Scope,
    payload: &K::Payload,
) -> Result<Resolution<K::Entity>, SyncError> {
    match K::create(ctx, scope, payload).await {
        Ok(created) => Ok(Resolution::Created(created)),
        Err(SyncError::Store(StoreError::Conflict(detail))) => {
            debug!(kind = K::NAME, %detail, "Create lost a concurrent race, re-finding");
            match K::find(ctx, scope, payload).await? {
                Some(found) => Ok(Resolution::Found(found)),
                None => Err(SyncError::Store(StoreError::DataCorruption(format!(
                    "{} missing after create conflict: {detail}",
                    K::NAME
                )))),
            }
        }
        Err(err) => Err(err),
    }
}

/// Websites resolved under a channel.
pub struct WebsiteKind;

#[async_trait]
impl EntityKind for WebsiteKind {
    type Scope = ChannelId;
    type Payload = RemoteWebsite;
    type Entity = Website;

    const NAME: &'static str = "website";

    async fn find(
        ctx: &ResolveCtx<'_>,
        scope: &Self::Scope,
        payload: &Self::Payload,
    ) -> Result<Option<Self::Entity>, SyncError> {
        Ok(ctx
            .store
            .website_by_remote(*scope, payload.website_id)
            .await?)
    }

    async fn create(
        ctx: &ResolveCtx<'_>,
        scope: &Self::Scope,
        payload: &Self::Payload,
    ) -> Result<Self::Entity, SyncError> {
        Ok(ctx
            .store
            .create_website(CreateWebsiteInput {
                channel_id: *scope,
                remote_id: payload.website_id,
                name: payload.name.clone(),
                code: payload.code.clone(),
            })
            .await?)
    }
}

/// Stores resolved under a website.
pub struct StoreKind;

#[async_trait]
impl EntityKind for StoreKind {
    type Scope = Website;
    type Payload = RemoteStoreGroup;
    type Entity = Store;

    const NAME: &'static str = "store";

    async fn find(
        ctx: &ResolveCtx<'_>,
        scope: &Self::Scope,
        payload: &Self::Payload,
    ) -> Result<Option<Self::Entity>, SyncError> {
        Ok(ctx.store.store_by_remote(scope.id, payload.group_id).await?)
    }

    async fn create(
        ctx: &ResolveCtx<'_>,
        scope: &Self::Scope,
        payload: &Self::Payload,
    ) -> Result<Self::Entity, SyncError> {
        // New stores price their tier defaults off the channel price list
        // until an operator assigns a dedicated one.
        Ok(ctx
            .store
            .create_store(CreateStoreInput {
                website_id: scope.id,
                channel_id: scope.channel_id,
                remote_id: payload.group_id,
                name: payload.name.clone(),
                price_list_id: ctx.channel.price_list_id,
            })
            .await?)
    }
}

/// Store views resolved under a store.
pub struct StoreViewKind;

#[async_trait]
impl EntityKind for StoreViewKind {
    type Scope = Store;
    type Payload = RemoteStoreView;
    type Entity = StoreView;

    const NAME: &'static str = "store_view";

    async fn find(
        ctx: &ResolveCtx<'_>,
        scope: &Self::Scope,
        payload: &Self::Payload,
    ) -> Result<Option<Self::Entity>, SyncError> {
        Ok(ctx
            .store
            .store_view_by_remote(scope.id, payload.store_id)
            .await?)
    }

    async fn create(
        ctx: &ResolveCtx<'_>,
        scope: &Self::Scope,
        payload: &Self::Payload,
    ) -> Result<Self::Entity, SyncError> {
        Ok(ctx
            .store
            .create_store_view(CreateStoreViewInput {
                store_id: scope.id,
                website_id: scope.website_id,
                channel_id: scope.channel_id,
                remote_id: payload.store_id,
                name: payload.name.clone(),
                code: payload.code.clone(),
            })
            .await?)
    }
}

/// Remote category data plus the local parent to file it under.
#[derive(Debug, Clone)]
pub struct CategoryPayload {
    /// Remote category id.
    pub remote_id: RemoteId,
    /// Display name.
    pub name: String,
    /// Local parent category. `None` files the category as a root.
    pub parent: Option<CategoryId>,
}

impl From<RemoteCategory> for CategoryPayload {
    /// A category fetched outside a tree walk lands as a root; a later
    /// tree import does not reparent it.
    fn from(info: RemoteCategory) -> Self {
        Self {
            remote_id: info.category_id,
            name: info.name,
            parent: None,
        }
    }
}

/// Categories resolved under a channel.
pub struct CategoryKind;

#[async_trait]
impl EntityKind for CategoryKind {
    type Scope = ChannelId;
    type Payload = CategoryPayload;
    type Entity = Category;

    const NAME: &'static str = "category";

    async fn find(
        ctx: &ResolveCtx<'_>,
        scope: &Self::Scope,
        payload: &Self::Payload,
    ) -> Result<Option<Self::Entity>, SyncError> {
        Ok(ctx.identity.category(*scope, payload.remote_id).await?)
    }

    async fn create(
        ctx: &ResolveCtx<'_>,
        scope: &Self::Scope,
        payload: &Self::Payload,
    ) -> Result<Self::Entity, SyncError> {
        Ok(ctx
            .store
            .create_linked_category(
                *scope,
                payload.remote_id,
                CreateCategoryInput {
                    name: payload.name.clone(),
                    parent_id: payload.parent,
                },
            )
            .await?)
    }
}

/// Products resolved under a channel.
pub struct ProductKind;

#[async_trait]
impl EntityKind for ProductKind {
    type Scope = ChannelId;
    type Payload = RemoteProduct;
    type Entity = Product;

    const NAME: &'static str = "product";

    async fn find(
        ctx: &ResolveCtx<'_>,
        scope: &Self::Scope,
        payload: &Self::Payload,
    ) -> Result<Option<Self::Entity>, SyncError> {
        Ok(ctx.identity.product(*scope, payload.product_id).await?)
    }

    async fn create(
        ctx: &ResolveCtx<'_>,
        scope: &Self::Scope,
        payload: &Self::Payload,
    ) -> Result<Self::Entity, SyncError> {
        let category_id = product_category(ctx, *scope, payload).await?;
        let sku = payload
            .sku
            .clone()
            .filter(|sku| !sku.is_empty())
            .ok_or(DataError::MissingSku {
                remote_id: payload.product_id,
            })?;
        let name = payload
            .name
            .clone()
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| format!("SKU: {sku}"));
        let list_price = payload
            .special_price
            .or(payload.price)
            .unwrap_or(Decimal::ZERO);

        Ok(ctx
            .store
            .create_product(CreateProductInput {
                name,
                code: Some(sku),
                description: payload.description.clone(),
                category_id,
                list_price,
                cost_price: payload.cost.unwrap_or(Decimal::ZERO),
                uom: ctx.channel.default_uom.clone(),
                account_expense: ctx.channel.account_expense.clone(),
                account_revenue: ctx.channel.account_revenue.clone(),
                salable: true,
                channel_id: *scope,
                remote_id: payload.product_id,
                product_type: payload.product_type.clone(),
            })
            .await?)
    }

    async fn update(
        ctx: &ResolveCtx<'_>,
        mut entity: Self::Entity,
        payload: &Self::Payload,
    ) -> Result<Self::Entity, SyncError> {
        if let Some(sku) = payload.sku.clone().filter(|sku| !sku.is_empty()) {
            entity.code = Some(sku);
        }
        if let Some(name) = payload.name.clone().filter(|name| !name.is_empty()) {
            entity.name = name;
        }
        if let Some(description) = payload.description.clone() {
            entity.description = Some(description);
        }
        if let Some(price) = payload.special_price.or(payload.price) {
            entity.list_price = price;
        }
        if let Some(cost) = payload.cost {
            entity.cost_price = cost;
        }
        ctx.store.update_product(&entity).await?;
        Ok(entity)
    }
}

/// Pick the local category for an imported product.
///
/// The first remote category wins. When it is not linked yet its record is
/// fetched and resolved on the spot; a product without categories files
/// under the fallback category.
async fn product_category(
    ctx: &ResolveCtx<'_>,
    channel: ChannelId,
    payload: &RemoteProduct,
) -> Result<CategoryId, SyncError> {
    match payload.categories.first() {
        Some(&remote) => {
            if let Some(category) = ctx.identity.category(channel, remote).await? {
                return Ok(category.id);
            }
            let info = ctx.session.category_info(remote).await?;
            let resolved =
                resolve::<CategoryKind>(ctx, &channel, &CategoryPayload::from(info)).await?;
            Ok(resolved.into_inner().id)
        }
        None => {
            let fallback = ctx
                .store
                .category_by_name(UNCLASSIFIED_CATEGORY)
                .await?
                .ok_or_else(|| {
                    SyncError::Store(StoreError::DataCorruption(format!(
                        "fallback category {UNCLASSIFIED_CATEGORY:?} missing"
                    )))
                })?;
            Ok(fallback.id)
        }
    }
}

/// Orders resolved under a store view.
pub struct OrderKind;

#[async_trait]
impl EntityKind for OrderKind {
    type Scope = StoreView;
    type Payload = RemoteOrder;
    type Entity = Order;

    const NAME: &'static str = "order";

    async fn find(
        ctx: &ResolveCtx<'_>,
        _scope: &Self::Scope,
        payload: &Self::Payload,
    ) -> Result<Option<Self::Entity>, SyncError> {
        Ok(ctx
            .identity
            .order_by_external(ctx.channel, &payload.increment_id)
            .await?)
    }

    async fn create(
        ctx: &ResolveCtx<'_>,
        scope: &Self::Scope,
        payload: &Self::Payload,
    ) -> Result<Self::Entity, SyncError> {
        let mut lines = Vec::with_capacity(payload.lines.len());
        for line in &payload.lines {
            let product_id = match line.product_id {
                Some(remote) => {
                    let product = match ctx.identity.product(ctx.channel.id, remote).await? {
                        Some(product) => product,
                        None => {
                            let info = ctx.session.product_info(remote).await?;
                            resolve::<ProductKind>(ctx, &ctx.channel.id, &info)
                                .await?
                                .into_inner()
                        }
                    };
                    Some(product.id)
                }
                None => None,
            };
            let taxes = line
                .tax_percent
                .map(|rate| scope.taxes_for_rate(rate))
                .unwrap_or_default();
            lines.push(CreateOrderLineInput {
                product_id,
                remote_line_id: Some(line.item_id),
                description: line.name.clone(),
                quantity: line.qty_ordered,
                unit_price: line.price,
                taxes,
            });
        }

        Ok(ctx
            .store
            .create_order(CreateOrderInput {
                channel_id: scope.channel_id,
                store_view_id: scope.id,
                reference: ctx.channel.order_reference(&payload.increment_id),
                remote_id: Some(payload.order_id),
                state: workflow_state_for(&payload.state),
                lines,
            })
            .await?)
    }
}

/// Map a remote order state code onto the local workflow.
///
/// Unknown codes land in `Draft` so an operator can triage them instead of
/// the import failing.
fn workflow_state_for(remote_state: &str) -> OrderWorkflowState {
    match remote_state {
        "new" => OrderWorkflowState::Confirmed,
        "processing" => OrderWorkflowState::Processing,
        "complete" => OrderWorkflowState::Done,
        "canceled" | "cancelled" => OrderWorkflowState::Cancelled,
        _ => OrderWorkflowState::Draft,
    }
}

/// Resolve a category tree depth-first, keeping the parent chain.
///
/// Returns the number of categories created.
pub fn resolve_category_tree<'a>(
    ctx: &'a ResolveCtx<'a>,
    channel: ChannelId,
    node: &'a RemoteCategoryTree,
    parent: Option<CategoryId>,
) -> Pin<Box<dyn Future<Output = Result<usize, SyncError>> + Send + 'a>> {
    Box::pin(async move {
        let payload = CategoryPayload {
            remote_id: node.category_id,
            name: node.name.clone(),
            parent,
        };
        let resolved = resolve::<CategoryKind>(ctx, &channel, &payload).await?;
        let mut created = usize::from(resolved.was_created());
        let local_id = resolved.into_inner().id;
        for child in &node.children {
            created += resolve_category_tree(ctx, channel, child, Some(local_id)).await?;
        }
        Ok(created)
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::models::{DEFAULT_ROOT_CATEGORY, DEFAULT_UOM};
    use crate::remote::{
        Filter, InventoryUpdate, NewRemoteProduct, RemoteCarrier, RemoteFault, RemoteOrderState,
        RemoteOrderSummary, TierPriceEntry, TrackingInfo,
    };
    use crate::store::memory::MemoryStore;
    use secrecy::SecretString;
    use std::collections::BTreeMap;
    use storebridge_core::PriceListId;

    /// Session stub for resolutions that must not reach the remote side.
    struct StubSession;

    fn unexpected() -> RemoteFault {
        RemoteFault::Protocol("unexpected remote call".to_string())
    }

    #[async_trait]
    impl RemoteSession for StubSession {
        async fn list_websites(&self) -> Result<Vec<RemoteWebsite>, RemoteFault> {
            Err(unexpected())
        }
        async fn list_stores(
            &self,
            _website: RemoteId,
        ) -> Result<Vec<RemoteStoreGroup>, RemoteFault> {
            Err(unexpected())
        }
        async fn list_store_views(
            &self,
            _store: RemoteId,
        ) -> Result<Vec<RemoteStoreView>, RemoteFault> {
            Err(unexpected())
        }
        async fn order_states(&self) -> Result<Vec<RemoteOrderState>, RemoteFault> {
            Err(unexpected())
        }
        async fn shipping_carriers(&self) -> Result<Vec<RemoteCarrier>, RemoteFault> {
            Err(unexpected())
        }
        async fn category_tree(
            &self,
            _root: RemoteId,
        ) -> Result<RemoteCategoryTree, RemoteFault> {
            Err(unexpected())
        }
        async fn category_info(&self, _category: RemoteId) -> Result<RemoteCategory, RemoteFault> {
            Err(unexpected())
        }
        async fn list_products(&self) -> Result<Vec<RemoteProduct>, RemoteFault> {
            Err(unexpected())
        }
        async fn product_info(&self, _product: RemoteId) -> Result<RemoteProduct, RemoteFault> {
            Err(unexpected())
        }
        async fn create_product(
            &self,
            _product: NewRemoteProduct,
        ) -> Result<RemoteId, RemoteFault> {
            Err(unexpected())
        }
        async fn list_orders(
            &self,
            _filter: &Filter,
        ) -> Result<Vec<RemoteOrderSummary>, RemoteFault> {
            Err(unexpected())
        }
        async fn order_info(&self, _increment_id: &str) -> Result<RemoteOrder, RemoteFault> {
            Err(unexpected())
        }
        async fn update_inventory(
            &self,
            _product: RemoteId,
            _update: InventoryUpdate,
        ) -> Result<(), RemoteFault> {
            Err(unexpected())
        }
        async fn update_tier_prices(
            &self,
            _product: RemoteId,
            _tiers: &[TierPriceEntry],
        ) -> Result<(), RemoteFault> {
            Err(unexpected())
        }
        async fn update_order_status(
            &self,
            _increment_id: &str,
            _status: &str,
        ) -> Result<(), RemoteFault> {
            Err(unexpected())
        }
        async fn create_shipment(
            &self,
            _increment_id: &str,
            _quantities: &BTreeMap<String, Decimal>,
        ) -> Result<String, RemoteFault> {
            Err(unexpected())
        }
        async fn add_shipment_tracking(
            &self,
            _shipment_ref: &str,
            _tracking: TrackingInfo,
        ) -> Result<(), RemoteFault> {
            Err(unexpected())
        }
    }

    fn channel() -> Channel {
        Channel {
            id: ChannelId::new(1),
            name: "test".to_string(),
            endpoint: "https://shop.example.com/api".parse().expect("url"),
            api_user: "bridge".to_string(),
            api_key: SecretString::from("k9!mK2@nL5#pQ7&rT0"),
            order_prefix: "mag_".to_string(),
            default_uom: DEFAULT_UOM.to_string(),
            account_expense: "Main Expense".to_string(),
            account_revenue: "Main Revenue".to_string(),
            root_category: DEFAULT_ROOT_CATEGORY,
            price_list_id: PriceListId::new(1),
        }
    }

    struct Fixture {
        store: Arc<dyn LocalStore>,
        identity: IdentityMap,
        channel: Channel,
        session: StubSession,
    }

    impl Fixture {
        fn new() -> Self {
            let store: Arc<dyn LocalStore> = Arc::new(MemoryStore::new());
            let identity = IdentityMap::new(store.clone());
            Self {
                store,
                identity,
                channel: channel(),
                session: StubSession,
            }
        }

        fn ctx(&self) -> ResolveCtx<'_> {
            ResolveCtx {
                store: &self.store,
                identity: &self.identity,
                channel: &self.channel,
                session: &self.session,
            }
        }
    }

    fn website_payload(remote: i64) -> RemoteWebsite {
        RemoteWebsite {
            website_id: RemoteId::new(remote),
            name: "Main Website".to_string(),
            code: "base".to_string(),
        }
    }

    fn product_payload(remote: i64) -> RemoteProduct {
        RemoteProduct {
            product_id: RemoteId::new(remote),
            sku: Some("WID-1".to_string()),
            name: Some("Widget".to_string()),
            description: None,
            product_type: "simple".to_string(),
            price: Some(Decimal::new(1999, 2)),
            special_price: None,
            cost: None,
            categories: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_resolve_is_idempotent() {
        let fixture = Fixture::new();
        let ctx = fixture.ctx();
        let payload = website_payload(2);

        let first = resolve::<WebsiteKind>(&ctx, &fixture.channel.id, &payload)
            .await
            .unwrap();
        assert!(first.was_created());
        let second = resolve::<WebsiteKind>(&ctx, &fixture.channel.id, &payload)
            .await
            .unwrap();
        assert!(!second.was_created());
        assert_eq!(first.into_inner().id, second.into_inner().id);
    }

    /// Kind whose create simulates losing a concurrent race: the row
    /// appears, then the conflict a real backend would raise comes back.
    struct RacingWebsiteKind;

    #[async_trait]
    impl EntityKind for RacingWebsiteKind {
        type Scope = ChannelId;
        type Payload = RemoteWebsite;
        type Entity = Website;

        const NAME: &'static str = "racing_website";

        async fn find(
            ctx: &ResolveCtx<'_>,
            scope: &Self::Scope,
            payload: &Self::Payload,
        ) -> Result<Option<Self::Entity>, SyncError> {
            Ok(ctx
                .store
                .website_by_remote(*scope, payload.website_id)
                .await?)
        }

        async fn create(
            ctx: &ResolveCtx<'_>,
            scope: &Self::Scope,
            payload: &Self::Payload,
        ) -> Result<Self::Entity, SyncError> {
            ctx.store
                .create_website(CreateWebsiteInput {
                    channel_id: *scope,
                    remote_id: payload.website_id,
                    name: payload.name.clone(),
                    code: payload.code.clone(),
                })
                .await?;
            Err(SyncError::Store(StoreError::Conflict(
                "lost concurrent create".to_string(),
            )))
        }
    }

    #[tokio::test]
    async fn test_resolve_refinds_after_losing_create_race() {
        let fixture = Fixture::new();
        let ctx = fixture.ctx();
        let payload = website_payload(2);

        let resolution = resolve::<RacingWebsiteKind>(&ctx, &fixture.channel.id, &payload)
            .await
            .unwrap();
        // The loser converges on the winner's row.
        assert!(!resolution.was_created());
        assert_eq!(resolution.into_inner().remote_id, RemoteId::new(2));
    }

    #[tokio::test]
    async fn test_resolve_updating_refreshes_found_product() {
        let fixture = Fixture::new();
        let ctx = fixture.ctx();

        let created = resolve::<ProductKind>(&ctx, &fixture.channel.id, &product_payload(7))
            .await
            .unwrap()
            .into_inner();

        let mut renamed = product_payload(7);
        renamed.name = Some("Widget Mk2".to_string());
        renamed.price = Some(Decimal::new(2499, 2));

        let updated = resolve_updating::<ProductKind>(&ctx, &fixture.channel.id, &renamed)
            .await
            .unwrap()
            .into_inner();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.name, "Widget Mk2");
        assert_eq!(updated.list_price, Decimal::new(2499, 2));

        let stored = fixture.store.product(created.id).await.unwrap();
        assert_eq!(stored.name, "Widget Mk2");
    }

    #[tokio::test]
    async fn test_product_without_sku_is_rejected() {
        let fixture = Fixture::new();
        let ctx = fixture.ctx();
        let mut payload = product_payload(7);
        payload.sku = None;

        let err = resolve::<ProductKind>(&ctx, &fixture.channel.id, &payload)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SyncError::Data(DataError::MissingSku { remote_id }) if remote_id == RemoteId::new(7)
        ));
    }

    #[tokio::test]
    async fn test_product_without_categories_files_under_fallback() {
        let fixture = Fixture::new();
        let ctx = fixture.ctx();

        let product = resolve::<ProductKind>(&ctx, &fixture.channel.id, &product_payload(7))
            .await
            .unwrap()
            .into_inner();
        let fallback = fixture
            .store
            .category_by_name(UNCLASSIFIED_CATEGORY)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(product.category_id, fallback.id);
    }

    #[tokio::test]
    async fn test_product_special_price_wins_over_price() {
        let fixture = Fixture::new();
        let ctx = fixture.ctx();
        let mut payload = product_payload(7);
        payload.special_price = Some(Decimal::new(1499, 2));

        let product = resolve::<ProductKind>(&ctx, &fixture.channel.id, &payload)
            .await
            .unwrap()
            .into_inner();
        assert_eq!(product.list_price, Decimal::new(1499, 2));
    }

    #[tokio::test]
    async fn test_product_without_name_falls_back_to_sku() {
        let fixture = Fixture::new();
        let ctx = fixture.ctx();
        let mut payload = product_payload(7);
        payload.name = None;

        let product = resolve::<ProductKind>(&ctx, &fixture.channel.id, &payload)
            .await
            .unwrap()
            .into_inner();
        assert_eq!(product.name, "SKU: WID-1");
    }

    #[tokio::test]
    async fn test_resolve_category_tree_keeps_parent_chain() {
        let fixture = Fixture::new();
        let ctx = fixture.ctx();
        let tree = RemoteCategoryTree {
            category_id: RemoteId::new(1),
            name: "Root".to_string(),
            children: vec![RemoteCategoryTree {
                category_id: RemoteId::new(2),
                name: "Books".to_string(),
                children: vec![RemoteCategoryTree {
                    category_id: RemoteId::new(3),
                    name: "Fiction".to_string(),
                    children: Vec::new(),
                }],
            }],
        };

        let created = resolve_category_tree(&ctx, fixture.channel.id, &tree, None)
            .await
            .unwrap();
        assert_eq!(created, 3);

        let root = fixture
            .identity
            .category(fixture.channel.id, RemoteId::new(1))
            .await
            .unwrap()
            .unwrap();
        let books = fixture
            .identity
            .category(fixture.channel.id, RemoteId::new(2))
            .await
            .unwrap()
            .unwrap();
        let fiction = fixture
            .identity
            .category(fixture.channel.id, RemoteId::new(3))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(root.parent_id, None);
        assert_eq!(books.parent_id, Some(root.id));
        assert_eq!(fiction.parent_id, Some(books.id));

        // A second walk creates nothing new.
        let again = resolve_category_tree(&ctx, fixture.channel.id, &tree, None)
            .await
            .unwrap();
        assert_eq!(again, 0);
    }

    #[test]
    fn test_workflow_state_mapping() {
        assert_eq!(workflow_state_for("new"), OrderWorkflowState::Confirmed);
        assert_eq!(
            workflow_state_for("processing"),
            OrderWorkflowState::Processing
        );
        assert_eq!(workflow_state_for("complete"), OrderWorkflowState::Done);
        assert_eq!(workflow_state_for("canceled"), OrderWorkflowState::Cancelled);
        assert_eq!(workflow_state_for("holded"), OrderWorkflowState::Draft);
    }
}
