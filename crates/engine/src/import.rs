//! Import pipelines: remote state flowing into the local store.
//!
//! Pipelines run sequentially and resolve every record through the
//! [`crate::resolver`] machinery, so a re-run after a partial failure picks
//! up where the previous run stopped without duplicating anything.

use tracing::{info, instrument};
use uuid::Uuid;

use storebridge_core::StoreViewId;

use crate::engine::SyncEngine;
use crate::error::SyncError;
use crate::models::{CreateCarrierInput, CreateOrderStateInput, OrderStateRecord, StoreView};
use crate::remote::Filter;
use crate::resolver::{
    OrderKind, ProductKind, StoreKind, StoreViewKind, WebsiteKind, resolve, resolve_category_tree,
    resolve_updating,
};
use crate::store::StoreError;
use crate::watermark::{SyncScope, WatermarkKind};

/// Counts from a hierarchy import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HierarchyImport {
    /// Websites created.
    pub websites: usize,
    /// Stores created.
    pub stores: usize,
    /// Store views created.
    pub store_views: usize,
}

/// Counts from a catalog import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CatalogImport {
    /// Categories created.
    pub categories: usize,
    /// Products created.
    pub products: usize,
}

/// Counts from an order import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrderImport {
    /// Orders the remote side listed inside the window.
    pub fetched: usize,
    /// Orders newly imported.
    pub imported: usize,
}

impl SyncEngine {
    /// Import the order state codes the remote side knows.
    ///
    /// New codes default their import eligibility via
    /// [`OrderStateRecord::default_import_eligible`]; existing codes keep
    /// whatever an operator configured.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError`] when the remote call or a store write fails.
    #[instrument(skip(self), fields(channel = %self.channel.id))]
    pub async fn import_order_states(&self) -> Result<usize, SyncError> {
        let session = self.session().await?;
        let mut created = 0;
        for state in session.order_states().await? {
            if self
                .store
                .order_state_by_code(self.channel.id, &state.code)
                .await?
                .is_some()
            {
                continue;
            }
            let input = CreateOrderStateInput {
                channel_id: self.channel.id,
                code: state.code.clone(),
                name: state.name,
                import_eligible: OrderStateRecord::default_import_eligible(&state.code),
            };
            match self.store.create_order_state(input).await {
                Ok(_) => created += 1,
                // A concurrent import recorded the code first.
                Err(StoreError::Conflict(_)) => {}
                Err(err) => return Err(err.into()),
            }
        }
        info!(created, "Imported order states");
        Ok(created)
    }

    /// Import the shipping carriers the remote side knows.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError`] when the remote call or a store write fails.
    #[instrument(skip(self), fields(channel = %self.channel.id))]
    pub async fn import_carriers(&self) -> Result<usize, SyncError> {
        let session = self.session().await?;
        let mut created = 0;
        for carrier in session.shipping_carriers().await? {
            if self
                .store
                .carrier_by_code(self.channel.id, &carrier.code)
                .await?
                .is_some()
            {
                continue;
            }
            let input = CreateCarrierInput {
                channel_id: self.channel.id,
                code: carrier.code.clone(),
                title: carrier.label,
            };
            match self.store.create_carrier(input).await {
                Ok(_) => created += 1,
                Err(StoreError::Conflict(_)) => {}
                Err(err) => return Err(err.into()),
            }
        }
        info!(created, "Imported carriers");
        Ok(created)
    }

    /// Import the website, store and store view hierarchy.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError`] when a remote call or a resolution fails.
    #[instrument(skip(self), fields(channel = %self.channel.id))]
    pub async fn import_hierarchy(&self) -> Result<HierarchyImport, SyncError> {
        let session = self.session().await?;
        let ctx = self.ctx(session.as_ref());
        let mut summary = HierarchyImport::default();

        for remote_website in session.list_websites().await? {
            let website = resolve::<WebsiteKind>(&ctx, &self.channel.id, &remote_website).await?;
            summary.websites += usize::from(website.was_created());
            let website = website.into_inner();

            for remote_store in session.list_stores(remote_website.website_id).await? {
                let store = resolve::<StoreKind>(&ctx, &website, &remote_store).await?;
                summary.stores += usize::from(store.was_created());
                let store = store.into_inner();

                for remote_view in session.list_store_views(remote_store.group_id).await? {
                    let view = resolve::<StoreViewKind>(&ctx, &store, &remote_view).await?;
                    summary.store_views += usize::from(view.was_created());
                }
            }
        }

        info!(
            websites = summary.websites,
            stores = summary.stores,
            store_views = summary.store_views,
            "Imported storefront hierarchy"
        );
        Ok(summary)
    }

    /// Import the category tree and the product catalog.
    ///
    /// Categories come first so products can file under them without extra
    /// per-category fetches.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError`] when a remote call or a resolution fails.
    #[instrument(skip(self), fields(channel = %self.channel.id))]
    pub async fn import_catalog(&self) -> Result<CatalogImport, SyncError> {
        let session = self.session().await?;
        let ctx = self.ctx(session.as_ref());

        let tree = session.category_tree(self.channel.root_category).await?;
        let categories = resolve_category_tree(&ctx, self.channel.id, &tree, None).await?;

        let mut products = 0;
        for remote_product in session.list_products().await? {
            let resolution =
                resolve::<ProductKind>(&ctx, &self.channel.id, &remote_product).await?;
            products += usize::from(resolution.was_created());
        }

        info!(categories, products, "Imported catalog");
        Ok(CatalogImport {
            categories,
            products,
        })
    }

    /// Refresh every listed product from the remote catalog.
    ///
    /// Unlike [`import_catalog`](Self::import_catalog) this runs the update
    /// branch, overwriting local name, description and prices with what the
    /// remote side holds.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError`] when a remote call or a resolution fails.
    #[instrument(skip(self), fields(channel = %self.channel.id))]
    pub async fn update_catalog(&self) -> Result<usize, SyncError> {
        let listings = self.store.listings(self.channel.id).await?;
        let mut refreshed = 0;
        for listing in listings {
            let session = self.session().await?;
            let ctx = self.ctx(session.as_ref());
            let info = session.product_info(listing.remote_id).await?;
            resolve_updating::<ProductKind>(&ctx, &self.channel.id, &info).await?;
            refreshed += 1;
        }
        info!(refreshed, "Refreshed catalog from remote");
        Ok(refreshed)
    }

    /// Import new orders placed in one store view.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::NoImportableStates`] when no order state of the
    /// channel is marked import eligible, before any remote call is made.
    #[instrument(skip(self), fields(store_view = %view))]
    pub async fn import_orders(&self, view: StoreViewId) -> Result<OrderImport, SyncError> {
        let view = self.store.store_view(view).await?;
        self.import_orders_for(&view).await
    }

    /// Import new orders across every store view of the channel.
    ///
    /// Views are processed sequentially; a failing view aborts the run so
    /// its window is not silently skipped for the remaining views.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError`] when any view fails to import.
    #[instrument(skip(self), fields(channel = %self.channel.id, run_id = %Uuid::new_v4()))]
    pub async fn import_orders_all(&self) -> Result<OrderImport, SyncError> {
        let mut summary = OrderImport::default();
        for view in self.store.store_views(self.channel.id).await? {
            let view_summary = self.import_orders_for(&view).await?;
            summary.fetched += view_summary.fetched;
            summary.imported += view_summary.imported;
        }
        Ok(summary)
    }

    async fn import_orders_for(&self, view: &StoreView) -> Result<OrderImport, SyncError> {
        let states = self.store.order_states(self.channel.id).await?;
        let eligible: Vec<String> = states
            .into_iter()
            .filter(|state| state.import_eligible)
            .map(|state| state.code)
            .collect();
        if eligible.is_empty() {
            return Err(SyncError::NoImportableStates(self.channel.id));
        }

        let window = self
            .windows
            .open_window(SyncScope::StoreView(view.id), WatermarkKind::OrderImport)
            .await?;
        let mut filter = Filter::new()
            .eq("store_id", view.remote_id)
            .any_of("state", eligible);
        if let Some(since) = window.since {
            filter = filter.since("updated_at", since);
        }

        let summaries = {
            let session = self.session().await?;
            session.list_orders(&filter).await?
        };

        let mut summary = OrderImport {
            fetched: summaries.len(),
            imported: 0,
        };
        for item in summaries {
            let session = self.session().await?;
            let ctx = self.ctx(session.as_ref());
            let order = session.order_info(&item.increment_id).await?;
            let resolution = resolve::<OrderKind>(&ctx, view, &order).await?;
            summary.imported += usize::from(resolution.was_created());
        }

        info!(
            store_view = %view.id,
            fetched = summary.fetched,
            imported = summary.imported,
            "Imported orders"
        );
        Ok(summary)
    }
}
