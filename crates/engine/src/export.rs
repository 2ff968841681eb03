//! Export pipelines: local state flowing out to the remote platform.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use storebridge_core::{CategoryId, FulfillmentState, ProductId, RemoteId, StoreId, StoreViewId};

use crate::engine::SyncEngine;
use crate::error::{DataError, SyncError};
use crate::models::{
    CreateIssueInput, CreateListingInput, IssueOrigin, Listing, Order, OrderFilter, Shipment,
    StoreView,
};
use crate::remote::{InventoryUpdate, NewRemoteProduct, RemoteSession, TierPriceEntry, TrackingInfo};
use crate::watermark::{SyncScope, WatermarkKind};

/// Remote product type used for exported products.
const SIMPLE_PRODUCT_TYPE: &str = "simple";

/// Counts from an export run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportSummary {
    /// Records pushed to the remote side.
    pub exported: usize,
    /// Records skipped, e.g. not dispatched yet or already exported.
    pub skipped: usize,
    /// Records that failed and were recorded as issues.
    pub failed: usize,
}

impl SyncEngine {
    /// Push inventory for every listed product.
    ///
    /// Each product is pushed over its own session and a failing push is
    /// recorded as an issue without stopping the run, so one bad product
    /// cannot starve the rest of the catalog of stock updates.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError`] when the local store fails; remote faults are
    /// per-product and land in the issue journal instead.
    #[instrument(skip(self), fields(channel = %self.channel.id))]
    pub async fn export_inventory(&self) -> Result<ExportSummary, SyncError> {
        let listings = self.store.listings(self.channel.id).await?;
        let mut summary = ExportSummary::default();

        for listing in listings {
            let product = self.store.product(listing.product_id).await?;
            let qty = self.store.quantity_on_hand(product.id).await?;
            let update = InventoryUpdate {
                qty,
                is_in_stock: qty > Decimal::ZERO,
            };

            let pushed = async {
                let session = self.session().await?;
                session.update_inventory(listing.remote_id, update).await
            }
            .await;

            match pushed {
                Ok(()) => summary.exported += 1,
                Err(fault) => {
                    warn!(product = %product.id, %fault, "Inventory push failed, continuing");
                    self.store
                        .record_issue(CreateIssueInput {
                            origin: IssueOrigin::Product(product.id),
                            log: format!("inventory push failed: {fault}"),
                        })
                        .await?;
                    summary.failed += 1;
                }
            }
        }

        info!(
            exported = summary.exported,
            failed = summary.failed,
            "Exported inventory"
        );
        Ok(summary)
    }

    /// Push tier prices for every listed product, priced for one store.
    ///
    /// Tiers configured on the product win over the store defaults. Product
    /// tiers are priced with the channel price list, store default tiers
    /// with the store's own price list. A product without either pushes an
    /// empty set, clearing any stale tiers on the remote side.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError`] when a store lookup or a remote push fails.
    #[instrument(skip(self), fields(store = %store))]
    pub async fn export_tier_prices(&self, store: StoreId) -> Result<ExportSummary, SyncError> {
        let store_entity = self.store.store(store).await?;
        let store_list = self.store.price_list(store_entity.price_list_id).await?;
        let channel_list = self.store.price_list(self.channel.price_list_id).await?;
        let store_tiers = self.store.store_tiers(store).await?;

        let listings = self.store.listings(self.channel.id).await?;
        let mut summary = ExportSummary::default();

        for listing in listings {
            let product = self.store.product(listing.product_id).await?;
            let product_tiers = self.store.product_tiers(product.id).await?;
            let (tiers, list) = if product_tiers.is_empty() {
                (store_tiers.clone(), &store_list)
            } else {
                (product_tiers, &channel_list)
            };
            let entries: Vec<TierPriceEntry> = tiers
                .iter()
                .map(|tier| TierPriceEntry {
                    quantity: tier.quantity,
                    price: list.compute(product.list_price, tier.quantity),
                })
                .collect();

            let session = self.session().await?;
            session
                .update_tier_prices(listing.remote_id, &entries)
                .await?;
            summary.exported += 1;
        }

        info!(exported = summary.exported, "Exported tier prices");
        Ok(summary)
    }

    /// Push order workflow states for one store view.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError`] when a store lookup or a remote push fails.
    #[instrument(skip(self), fields(store_view = %view))]
    pub async fn export_order_status(&self, view: StoreViewId) -> Result<ExportSummary, SyncError> {
        let view = self.store.store_view(view).await?;
        self.export_order_status_for(&view).await
    }

    /// Push order workflow states across every store view of the channel.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError`] when any view fails to export.
    #[instrument(skip(self), fields(channel = %self.channel.id, run_id = %Uuid::new_v4()))]
    pub async fn export_order_status_all(&self) -> Result<ExportSummary, SyncError> {
        let mut summary = ExportSummary::default();
        for view in self.store.store_views(self.channel.id).await? {
            let view_summary = self.export_order_status_for(&view).await?;
            summary.exported += view_summary.exported;
            summary.skipped += view_summary.skipped;
            summary.failed += view_summary.failed;
        }
        Ok(summary)
    }

    async fn export_order_status_for(&self, view: &StoreView) -> Result<ExportSummary, SyncError> {
        let window = self
            .windows
            .open_window(SyncScope::StoreView(view.id), WatermarkKind::OrderExport)
            .await?;
        let filter = OrderFilter {
            modified_since: window.since,
            has_remote_id: true,
            ..OrderFilter::default()
        };
        let orders = self.store.orders(view.id, &filter).await?;

        let mut summary = ExportSummary::default();
        for order in orders {
            let increment_id = self.channel.external_order_id(&order.reference)?;
            let session = self.session().await?;
            session
                .update_order_status(increment_id, &order.state.to_string())
                .await?;
            summary.exported += 1;
        }

        info!(
            store_view = %view.id,
            exported = summary.exported,
            "Exported order status"
        );
        Ok(summary)
    }

    /// Push dispatched shipments for one store view.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError`] when a store lookup fails or the remote side
    /// raises a fault that is not a benign duplicate.
    #[instrument(skip(self), fields(store_view = %view))]
    pub async fn export_shipment_status(
        &self,
        view: StoreViewId,
    ) -> Result<ExportSummary, SyncError> {
        let view = self.store.store_view(view).await?;
        self.export_shipment_status_for(&view).await
    }

    /// Push dispatched shipments across every store view of the channel.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError`] when any view fails to export.
    #[instrument(skip(self), fields(channel = %self.channel.id, run_id = %Uuid::new_v4()))]
    pub async fn export_shipment_status_all(&self) -> Result<ExportSummary, SyncError> {
        let mut summary = ExportSummary::default();
        for view in self.store.store_views(self.channel.id).await? {
            let view_summary = self.export_shipment_status_for(&view).await?;
            summary.exported += view_summary.exported;
            summary.skipped += view_summary.skipped;
            summary.failed += view_summary.failed;
        }
        Ok(summary)
    }

    /// A shipment is exported once it is dispatched. When the remote side
    /// reports it already has a shipment for the order (a duplicate from a
    /// run that crashed after the create), the order's remaining shipments
    /// are skipped and the run continues with the next order; any other
    /// fault aborts the run.
    async fn export_shipment_status_for(
        &self,
        view: &StoreView,
    ) -> Result<ExportSummary, SyncError> {
        let window = self
            .windows
            .open_window(SyncScope::StoreView(view.id), WatermarkKind::ShipmentExport)
            .await?;
        let filter = OrderFilter {
            modified_since: window.since,
            fulfillment_state: Some(FulfillmentState::Sent),
            has_remote_id: true,
            has_shipments: true,
        };
        let orders = self.store.orders(view.id, &filter).await?;

        let mut summary = ExportSummary::default();
        'orders: for order in orders {
            let increment_id = self.channel.external_order_id(&order.reference)?.to_string();

            for shipment in self.store.shipments_for_order(order.id).await? {
                if !shipment.state.is_dispatched() || shipment.remote_ref.is_some() {
                    summary.skipped += 1;
                    continue;
                }
                let quantities = aggregate_shipment_quantities(&order, &shipment);
                if quantities.is_empty() {
                    // Nothing on this shipment maps to a remote line.
                    summary.skipped += 1;
                    continue;
                }

                let session = self.session().await?;
                match session.create_shipment(&increment_id, &quantities).await {
                    Ok(remote_ref) => {
                        let mut shipment = shipment;
                        shipment.remote_ref = Some(remote_ref.clone());
                        self.store.update_shipment(&shipment).await?;
                        summary.exported += 1;

                        if view.export_tracking {
                            self.export_tracking(session.as_ref(), &remote_ref, &mut shipment)
                                .await?;
                        }
                    }
                    Err(fault) if fault.is_benign_conflict() => {
                        warn!(
                            order = %order.id,
                            shipment = %shipment.id,
                            %fault,
                            "Remote already has a shipment for this order, skipping it"
                        );
                        self.store
                            .record_issue(CreateIssueInput {
                                origin: IssueOrigin::Shipment(shipment.id),
                                log: format!("shipment already exists remotely: {fault}"),
                            })
                            .await?;
                        summary.skipped += 1;
                        continue 'orders;
                    }
                    Err(fault) => return Err(fault.into()),
                }
            }
        }

        info!(
            store_view = %view.id,
            exported = summary.exported,
            skipped = summary.skipped,
            "Exported shipments"
        );
        Ok(summary)
    }

    async fn export_tracking(
        &self,
        session: &dyn RemoteSession,
        remote_ref: &str,
        shipment: &mut Shipment,
    ) -> Result<(), SyncError> {
        let (Some(carrier_id), Some(tracking_number)) =
            (shipment.carrier_id, shipment.tracking_number.clone())
        else {
            return Ok(());
        };
        let carrier = self.store.carrier(carrier_id).await?;
        session
            .add_shipment_tracking(
                remote_ref,
                TrackingInfo {
                    carrier_code: carrier.code,
                    title: carrier.title,
                    tracking_number,
                },
            )
            .await?;
        shipment.tracking_exported = true;
        self.store.update_shipment(shipment).await?;
        Ok(())
    }

    /// Register a local product on the remote platform and list it.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::CategoryNotLinked`] when `category` has no
    /// remote counterpart, [`DataError::MissingProductCode`] when the
    /// product has no SKU, and [`DataError::AlreadyListed`] when the
    /// product is already on this channel.
    #[instrument(skip(self), fields(product = %product))]
    pub async fn export_product(
        &self,
        product: ProductId,
        category: CategoryId,
        attribute_set: RemoteId,
    ) -> Result<Listing, SyncError> {
        let product = self.store.product(product).await?;

        let remote_category = self
            .identity
            .category_external(self.channel.id, category)
            .await?
            .ok_or(DataError::CategoryNotLinked {
                category_id: category,
                channel_id: self.channel.id,
            })?;
        let sku = product
            .code
            .clone()
            .ok_or(DataError::MissingProductCode {
                product_id: product.id,
            })?;
        if self
            .identity
            .listing_for(self.channel.id, product.id)
            .await?
            .is_some()
        {
            return Err(DataError::AlreadyListed {
                product_id: product.id,
                channel_id: self.channel.id,
            }
            .into());
        }

        let websites = self.store.websites(self.channel.id).await?;
        let description = product
            .description
            .clone()
            .unwrap_or_else(|| product.name.clone());
        let payload = NewRemoteProduct {
            product_type: SIMPLE_PRODUCT_TYPE.to_string(),
            attribute_set,
            sku,
            name: product.name.clone(),
            description: description.clone(),
            short_description: description,
            price: product.list_price,
            categories: vec![remote_category],
            websites: websites.iter().map(|w| w.remote_id).collect(),
        };

        let session = self.session().await?;
        let remote_id = session.create_product(payload).await?;
        let listing = self
            .store
            .create_listing(CreateListingInput {
                channel_id: self.channel.id,
                product_id: product.id,
                remote_id,
                product_type: SIMPLE_PRODUCT_TYPE.to_string(),
            })
            .await?;

        info!(product = %product.id, remote = %remote_id, "Exported product");
        Ok(listing)
    }
}

/// Total shipped quantity per remote line item id.
///
/// Shipment lines covering the same order line are summed; lines whose
/// order line carries no remote id stay local and are left out.
#[must_use]
pub fn aggregate_shipment_quantities(
    order: &Order,
    shipment: &Shipment,
) -> BTreeMap<String, Decimal> {
    let mut quantities = BTreeMap::new();
    for line in &shipment.lines {
        let Some(order_line) = order.lines.iter().find(|ol| ol.id == line.order_line_id) else {
            continue;
        };
        let Some(remote_line) = order_line.remote_line_id else {
            continue;
        };
        *quantities
            .entry(remote_line.to_string())
            .or_insert(Decimal::ZERO) += line.quantity;
    }
    quantities
}
