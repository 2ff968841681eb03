//! Export pipeline commands.
//!
//! # Usage
//!
//! ```bash
//! sb-cli export inventory
//! sb-cli export tiers
//! sb-cli export orders
//! sb-cli export shipments
//!
//! # Register a seeded local product on the remote platform
//! sb-cli export product
//! ```
//!
//! Exports need local state to push, so each command first runs the import
//! pipelines it depends on and seeds the relevant fixtures (stock levels,
//! price tiers, a dispatched shipment) before exporting.

use tracing::info;

use storebridge_core::{CategoryId, ProductId, RemoteId};

use crate::demo::DemoEnv;

/// Push inventory levels for every listed product.
///
/// # Errors
///
/// Returns an error when a prerequisite or the pipeline fails.
pub async fn inventory() -> Result<(), Box<dyn std::error::Error>> {
    let env = DemoEnv::new().await?;
    env.engine.import_catalog().await?;
    env.seed_stock().await?;

    let summary = env.engine.export_inventory().await?;
    info!(
        exported = summary.exported,
        failed = summary.failed,
        "Inventory export finished"
    );
    Ok(())
}

/// Push tier prices for every listed product.
///
/// # Errors
///
/// Returns an error when a prerequisite or the pipeline fails.
pub async fn tiers() -> Result<(), Box<dyn std::error::Error>> {
    let env = DemoEnv::new().await?;
    env.engine.import_hierarchy().await?;
    env.engine.import_catalog().await?;
    let store = env.first_store().await?;
    env.seed_tiers(store).await?;

    let summary = env.engine.export_tier_prices(store).await?;
    info!(exported = summary.exported, "Tier price export finished");
    Ok(())
}

/// Push order workflow states for every store view.
///
/// # Errors
///
/// Returns an error when a prerequisite or the pipeline fails.
pub async fn orders() -> Result<(), Box<dyn std::error::Error>> {
    let env = DemoEnv::new().await?;
    env.engine.import_order_states().await?;
    env.engine.import_hierarchy().await?;
    env.engine.import_orders_all().await?;

    let summary = env.engine.export_order_status_all().await?;
    info!(exported = summary.exported, "Order status export finished");
    Ok(())
}

/// Push dispatched shipments and their tracking numbers.
///
/// # Errors
///
/// Returns an error when a prerequisite or the pipeline fails.
pub async fn shipments() -> Result<(), Box<dyn std::error::Error>> {
    let env = DemoEnv::new().await?;
    env.engine.import_order_states().await?;
    env.engine.import_carriers().await?;
    env.engine.import_hierarchy().await?;
    env.engine.import_orders_all().await?;
    env.seed_dispatch().await?;

    let summary = env.engine.export_shipment_status_all().await?;
    info!(
        exported = summary.exported,
        skipped = summary.skipped,
        "Shipment export finished"
    );
    Ok(())
}

/// Register a local product on the remote platform and list it.
///
/// With no ids given, a demo product is seeded under an imported category
/// and exported; explicit ids address records in the demo store.
///
/// # Errors
///
/// Returns an error when a precondition fails (unlinked category, missing
/// product code, product already listed) or the remote call fails.
pub async fn product(
    product: Option<i32>,
    category: Option<i32>,
    attribute_set: i64,
) -> Result<(), Box<dyn std::error::Error>> {
    let env = DemoEnv::new().await?;
    env.engine.import_catalog().await?;

    let (product_id, category_id) = match (product, category) {
        (Some(p), Some(c)) => (ProductId::new(p), CategoryId::new(c)),
        _ => {
            let seeded = env.seed_unlisted_product().await?;
            (seeded.id, seeded.category_id)
        }
    };

    let listing = env
        .engine
        .export_product(product_id, category_id, RemoteId::new(attribute_set))
        .await?;
    info!(
        product = %listing.product_id,
        remote = %listing.remote_id,
        "Product registered on the remote platform"
    );
    Ok(())
}
