//! Import pipeline commands.
//!
//! # Usage
//!
//! ```bash
//! # Vocabulary first, then the hierarchy, then the heavy pipelines
//! sb-cli import states
//! sb-cli import carriers
//! sb-cli import hierarchy
//! sb-cli import catalog
//! sb-cli import orders
//!
//! # Or everything in dependency order
//! sb-cli import all
//! ```
//!
//! Each command stands up its own demo environment and runs whatever
//! earlier pipelines it depends on, so the subcommands work standalone.

use tracing::info;

use crate::demo::DemoEnv;

/// Import the remote order state vocabulary.
///
/// # Errors
///
/// Returns an error when the pipeline fails.
pub async fn states() -> Result<(), Box<dyn std::error::Error>> {
    let env = DemoEnv::new().await?;
    let created = env.engine.import_order_states().await?;
    info!(created, "Order state import finished");
    Ok(())
}

/// Import the remote shipping carriers.
///
/// # Errors
///
/// Returns an error when the pipeline fails.
pub async fn carriers() -> Result<(), Box<dyn std::error::Error>> {
    let env = DemoEnv::new().await?;
    let created = env.engine.import_carriers().await?;
    info!(created, "Carrier import finished");
    Ok(())
}

/// Import the website / store / store view hierarchy.
///
/// # Errors
///
/// Returns an error when the pipeline fails.
pub async fn hierarchy() -> Result<(), Box<dyn std::error::Error>> {
    let env = DemoEnv::new().await?;
    let summary = env.engine.import_hierarchy().await?;
    info!(
        websites = summary.websites,
        stores = summary.stores,
        store_views = summary.store_views,
        "Hierarchy import finished"
    );
    Ok(())
}

/// Import the category tree and the product catalog.
///
/// # Errors
///
/// Returns an error when the pipeline fails.
pub async fn catalog() -> Result<(), Box<dyn std::error::Error>> {
    let env = DemoEnv::new().await?;
    let summary = env.engine.import_catalog().await?;
    info!(
        categories = summary.categories,
        products = summary.products,
        "Catalog import finished"
    );
    Ok(())
}

/// Import open orders across every store view.
///
/// # Errors
///
/// Returns an error when a prerequisite or the pipeline fails.
pub async fn orders() -> Result<(), Box<dyn std::error::Error>> {
    let env = DemoEnv::new().await?;
    env.engine.import_order_states().await?;
    env.engine.import_hierarchy().await?;
    let summary = env.engine.import_orders_all().await?;
    info!(
        fetched = summary.fetched,
        imported = summary.imported,
        "Order import finished"
    );
    Ok(())
}

/// Run every import pipeline in dependency order.
///
/// # Errors
///
/// Returns an error when any pipeline fails.
pub async fn all() -> Result<(), Box<dyn std::error::Error>> {
    let env = DemoEnv::new().await?;
    let states = env.engine.import_order_states().await?;
    let carriers = env.engine.import_carriers().await?;
    info!(states, carriers, "Vocabulary import finished");

    let hierarchy = env.engine.import_hierarchy().await?;
    info!(
        websites = hierarchy.websites,
        stores = hierarchy.stores,
        store_views = hierarchy.store_views,
        "Hierarchy import finished"
    );

    let catalog = env.engine.import_catalog().await?;
    info!(
        categories = catalog.categories,
        products = catalog.products,
        "Catalog import finished"
    );

    let orders = env.engine.import_orders_all().await?;
    info!(
        fetched = orders.fetched,
        imported = orders.imported,
        "Order import finished"
    );
    Ok(())
}
