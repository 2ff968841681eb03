//! Inventory and tier price export scenarios: storage-only quantities,
//! per-item fault isolation, and the precedence between product tiers and
//! store default tiers.

#![allow(clippy::unwrap_used)]

use rust_decimal::Decimal;
use storebridge_core::RemoteId;
use storebridge_engine::models::{LocationKind, PriceRule, Product};
use storebridge_engine::remote::{InventoryUpdate, RemoteFault, TierPriceEntry};
use storebridge_engine::store::LocalStore;
use storebridge_integration_tests::TestContext;

/// The local product listed under a remote id.
async fn listed_product(ctx: &TestContext, remote: i64) -> Product {
    let channel = ctx.engine.channel().id;
    let listing = ctx
        .store
        .listing(channel, RemoteId::new(remote))
        .await
        .unwrap()
        .unwrap();
    ctx.store.product(listing.product_id).await.unwrap()
}

// =============================================================================
// Inventory
// =============================================================================

#[tokio::test]
async fn test_inventory_counts_storage_locations_only() {
    let ctx = TestContext::new().await;
    ctx.remote.seed_catalog().await;
    ctx.engine.import_catalog().await.unwrap();

    let bottle = listed_product(&ctx, 101).await;
    let shelf = ctx
        .store
        .insert_location("Main Storage", LocationKind::Storage)
        .await;
    let customers = ctx
        .store
        .insert_location("Customers", LocationKind::Customer)
        .await;
    ctx.store
        .set_stock(shelf.id, bottle.id, Decimal::from(7))
        .await;
    ctx.store
        .set_stock(customers.id, bottle.id, Decimal::from(99))
        .await;

    let summary = ctx.engine.export_inventory().await.unwrap();
    assert_eq!(summary.exported, 3);
    assert_eq!(summary.failed, 0);

    let calls = ctx.remote.calls().await;
    assert_eq!(calls.inventory.len(), 3);
    let (remote, update) = calls.inventory.first().unwrap();
    assert_eq!(*remote, RemoteId::new(101));
    assert_eq!(
        *update,
        InventoryUpdate {
            qty: Decimal::from(7),
            is_in_stock: true,
        }
    );
    // The other two products hold no stock anywhere.
    for (_, update) in calls.inventory.iter().skip(1) {
        assert_eq!(update.qty, Decimal::ZERO);
        assert!(!update.is_in_stock);
    }
}

#[tokio::test]
async fn test_inventory_fault_only_fails_the_one_item() {
    let ctx = TestContext::new().await;
    ctx.remote.seed_catalog().await;
    ctx.engine.import_catalog().await.unwrap();
    ctx.remote
        .fail_inventory(
            RemoteId::new(102),
            RemoteFault::Transport("connection reset".to_string()),
        )
        .await;

    let summary = ctx.engine.export_inventory().await.unwrap();
    assert_eq!(summary.exported, 2);
    assert_eq!(summary.failed, 1);

    let pushed: Vec<RemoteId> = ctx
        .remote
        .calls()
        .await
        .inventory
        .iter()
        .map(|(remote, _)| *remote)
        .collect();
    assert_eq!(pushed, vec![RemoteId::new(101), RemoteId::new(103)]);
    assert_eq!(ctx.store.issues().await.len(), 1);
}

// =============================================================================
// Tier prices
// =============================================================================

#[tokio::test]
async fn test_product_tiers_beat_store_tiers() {
    let ctx = TestContext::new().await;
    ctx.remote.seed_hierarchy().await;
    ctx.remote.seed_catalog().await;
    ctx.engine.import_hierarchy().await.unwrap();
    ctx.engine.import_catalog().await.unwrap();

    let channel = ctx.engine.channel().id;
    let views = ctx.store.store_views(channel).await.unwrap();
    let store_id = views.first().unwrap().store_id;

    // Give the store its own, more aggressive price list; the channel list
    // of ten percent off above ten stays in place for product tiers.
    let store_list = ctx
        .store
        .insert_price_list(
            "Store Retail",
            vec![PriceRule {
                min_quantity: Decimal::from(10),
                percent_discount: Decimal::from(20),
            }],
        )
        .await;
    ctx.store
        .set_store_price_list(store_id, store_list.id)
        .await
        .unwrap();
    ctx.store
        .set_store_tiers(store_id, vec![Decimal::from(10)])
        .await;

    let bottle = listed_product(&ctx, 101).await;
    ctx.store
        .set_product_tiers(bottle.id, vec![Decimal::from(5), Decimal::from(25)])
        .await;

    let summary = ctx.engine.export_tier_prices(store_id).await.unwrap();
    assert_eq!(summary.exported, 3);

    let calls = ctx.remote.calls().await;
    assert_eq!(calls.tier_prices.len(), 3);

    // The bottle's own tiers, priced with the channel list: no break at
    // five, ten percent off at twenty-five.
    let (remote, entries) = calls.tier_prices.first().unwrap();
    assert_eq!(*remote, RemoteId::new(101));
    assert_eq!(
        *entries,
        vec![
            TierPriceEntry {
                quantity: Decimal::from(5),
                price: Decimal::new(2500, 2),
            },
            TierPriceEntry {
                quantity: Decimal::from(25),
                price: Decimal::new(2250, 2),
            },
        ]
    );

    // The tee falls back to the store tier, priced with the store list.
    let (remote, entries) = calls.tier_prices.get(1).unwrap();
    assert_eq!(*remote, RemoteId::new(102));
    assert_eq!(
        *entries,
        vec![TierPriceEntry {
            quantity: Decimal::from(10),
            price: Decimal::new(1160, 2),
        }]
    );

    let (remote, entries) = calls.tier_prices.get(2).unwrap();
    assert_eq!(*remote, RemoteId::new(103));
    assert_eq!(
        *entries,
        vec![TierPriceEntry {
            quantity: Decimal::from(10),
            price: Decimal::new(480, 2),
        }]
    );
}

#[tokio::test]
async fn test_no_tiers_anywhere_pushes_an_empty_set() {
    let ctx = TestContext::new().await;
    ctx.remote.seed_hierarchy().await;
    ctx.remote.seed_catalog().await;
    ctx.engine.import_hierarchy().await.unwrap();
    ctx.engine.import_catalog().await.unwrap();

    let channel = ctx.engine.channel().id;
    let views = ctx.store.store_views(channel).await.unwrap();
    let store_id = views.first().unwrap().store_id;

    let summary = ctx.engine.export_tier_prices(store_id).await.unwrap();
    assert_eq!(summary.exported, 3);

    let calls = ctx.remote.calls().await;
    assert_eq!(calls.tier_prices.len(), 3);
    for (_, entries) in &calls.tier_prices {
        assert!(entries.is_empty());
    }
}
