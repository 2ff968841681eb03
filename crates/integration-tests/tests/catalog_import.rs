//! Catalog import and export scenarios: the category tree walk, product
//! upserts, the re-import update branch, and registering local products on
//! the remote platform.

#![allow(clippy::unwrap_used)]

use rust_decimal::Decimal;
use storebridge_core::RemoteId;
use storebridge_engine::models::{CreateCategoryInput, UNCLASSIFIED_CATEGORY};
use storebridge_engine::store::LocalStore;
use storebridge_engine::{DataError, SyncError};
use storebridge_integration_tests::{TestContext, remote_product};

// =============================================================================
// Category tree
// =============================================================================

#[tokio::test]
async fn test_catalog_import_builds_category_chain() {
    let ctx = TestContext::new().await;
    ctx.remote.seed_catalog().await;

    let summary = ctx.engine.import_catalog().await.unwrap();
    assert_eq!(summary.categories, 4);
    assert_eq!(summary.products, 3);

    let channel = ctx.engine.channel().id;
    let gear = ctx.store.category_by_name("Gear").await.unwrap().unwrap();
    let parent = ctx.store.category(gear.parent_id.unwrap()).await.unwrap();
    assert_eq!(parent.name, "Default Category");
    let root = ctx.store.category(parent.parent_id.unwrap()).await.unwrap();
    assert_eq!(root.name, "Root Catalog");
    assert!(root.parent_id.is_none());

    let link = ctx
        .store
        .category_link(channel, RemoteId::new(3))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(link.category_id, gear.id);
}

#[tokio::test]
async fn test_catalog_reimport_creates_nothing() {
    let ctx = TestContext::new().await;
    ctx.remote.seed_catalog().await;

    ctx.engine.import_catalog().await.unwrap();
    let second = ctx.engine.import_catalog().await.unwrap();
    assert_eq!(second.categories, 0);
    assert_eq!(second.products, 0);
}

// =============================================================================
// Products
// =============================================================================

#[tokio::test]
async fn test_product_fields_map_from_remote_payload() {
    let ctx = TestContext::new().await;
    ctx.remote.seed_catalog().await;
    ctx.engine.import_catalog().await.unwrap();

    let channel = ctx.engine.channel().id;
    let listing = ctx
        .store
        .listing(channel, RemoteId::new(101))
        .await
        .unwrap()
        .unwrap();
    let bottle = ctx.store.product(listing.product_id).await.unwrap();
    assert_eq!(bottle.name, "Steel Water Bottle");
    assert_eq!(bottle.code.as_deref(), Some("GEAR-BOTTLE"));
    assert_eq!(bottle.list_price, Decimal::new(2500, 2));
    assert_eq!(bottle.uom, "Unit");
    assert_eq!(bottle.account_expense, "Main Expense");
    assert!(bottle.salable);

    let gear = ctx.store.category_by_name("Gear").await.unwrap().unwrap();
    assert_eq!(bottle.category_id, gear.id);
}

#[tokio::test]
async fn test_special_price_wins_over_regular_price() {
    let ctx = TestContext::new().await;
    ctx.remote.seed_catalog().await;
    ctx.engine.import_catalog().await.unwrap();

    let channel = ctx.engine.channel().id;
    let listing = ctx
        .store
        .listing(channel, RemoteId::new(102))
        .await
        .unwrap()
        .unwrap();
    let tee = ctx.store.product(listing.product_id).await.unwrap();
    assert_eq!(tee.list_price, Decimal::new(1450, 2));
}

#[tokio::test]
async fn test_product_without_category_lands_in_fallback() {
    let ctx = TestContext::new().await;
    ctx.remote.seed_catalog().await;
    ctx.engine.import_catalog().await.unwrap();

    let channel = ctx.engine.channel().id;
    let listing = ctx
        .store
        .listing(channel, RemoteId::new(103))
        .await
        .unwrap()
        .unwrap();
    let sticker = ctx.store.product(listing.product_id).await.unwrap();

    let fallback = ctx
        .store
        .category_by_name(UNCLASSIFIED_CATEGORY)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(sticker.category_id, fallback.id);
}

#[tokio::test]
async fn test_update_catalog_refreshes_changed_products() {
    let ctx = TestContext::new().await;
    ctx.remote.seed_catalog().await;
    ctx.engine.import_catalog().await.unwrap();

    ctx.remote
        .set_product(remote_product(
            101,
            "GEAR-BOTTLE",
            "Steel Water Bottle XL",
            3000,
            vec![3],
        ))
        .await;

    let refreshed = ctx.engine.update_catalog().await.unwrap();
    assert_eq!(refreshed, 3);

    let channel = ctx.engine.channel().id;
    let listing = ctx
        .store
        .listing(channel, RemoteId::new(101))
        .await
        .unwrap()
        .unwrap();
    let bottle = ctx.store.product(listing.product_id).await.unwrap();
    assert_eq!(bottle.name, "Steel Water Bottle XL");
    assert_eq!(bottle.list_price, Decimal::new(3000, 2));
}

// =============================================================================
// Product export
// =============================================================================

#[tokio::test]
async fn test_export_product_registers_and_lists() {
    let ctx = TestContext::new().await;
    ctx.remote.seed_hierarchy().await;
    ctx.remote.seed_catalog().await;
    ctx.engine.import_hierarchy().await.unwrap();
    ctx.engine.import_catalog().await.unwrap();

    let gear = ctx.store.category_by_name("Gear").await.unwrap().unwrap();
    let mug = ctx
        .store
        .insert_unlisted_product("Travel Mug", Some("GEAR-MUG"), gear.id, Decimal::new(2200, 2))
        .await;

    let listing = ctx
        .engine
        .export_product(mug.id, gear.id, RemoteId::new(4))
        .await
        .unwrap();
    assert_eq!(listing.product_id, mug.id);
    assert_eq!(listing.product_type, "simple");

    let calls = ctx.remote.calls().await;
    let created = calls.products_created.first().unwrap();
    assert_eq!(created.sku, "GEAR-MUG");
    assert_eq!(created.attribute_set, RemoteId::new(4));
    assert_eq!(created.categories, vec![RemoteId::new(3)]);
    assert_eq!(created.websites, vec![RemoteId::new(1)]);
    // No description on the product, so the name fills both text fields.
    assert_eq!(created.description, "Travel Mug");

    let channel = ctx.engine.channel().id;
    let found = ctx
        .store
        .listing(channel, listing.remote_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.product_id, mug.id);
}

#[tokio::test]
async fn test_export_product_requires_linked_category() {
    let ctx = TestContext::new().await;
    ctx.remote.seed_hierarchy().await;
    ctx.engine.import_hierarchy().await.unwrap();

    let local_only = ctx
        .store
        .create_category(CreateCategoryInput {
            name: "Local Only".to_string(),
            parent_id: None,
        })
        .await
        .unwrap();
    let mug = ctx
        .store
        .insert_unlisted_product(
            "Travel Mug",
            Some("GEAR-MUG"),
            local_only.id,
            Decimal::new(2200, 2),
        )
        .await;

    let err = ctx
        .engine
        .export_product(mug.id, local_only.id, RemoteId::new(4))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SyncError::Data(DataError::CategoryNotLinked { .. })
    ));
}

#[tokio::test]
async fn test_export_product_requires_a_code() {
    let ctx = TestContext::new().await;
    ctx.remote.seed_catalog().await;
    ctx.engine.import_catalog().await.unwrap();

    let gear = ctx.store.category_by_name("Gear").await.unwrap().unwrap();
    let nameless = ctx
        .store
        .insert_unlisted_product("Uncoded", None, gear.id, Decimal::ONE)
        .await;

    let err = ctx
        .engine
        .export_product(nameless.id, gear.id, RemoteId::new(4))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SyncError::Data(DataError::MissingProductCode { .. })
    ));
}

#[tokio::test]
async fn test_export_product_rejects_already_listed() {
    let ctx = TestContext::new().await;
    ctx.remote.seed_catalog().await;
    ctx.engine.import_catalog().await.unwrap();

    let channel = ctx.engine.channel().id;
    let listing = ctx
        .store
        .listing(channel, RemoteId::new(101))
        .await
        .unwrap()
        .unwrap();
    let gear = ctx.store.category_by_name("Gear").await.unwrap().unwrap();

    let err = ctx
        .engine
        .export_product(listing.product_id, gear.id, RemoteId::new(4))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SyncError::Data(DataError::AlreadyListed { .. })
    ));
}
