//! Order import and status export scenarios: eligible-state gating, the
//! import window, idempotent re-runs, and pushing local workflow states
//! back to the remote platform.

#![allow(clippy::unwrap_used)]

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use storebridge_core::{FulfillmentState, OrderWorkflowState, RemoteId};
use storebridge_engine::SyncError;
use storebridge_engine::models::CreateOrderStateInput;
use storebridge_engine::remote::{FilterOp, FilterValue};
use storebridge_engine::store::LocalStore;
use storebridge_engine::watermark::{SyncScope, WatermarkKind};
use storebridge_integration_tests::{TestContext, remote_order, remote_order_line};

// =============================================================================
// Eligibility gate
// =============================================================================

#[tokio::test]
async fn test_order_import_requires_eligible_states() {
    let ctx = TestContext::new().await;
    ctx.remote.seed_hierarchy().await;
    ctx.engine.import_hierarchy().await.unwrap();

    let channel = ctx.engine.channel().id;
    let sessions_before = ctx.remote.calls().await.sessions_opened;

    let err = ctx.engine.import_orders_all().await.unwrap_err();
    assert!(matches!(err, SyncError::NoImportableStates(id) if id == channel));

    // The gate fires before any remote call and before the window opens.
    assert_eq!(ctx.remote.calls().await.sessions_opened, sessions_before);
    let views = ctx.store.store_views(channel).await.unwrap();
    let view = views.first().unwrap();
    let mark = ctx
        .store
        .watermark(SyncScope::StoreView(view.id), WatermarkKind::OrderImport)
        .await
        .unwrap();
    assert!(mark.is_none());

    // Known but ineligible states do not satisfy the gate either.
    ctx.store
        .create_order_state(CreateOrderStateInput {
            channel_id: channel,
            code: "holded".to_string(),
            name: "On Hold".to_string(),
            import_eligible: false,
        })
        .await
        .unwrap();
    let err = ctx.engine.import_orders_all().await.unwrap_err();
    assert!(matches!(err, SyncError::NoImportableStates(_)));
}

// =============================================================================
// Import
// =============================================================================

#[tokio::test]
async fn test_order_import_creates_local_orders() {
    let ctx = TestContext::new().await;
    ctx.remote.seed_hierarchy().await;
    ctx.remote.seed_vocab().await;
    ctx.remote.seed_catalog().await;
    ctx.remote
        .add_order(remote_order(
            9001,
            "100000001",
            "new",
            1,
            vec![
                remote_order_line(7001, 101, "GEAR-BOTTLE", 2, 2500),
                remote_order_line(7002, 103, "MISC-STICKER", 3, 600),
            ],
        ))
        .await;

    ctx.engine.import_order_states().await.unwrap();
    ctx.engine.import_hierarchy().await.unwrap();
    ctx.engine.import_catalog().await.unwrap();

    let summary = ctx.engine.import_orders_all().await.unwrap();
    assert_eq!(summary.fetched, 1);
    assert_eq!(summary.imported, 1);

    let channel = ctx.engine.channel().id;
    let order = ctx
        .store
        .order_by_reference(channel, "mag_100000001")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(order.remote_id, Some(RemoteId::new(9001)));
    assert_eq!(order.state, OrderWorkflowState::Confirmed);
    assert_eq!(order.lines.len(), 2);

    let bottle_line = order
        .lines
        .iter()
        .find(|l| l.remote_line_id == Some(RemoteId::new(7001)))
        .unwrap();
    assert_eq!(bottle_line.description, "GEAR-BOTTLE");
    assert_eq!(bottle_line.quantity, Decimal::from(2));
    assert_eq!(bottle_line.unit_price, Decimal::new(2500, 2));

    let listing = ctx
        .store
        .listing(channel, RemoteId::new(101))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(bottle_line.product_id, Some(listing.product_id));
}

#[tokio::test]
async fn test_order_import_resolves_unknown_products_on_the_fly() {
    let ctx = TestContext::new().await;
    ctx.remote.seed_hierarchy().await;
    ctx.remote.seed_vocab().await;
    ctx.remote.seed_catalog().await;
    ctx.remote
        .add_order(remote_order(
            9001,
            "100000001",
            "new",
            1,
            vec![remote_order_line(7001, 101, "GEAR-BOTTLE", 1, 2500)],
        ))
        .await;

    ctx.engine.import_order_states().await.unwrap();
    ctx.engine.import_hierarchy().await.unwrap();
    // No catalog import: the order line forces a product lookup.
    ctx.engine.import_orders_all().await.unwrap();

    let channel = ctx.engine.channel().id;
    let listing = ctx
        .store
        .listing(channel, RemoteId::new(101))
        .await
        .unwrap()
        .unwrap();
    let product = ctx.store.product(listing.product_id).await.unwrap();
    assert_eq!(product.name, "Steel Water Bottle");
}

#[tokio::test]
async fn test_order_import_is_idempotent_and_windowed() {
    let ctx = TestContext::new().await;
    ctx.remote.seed_hierarchy().await;
    ctx.remote.seed_vocab().await;
    ctx.remote.seed_catalog().await;
    ctx.remote
        .add_order(remote_order(
            9001,
            "100000001",
            "new",
            1,
            vec![remote_order_line(7001, 101, "GEAR-BOTTLE", 1, 2500)],
        ))
        .await;

    ctx.engine.import_order_states().await.unwrap();
    ctx.engine.import_hierarchy().await.unwrap();
    ctx.engine.import_catalog().await.unwrap();

    let first = ctx.engine.import_orders_all().await.unwrap();
    assert_eq!(first.imported, 1);

    // The mock returns the order again; resolution recognizes it.
    let second = ctx.engine.import_orders_all().await.unwrap();
    assert_eq!(second.fetched, 1);
    assert_eq!(second.imported, 0);

    let channel = ctx.engine.channel().id;
    let views = ctx.store.store_views(channel).await.unwrap();
    let view = views.first().unwrap();
    let mark = ctx
        .store
        .watermark(SyncScope::StoreView(view.id), WatermarkKind::OrderImport)
        .await
        .unwrap();
    assert!(mark.is_some());

    // Two views per run: the first run filters without a timestamp bound,
    // the second adds one per view.
    let filters = ctx.remote.calls().await.order_filters;
    assert_eq!(filters.len(), 4);

    let first_run = filters.first().unwrap().predicates();
    assert_eq!(first_run.len(), 2);
    let by_store = first_run.first().unwrap();
    assert_eq!(by_store.field, "store_id");
    assert_eq!(by_store.op, FilterOp::Eq);
    assert_eq!(by_store.value, FilterValue::Int(1));
    let by_state = first_run.get(1).unwrap();
    assert_eq!(by_state.field, "state");
    assert_eq!(by_state.op, FilterOp::In);
    assert_eq!(
        by_state.value,
        FilterValue::List(vec!["new".to_string(), "processing".to_string()])
    );

    let second_run = filters.get(2).unwrap().predicates();
    assert_eq!(second_run.len(), 3);
    let by_window = second_run.get(2).unwrap();
    assert_eq!(by_window.field, "updated_at");
    assert_eq!(by_window.op, FilterOp::Gteq);
}

// =============================================================================
// Status export
// =============================================================================

#[tokio::test]
async fn test_order_status_export_pushes_workflow_state() {
    let ctx = TestContext::new().await;
    ctx.remote.seed_hierarchy().await;
    ctx.remote.seed_vocab().await;
    ctx.remote.seed_catalog().await;
    ctx.remote
        .add_order(remote_order(
            9001,
            "100000001",
            "new",
            1,
            vec![remote_order_line(7001, 101, "GEAR-BOTTLE", 1, 2500)],
        ))
        .await;

    ctx.engine.import_order_states().await.unwrap();
    ctx.engine.import_hierarchy().await.unwrap();
    ctx.engine.import_catalog().await.unwrap();
    ctx.engine.import_orders_all().await.unwrap();

    let channel = ctx.engine.channel().id;
    let order = ctx
        .store
        .order_by_reference(channel, "mag_100000001")
        .await
        .unwrap()
        .unwrap();
    // Backdate the modification so the second window excludes it.
    ctx.store
        .advance_order(
            order.id,
            OrderWorkflowState::Confirmed,
            FulfillmentState::None,
            Utc::now() - Duration::hours(1),
        )
        .await
        .unwrap();

    let summary = ctx.engine.export_order_status_all().await.unwrap();
    assert_eq!(summary.exported, 1);
    // The remote sees its own increment id, not the prefixed reference.
    let calls = ctx.remote.calls().await;
    assert_eq!(
        calls.order_status,
        vec![("100000001".to_string(), "confirmed".to_string())]
    );

    let second = ctx.engine.export_order_status_all().await.unwrap();
    assert_eq!(second.exported, 0);
    assert_eq!(ctx.remote.calls().await.order_status.len(), 1);
}
