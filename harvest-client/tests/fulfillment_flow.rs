mod common;

use common::{dec, fixture, Fixture};
use harvest_client::{ClientError, OrderStatus};
use shared::error::ErrorCode;

/// Buyer places one order per farmer, then `farmer` signs in and loads their orders
async fn placed_orders(f: &Fixture) -> String {
    f.buyer_with_cart().await;
    let outcome = f.client.checkout().checkout("12 Orchard Lane").await.unwrap();
    assert!(outcome.is_success());

    f.sign_in(&f.farmer);
    let orders = f.client.fulfillment().load().await.unwrap();
    assert_eq!(orders.len(), 1);
    orders[0].id.clone()
}

#[tokio::test]
async fn test_advance_through_full_chain() {
    let f = fixture();
    let order_id = placed_orders(&f).await;
    let coordinator = f.client.fulfillment();

    assert_eq!(
        coordinator.next_action(&order_id).map(|a| a.label),
        Some("Confirm Order")
    );

    let expected = [
        (OrderStatus::Confirmed, Some("Mark as Shipped")),
        (OrderStatus::Shipped, Some("Mark as Delivered")),
        (OrderStatus::Delivered, None),
    ];
    for (status, next_label) in expected {
        let updated = coordinator.advance(&order_id).await.unwrap();
        assert_eq!(updated.status, status);
        assert_eq!(coordinator.order(&order_id).unwrap().status, status);
        assert_eq!(
            coordinator.next_action(&order_id).map(|a| a.label),
            next_label
        );
    }

    let stored = f.market.orders().into_iter().find(|o| o.id == order_id).unwrap();
    assert_eq!(stored.status, OrderStatus::Delivered);
    assert_eq!(stored.total_amount, dec("100"));
}

#[tokio::test]
async fn test_delivered_order_cannot_advance() {
    let f = fixture();
    let order_id = placed_orders(&f).await;
    let coordinator = f.client.fulfillment();
    for _ in 0..3 {
        coordinator.advance(&order_id).await.unwrap();
    }

    let err = coordinator.advance(&order_id).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::OrderAlreadyDelivered);
    assert_eq!(coordinator.order(&order_id).unwrap().status, OrderStatus::Delivered);
}

#[tokio::test]
async fn test_other_farmers_orders_are_out_of_reach() {
    let f = fixture();
    let order_id = placed_orders(&f).await;
    let their_order = f
        .market
        .orders()
        .into_iter()
        .find(|o| o.farmer_id == "f2")
        .unwrap();
    assert_ne!(order_id, their_order.id);

    // f1 never loaded f2's order
    let err = f.client.fulfillment().advance(&their_order.id).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::OrderNotFound);

    // f2 loads it, then the session switches back to f1
    f.sign_in(&f.other_farmer);
    assert_eq!(f.client.fulfillment().load().await.unwrap().len(), 1);
    f.sign_in(&f.farmer);
    assert!(f.client.fulfillment().orders().is_empty());
    assert!(f.client.fulfillment().next_action(&their_order.id).is_none());
    let err = f.client.fulfillment().advance(&their_order.id).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::OrderNotFound);

    let stored = f.market.orders().into_iter().find(|o| o.id == their_order.id).unwrap();
    assert_eq!(stored.status, OrderStatus::Pending);
}

#[tokio::test]
async fn test_loaded_orders_hidden_after_sign_out() {
    let f = fixture();
    let order_id = placed_orders(&f).await;
    assert_eq!(f.client.fulfillment().orders().len(), 1);

    f.client.session().clear();
    assert!(f.client.fulfillment().orders().is_empty());
    assert!(f.client.fulfillment().order(&order_id).is_none());

    f.sign_in(&f.buyer);
    assert!(f.client.fulfillment().orders().is_empty());
}

#[tokio::test]
async fn test_service_forbidden_leaves_cache_unchanged() {
    let f = fixture();
    let _ = placed_orders(&f).await;
    let their_order = f
        .market
        .orders()
        .into_iter()
        .find(|o| o.farmer_id == "f2")
        .unwrap();

    // Local view says f2, the service sees the calls as f1
    f.sign_in(&f.other_farmer);
    f.client.fulfillment().load().await.unwrap();
    f.market.act_as("f1");

    let err = f.client.fulfillment().advance(&their_order.id).await.unwrap_err();
    assert!(matches!(err, ClientError::Forbidden(ref m) if m == "Not authorized"));
    assert_eq!(
        f.client.fulfillment().order(&their_order.id).unwrap().status,
        OrderStatus::Pending
    );
}

#[tokio::test]
async fn test_failed_update_leaves_cache_unchanged() {
    let f = fixture();
    let order_id = placed_orders(&f).await;
    f.market.fail_next_status_update("database unavailable");

    let err = f.client.fulfillment().advance(&order_id).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::InternalError);
    let cached = f.client.fulfillment().order(&order_id).unwrap();
    assert_eq!(cached.status, OrderStatus::Pending);

    // Retry succeeds and moves exactly one step
    let updated = f.client.fulfillment().advance(&order_id).await.unwrap();
    assert_eq!(updated.status, OrderStatus::Confirmed);
}

#[tokio::test]
async fn test_buyer_sees_no_actions_and_cannot_advance() {
    let f = fixture();
    let order_id = placed_orders(&f).await;

    f.sign_in(&f.buyer);
    let orders = f.client.fulfillment().load().await.unwrap();
    assert_eq!(orders.len(), 2);
    assert!(f.client.fulfillment().next_action(&order_id).is_none());

    let err = f.client.fulfillment().advance(&order_id).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::RoleRequired);
}
