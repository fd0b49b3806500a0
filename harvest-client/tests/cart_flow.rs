mod common;

use common::{dec, fixture};
use harvest_client::{ClientError, OrderService};
use rust_decimal::Decimal;
use shared::error::ErrorCode;

fn line_id(f: &common::Fixture, product_id: &str) -> String {
    f.client
        .cart()
        .items()
        .into_iter()
        .find(|i| i.product_id == product_id)
        .map(|i| i.id)
        .unwrap()
}

fn assert_total_matches_items(f: &common::Fixture) {
    let expected = f
        .client
        .cart()
        .items()
        .iter()
        .map(|i| i.product.as_ref().unwrap().price * Decimal::from(i.quantity))
        .fold(Decimal::ZERO, |a, b| a + b);
    assert_eq!(f.client.cart().total(), expected);
}

#[tokio::test]
async fn test_two_items_remove_then_clear() {
    let f = fixture();
    f.buyer_with_cart().await;

    let cart = f.client.cart();
    assert_eq!(cart.items().len(), 2);
    assert_eq!(cart.total(), dec("130"));

    let pb = line_id(&f, "pb");
    cart.remove(&pb).await.unwrap();
    assert_eq!(cart.items().len(), 1);
    assert_eq!(cart.total(), dec("100"));

    cart.clear().await.unwrap();
    assert!(cart.items().is_empty());
    assert_eq!(cart.total(), Decimal::ZERO);
    assert_eq!(f.market.cart_len("b1"), 0);
}

#[tokio::test]
async fn test_set_quantity_below_one_removes() {
    for quantity in [0i64, -1] {
        let f = fixture();
        f.buyer_with_cart().await;
        let pa = line_id(&f, "pa");

        let snapshot = f.client.cart().set_quantity(&pa, quantity).await.unwrap();
        assert_eq!(snapshot.len(), 1, "quantity {quantity}");
        assert!(snapshot.item(&pa).is_none());
        assert_eq!(f.client.cart().total(), dec("30"));
        assert_eq!(f.market.cart_len("b1"), 1);
    }
}

#[tokio::test]
async fn test_total_tracks_items_across_mutations() {
    let f = fixture();
    f.buyer_with_cart().await;
    assert_total_matches_items(&f);

    let cart = f.client.cart();
    cart.add("pa", 3).await.unwrap();
    assert_eq!(cart.items().len(), 2, "same product merges into one line");
    assert_total_matches_items(&f);

    let pb = line_id(&f, "pb");
    cart.set_quantity(&pb, 4).await.unwrap();
    assert_total_matches_items(&f);
    assert_eq!(cart.total(), dec("370"));

    cart.add("pc", 3).await.unwrap();
    assert_total_matches_items(&f);
    assert_eq!(cart.total(), dec("407.50"));
}

#[tokio::test]
async fn test_price_change_visible_after_next_mutation() {
    let f = fixture();
    f.buyer_with_cart().await;

    f.market.set_price("pa", dec("55.25"));
    assert_eq!(f.client.cart().total(), dec("130"), "cache is not live");

    f.client.cart().add("pc", 1).await.unwrap();
    assert_eq!(f.client.cart().total(), dec("110.50") + dec("30") + dec("12.50"));
}

#[tokio::test]
async fn test_service_rejection_propagates_and_keeps_cache() {
    let f = fixture();
    f.buyer_with_cart().await;
    f.market.set_status("pc", shared::models::ModerationStatus::Pending);

    let err = f.client.cart().add("pc", 1).await.unwrap_err();
    assert!(matches!(err, ClientError::NotFound(ref m) if m == "Product not available"));
    assert_eq!(f.client.cart().items().len(), 2);
    assert_eq!(f.client.cart().total(), dec("130"));
}

#[tokio::test]
async fn test_unknown_line_is_not_found() {
    let f = fixture();
    f.buyer_with_cart().await;

    let err = f.client.cart().set_quantity("cart-999", 2).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotFound);
    assert_eq!(f.client.cart().items().len(), 2);
}

#[tokio::test]
async fn test_fetch_skips_lines_of_deleted_products() {
    let f = fixture();
    f.buyer_with_cart().await;
    f.market.remove_product("pb");

    let snapshot = f.client.cart().fetch().await.unwrap();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot.total(), dec("100"));
    // The service still stores the orphaned line
    assert_eq!(f.market.get_cart().await.unwrap().items.len(), 1);
    assert_eq!(f.market.cart_len("b1"), 2);
}

#[tokio::test]
async fn test_add_zero_rejected_before_remote_call() {
    let f = fixture();
    f.sign_in(&f.buyer);

    let err = f.client.cart().add("pa", 0).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidQuantity);
    assert_eq!(f.market.cart_calls(), 0);
}

#[tokio::test]
async fn test_huge_quantity_rejected_before_remote_call() {
    let f = fixture();
    f.buyer_with_cart().await;
    let pa = line_id(&f, "pa");
    let calls = f.market.cart_calls();

    let err = f.client.cart().set_quantity(&pa, i64::MAX).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidQuantity);
    assert_eq!(f.market.cart_calls(), calls);
}

#[tokio::test]
async fn test_failed_fetch_keeps_cache() {
    let f = fixture();
    f.buyer_with_cart().await;

    f.market.fail_next_cart_fetch("service unavailable");
    let err = f.client.cart().fetch().await.unwrap_err();
    assert!(matches!(err, ClientError::Internal(_)));
    assert_eq!(f.client.cart().items().len(), 2);
    assert_eq!(f.client.cart().total(), dec("130"));
}

#[tokio::test]
async fn test_clear_on_empty_cart_is_ok() {
    let f = fixture();
    f.sign_in(&f.buyer);
    f.client.cart().clear().await.unwrap();
    f.client.cart().clear().await.unwrap();
    assert!(f.client.cart().is_empty());
    assert_eq!(f.client.cart().total(), Decimal::ZERO);
}

#[tokio::test]
async fn test_cache_hidden_once_session_user_changes() {
    let f = fixture();
    f.buyer_with_cart().await;

    f.client.session().clear();
    assert!(f.client.cart().is_empty());
    assert_eq!(f.client.cart().total(), Decimal::ZERO);

    let other = f.market.seed_buyer("b2");
    f.sign_in(&other);
    assert!(f.client.cart().snapshot().is_empty());

    // b2's fetch replaces the cache; b1 sees nothing until their own fetch
    f.client.cart().fetch().await.unwrap();
    f.sign_in(&f.buyer);
    assert!(f.client.cart().is_empty());
    let snapshot = f.client.cart().fetch().await.unwrap();
    assert_eq!(snapshot.total(), dec("130"));
}
