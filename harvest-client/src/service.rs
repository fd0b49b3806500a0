//! Remote order service seam
//!
//! Cart, payment and order calls consumed by the cart manager, checkout
//! orchestrator and status coordinator. [`HttpClient`] talks to the real
//! service; the `harvest-mock` crate provides an in-process implementation
//! for tests and demos.

use async_trait::async_trait;
use reqwest::Method;
use shared::models::{
    AddCartItem, Cart, CartItem, CreateOrderRequest, CreateOrderResponse, MessageResponse, Order,
    OrderStatus, PaymentResult, StatusUpdate, UpdateCartItem,
};

use crate::{ClientResult, HttpClient};

/// Header carrying the order idempotency key
pub const IDEMPOTENCY_HEADER: &str = "Idempotency-Key";

/// Typed cart/order/payment calls; request and response shaping only
#[async_trait]
pub trait OrderService: Send + Sync {
    /// `GET /cart`
    async fn get_cart(&self) -> ClientResult<Cart>;

    /// `POST /cart`; merges into an existing line for the same product
    async fn add_to_cart(&self, item: &AddCartItem) -> ClientResult<CartItem>;

    /// `PUT /cart/{id}`
    async fn update_cart_item(&self, item_id: &str, quantity: u32) -> ClientResult<CartItem>;

    /// `DELETE /cart/{id}`
    async fn remove_cart_item(&self, item_id: &str) -> ClientResult<()>;

    /// `DELETE /cart`
    async fn clear_cart(&self) -> ClientResult<()>;

    /// `POST /payment/process`
    async fn process_payment(&self) -> ClientResult<PaymentResult>;

    /// `POST /orders`; one order per farmer
    async fn create_order(
        &self,
        request: &CreateOrderRequest,
        idempotency_key: Option<&str>,
    ) -> ClientResult<Vec<Order>>;

    /// `GET /orders`, scoped by the caller's role
    async fn list_orders(&self) -> ClientResult<Vec<Order>>;

    /// `PUT /orders/{id}/status`
    async fn update_order_status(&self, order_id: &str, status: OrderStatus) -> ClientResult<Order>;
}

#[async_trait]
impl OrderService for HttpClient {
    async fn get_cart(&self) -> ClientResult<Cart> {
        self.get("/cart").await
    }

    async fn add_to_cart(&self, item: &AddCartItem) -> ClientResult<CartItem> {
        self.post("/cart", item).await
    }

    async fn update_cart_item(&self, item_id: &str, quantity: u32) -> ClientResult<CartItem> {
        self.put(&format!("/cart/{}", item_id), &UpdateCartItem { quantity })
            .await
    }

    async fn remove_cart_item(&self, item_id: &str) -> ClientResult<()> {
        let _: MessageResponse = self.delete(&format!("/cart/{}", item_id)).await?;
        Ok(())
    }

    async fn clear_cart(&self) -> ClientResult<()> {
        let _: MessageResponse = self.delete("/cart").await?;
        Ok(())
    }

    async fn process_payment(&self) -> ClientResult<PaymentResult> {
        self.post_empty("/payment/process").await
    }

    async fn create_order(
        &self,
        request: &CreateOrderRequest,
        idempotency_key: Option<&str>,
    ) -> ClientResult<Vec<Order>> {
        let mut builder = self.request(Method::POST, "/orders").json(request);
        if let Some(key) = idempotency_key {
            builder = builder.header(IDEMPOTENCY_HEADER, key);
        }
        let response: CreateOrderResponse = self.execute(builder).await?;
        Ok(response.orders)
    }

    async fn list_orders(&self) -> ClientResult<Vec<Order>> {
        self.get("/orders").await
    }

    async fn update_order_status(&self, order_id: &str, status: OrderStatus) -> ClientResult<Order> {
        self.put(
            &format!("/orders/{}/status", order_id),
            &StatusUpdate { status },
        )
        .await
    }
}
