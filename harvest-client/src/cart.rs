//! Cart Manager
//!
//! Keeps a cached copy of the buyer's cart. Every mutation is followed by an
//! authoritative fetch; the cache is never patched with predicted state.
//! The cache belongs to the user it was fetched for: once the session user
//! changes (sign-out, rejected token, another sign-in) it reads as empty.

use std::sync::Arc;

use parking_lot::RwLock;
use rust_decimal::Decimal;
use shared::error::{AppError, ErrorCode};
use shared::models::{AddCartItem, CartItem, CartSnapshot, money};
use tokio::sync::Mutex;

use crate::ClientResult;
use crate::service::OrderService;
use crate::session::SessionContext;

/// Snapshot tagged with the user it was fetched for
#[derive(Default)]
struct CachedCart {
    owner: Option<String>,
    snapshot: CartSnapshot,
}

pub struct CartManager {
    session: SessionContext,
    service: Arc<dyn OrderService>,
    cache: RwLock<CachedCart>,
    /// Serializes mutate-then-fetch sequences so an older fetch never lands last
    ops: Mutex<()>,
}

impl CartManager {
    pub fn new(session: SessionContext, service: Arc<dyn OrderService>) -> Self {
        Self {
            session,
            service,
            cache: RwLock::new(CachedCart::default()),
            ops: Mutex::new(()),
        }
    }

    /// Cached cart of the signed-in user; empty for anybody else
    pub fn snapshot(&self) -> CartSnapshot {
        let user_id = self.session.user_id();
        let cache = self.cache.read();
        if user_id.is_some() && cache.owner == user_id {
            cache.snapshot.clone()
        } else {
            CartSnapshot::default()
        }
    }

    pub fn items(&self) -> Vec<CartItem> {
        self.snapshot().items().to_vec()
    }

    /// Σ subtotals of the cached items
    pub fn total(&self) -> Decimal {
        self.snapshot().total()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    /// Replace the cache with the server's cart
    ///
    /// On failure the previous cache stays as it was.
    pub async fn fetch(&self) -> ClientResult<CartSnapshot> {
        let _op = self.ops.lock().await;
        self.fetch_locked().await
    }

    async fn fetch_locked(&self) -> ClientResult<CartSnapshot> {
        let owner = self.session.user_id();
        let cart = self.service.get_cart().await?;
        let reported_total = cart.total;
        let snapshot = CartSnapshot::from(cart);

        if !money::approx_eq(snapshot.total(), reported_total) {
            tracing::warn!(
                reported = %reported_total,
                computed = %snapshot.total(),
                "Cart total reported by service disagrees with its items"
            );
        }

        if self.session.user_id() != owner {
            tracing::debug!("Session changed during cart fetch, result not cached");
            return Ok(snapshot);
        }
        *self.cache.write() = CachedCart {
            owner,
            snapshot: snapshot.clone(),
        };
        tracing::debug!(items = snapshot.len(), total = %snapshot.total(), "Cart refreshed");
        Ok(snapshot)
    }

    /// Add `quantity` of a product, merging with an existing line
    pub async fn add(&self, product_id: &str, quantity: u32) -> ClientResult<CartSnapshot> {
        if quantity == 0 {
            return Err(AppError::new(ErrorCode::InvalidQuantity)
                .with_detail("product_id", product_id)
                .into());
        }
        let _op = self.ops.lock().await;
        self.service
            .add_to_cart(&AddCartItem {
                product_id: product_id.to_string(),
                quantity,
            })
            .await?;
        self.fetch_locked().await
    }

    /// Set a line's quantity; anything below 1 removes the line
    pub async fn set_quantity(&self, item_id: &str, quantity: i64) -> ClientResult<CartSnapshot> {
        if quantity < 1 {
            return self.remove(item_id).await;
        }
        let quantity = u32::try_from(quantity).map_err(|_| {
            AppError::new(ErrorCode::InvalidQuantity)
                .with_detail("cart_item_id", item_id)
                .with_detail("quantity", quantity)
        })?;
        let _op = self.ops.lock().await;
        self.service.update_cart_item(item_id, quantity).await?;
        self.fetch_locked().await
    }

    pub async fn remove(&self, item_id: &str) -> ClientResult<CartSnapshot> {
        let _op = self.ops.lock().await;
        self.service.remove_cart_item(item_id).await?;
        self.fetch_locked().await
    }

    /// Empty the cart; the local cache is reset without a fetch
    pub async fn clear(&self) -> ClientResult<()> {
        let _op = self.ops.lock().await;
        self.service.clear_cart().await?;
        self.reset();
        Ok(())
    }

    /// Drop the cached cart without contacting the service
    pub(crate) fn reset(&self) {
        *self.cache.write() = CachedCart::default();
    }
}
