//! Order Status Coordinator
//!
//! Farmer-side fulfillment. Status only changes here, and only through the
//! `shared::order` reducer after the service has acknowledged the update.
//! Loaded orders are only visible to the user they were loaded for.

use std::sync::Arc;

use parking_lot::RwLock;
use shared::error::{AppError, ErrorCode};
use shared::models::{Order, Role};
use shared::order::{self, OrderEvent, StatusAction};
use tokio::sync::Mutex;

use crate::ClientResult;
use crate::service::OrderService;
use crate::session::SessionContext;

#[derive(Default)]
struct CachedOrders {
    owner: Option<String>,
    orders: Vec<Order>,
}

pub struct OrderStatusCoordinator {
    session: SessionContext,
    service: Arc<dyn OrderService>,
    orders: RwLock<CachedOrders>,
    /// One status update in flight at a time
    advancing: Mutex<()>,
}

impl OrderStatusCoordinator {
    pub fn new(session: SessionContext, service: Arc<dyn OrderService>) -> Self {
        Self {
            session,
            service,
            orders: RwLock::new(CachedOrders::default()),
            advancing: Mutex::new(()),
        }
    }

    /// Replace the cached orders with the service's list
    pub async fn load(&self) -> ClientResult<Vec<Order>> {
        let owner = self.session.user_id();
        let orders = self.service.list_orders().await?;
        for o in orders.iter().filter(|o| !o.is_consistent()) {
            tracing::warn!(
                order_id = %o.id,
                total = %o.total_amount,
                items_total = %o.items_total(),
                "Order total disagrees with its items"
            );
        }
        if self.session.user_id() == owner {
            *self.orders.write() = CachedOrders {
                owner,
                orders: orders.clone(),
            };
        }
        Ok(orders)
    }

    /// Cached orders of the signed-in user; empty for anybody else
    pub fn orders(&self) -> Vec<Order> {
        let user_id = self.session.user_id();
        let cache = self.orders.read();
        if user_id.is_some() && cache.owner == user_id {
            cache.orders.clone()
        } else {
            Vec::new()
        }
    }

    pub fn order(&self, order_id: &str) -> Option<Order> {
        self.orders().into_iter().find(|o| o.id == order_id)
    }

    /// Action offered to the signed-in user for a cached order
    pub fn next_action(&self, order_id: &str) -> Option<StatusAction> {
        let viewer = self.session.user()?;
        let order = self.order(order_id)?;
        order::next_action(&order, &viewer)
    }

    /// Move an order one step forward
    ///
    /// Rejected locally (cache untouched, no request) when the caller is not
    /// the owning farmer or the order is delivered. The service still performs
    /// its own ownership check; a rejection there also leaves the cache as is.
    pub async fn advance(&self, order_id: &str) -> ClientResult<Order> {
        let _advancing = self.advancing.lock().await;

        let viewer = self.session.require_role(Role::Farmer)?;
        let current = self.order(order_id).ok_or_else(|| {
            AppError::new(ErrorCode::OrderNotFound).with_detail("order_id", order_id)
        })?;

        if !order::is_fulfiller(&current, &viewer) {
            return Err(AppError::new(ErrorCode::NotResourceOwner)
                .with_detail("order_id", order_id)
                .into());
        }

        let event = OrderEvent::advance(&current).ok_or_else(|| {
            AppError::new(ErrorCode::OrderAlreadyDelivered).with_detail("order_id", order_id)
        })?;
        let OrderEvent::StatusAdvanced { to } = event;

        let acknowledged = self.service.update_order_status(order_id, to).await?;
        if acknowledged.status != to {
            tracing::warn!(
                order_id = %order_id,
                requested = %to,
                reported = %acknowledged.status,
                "Service acknowledged a different status"
            );
        }

        let mut updated = order::apply(&current, &event)?;
        if acknowledged.updated_at.is_some() {
            updated.updated_at = acknowledged.updated_at;
        }

        let mut cache = self.orders.write();
        if cache.owner.as_deref() == Some(viewer.id.as_str())
            && let Some(slot) = cache.orders.iter_mut().find(|o| o.id == order_id)
        {
            *slot = updated.clone();
        }
        drop(cache);
        tracing::info!(order_id = %order_id, status = %to, "Order status advanced");
        Ok(updated)
    }
}
