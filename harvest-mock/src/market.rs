//! In-process marketplace service
//!
//! Implements [`OrderService`] with the service's observable rules: role and
//! ownership checks, approved-only cart additions merging into existing lines,
//! per-farmer order split with price snapshots and stock decrement, cart
//! cleared on order creation, and realtime notifications through an optional
//! [`MemoryHub`]. Failures, payment results and latency can be scripted.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use harvest_client::{ClientError, ClientResult, OrderService};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use shared::models::{
    AddCartItem, Cart, CartItem, CreateOrderRequest, ModerationStatus, Notification,
    NotificationKind, Order, OrderItem, OrderStatus, PaymentResult, Product, Role, User, money,
};

use crate::hub::MemoryHub;

#[derive(Debug, Clone)]
struct CartLine {
    id: String,
    buyer_id: String,
    product_id: String,
    quantity: u32,
}

#[derive(Default)]
struct Faults {
    cart_fetch: Option<String>,
    cart_clear: Option<String>,
    order_creation: Option<String>,
    status_update: Option<String>,
}

#[derive(Default)]
struct MarketState {
    next_id: u64,
    acting: Option<String>,
    users: HashMap<String, User>,
    products: HashMap<String, Product>,
    cart: Vec<CartLine>,
    /// Oldest first
    orders: Vec<Order>,
    payments: VecDeque<ClientResult<PaymentResult>>,
    idempotent: HashMap<String, Vec<Order>>,
    last_idempotency_key: Option<String>,
    keep_orphaned_lines: bool,
    faults: Faults,
}

impl MarketState {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}-{}", prefix, self.next_id)
    }

    fn current_user(&self) -> ClientResult<User> {
        self.acting
            .as_ref()
            .and_then(|id| self.users.get(id))
            .cloned()
            .ok_or(ClientError::Unauthorized)
    }

    fn require(&self, role: Role) -> ClientResult<User> {
        let user = self.current_user()?;
        if user.role != role {
            return Err(ClientError::Forbidden("Insufficient permissions".into()));
        }
        Ok(user)
    }

    fn owned_line(&mut self, buyer_id: &str, item_id: &str) -> ClientResult<&mut CartLine> {
        self.cart
            .iter_mut()
            .find(|l| l.id == item_id && l.buyer_id == buyer_id)
            .ok_or_else(|| ClientError::NotFound("Cart item not found".into()))
    }
}

pub struct InMemoryMarket {
    state: Mutex<MarketState>,
    hub: Option<MemoryHub>,
    latency: Duration,
    cart_calls: AtomicU32,
    payment_calls: AtomicU32,
    payment_captures: AtomicU32,
    order_calls: AtomicU32,
}

impl Default for InMemoryMarket {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryMarket {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MarketState::default()),
            hub: None,
            latency: Duration::ZERO,
            cart_calls: AtomicU32::new(0),
            payment_calls: AtomicU32::new(0),
            payment_captures: AtomicU32::new(0),
            order_calls: AtomicU32::new(0),
        }
    }

    /// Emit notifications through `hub`
    pub fn with_hub(mut self, hub: MemoryHub) -> Self {
        self.hub = Some(hub);
        self
    }

    /// Delay every call by `latency`
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    // ========== Seeding ==========

    pub fn seed_user(&self, user: User) {
        self.state.lock().users.insert(user.id.clone(), user);
    }

    pub fn seed_buyer(&self, id: &str) -> User {
        let user = user(id, Role::Buyer);
        self.seed_user(user.clone());
        user
    }

    pub fn seed_farmer(&self, id: &str) -> User {
        let user = user(id, Role::Farmer);
        self.seed_user(user.clone());
        user
    }

    /// Approved listing
    pub fn seed_product(&self, id: &str, farmer_id: &str, name: &str, price: Decimal, stock: u32) {
        let product = Product {
            id: id.to_string(),
            farmer_id: farmer_id.to_string(),
            name: name.to_string(),
            category: "produce".to_string(),
            price,
            quantity: stock,
            description: String::new(),
            images: vec![],
            status: ModerationStatus::Approved,
            avg_rating: 0.0,
            review_count: 0,
            farmer: None,
            created_at: Some(Utc::now().naive_utc()),
            updated_at: None,
        };
        self.state.lock().products.insert(id.to_string(), product);
    }

    /// Calls are made as this user, as if their token were attached
    pub fn act_as(&self, user_id: &str) {
        self.state.lock().acting = Some(user_id.to_string());
    }

    pub fn sign_out(&self) {
        self.state.lock().acting = None;
    }

    pub fn product(&self, id: &str) -> Option<Product> {
        self.state.lock().products.get(id).cloned()
    }

    pub fn set_price(&self, product_id: &str, price: Decimal) {
        if let Some(p) = self.state.lock().products.get_mut(product_id) {
            p.price = price;
        }
    }

    pub fn set_status(&self, product_id: &str, status: ModerationStatus) {
        if let Some(p) = self.state.lock().products.get_mut(product_id) {
            p.status = status;
        }
    }

    /// Delete a listing; cart lines pointing at it stay behind
    pub fn remove_product(&self, product_id: &str) {
        self.state.lock().products.remove(product_id);
    }

    /// Report cart lines of removed products with no product instead of skipping them
    pub fn keep_orphaned_lines(&self, keep: bool) {
        self.state.lock().keep_orphaned_lines = keep;
    }

    // ========== Scripting ==========

    /// Queue the result of the next payment call
    pub fn script_payment(&self, result: PaymentResult) {
        self.state.lock().payments.push_back(Ok(result));
    }

    /// Queue a failure of the next payment call itself
    pub fn script_payment_error(&self, message: &str) {
        self.state
            .lock()
            .payments
            .push_back(Err(ClientError::Internal(message.to_string())));
    }

    pub fn fail_next_cart_fetch(&self, message: &str) {
        self.state.lock().faults.cart_fetch = Some(message.to_string());
    }

    pub fn fail_next_cart_clear(&self, message: &str) {
        self.state.lock().faults.cart_clear = Some(message.to_string());
    }

    pub fn fail_next_order_creation(&self, message: &str) {
        self.state.lock().faults.order_creation = Some(message.to_string());
    }

    pub fn fail_next_status_update(&self, message: &str) {
        self.state.lock().faults.status_update = Some(message.to_string());
    }

    // ========== Inspection ==========

    /// Cart mutations received (add, update, remove, clear)
    pub fn cart_calls(&self) -> u32 {
        self.cart_calls.load(Ordering::SeqCst)
    }

    pub fn payment_calls(&self) -> u32 {
        self.payment_calls.load(Ordering::SeqCst)
    }

    /// Successful payments
    pub fn payment_captures(&self) -> u32 {
        self.payment_captures.load(Ordering::SeqCst)
    }

    pub fn order_calls(&self) -> u32 {
        self.order_calls.load(Ordering::SeqCst)
    }

    pub fn orders(&self) -> Vec<Order> {
        self.state.lock().orders.clone()
    }

    /// Cart line count for a buyer, orphans included
    pub fn cart_len(&self, buyer_id: &str) -> usize {
        self.state
            .lock()
            .cart
            .iter()
            .filter(|l| l.buyer_id == buyer_id)
            .count()
    }

    pub fn last_idempotency_key(&self) -> Option<String> {
        self.state.lock().last_idempotency_key.clone()
    }

    async fn pause(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    fn notify(&self, notification: Notification) {
        if let Some(hub) = &self.hub {
            hub.emit_to_user(&notification.user_id, &notification);
        }
    }
}

fn user(id: &str, role: Role) -> User {
    User {
        id: id.to_string(),
        email: format!("{}@example.com", id),
        name: id.to_string(),
        phone: String::new(),
        role,
        address: None,
        created_at: Some(Utc::now().naive_utc()),
    }
}

#[async_trait]
impl OrderService for InMemoryMarket {
    async fn get_cart(&self) -> ClientResult<Cart> {
        self.pause().await;
        let mut state = self.state.lock();
        let buyer = state.require(Role::Buyer)?;
        if let Some(message) = state.faults.cart_fetch.take() {
            return Err(ClientError::Internal(message));
        }

        let mut items = Vec::new();
        let mut total = Decimal::ZERO;
        for line in state.cart.iter().filter(|l| l.buyer_id == buyer.id) {
            let product = state.products.get(&line.product_id).cloned();
            match &product {
                Some(p) => total += money::line_total(p.price, line.quantity),
                None if state.keep_orphaned_lines => {}
                None => continue,
            }
            items.push(CartItem {
                id: line.id.clone(),
                buyer_id: line.buyer_id.clone(),
                product_id: line.product_id.clone(),
                quantity: line.quantity,
                product,
            });
        }
        Ok(Cart { items, total })
    }

    async fn add_to_cart(&self, item: &AddCartItem) -> ClientResult<CartItem> {
        self.pause().await;
        self.cart_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock();
        let buyer = state.require(Role::Buyer)?;
        match state.products.get(&item.product_id) {
            Some(p) if p.is_approved() => {}
            _ => return Err(ClientError::NotFound("Product not available".into())),
        }

        let existing = state
            .cart
            .iter()
            .position(|l| l.buyer_id == buyer.id && l.product_id == item.product_id);
        let line = match existing {
            Some(idx) => {
                state.cart[idx].quantity += item.quantity;
                state.cart[idx].clone()
            }
            None => {
                let line = CartLine {
                    id: state.next_id("cart"),
                    buyer_id: buyer.id.clone(),
                    product_id: item.product_id.clone(),
                    quantity: item.quantity,
                };
                state.cart.push(line.clone());
                line
            }
        };
        Ok(CartItem {
            id: line.id,
            buyer_id: line.buyer_id,
            product_id: line.product_id,
            quantity: line.quantity,
            product: None,
        })
    }

    async fn update_cart_item(&self, item_id: &str, quantity: u32) -> ClientResult<CartItem> {
        self.pause().await;
        self.cart_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock();
        let buyer = state.require(Role::Buyer)?;
        let line = state.owned_line(&buyer.id, item_id)?;
        line.quantity = quantity;
        Ok(CartItem {
            id: line.id.clone(),
            buyer_id: line.buyer_id.clone(),
            product_id: line.product_id.clone(),
            quantity: line.quantity,
            product: None,
        })
    }

    async fn remove_cart_item(&self, item_id: &str) -> ClientResult<()> {
        self.pause().await;
        self.cart_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock();
        let buyer = state.require(Role::Buyer)?;
        state.owned_line(&buyer.id, item_id)?;
        state.cart.retain(|l| l.id != item_id);
        Ok(())
    }

    async fn clear_cart(&self) -> ClientResult<()> {
        self.pause().await;
        self.cart_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock();
        let buyer = state.require(Role::Buyer)?;
        if let Some(message) = state.faults.cart_clear.take() {
            return Err(ClientError::Internal(message));
        }
        state.cart.retain(|l| l.buyer_id != buyer.id);
        Ok(())
    }

    async fn process_payment(&self) -> ClientResult<PaymentResult> {
        self.pause().await;
        self.payment_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock();
        state.require(Role::Buyer)?;
        let result = match state.payments.pop_front() {
            Some(scripted) => scripted?,
            None => {
                let txn = state.next_id("TXN");
                PaymentResult::approved(txn)
            }
        };
        if result.success {
            self.payment_captures.fetch_add(1, Ordering::SeqCst);
        }
        Ok(result)
    }

    async fn create_order(
        &self,
        request: &CreateOrderRequest,
        idempotency_key: Option<&str>,
    ) -> ClientResult<Vec<Order>> {
        self.pause().await;
        self.order_calls.fetch_add(1, Ordering::SeqCst);

        let (created, notifications) = {
            let mut state = self.state.lock();
            let buyer = state.require(Role::Buyer)?;
            state.last_idempotency_key = idempotency_key.map(str::to_string);

            if let Some(key) = idempotency_key
                && let Some(orders) = state.idempotent.get(key)
            {
                return Ok(orders.clone());
            }
            if let Some(message) = state.faults.order_creation.take() {
                return Err(ClientError::Internal(message));
            }
            if request.items.is_empty() {
                return Err(ClientError::Validation("No items in order".into()));
            }

            // Validate every line before touching anything; group by farmer in request order
            let mut groups: Vec<(String, Vec<(Product, u32)>)> = Vec::new();
            for line in &request.items {
                let product = match state.products.get(&line.product_id) {
                    Some(p) if p.is_approved() => p.clone(),
                    _ => return Err(ClientError::Validation("Product not available".into())),
                };
                if product.quantity < line.quantity {
                    return Err(ClientError::Validation(format!(
                        "Insufficient stock for {}",
                        product.name
                    )));
                }
                match groups.iter_mut().find(|(f, _)| *f == product.farmer_id) {
                    Some((_, lines)) => lines.push((product, line.quantity)),
                    None => groups.push((product.farmer_id.clone(), vec![(product, line.quantity)])),
                }
            }

            let now = Utc::now().naive_utc();
            let mut created = Vec::new();
            let mut notifications = Vec::new();
            for (farmer_id, lines) in groups {
                let order_id = state.next_id("order");
                let mut items = Vec::new();
                for (product, quantity) in &lines {
                    let item_id = state.next_id("item");
                    items.push(OrderItem {
                        id: item_id,
                        order_id: order_id.clone(),
                        product_id: product.id.clone(),
                        quantity: *quantity,
                        price_at_purchase: product.price,
                        product: None,
                    });
                    if let Some(p) = state.products.get_mut(&product.id) {
                        p.quantity -= quantity;
                    }
                }
                let total_amount = items
                    .iter()
                    .map(OrderItem::line_total)
                    .fold(Decimal::ZERO, |acc, t| acc + t);
                let order = Order {
                    id: order_id,
                    buyer_id: buyer.id.clone(),
                    farmer_id: farmer_id.clone(),
                    total_amount,
                    status: OrderStatus::Pending,
                    shipping_address: request.shipping_address.clone(),
                    created_at: Some(now),
                    updated_at: Some(now),
                    items,
                    buyer: None,
                    farmer: None,
                };
                state.orders.push(order.clone());
                created.push(order);
                notifications.push(Notification::new(
                    farmer_id,
                    NotificationKind::NewOrder,
                    format!("New order received from {}", buyer.name),
                ));
            }

            state.cart.retain(|l| l.buyer_id != buyer.id);
            if let Some(key) = idempotency_key {
                state.idempotent.insert(key.to_string(), created.clone());
            }
            (created, notifications)
        };

        for n in notifications {
            self.notify(n);
        }
        Ok(created)
    }

    async fn list_orders(&self) -> ClientResult<Vec<Order>> {
        self.pause().await;
        let state = self.state.lock();
        let user = state.current_user()?;
        Ok(state
            .orders
            .iter()
            .rev()
            .filter(|o| match user.role {
                Role::Buyer => o.buyer_id == user.id,
                Role::Farmer => o.farmer_id == user.id,
                Role::Admin => true,
            })
            .cloned()
            .collect())
    }

    async fn update_order_status(&self, order_id: &str, status: OrderStatus) -> ClientResult<Order> {
        self.pause().await;
        let (order, notification) = {
            let mut state = self.state.lock();
            let farmer = state.require(Role::Farmer)?;
            if let Some(message) = state.faults.status_update.take() {
                return Err(ClientError::Internal(message));
            }
            let order = state
                .orders
                .iter_mut()
                .find(|o| o.id == order_id)
                .ok_or_else(|| ClientError::NotFound("Order not found".into()))?;
            if order.farmer_id != farmer.id {
                return Err(ClientError::Forbidden("Not authorized".into()));
            }
            order.status = status;
            order.updated_at = Some(Utc::now().naive_utc());
            let notification = Notification::new(
                order.buyer_id.clone(),
                NotificationKind::OrderStatusUpdate,
                format!("Your order has been {}", status),
            );
            (order.clone(), notification)
        };
        self.notify(notification);
        Ok(order)
    }
}
