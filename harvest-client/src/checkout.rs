//! Checkout Orchestrator
//!
//! Runs the purchase sequence `payment -> order creation -> cart clear` and
//! ends every accepted run in exactly one [`CheckoutOutcome`]. Nothing is rolled
//! back: a declined payment leaves cart and orders untouched, and an order
//! failure after a captured payment is reported as its own outcome.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rust_decimal::Decimal;
use shared::error::{AppError, ErrorCode};
use shared::models::{CreateOrderRequest, Order, OrderLine, Role};
use thiserror::Error;

use crate::cart::CartManager;
use crate::config::CheckoutConfig;
use crate::service::OrderService;
use crate::session::SessionContext;

/// Checkout rejected before any remote call
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("A checkout is already in progress")]
    InProgress,

    #[error("Shipping address is required")]
    ShippingAddressRequired,

    #[error("Cart is empty")]
    EmptyCart,

    /// Cart lines whose product no longer resolves
    #[error("Cart items refer to unknown products: {}", .0.join(", "))]
    UnresolvedItems(Vec<String>),

    #[error(transparent)]
    Session(#[from] AppError),
}

impl CheckoutError {
    pub fn code(&self) -> ErrorCode {
        match self {
            CheckoutError::InProgress => ErrorCode::CheckoutInProgress,
            CheckoutError::ShippingAddressRequired => ErrorCode::ShippingAddressRequired,
            CheckoutError::EmptyCart => ErrorCode::CartEmpty,
            CheckoutError::UnresolvedItems(_) => ErrorCode::CartItemProductMissing,
            CheckoutError::Session(e) => e.code,
        }
    }
}

/// Successful purchase
#[derive(Debug, Clone)]
pub struct CheckoutReceipt {
    pub transaction_id: Option<String>,
    /// One order per farmer, totals computed by the service
    pub orders: Vec<Order>,
}

impl CheckoutReceipt {
    /// Σ order totals as computed by the service
    pub fn total(&self) -> Decimal {
        self.orders
            .iter()
            .fold(Decimal::ZERO, |acc, o| acc + o.total_amount)
    }
}

/// Why a run ended on a failure screen
#[derive(Debug, Clone, PartialEq)]
pub enum CheckoutFailure {
    /// Payment answered `success: false`
    PaymentDeclined { message: String },
    /// Payment call itself failed; nothing was charged
    PaymentUnavailable { code: ErrorCode, message: String },
    /// Payment was captured but no order was recorded
    OrderFailedAfterPayment {
        transaction_id: Option<String>,
        code: ErrorCode,
        message: String,
    },
}

impl CheckoutFailure {
    pub fn code(&self) -> ErrorCode {
        match self {
            CheckoutFailure::PaymentDeclined { .. } => ErrorCode::PaymentFailed,
            CheckoutFailure::PaymentUnavailable { .. } => ErrorCode::PaymentUnavailable,
            CheckoutFailure::OrderFailedAfterPayment { .. } => ErrorCode::OrderFailedAfterPayment,
        }
    }

    /// The buyer has been charged
    pub fn is_charged(&self) -> bool {
        matches!(self, CheckoutFailure::OrderFailedAfterPayment { .. })
    }

    pub fn message(&self) -> &str {
        match self {
            CheckoutFailure::PaymentDeclined { message }
            | CheckoutFailure::PaymentUnavailable { message, .. }
            | CheckoutFailure::OrderFailedAfterPayment { message, .. } => message,
        }
    }
}

/// Terminal state of an accepted checkout
#[derive(Debug, Clone)]
pub enum CheckoutOutcome {
    Success(CheckoutReceipt),
    Failure(CheckoutFailure),
}

impl CheckoutOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, CheckoutOutcome::Success(_))
    }

    pub fn receipt(&self) -> Option<&CheckoutReceipt> {
        match self {
            CheckoutOutcome::Success(r) => Some(r),
            CheckoutOutcome::Failure(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&CheckoutFailure> {
        match self {
            CheckoutOutcome::Success(_) => None,
            CheckoutOutcome::Failure(f) => Some(f),
        }
    }
}

/// Releases the in-flight flag when a run ends, however it ends
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlight(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct CheckoutOrchestrator {
    session: SessionContext,
    service: Arc<dyn OrderService>,
    cart: Arc<CartManager>,
    config: CheckoutConfig,
    in_flight: AtomicBool,
}

impl CheckoutOrchestrator {
    pub fn new(
        session: SessionContext,
        service: Arc<dyn OrderService>,
        cart: Arc<CartManager>,
        config: CheckoutConfig,
    ) -> Self {
        Self {
            session,
            service,
            cart,
            config,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Run one checkout for the cached cart
    ///
    /// A second call while one is outstanding is rejected with
    /// [`CheckoutError::InProgress`]; it never reaches the service.
    pub async fn checkout(&self, shipping_address: &str) -> Result<CheckoutOutcome, CheckoutError> {
        let _guard = InFlight::acquire(&self.in_flight).ok_or(CheckoutError::InProgress)?;

        let request = self.prepare(shipping_address)?;
        tracing::info!(lines = request.items.len(), "Checkout started");

        // 1. Payment
        let transaction_id = match self.service.process_payment().await {
            Ok(payment) if payment.success => payment.transaction_id,
            Ok(payment) => {
                let message = payment
                    .message
                    .unwrap_or_else(|| ErrorCode::PaymentFailed.message().to_string());
                tracing::info!(reason = %message, "Payment declined, cart left untouched");
                return Ok(CheckoutOutcome::Failure(CheckoutFailure::PaymentDeclined { message }));
            }
            Err(e) => {
                tracing::warn!("Payment call failed, cart left untouched: {}", e);
                return Ok(CheckoutOutcome::Failure(CheckoutFailure::PaymentUnavailable {
                    code: e.code(),
                    message: e.to_string(),
                }));
            }
        };
        tracing::info!(transaction_id = ?transaction_id, "Payment captured");

        // 2. Order creation, priced by the service
        let idempotency_key = if self.config.idempotency_key {
            transaction_id.as_deref()
        } else {
            None
        };
        let orders = match self.service.create_order(&request, idempotency_key).await {
            Ok(orders) => orders,
            Err(e) => {
                tracing::error!(
                    transaction_id = ?transaction_id,
                    "Order creation failed after payment was captured: {}",
                    e
                );
                return Ok(CheckoutOutcome::Failure(
                    CheckoutFailure::OrderFailedAfterPayment {
                        transaction_id,
                        code: e.code(),
                        message: e.to_string(),
                    },
                ));
            }
        };

        // 3. Cart clear; the service already empties the cart on order creation
        if let Err(e) = self.cart.clear().await {
            tracing::warn!("Cart clear after checkout failed, resetting local cart: {}", e);
            self.cart.reset();
        }

        let receipt = CheckoutReceipt {
            transaction_id,
            orders,
        };
        tracing::info!(
            orders = receipt.orders.len(),
            total = %receipt.total(),
            "Checkout completed"
        );
        Ok(CheckoutOutcome::Success(receipt))
    }

    /// Preconditions checked against the signed-in user's cached cart; no remote calls
    fn prepare(&self, shipping_address: &str) -> Result<CreateOrderRequest, CheckoutError> {
        self.session.require_role(Role::Buyer)?;

        let shipping_address = shipping_address.trim();
        if shipping_address.is_empty() {
            return Err(CheckoutError::ShippingAddressRequired);
        }

        let snapshot = self.cart.snapshot();
        if snapshot.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let unresolved: Vec<String> = snapshot.unresolved().map(|i| i.id.clone()).collect();
        if !unresolved.is_empty() {
            return Err(CheckoutError::UnresolvedItems(unresolved));
        }

        Ok(CreateOrderRequest {
            shipping_address: shipping_address.to_string(),
            items: snapshot
                .items()
                .iter()
                .map(|item| OrderLine {
                    product_id: item.product_id.clone(),
                    quantity: item.quantity,
                })
                .collect(),
        })
    }
}
