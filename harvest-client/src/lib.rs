//! Harvest Client - marketplace client core
//!
//! Session handling, the REST client, and the cart, checkout, fulfillment
//! and realtime notification components built on top of it.

pub mod api;
pub mod cart;
pub mod checkout;
pub mod client;
pub mod config;
pub mod error;
pub mod fulfillment;
pub mod http;
pub mod notification;
pub mod service;
pub mod session;

pub use cart::CartManager;
pub use checkout::{CheckoutError, CheckoutFailure, CheckoutOrchestrator, CheckoutOutcome, CheckoutReceipt};
pub use client::HarvestClient;
pub use config::{CheckoutConfig, ClientConfig, NotificationConfig};
pub use error::{ClientError, ClientResult};
pub use fulfillment::OrderStatusCoordinator;
pub use http::HttpClient;
pub use notification::{ChannelState, ListenerHandle, NotificationChannel};
pub use service::OrderService;
pub use session::{FileTokenStore, MemoryTokenStore, SessionContext, TokenStore};

// Re-export shared types for convenience
pub use shared::models::{Cart, CartItem, CartSnapshot, Notification, Order, OrderStatus, Product, Role, User};
