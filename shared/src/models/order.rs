//! Order Model

use super::money;
use super::product::Product;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fulfillment status, strictly forward
/// `Pending -> Confirmed -> Shipped -> Delivered`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Shipped,
    Delivered,
}

impl OrderStatus {
    /// The single legal successor, `None` once delivered
    pub fn next(&self) -> Option<OrderStatus> {
        match self {
            Self::Pending => Some(Self::Confirmed),
            Self::Confirmed => Some(Self::Shipped),
            Self::Shipped => Some(Self::Delivered),
            Self::Delivered => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.next().is_none()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Buyer or farmer contact embedded in order listings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartySummary {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub phone: String,
}

/// Order line with the price captured at creation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: String,
    pub order_id: String,
    pub product_id: String,
    pub quantity: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub price_at_purchase: Decimal,
    #[serde(default)]
    pub product: Option<Product>,
}

impl OrderItem {
    pub fn line_total(&self) -> Decimal {
        money::line_total(self.price_at_purchase, self.quantity)
    }
}

/// Order for a single farmer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub buyer_id: String,
    pub farmer_id: String,
    /// Snapshot at creation, never derived from live prices
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    pub status: OrderStatus,
    pub shipping_address: String,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub updated_at: Option<NaiveDateTime>,
    /// Present on `GET /orders`, absent on the creation response
    #[serde(default)]
    pub items: Vec<OrderItem>,
    #[serde(default)]
    pub buyer: Option<PartySummary>,
    #[serde(default)]
    pub farmer: Option<PartySummary>,
}

impl Order {
    /// Σ price_at_purchase × quantity over embedded items
    pub fn items_total(&self) -> Decimal {
        self.items
            .iter()
            .map(OrderItem::line_total)
            .fold(Decimal::ZERO, |acc, t| acc + t)
    }

    /// Whether the stored total agrees with the embedded items
    ///
    /// Vacuously true when items were not embedded.
    pub fn is_consistent(&self) -> bool {
        self.items.is_empty() || money::approx_eq(self.items_total(), self.total_amount)
    }
}

/// One requested line of `POST /orders`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: String,
    pub quantity: u32,
}

/// `POST /orders` payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub shipping_address: String,
    pub items: Vec<OrderLine>,
}

/// `POST /orders` response; one order per farmer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderResponse {
    pub orders: Vec<Order>,
    #[serde(default)]
    pub message: String,
}

/// `PUT /orders/{id}/status` payload
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub status: OrderStatus,
}
