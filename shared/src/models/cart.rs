//! Cart Model

use super::money;
use super::product::Product;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One cart line as reported by `GET /cart`
///
/// The service also sends a per-line `subtotal`; it is not kept; see
/// [`CartItem::subtotal`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: String,
    #[serde(default)]
    pub buyer_id: String,
    pub product_id: String,
    pub quantity: u32,
    /// Embedded product; `None` when the reference no longer resolves
    #[serde(default)]
    pub product: Option<Product>,
}

impl CartItem {
    /// `quantity × product.price`, or `None` without a resolved product
    pub fn subtotal(&self) -> Option<Decimal> {
        self.product
            .as_ref()
            .map(|p| money::line_total(p.price, self.quantity))
    }
}

/// Cart as reported by the service
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    #[serde(default)]
    pub items: Vec<CartItem>,
    #[serde(default, with = "rust_decimal::serde::float")]
    pub total: Decimal,
}

/// Client-side cart cache
///
/// Holds only items; the total is derived on every read so it can never
/// disagree with the visible lines.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CartSnapshot {
    items: Vec<CartItem>,
}

impl CartSnapshot {
    pub fn new(items: Vec<CartItem>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Σ subtotals over lines with a resolved product
    pub fn total(&self) -> Decimal {
        self.items
            .iter()
            .filter_map(CartItem::subtotal)
            .fold(Decimal::ZERO, |acc, s| acc + s)
    }

    pub fn item(&self, item_id: &str) -> Option<&CartItem> {
        self.items.iter().find(|i| i.id == item_id)
    }

    /// Lines whose product reference did not resolve
    pub fn unresolved(&self) -> impl Iterator<Item = &CartItem> {
        self.items.iter().filter(|i| i.product.is_none())
    }
}

impl From<Cart> for CartSnapshot {
    fn from(cart: Cart) -> Self {
        Self::new(cart.items)
    }
}

/// `POST /cart` payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddCartItem {
    pub product_id: String,
    pub quantity: u32,
}

/// `PUT /cart/{id}` payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateCartItem {
    pub quantity: u32,
}
