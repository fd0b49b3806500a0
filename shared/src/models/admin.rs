//! Admin Models

use super::product::ModerationStatus;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Marketplace totals from `GET /admin/analytics`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Analytics {
    pub total_users: u64,
    pub total_farmers: u64,
    pub total_buyers: u64,
    pub total_products: u64,
    pub approved_products: u64,
    pub pending_products: u64,
    pub total_orders: u64,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_revenue: Decimal,
}

/// `PUT /admin/products/{id}/approve` payload
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProductApproval {
    pub status: ModerationStatus,
}
