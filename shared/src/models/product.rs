//! Product Model

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Moderation state of a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModerationStatus {
    Pending,
    Approved,
    Rejected,
}

impl ModerationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

/// Contact summary of the listing farmer (embedded by the service)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FarmerSummary {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub phone: String,
}

/// Product listing (read-only snapshot on the client)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub farmer_id: String,
    pub name: String,
    pub category: String,
    /// Unit price
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    /// Available stock
    pub quantity: u32,
    #[serde(default)]
    pub description: String,
    /// Base64 encoded images (opaque)
    #[serde(default)]
    pub images: Vec<String>,
    pub status: ModerationStatus,
    #[serde(default)]
    pub avg_rating: f64,
    #[serde(default)]
    pub review_count: u32,
    #[serde(default)]
    pub farmer: Option<FarmerSummary>,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub updated_at: Option<NaiveDateTime>,
}

impl Product {
    pub fn is_approved(&self) -> bool {
        self.status == ModerationStatus::Approved
    }
}

/// Create product payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductDraft {
    pub name: String,
    pub category: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub quantity: u32,
    pub description: String,
    #[serde(default)]
    pub images: Vec<String>,
}

/// Update product payload (only present fields are sent)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option"
    )]
    pub price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
}

/// Catalogue filter for `GET /products`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option"
    )]
    pub min_price: Option<Decimal>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option"
    )]
    pub max_price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ModerationStatus>,
}

impl ProductQuery {
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn price_range(mut self, min: Option<Decimal>, max: Option<Decimal>) -> Self {
        self.min_price = min;
        self.max_price = max;
        self
    }

    pub fn status(mut self, status: ModerationStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Whether a product passes this filter
    pub fn matches(&self, product: &Product) -> bool {
        let status = self.status.unwrap_or(ModerationStatus::Approved);
        product.status == status
            && self.category.as_ref().is_none_or(|c| &product.category == c)
            && self.min_price.is_none_or(|min| product.price >= min)
            && self.max_price.is_none_or(|max| product.price <= max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn product(category: &str, price: &str, status: ModerationStatus) -> Product {
        Product {
            id: "p1".into(),
            farmer_id: "f1".into(),
            name: "Tomatoes".into(),
            category: category.into(),
            price: Decimal::from_str(price).unwrap(),
            quantity: 10,
            description: String::new(),
            images: vec![],
            status,
            avg_rating: 0.0,
            review_count: 0,
            farmer: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_price_decodes_from_json_number() {
        let json = r#"{
            "id": "p1", "farmer_id": "f1", "name": "Kale", "category": "vegetables",
            "price": 12.5, "quantity": 3, "status": "approved"
        }"#;
        let p: Product = serde_json::from_str(json).unwrap();
        assert_eq!(p.price, Decimal::from_str("12.5").unwrap());
        assert!(p.is_approved());

        let back = serde_json::to_value(&p).unwrap();
        assert_eq!(back["price"], serde_json::json!(12.5));
    }

    #[test]
    fn test_patch_skips_absent_fields() {
        let patch = ProductPatch {
            quantity: Some(4),
            ..Default::default()
        };
        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(json, serde_json::json!({ "quantity": 4 }));
    }

    #[test]
    fn test_query_matches_defaults_to_approved() {
        let q = ProductQuery::default();
        assert!(q.matches(&product("fruit", "3", ModerationStatus::Approved)));
        assert!(!q.matches(&product("fruit", "3", ModerationStatus::Pending)));

        let q = ProductQuery::default()
            .category("fruit")
            .price_range(Some(Decimal::from(2)), Some(Decimal::from(5)));
        assert!(q.matches(&product("fruit", "5", ModerationStatus::Approved)));
        assert!(!q.matches(&product("fruit", "5.01", ModerationStatus::Approved)));
        assert!(!q.matches(&product("grain", "3", ModerationStatus::Approved)));
    }
}
