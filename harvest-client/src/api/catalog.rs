use serde::{Deserialize, Serialize};
use shared::models::{MessageResponse, Order, Product, ProductDraft, ProductPatch, ProductQuery};

use crate::{ClientResult, HttpClient};

/// `GET /health` body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}

// ========== Product API ==========

impl HttpClient {
    /// Browse the catalogue (approved listings unless `query.status` says otherwise)
    pub async fn list_products(&self, query: &ProductQuery) -> ClientResult<Vec<Product>> {
        self.get_query("/products", query).await
    }

    pub async fn get_product(&self, product_id: &str) -> ClientResult<Product> {
        self.get(&format!("/products/{}", product_id)).await
    }

    /// Listings of the signed-in farmer, any moderation status
    pub async fn farmer_products(&self) -> ClientResult<Vec<Product>> {
        self.get("/farmer/products").await
    }

    /// Create a listing; it starts out pending moderation
    pub async fn create_product(&self, draft: &ProductDraft) -> ClientResult<Product> {
        self.post("/products", draft).await
    }

    pub async fn update_product(&self, product_id: &str, patch: &ProductPatch) -> ClientResult<Product> {
        self.put(&format!("/products/{}", product_id), patch).await
    }

    pub async fn delete_product(&self, product_id: &str) -> ClientResult<String> {
        let response: MessageResponse = self.delete(&format!("/products/{}", product_id)).await?;
        Ok(response.message)
    }

    /// Single order with embedded items and parties
    pub async fn get_order(&self, order_id: &str) -> ClientResult<Order> {
        self.get(&format!("/orders/{}", order_id)).await
    }

    pub async fn health(&self) -> ClientResult<HealthStatus> {
        self.get("/health").await
    }
}
