use shared::models::{Analytics, ModerationStatus, Product, ProductApproval, User};

use crate::{ClientResult, HttpClient};

// ========== Admin API ==========

impl HttpClient {
    pub async fn pending_products(&self) -> ClientResult<Vec<Product>> {
        self.get("/admin/pending-products").await
    }

    /// Approve or reject a pending listing, returning the updated product
    pub async fn moderate_product(&self, product_id: &str, status: ModerationStatus) -> ClientResult<Product> {
        self.put(
            &format!("/admin/products/{}/approve", product_id),
            &ProductApproval { status },
        )
        .await
    }

    pub async fn analytics(&self) -> ClientResult<Analytics> {
        self.get("/admin/analytics").await
    }

    pub async fn users(&self) -> ClientResult<Vec<User>> {
        self.get("/admin/users").await
    }
}
