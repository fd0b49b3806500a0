use shared::error::AppError;
use shared::models::{Review, ReviewDraft};

use crate::{ClientResult, HttpClient};

// ========== Review API ==========

impl HttpClient {
    pub async fn create_review(&self, draft: &ReviewDraft) -> ClientResult<Review> {
        if !draft.is_valid_rating() {
            return Err(AppError::validation("Rating must be between 1 and 5")
                .with_detail("rating", draft.rating)
                .into());
        }
        self.post("/reviews", draft).await
    }

    pub async fn product_reviews(&self, product_id: &str) -> ClientResult<Vec<Review>> {
        self.get(&format!("/reviews/{}", product_id)).await
    }
}
