//! Review Model

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: String,
    pub product_id: String,
    pub buyer_id: String,
    pub order_id: String,
    /// 1..=5
    pub rating: u8,
    pub text: String,
    #[serde(default)]
    pub buyer_name: Option<String>,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
}

/// `POST /reviews` payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewDraft {
    pub product_id: String,
    pub order_id: String,
    pub rating: u8,
    pub text: String,
}

impl ReviewDraft {
    pub fn is_valid_rating(&self) -> bool {
        (1..=5).contains(&self.rating)
    }
}
