//! Payment Model

use serde::{Deserialize, Serialize};

/// Result of `POST /payment/process`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentResult {
    pub success: bool,
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl PaymentResult {
    pub fn approved(transaction_id: impl Into<String>) -> Self {
        Self {
            success: true,
            transaction_id: Some(transaction_id.into()),
            message: Some("Payment processed successfully".into()),
        }
    }

    pub fn declined(message: impl Into<String>) -> Self {
        Self {
            success: false,
            transaction_id: None,
            message: Some(message.into()),
        }
    }
}
