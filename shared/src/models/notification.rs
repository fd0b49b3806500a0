//! Notification Model

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Known notification types emitted by the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    NewOrder,
    OrderStatusUpdate,
    ProductApproval,
    NewProduct,
    NewReview,
}

impl NotificationKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "new_order" => Some(Self::NewOrder),
            "order_status_update" => Some(Self::OrderStatusUpdate),
            "product_approval" => Some(Self::ProductApproval),
            "new_product" => Some(Self::NewProduct),
            "new_review" => Some(Self::NewReview),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NewOrder => "new_order",
            Self::OrderStatusUpdate => "order_status_update",
            Self::ProductApproval => "product_approval",
            Self::NewProduct => "new_product",
            Self::NewReview => "new_review",
        }
    }
}

/// Notification as stored by the service and pushed over the realtime channel
///
/// Pushed payloads may omit `id`; they are built before the insert id is known.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    #[serde(default)]
    pub id: String,
    pub user_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    #[serde(default)]
    pub read: bool,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
}

impl Notification {
    pub fn new(user_id: impl Into<String>, kind: NotificationKind, message: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            user_id: user_id.into(),
            kind: kind.as_str().to_string(),
            message: message.into(),
            read: false,
            created_at: None,
        }
    }

    /// Typed view of `kind`; `None` for types this client does not know
    pub fn known_kind(&self) -> Option<NotificationKind> {
        NotificationKind::parse(&self.kind)
    }
}
