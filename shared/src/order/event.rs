//! Order status events and the pure reducer over them

use crate::error::{AppError, ErrorCode};
use crate::models::{Order, OrderStatus};
use serde::{Deserialize, Serialize};

/// Fact acknowledged by the service about an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum OrderEvent {
    /// Status moved to `to`
    StatusAdvanced { to: OrderStatus },
}

impl OrderEvent {
    /// Event advancing `order` to its single legal successor, if any
    pub fn advance(order: &Order) -> Option<Self> {
        order.status.next().map(|to| Self::StatusAdvanced { to })
    }
}

/// Check that `to` is the single legal successor of `from`
pub fn validate_transition(from: OrderStatus, to: OrderStatus) -> Result<(), AppError> {
    match from.next() {
        Some(next) if next == to => Ok(()),
        None => Err(AppError::new(ErrorCode::OrderAlreadyDelivered)
            .with_detail("from", from.as_str())
            .with_detail("to", to.as_str())),
        Some(next) => Err(AppError::with_message(
            ErrorCode::InvalidStatusTransition,
            format!("Cannot move order from {} to {} (next is {})", from, to, next),
        )
        .with_detail("from", from.as_str())
        .with_detail("to", to.as_str())),
    }
}

/// Apply an event to an order, returning the new order
///
/// The input is never mutated; a rejected event leaves the caller's copy as is.
pub fn apply(order: &Order, event: &OrderEvent) -> Result<Order, AppError> {
    match *event {
        OrderEvent::StatusAdvanced { to } => {
            validate_transition(order.status, to)
                .map_err(|e| e.with_detail("order_id", order.id.clone()))?;
            let mut next = order.clone();
            next.status = to;
            Ok(next)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn order(status: OrderStatus) -> Order {
        Order {
            id: "o1".into(),
            buyer_id: "b1".into(),
            farmer_id: "f1".into(),
            total_amount: Decimal::from(130),
            status,
            shipping_address: "1 Farm Rd".into(),
            created_at: None,
            updated_at: None,
            items: vec![],
            buyer: None,
            farmer: None,
        }
    }

    #[test]
    fn test_walks_the_full_chain() {
        let mut current = order(OrderStatus::Pending);
        let mut seen = vec![current.status];
        while let Some(event) = OrderEvent::advance(&current) {
            current = apply(&current, &event).unwrap();
            seen.push(current.status);
        }
        assert_eq!(
            seen,
            vec![
                OrderStatus::Pending,
                OrderStatus::Confirmed,
                OrderStatus::Shipped,
                OrderStatus::Delivered
            ]
        );
    }

    #[test]
    fn test_skip_rejected() {
        let o = order(OrderStatus::Pending);
        let err = apply(
            &o,
            &OrderEvent::StatusAdvanced {
                to: OrderStatus::Shipped,
            },
        )
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidStatusTransition);
        assert_eq!(o.status, OrderStatus::Pending);
    }

    #[test]
    fn test_reverse_and_same_rejected() {
        let o = order(OrderStatus::Shipped);
        for to in [OrderStatus::Pending, OrderStatus::Confirmed, OrderStatus::Shipped] {
            let err = apply(&o, &OrderEvent::StatusAdvanced { to }).unwrap_err();
            assert_eq!(err.code, ErrorCode::InvalidStatusTransition);
        }
    }

    #[test]
    fn test_delivered_is_terminal() {
        let o = order(OrderStatus::Delivered);
        assert!(OrderEvent::advance(&o).is_none());
        let err = apply(
            &o,
            &OrderEvent::StatusAdvanced {
                to: OrderStatus::Delivered,
            },
        )
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::OrderAlreadyDelivered);
        assert_eq!(err.detail("order_id").unwrap(), "o1");
    }

    #[test]
    fn test_event_serde() {
        let json = serde_json::to_value(OrderEvent::StatusAdvanced {
            to: OrderStatus::Confirmed,
        })
        .unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "event": "status_advanced", "to": "confirmed" })
        );
    }
}
