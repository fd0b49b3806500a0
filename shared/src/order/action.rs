//! Next available fulfillment action for a viewer

use crate::models::{Order, OrderStatus, Role, User};

/// Action a viewer may take on an order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusAction {
    pub label: &'static str,
    pub target: OrderStatus,
}

impl StatusAction {
    /// Forward step offered from `status`; none once delivered
    pub fn from_status(status: OrderStatus) -> Option<Self> {
        let (label, target) = match status {
            OrderStatus::Pending => ("Confirm Order", OrderStatus::Confirmed),
            OrderStatus::Confirmed => ("Mark as Shipped", OrderStatus::Shipped),
            OrderStatus::Shipped => ("Mark as Delivered", OrderStatus::Delivered),
            OrderStatus::Delivered => return None,
        };
        Some(Self { label, target })
    }
}

/// Whether `viewer` is the farmer fulfilling `order`
pub fn is_fulfiller(order: &Order, viewer: &User) -> bool {
    viewer.role == Role::Farmer && viewer.id == order.farmer_id
}

/// The single action available to `viewer`
///
/// Only the owning farmer of an undelivered order gets one; everybody else
/// has read-only access.
pub fn next_action(order: &Order, viewer: &User) -> Option<StatusAction> {
    if !is_fulfiller(order, viewer) {
        return None;
    }
    StatusAction::from_status(order.status)
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
            total_amount: Decimal::ONE,
            status,
            shipping_address: "x".into(),
            created_at: None,
            updated_at: None,
            items: vec![],
            buyer: None,
            farmer: None,
        }
    }

    fn user(id: &str, role: Role) -> User {
        User {
            id: id.into(),
            email: format!("{id}@example.com"),
            name: id.into(),
            phone: String::new(),
            role,
            address: None,
            created_at: None,
        }
    }

    #[test]
    fn test_owner_gets_next_step() {
        let farmer = user("f1", Role::Farmer);
        let action = next_action(&order(OrderStatus::Pending), &farmer).unwrap();
        assert_eq!(action.target, OrderStatus::Confirmed);
        assert_eq!(action.label, "Confirm Order");

        let action = next_action(&order(OrderStatus::Shipped), &farmer).unwrap();
        assert_eq!(action.target, OrderStatus::Delivered);
    }

    #[test]
    fn test_action_target_is_next_status() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Confirmed,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
        ] {
            assert_eq!(StatusAction::from_status(status).map(|a| a.target), status.next());
        }
    }

    #[test]
    fn test_delivered_has_no_action() {
        assert!(next_action(&order(OrderStatus::Delivered), &user("f1", Role::Farmer)).is_none());
    }

    #[test]
    fn test_non_owners_are_read_only() {
        let o = order(OrderStatus::Pending);
        assert!(next_action(&o, &user("f2", Role::Farmer)).is_none());
        assert!(next_action(&o, &user("b1", Role::Buyer)).is_none());
        assert!(next_action(&o, &user("a1", Role::Admin)).is_none());
    }
}
