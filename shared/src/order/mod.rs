//! Order fulfillment state machine
//!
//! - [`OrderEvent`]: facts acknowledged by the service
//! - [`apply`]: pure `(order, event) -> order` reducer
//! - [`next_action`]: what a viewer may do next, derived from status and ownership

pub mod action;
pub mod event;

// Re-exports
pub use action::{StatusAction, is_fulfiller, next_action};
pub use event::{OrderEvent, apply, validate_transition};
