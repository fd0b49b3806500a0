//! Harvest Mock - in-process stand-ins for the marketplace service
//!
//! [`InMemoryMarket`] implements the client's `OrderService` with the
//! service's rules; [`MemoryHub`] is the realtime server behind it. Used by
//! the client's integration tests and demos, never shipped with the client.

pub mod hub;
pub mod market;

pub use hub::{MemoryConnector, MemoryHub, MemoryTransport};
pub use market::InMemoryMarket;
