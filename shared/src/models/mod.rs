//! Data models
//!
//! Wire types for the marketplace REST API and realtime channel.
//! All IDs are opaque `String`s issued by the service; money is `Decimal`.

pub mod admin;
pub mod auth;
pub mod cart;
pub mod money;
pub mod notification;
pub mod order;
pub mod payment;
pub mod product;
pub mod review;
pub mod user;

// Re-exports
pub use admin::*;
pub use auth::*;
pub use cart::*;
pub use notification::*;
pub use order::*;
pub use payment::*;
pub use product::*;
pub use review::*;
pub use user::*;
