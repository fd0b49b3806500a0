//! Endpoint wrappers outside the order service seam
//!
//! Thin request/response shaping on [`HttpClient`](crate::HttpClient); no
//! business rules live here.

mod admin;
mod auth;
mod catalog;
mod notifications;
mod reviews;

pub use catalog::HealthStatus;
