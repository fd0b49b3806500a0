//! Shared types for the Harvest marketplace client
//!
//! Wire models, the unified error system, the order status state machine
//! and the realtime channel packet codec. No I/O lives here.

pub mod error;
pub mod message;
pub mod models;
pub mod order;

// Re-exports
pub use http;
pub use serde::{Deserialize, Serialize};

pub use error::{AppError, AppResult, ErrorCategory, ErrorCode};
pub use message::{ChannelEvent, Packet};
