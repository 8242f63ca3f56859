//! Shared types for the delivery service
//!
//! Common types used by the server and its clients: error types, response
//! structures, domain models and real-time event payloads.

pub mod client;
pub mod error;
pub mod message;
pub mod models;
pub mod util;

// Re-exports
pub use error::{ApiResponse, AppError, AppResult, ErrorCode};
pub use message::{OrderEvent, Topic};
pub use models::{Identity, Order, OrderStatus, PublicUser, Role};
