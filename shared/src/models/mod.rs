//! Data models
//!
//! Shared between delivery-server and its clients (via API).
//! All IDs are UUID strings; timestamps are Unix milliseconds.

pub mod order;
pub mod user;

// Re-exports
pub use order::*;
pub use user::*;
