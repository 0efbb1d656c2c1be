//! Shared identifier types used across the order service.

pub mod types;

pub use types::{OrderId, OrderNumber, ProductId};
