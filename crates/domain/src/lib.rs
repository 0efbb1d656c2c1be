//! Service layer for the order system.
//!
//! This crate provides:
//! - `OrderService`, the entry point for order creation and lifecycle
//!   changes, generic over the storage backend
//! - `Receipt`, the pure receipt formatter
//! - the service-level error taxonomy

pub mod error;
pub mod receipt;
pub mod service;

pub use error::DomainError;
pub use receipt::Receipt;
pub use service::{ItemRequest, NewOrder, OrderService};
