//! Service-level error types.

use common::{OrderId, OrderNumber};
use store::StoreError;
use thiserror::Error;

/// Errors that can occur during service operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// A malformed request, rejected before any locking begins.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// No order with the given id.
    #[error("Order {0} not found")]
    OrderNotFound(OrderId),

    /// No order with the given order number.
    #[error("Order {0} not found")]
    OrderNumberNotFound(OrderNumber),

    /// Dedicated cancel on an order that is already canceled.
    #[error("Order {order_number} is already canceled")]
    AlreadyCanceled { order_number: OrderNumber },

    /// An error from the storage layer.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl DomainError {
    /// Returns true if the caller may retry the whole operation.
    pub fn is_retryable(&self) -> bool {
        match self {
            DomainError::Store(err) => err.is_retryable(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_storage_failures_are_retryable() {
        assert!(!DomainError::Validation("items must not be empty".into()).is_retryable());
        assert!(!DomainError::OrderNotFound(OrderId::new(1)).is_retryable());
        assert!(
            DomainError::Store(StoreError::OrderNumberExhausted { attempts: 16 }).is_retryable()
        );
    }
}
