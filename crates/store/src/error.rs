use common::ProductId;
use thiserror::Error;

use crate::status::OrderStatus;

/// Errors that can occur when interacting with the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A product referenced by an order does not exist in the locked set.
    #[error("Product {product_id} not found")]
    ProductNotFound { product_id: ProductId },

    /// Locked stock is below the requested quantity.
    #[error("Insufficient stock for {name}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: ProductId,
        name: String,
        requested: u32,
        available: i64,
    },

    /// Merged duplicate quantities overflowed the representable range.
    #[error("Total quantity for product {product_id} is too large")]
    QuantityTooLarge { product_id: ProductId },

    /// A status change that the lifecycle table does not allow.
    #[error("Cannot transition order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// Unique order number generation kept colliding.
    #[error("Could not generate a unique order number after {attempts} attempts")]
    OrderNumberExhausted { attempts: u32 },

    /// An error from the underlying database.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Failed to (de)serialize persisted line items.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    /// Returns true if the caller may retry the whole operation.
    ///
    /// Semantic failures (missing product, insufficient stock, disallowed
    /// transition) will fail the same way again; transient storage failures
    /// will not.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            StoreError::Database(_) | StoreError::OrderNumberExhausted { .. }
        )
    }
}

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
