//! Product catalog model.

use chrono::{DateTime, Utc};
use common::ProductId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A product row in the inventory ledger.
///
/// `stock` is the authoritative available quantity. When a product takes
/// part in an order it is only ever read and mutated under an exclusive
/// row lock; unlocked reads are for catalog display only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    /// Unit price, non-negative, two decimal places.
    pub price: Decimal,
    /// Available units, never negative.
    pub stock: i64,
    pub created_at: DateTime<Utc>,
}

/// Fields for inserting a new product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub stock: i64,
}

/// Partial update for an existing product. `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub stock: Option<i64>,
}

impl ProductPatch {
    /// Applies the patch to a product in place.
    pub fn apply(&self, product: &mut Product) {
        if let Some(ref name) = self.name {
            product.name = name.clone();
        }
        if let Some(ref description) = self.description {
            product.description = Some(description.clone());
        }
        if let Some(price) = self.price {
            product.price = crate::checkout::round2(price);
        }
        if let Some(stock) = self.stock {
            product.stock = stock;
        }
    }
}
