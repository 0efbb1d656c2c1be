//! Pure checkout logic shared by all storage backends.
//!
//! Backends own the transaction mechanics (locks, commits, rollbacks);
//! the stock checks and pricing live here so the two implementations
//! cannot drift apart.

use std::collections::BTreeMap;

use common::ProductId;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{Result, StoreError};
use crate::order::LineItem;
use crate::product::Product;

/// Normalizes a monetary amount to exactly two decimal places.
///
/// Midpoints round away from zero (1.005 becomes 1.01), matching the
/// arithmetic the totals invariants are stated in.
pub fn round2(amount: Decimal) -> Decimal {
    let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}

/// Merges duplicate product ids by summing their quantities.
///
/// The result is keyed by product id in ascending order; backends iterate
/// it directly to acquire row locks, which keeps the lock order fixed
/// across concurrent transactions that share products.
///
/// A merged quantity that would overflow fails the whole request: a
/// wrapped-around small quantity could otherwise pass the stock check and
/// be charged instead of what was asked for.
pub fn group_items(items: &[(ProductId, u32)]) -> Result<BTreeMap<ProductId, u32>> {
    let mut grouped: BTreeMap<ProductId, u32> = BTreeMap::new();
    for &(product_id, quantity) in items {
        let merged = grouped.entry(product_id).or_insert(0);
        *merged = merged
            .checked_add(quantity)
            .ok_or(StoreError::QuantityTooLarge { product_id })?;
    }
    Ok(grouped)
}

/// Line items and subtotal priced from a locked product snapshot.
#[derive(Debug, Clone)]
pub struct PricedItems {
    pub line_items: Vec<LineItem>,
    pub subtotal: Decimal,
}

/// Validates and prices the requested quantities against a locked snapshot.
///
/// `products` must hold exactly the rows the backend locked. Every
/// requested product must be present with sufficient stock, otherwise the
/// whole checkout fails and the backend rolls back. Prices are taken from
/// the snapshot, never from the caller.
pub fn price_items(
    products: &BTreeMap<ProductId, Product>,
    quantities: &BTreeMap<ProductId, u32>,
) -> Result<PricedItems> {
    let mut line_items = Vec::with_capacity(quantities.len());
    let mut subtotal = Decimal::ZERO;

    for (&product_id, &quantity) in quantities {
        let product = products
            .get(&product_id)
            .ok_or(StoreError::ProductNotFound { product_id })?;

        if product.stock < i64::from(quantity) {
            return Err(StoreError::InsufficientStock {
                product_id,
                name: product.name.clone(),
                requested: quantity,
                available: product.stock,
            });
        }

        let line_total = round2(product.price * Decimal::from(quantity));
        subtotal += line_total;

        line_items.push(LineItem {
            product_id,
            name: product.name.clone(),
            price: round2(product.price),
            quantity,
            line_total,
        });
    }

    Ok(PricedItems {
        line_items,
        subtotal: round2(subtotal),
    })
}
