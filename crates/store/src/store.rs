use std::collections::BTreeMap;

use async_trait::async_trait;
use common::{OrderId, OrderNumber, ProductId};
use rust_decimal::Decimal;

use crate::error::Result;
use crate::order::Order;
use crate::product::{NewProduct, Product, ProductPatch};
use crate::status::OrderStatus;

/// A validated, already-grouped order ready for the checkout transaction.
///
/// `quantities` holds one entry per distinct product (duplicates merged by
/// `checkout::group_items`); its ascending-id iteration order is the lock
/// acquisition order inside backends.
#[derive(Debug, Clone)]
pub struct OrderDraft {
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub quantities: BTreeMap<ProductId, u32>,
    /// Caller-supplied tax amount, already checked non-negative.
    pub tax: Decimal,
}

/// Core trait for order/inventory storage backends.
///
/// `create_order` and `update_status` are the two transactional operations:
/// each runs as a single atomic unit, locking affected rows in ascending
/// product id order and leaving no partial mutation behind on failure.
/// The remaining methods are plain reads and catalog CRUD.
///
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait OrderStore: Send + Sync {
    // -- Products --

    /// Inserts a new product and returns the stored row.
    async fn insert_product(&self, new: NewProduct) -> Result<Product>;

    /// Fetches a product by id. Unlocked; for display only.
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>>;

    /// Lists all products, newest first. Unlocked; for display only.
    async fn list_products(&self) -> Result<Vec<Product>>;

    /// Applies a partial update; returns the updated row, or `None` if the
    /// product does not exist.
    async fn update_product(&self, id: ProductId, patch: ProductPatch) -> Result<Option<Product>>;

    /// Deletes a product; returns false if it did not exist.
    async fn delete_product(&self, id: ProductId) -> Result<bool>;

    // -- Orders --

    /// Runs the checkout transaction for a draft order.
    ///
    /// Atomically: locks the distinct products in ascending id order,
    /// validates existence and stock against the locked snapshot, prices
    /// the line items from that snapshot, decrements stock, generates a
    /// unique order number, and persists the order as `Pending`. Any
    /// failure rolls the whole unit back.
    async fn create_order(&self, draft: OrderDraft) -> Result<Order>;

    /// Fetches an order by id.
    async fn get_order(&self, id: OrderId) -> Result<Option<Order>>;

    /// Fetches an order by its order number.
    async fn get_order_by_number(&self, number: &OrderNumber) -> Result<Option<Order>>;

    /// Lists all orders, newest first.
    async fn list_orders(&self) -> Result<Vec<Order>>;

    /// Applies a status transition under the order's row lock.
    ///
    /// Atomically: loads the order exclusively, validates the transition
    /// against the lifecycle table (`InvalidTransition` on a disallowed
    /// move; same-status writes are no-ops), restores stock for every line
    /// item iff the order moves into `Canceled` from a non-canceled state,
    /// then writes the status. Returns `None` if the order does not exist.
    ///
    /// The locked status check is the single guard that makes stock
    /// restoration fire exactly once per order, regardless of which entry
    /// point requested the cancellation.
    async fn update_status(&self, id: OrderId, status: OrderStatus) -> Result<Option<Order>>;
}
