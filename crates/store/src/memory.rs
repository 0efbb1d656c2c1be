use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use common::{OrderId, OrderNumber, ProductId};
use tokio::sync::Mutex;

use crate::checkout::{price_items, round2};
use crate::error::{Result, StoreError};
use crate::order::Order;
use crate::order_number::{MAX_ORDER_NUMBER_ATTEMPTS, generate_order_number};
use crate::product::{NewProduct, Product, ProductPatch};
use crate::status::OrderStatus;
use crate::store::{OrderDraft, OrderStore};

#[derive(Default)]
struct Tables {
    products: BTreeMap<ProductId, Product>,
    orders: BTreeMap<OrderId, Order>,
    next_product_id: i64,
    next_order_id: i64,
}

/// In-memory store implementation for tests and database-less dev runs.
///
/// A single async mutex over both tables stands in for row locks: every
/// transactional operation holds it for its whole critical section, so
/// transactions are serialized and the same atomicity and lock-ordering
/// guarantees hold trivially. It provides the same interface as the
/// PostgreSQL implementation.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of persisted orders.
    pub async fn order_count(&self) -> usize {
        self.tables.lock().await.orders.len()
    }
}

#[async_trait]
impl OrderStore for InMemoryStore {
    async fn insert_product(&self, new: NewProduct) -> Result<Product> {
        let mut tables = self.tables.lock().await;
        tables.next_product_id += 1;
        let product = Product {
            id: ProductId::new(tables.next_product_id),
            name: new.name,
            description: new.description,
            price: round2(new.price),
            stock: new.stock,
            created_at: Utc::now(),
        };
        tables.products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        Ok(self.tables.lock().await.products.get(&id).cloned())
    }

    async fn list_products(&self) -> Result<Vec<Product>> {
        let tables = self.tables.lock().await;
        Ok(tables.products.values().rev().cloned().collect())
    }

    async fn update_product(&self, id: ProductId, patch: ProductPatch) -> Result<Option<Product>> {
        let mut tables = self.tables.lock().await;
        Ok(tables.products.get_mut(&id).map(|product| {
            patch.apply(product);
            product.clone()
        }))
    }

    async fn delete_product(&self, id: ProductId) -> Result<bool> {
        Ok(self.tables.lock().await.products.remove(&id).is_some())
    }

    async fn create_order(&self, draft: OrderDraft) -> Result<Order> {
        // Critical section: nothing else observes the tables until the
        // order and all stock decrements are in place.
        let mut tables = self.tables.lock().await;

        let priced = price_items(&tables.products, &draft.quantities)?;

        for (product_id, quantity) in &draft.quantities {
            let product = tables
                .products
                .get_mut(product_id)
                .ok_or(StoreError::ProductNotFound {
                    product_id: *product_id,
                })?;
            product.stock -= i64::from(*quantity);
        }

        let order_number = unique_order_number(&tables.orders)?;

        tables.next_order_id += 1;
        let tax = round2(draft.tax);
        let order = Order {
            id: OrderId::new(tables.next_order_id),
            order_number,
            customer_name: draft.customer_name,
            customer_email: draft.customer_email,
            items: priced.line_items,
            subtotal: priced.subtotal,
            tax,
            total: round2(priced.subtotal + tax),
            status: OrderStatus::Pending,
            created_at: Utc::now(),
        };
        tables.orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        Ok(self.tables.lock().await.orders.get(&id).cloned())
    }

    async fn get_order_by_number(&self, number: &OrderNumber) -> Result<Option<Order>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .orders
            .values()
            .find(|order| &order.order_number == number)
            .cloned())
    }

    async fn list_orders(&self) -> Result<Vec<Order>> {
        let tables = self.tables.lock().await;
        Ok(tables.orders.values().rev().cloned().collect())
    }

    async fn update_status(&self, id: OrderId, status: OrderStatus) -> Result<Option<Order>> {
        let mut tables = self.tables.lock().await;

        let Some(order) = tables.orders.get(&id).cloned() else {
            return Ok(None);
        };

        if !order.status.can_transition_to(status) {
            return Err(StoreError::InvalidTransition {
                from: order.status,
                to: status,
            });
        }

        // Restoration fires only on the actual transition into Canceled;
        // the locked status check above makes it once-per-order.
        if status == OrderStatus::Canceled && order.status != OrderStatus::Canceled {
            for item in &order.items {
                if let Some(product) = tables.products.get_mut(&item.product_id) {
                    product.stock += i64::from(item.quantity);
                }
            }
        }

        Ok(tables.orders.get_mut(&id).map(|order| {
            order.status = status;
            order.clone()
        }))
    }
}

fn unique_order_number(orders: &BTreeMap<OrderId, Order>) -> Result<OrderNumber> {
    let mut rng = rand::thread_rng();
    for _ in 0..MAX_ORDER_NUMBER_ATTEMPTS {
        let candidate = generate_order_number(Utc::now(), &mut rng);
        if !orders.values().any(|o| o.order_number == candidate) {
            return Ok(candidate);
        }
    }
    Err(StoreError::OrderNumberExhausted {
        attempts: MAX_ORDER_NUMBER_ATTEMPTS,
    })
}
