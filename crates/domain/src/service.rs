//! Order service: creation, lookup, and lifecycle changes.

use common::{OrderId, OrderNumber, ProductId};
use rust_decimal::Decimal;
use store::{Order, OrderDraft, OrderStatus, OrderStore, StoreError, checkout};

use crate::error::DomainError;
use crate::receipt::Receipt;

/// One requested order line, before duplicate merging.
#[derive(Debug, Clone)]
pub struct ItemRequest {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// A validated-at-the-boundary order creation request.
///
/// The service re-checks the core constraints itself before touching
/// storage, so it stays safe when driven directly rather than through the
/// HTTP layer.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub items: Vec<ItemRequest>,
    pub tax: Option<Decimal>,
}

impl NewOrder {
    fn validate(&self) -> Result<(), DomainError> {
        if self.items.is_empty() {
            return Err(DomainError::Validation(
                "order must contain at least one item".to_string(),
            ));
        }
        for item in &self.items {
            if item.quantity == 0 {
                return Err(DomainError::Validation(format!(
                    "quantity for product {} must be at least 1",
                    item.product_id
                )));
            }
        }
        if let Some(tax) = self.tax
            && tax < Decimal::ZERO
        {
            return Err(DomainError::Validation(
                "tax must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}

/// Service for managing orders.
///
/// Wraps a storage backend and provides the order-creation and lifecycle
/// operations; the storage backend owns the transactional mechanics.
pub struct OrderService<S: OrderStore> {
    store: S,
}

impl<S: OrderStore> OrderService<S> {
    /// Creates a new order service with the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Creates an order: validates the request, merges duplicate items,
    /// and runs the checkout transaction.
    #[tracing::instrument(skip(self, request))]
    pub async fn create_order(&self, request: NewOrder) -> Result<Order, DomainError> {
        request.validate()?;

        let pairs: Vec<(ProductId, u32)> = request
            .items
            .iter()
            .map(|item| (item.product_id, item.quantity))
            .collect();

        let draft = OrderDraft {
            customer_name: request.customer_name,
            customer_email: request.customer_email,
            quantities: checkout::group_items(&pairs)?,
            tax: request.tax.unwrap_or(Decimal::ZERO),
        };

        let order = self.store.create_order(draft).await.inspect_err(|err| {
            if matches!(err, StoreError::InsufficientStock { .. }) {
                metrics::counter!("stock_insufficient_total").increment(1);
            }
        })?;

        metrics::counter!("orders_created_total").increment(1);
        tracing::info!(
            order_number = %order.order_number,
            total = %order.total,
            "order created"
        );
        Ok(order)
    }

    /// Lists all orders, newest first.
    #[tracing::instrument(skip(self))]
    pub async fn list_orders(&self) -> Result<Vec<Order>, DomainError> {
        Ok(self.store.list_orders().await?)
    }

    /// Loads an order by id.
    #[tracing::instrument(skip(self))]
    pub async fn get_order(&self, id: OrderId) -> Result<Order, DomainError> {
        self.store
            .get_order(id)
            .await?
            .ok_or(DomainError::OrderNotFound(id))
    }

    /// Loads an order by id together with its receipt.
    pub async fn get_order_with_receipt(
        &self,
        id: OrderId,
    ) -> Result<(Order, Receipt), DomainError> {
        let order = self.get_order(id).await?;
        let receipt = Receipt::for_order(&order);
        Ok((order, receipt))
    }

    /// Loads an order by its order number together with its receipt.
    #[tracing::instrument(skip(self))]
    pub async fn receipt_by_number(
        &self,
        number: &OrderNumber,
    ) -> Result<(Order, Receipt), DomainError> {
        let order = self
            .store
            .get_order_by_number(number)
            .await?
            .ok_or_else(|| DomainError::OrderNumberNotFound(number.clone()))?;
        let receipt = Receipt::for_order(&order);
        Ok((order, receipt))
    }

    /// Applies a status transition.
    ///
    /// The store validates the transition and restores stock under the
    /// order row lock when the order moves into `Canceled`; a repeated
    /// `Canceled` write through this generic path is a harmless no-op.
    #[tracing::instrument(skip(self))]
    pub async fn update_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, DomainError> {
        let order = self
            .store
            .update_status(id, status)
            .await?
            .ok_or(DomainError::OrderNotFound(id))?;

        tracing::info!(order_number = %order.order_number, status = %order.status, "order status updated");
        Ok(order)
    }

    /// Cancels an order, restoring its stock.
    ///
    /// Unlike the generic status update, the dedicated cancel entry point
    /// rejects an already-canceled order with a conflict.
    #[tracing::instrument(skip(self))]
    pub async fn cancel(&self, id: OrderId) -> Result<Order, DomainError> {
        let order = self.get_order(id).await?;
        if order.status == OrderStatus::Canceled {
            return Err(DomainError::AlreadyCanceled {
                order_number: order.order_number,
            });
        }

        let order = self.update_status(id, OrderStatus::Canceled).await?;
        metrics::counter!("orders_canceled_total").increment(1);
        Ok(order)
    }
}
