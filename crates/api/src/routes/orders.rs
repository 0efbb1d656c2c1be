//! Order endpoints: creation, lookup, lifecycle changes, receipts.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::{OrderId, OrderNumber, ProductId};
use domain::{ItemRequest, NewOrder, OrderService, Receipt};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use store::{Order, OrderStatus, OrderStore};
use validator::Validate;

use crate::error::{ApiError, ApiJson};

/// Shared application state accessible from all handlers.
pub struct AppState<S: OrderStore> {
    pub orders: OrderService<S>,
}

impl<S: OrderStore> AppState<S> {
    /// Creates application state over a storage backend.
    pub fn new(store: S) -> Arc<Self> {
        Arc::new(Self {
            orders: OrderService::new(store),
        })
    }
}

// -- Request types --

#[derive(Deserialize, Validate)]
pub struct CreateOrderRequest {
    #[validate(length(max = 255))]
    pub customer_name: Option<String>,
    #[validate(email, length(max = 255))]
    pub customer_email: Option<String>,
    #[validate(length(min = 1, message = "at least one item is required"), nested)]
    pub items: Vec<OrderItemRequest>,
    pub tax: Option<Decimal>,
}

#[derive(Deserialize, Serialize, Validate)]
pub struct OrderItemRequest {
    pub product_id: i64,
    #[validate(range(min = 1))]
    pub quantity: u32,
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderWithReceipt {
    pub order: Order,
    pub receipt: Receipt,
}

#[derive(Serialize)]
pub struct CancelResponse {
    pub message: &'static str,
    pub order: Order,
}

// -- Handlers --

/// POST /orders — run the checkout transaction for a new order.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: OrderStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    ApiJson(req): ApiJson<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderWithReceipt>), ApiError> {
    req.validate()?;
    if let Some(tax) = req.tax
        && tax < Decimal::ZERO
    {
        return Err(ApiError::Validation("tax must not be negative".to_string()));
    }

    let request = NewOrder {
        customer_name: req.customer_name,
        customer_email: req.customer_email,
        items: req
            .items
            .into_iter()
            .map(|item| ItemRequest {
                product_id: ProductId::new(item.product_id),
                quantity: item.quantity,
            })
            .collect(),
        tax: req.tax,
    };

    let order = state.orders.create_order(request).await?;
    let receipt = Receipt::for_order(&order);

    Ok((StatusCode::CREATED, Json(OrderWithReceipt { order, receipt })))
}

/// GET /orders — list all orders, newest first.
#[tracing::instrument(skip(state))]
pub async fn list<S: OrderStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<Order>>, ApiError> {
    Ok(Json(state.orders.list_orders().await?))
}

/// GET /orders/:id — load an order with its receipt.
#[tracing::instrument(skip(state))]
pub async fn get<S: OrderStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<i64>,
) -> Result<Json<OrderWithReceipt>, ApiError> {
    let (order, receipt) = state
        .orders
        .get_order_with_receipt(OrderId::new(id))
        .await?;
    Ok(Json(OrderWithReceipt { order, receipt }))
}

/// PUT /orders/:id — apply a status transition.
#[tracing::instrument(skip(state, req))]
pub async fn update_status<S: OrderStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<i64>,
    ApiJson(req): ApiJson<UpdateStatusRequest>,
) -> Result<Json<Order>, ApiError> {
    let order = state
        .orders
        .update_status(OrderId::new(id), req.status)
        .await?;
    Ok(Json(order))
}

/// POST /orders/:id/cancel — cancel an order, restoring its stock.
#[tracing::instrument(skip(state))]
pub async fn cancel<S: OrderStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<i64>,
) -> Result<Json<CancelResponse>, ApiError> {
    let order = state.orders.cancel(OrderId::new(id)).await?;
    Ok(Json(CancelResponse {
        message: "Order canceled",
        order,
    }))
}

/// GET /orders/:order_number/receipt — look up a receipt by order number.
#[tracing::instrument(skip(state))]
pub async fn receipt_by_number<S: OrderStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(order_number): Path<String>,
) -> Result<Json<OrderWithReceipt>, ApiError> {
    let (order, receipt) = state
        .orders
        .receipt_by_number(&OrderNumber::new(order_number))
        .await?;
    Ok(Json(OrderWithReceipt { order, receipt }))
}
