//! Product catalog CRUD endpoints.
//!
//! Plain catalog management; reads here are unlocked and non-authoritative
//! for order decisions, which always re-read under row locks.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::ProductId;
use rust_decimal::Decimal;
use serde::Deserialize;
use store::{NewProduct, OrderStore, Product, ProductPatch};
use validator::Validate;

use crate::error::{ApiError, ApiJson};
use crate::routes::orders::AppState;

// -- Request types --

#[derive(Deserialize, Validate)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub stock: i64,
}

#[derive(Deserialize, Validate, Default)]
pub struct UpdateProductRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub stock: Option<i64>,
}

fn check_price(price: Decimal) -> Result<(), ApiError> {
    if price < Decimal::ZERO {
        return Err(ApiError::Validation("price must not be negative".to_string()));
    }
    Ok(())
}

fn check_stock(stock: i64) -> Result<(), ApiError> {
    if stock < 0 {
        return Err(ApiError::Validation("stock must not be negative".to_string()));
    }
    Ok(())
}

// -- Handlers --

/// POST /products — add a product to the catalog.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: OrderStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    ApiJson(req): ApiJson<CreateProductRequest>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    req.validate()?;
    check_price(req.price)?;
    check_stock(req.stock)?;

    let product = state
        .orders
        .store()
        .insert_product(NewProduct {
            name: req.name,
            description: req.description,
            price: req.price,
            stock: req.stock,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(product)))
}

/// GET /products — list the catalog, newest first.
#[tracing::instrument(skip(state))]
pub async fn list<S: OrderStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<Product>>, ApiError> {
    Ok(Json(state.orders.store().list_products().await?))
}

/// GET /products/:id — fetch a single product.
#[tracing::instrument(skip(state))]
pub async fn get<S: OrderStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<i64>,
) -> Result<Json<Product>, ApiError> {
    let product = state
        .orders
        .store()
        .get_product(ProductId::new(id))
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Product {id} not found")))?;
    Ok(Json(product))
}

/// PUT /products/:id — partially update a product.
#[tracing::instrument(skip(state, req))]
pub async fn update<S: OrderStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<i64>,
    ApiJson(req): ApiJson<UpdateProductRequest>,
) -> Result<Json<Product>, ApiError> {
    req.validate()?;
    if let Some(price) = req.price {
        check_price(price)?;
    }
    if let Some(stock) = req.stock {
        check_stock(stock)?;
    }

    let product = state
        .orders
        .store()
        .update_product(
            ProductId::new(id),
            ProductPatch {
                name: req.name,
                description: req.description,
                price: req.price,
                stock: req.stock,
            },
        )
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Product {id} not found")))?;
    Ok(Json(product))
}

/// DELETE /products/:id — remove a product from the catalog.
#[tracing::instrument(skip(state))]
pub async fn delete<S: OrderStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let deleted = state
        .orders
        .store()
        .delete_product(ProductId::new(id))
        .await?;
    if !deleted {
        return Err(ApiError::NotFound(format!("Product {id} not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}
