//! API error types with HTTP response mapping.

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::DomainError;
use store::StoreError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Malformed request fields, rejected at the boundary.
    Validation(String),
    /// Resource not found.
    NotFound(String),
    /// Service-layer error.
    Domain(DomainError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Domain(err) => domain_error_to_response(err),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn domain_error_to_response(err: DomainError) -> (StatusCode, String) {
    match &err {
        DomainError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, err.to_string()),
        DomainError::OrderNotFound(_) | DomainError::OrderNumberNotFound(_) => {
            (StatusCode::NOT_FOUND, err.to_string())
        }
        DomainError::AlreadyCanceled { .. } => (StatusCode::CONFLICT, err.to_string()),
        DomainError::Store(store_err) => match store_err {
            // Checkout failures are request problems, as is an order that
            // names a product the catalog does not have.
            StoreError::ProductNotFound { .. }
            | StoreError::InsufficientStock { .. }
            | StoreError::QuantityTooLarge { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, err.to_string())
            }
            StoreError::InvalidTransition { .. } => (StatusCode::CONFLICT, err.to_string()),
            StoreError::Database(_)
            | StoreError::OrderNumberExhausted { .. }
            | StoreError::Serialization(_) => {
                tracing::error!(error = %err, "storage failure");
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
        },
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Domain(DomainError::Store(err))
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiError::Validation(errors.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

/// JSON body extractor whose rejections use the standard error body.
///
/// The stock `Json` extractor answers a malformed body (bad syntax, an
/// unknown status string) with a plain-text response; this wrapper routes
/// the rejection through `ApiError` so every failure on the API looks the
/// same to clients.
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    S: Send + Sync,
    axum::Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let axum::Json(value) = axum::Json::from_request(req, state).await?;
        Ok(Self(value))
    }
}
