//! PostgreSQL integration tests.
//!
//! These tests use a shared PostgreSQL container and need a local Docker
//! daemon, so they are ignored by default. Run with:
//!
//! ```bash
//! cargo test -p store --test postgres_integration -- --ignored --test-threads=1
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use common::ProductId;
use rust_decimal_macros::dec;
use sqlx::PgPool;
use store::{
    NewProduct, OrderDraft, OrderStatus, OrderStore, PostgresStore, ProductPatch, StoreError,
};
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            let temp_pool = PgPool::connect(&connection_string).await.unwrap();
            sqlx::raw_sql(include_str!("../../../migrations/001_create_products.sql"))
                .execute(&temp_pool)
                .await
                .unwrap();
            sqlx::raw_sql(include_str!("../../../migrations/002_create_orders.sql"))
                .execute(&temp_pool)
                .await
                .unwrap();
            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh store with its own pool and cleared tables
async fn get_test_store() -> PostgresStore {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(8)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query("TRUNCATE TABLE orders, products RESTART IDENTITY")
        .execute(&pool)
        .await
        .unwrap();

    PostgresStore::new(pool)
}

async fn seed_product(store: &PostgresStore, name: &str, price: &str, stock: i64) -> ProductId {
    store
        .insert_product(NewProduct {
            name: name.to_string(),
            description: None,
            price: price.parse().unwrap(),
            stock,
        })
        .await
        .unwrap()
        .id
}

fn draft(product_id: ProductId, quantity: u32) -> OrderDraft {
    OrderDraft {
        customer_name: Some("Ada Lovelace".to_string()),
        customer_email: Some("ada@example.com".to_string()),
        quantities: BTreeMap::from([(product_id, quantity)]),
        tax: dec!(2.00),
    }
}

#[tokio::test]
#[ignore = "requires a local Docker daemon"]
async fn product_crud_roundtrip() {
    let store = get_test_store().await;
    let id = seed_product(&store, "Widget", "10.00", 5).await;

    let product = store.get_product(id).await.unwrap().unwrap();
    assert_eq!(product.name, "Widget");
    assert_eq!(product.price, dec!(10.00));
    assert_eq!(product.stock, 5);

    let updated = store
        .update_product(
            id,
            ProductPatch {
                stock: Some(9),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.stock, 9);
    assert_eq!(updated.name, "Widget");

    assert!(store.delete_product(id).await.unwrap());
    assert!(store.get_product(id).await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires a local Docker daemon"]
async fn checkout_commits_order_and_decrement_together() {
    let store = get_test_store().await;
    let id = seed_product(&store, "Widget", "10.00", 5).await;

    let order = store.create_order(draft(id, 5)).await.unwrap();

    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.subtotal, dec!(50.00));
    assert_eq!(order.tax, dec!(2.00));
    assert_eq!(order.total, dec!(52.00));
    assert!(order.order_number.as_str().starts_with("ORD-"));
    assert_eq!(store.get_product(id).await.unwrap().unwrap().stock, 0);

    let reloaded = store.get_order(order.id).await.unwrap().unwrap();
    assert_eq!(reloaded, order);
    let by_number = store
        .get_order_by_number(&order.order_number)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(by_number.id, order.id);
}

#[tokio::test]
#[ignore = "requires a local Docker daemon"]
async fn failed_checkout_rolls_back_everything() {
    let store = get_test_store().await;
    let id = seed_product(&store, "Widget", "10.00", 2).await;

    let err = store.create_order(draft(id, 3)).await.unwrap_err();
    assert!(matches!(err, StoreError::InsufficientStock { .. }));

    assert_eq!(store.get_product(id).await.unwrap().unwrap().stock, 2);
    assert!(store.list_orders().await.unwrap().is_empty());
}

#[tokio::test]
#[ignore = "requires a local Docker daemon"]
async fn cancel_restores_stock_and_further_transitions_conflict() {
    let store = get_test_store().await;
    let id = seed_product(&store, "Widget", "10.00", 5).await;
    let order = store.create_order(draft(id, 4)).await.unwrap();

    let canceled = store
        .update_status(order.id, OrderStatus::Canceled)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(canceled.status, OrderStatus::Canceled);
    assert_eq!(store.get_product(id).await.unwrap().unwrap().stock, 5);

    // No-op re-cancel must not restore again.
    store
        .update_status(order.id, OrderStatus::Canceled)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(store.get_product(id).await.unwrap().unwrap().stock, 5);

    let err = store
        .update_status(order.id, OrderStatus::Paid)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidTransition { .. }));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore = "requires a local Docker daemon"]
async fn concurrent_checkouts_against_one_row_never_oversell() {
    let store = get_test_store().await;
    let id = seed_product(&store, "Widget", "10.00", 5).await;

    let mut handles = Vec::new();
    for _ in 0..10 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store
                .create_order(OrderDraft {
                    customer_name: None,
                    customer_email: None,
                    quantities: BTreeMap::from([(id, 1)]),
                    tax: dec!(0),
                })
                .await
        }));
    }

    let mut succeeded = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => succeeded += 1,
            Err(StoreError::InsufficientStock { .. }) => {}
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    assert_eq!(succeeded, 5);
    assert_eq!(store.get_product(id).await.unwrap().unwrap().stock, 0);
}
