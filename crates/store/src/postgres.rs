use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use common::{OrderId, OrderNumber, ProductId};
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::checkout::{price_items, round2};
use crate::error::{Result, StoreError};
use crate::order::{LineItem, Order};
use crate::order_number::{MAX_ORDER_NUMBER_ATTEMPTS, generate_order_number};
use crate::product::{NewProduct, Product, ProductPatch};
use crate::status::OrderStatus;
use crate::store::{OrderDraft, OrderStore};

/// PostgreSQL-backed store implementation.
///
/// Row locks are taken with `SELECT ... FOR UPDATE` in ascending product
/// id order, and every transactional operation commits or rolls back as
/// one unit.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store on an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_product(row: PgRow) -> Result<Product> {
        Ok(Product {
            id: ProductId::new(row.try_get("id")?),
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            price: row.try_get("price")?,
            stock: row.try_get("stock")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_order(row: PgRow) -> Result<Order> {
        let items_json: serde_json::Value = row.try_get("items")?;
        let items: Vec<LineItem> = serde_json::from_value(items_json)?;

        let status_str: String = row.try_get("status")?;
        let status = OrderStatus::parse(&status_str).ok_or_else(|| {
            StoreError::Database(sqlx::Error::Decode(
                format!("unknown order status: {status_str}").into(),
            ))
        })?;

        Ok(Order {
            id: OrderId::new(row.try_get("id")?),
            order_number: OrderNumber::new(row.try_get::<String, _>("order_number")?),
            customer_name: row.try_get("customer_name")?,
            customer_email: row.try_get("customer_email")?,
            items,
            subtotal: row.try_get("subtotal")?,
            tax: row.try_get("tax")?,
            total: row.try_get("total")?,
            status,
            created_at: row.try_get("created_at")?,
        })
    }
}

const ORDER_COLUMNS: &str = "id, order_number, customer_name, customer_email, items, \
                             subtotal, tax, total, status, created_at";

#[async_trait]
impl OrderStore for PostgresStore {
    async fn insert_product(&self, new: NewProduct) -> Result<Product> {
        let row = sqlx::query(
            r#"
            INSERT INTO products (name, description, price, stock)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, description, price, stock, created_at
            "#,
        )
        .bind(&new.name)
        .bind(&new.description)
        .bind(round2(new.price))
        .bind(new.stock)
        .fetch_one(&self.pool)
        .await?;

        Self::row_to_product(row)
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        let row = sqlx::query(
            "SELECT id, name, description, price, stock, created_at FROM products WHERE id = $1",
        )
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_product).transpose()
    }

    async fn list_products(&self) -> Result<Vec<Product>> {
        let rows = sqlx::query(
            "SELECT id, name, description, price, stock, created_at FROM products ORDER BY id DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_product).collect()
    }

    async fn update_product(&self, id: ProductId, patch: ProductPatch) -> Result<Option<Product>> {
        let row = sqlx::query(
            r#"
            UPDATE products
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                price = COALESCE($4, price),
                stock = COALESCE($5, stock)
            WHERE id = $1
            RETURNING id, name, description, price, stock, created_at
            "#,
        )
        .bind(id.as_i64())
        .bind(&patch.name)
        .bind(&patch.description)
        .bind(patch.price.map(round2))
        .bind(patch.stock)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_product).transpose()
    }

    async fn delete_product(&self, id: ProductId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.as_i64())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn create_order(&self, draft: OrderDraft) -> Result<Order> {
        let mut tx = self.pool.begin().await?;

        // Lock exactly the distinct products referenced, in ascending id
        // order so concurrent orders sharing products cannot deadlock.
        let ids: Vec<i64> = draft.quantities.keys().map(|id| id.as_i64()).collect();
        let rows = sqlx::query(
            r#"
            SELECT id, name, description, price, stock, created_at
            FROM products
            WHERE id = ANY($1)
            ORDER BY id
            FOR UPDATE
            "#,
        )
        .bind(&ids)
        .fetch_all(&mut *tx)
        .await?;

        let mut locked: BTreeMap<ProductId, Product> = BTreeMap::new();
        for row in rows {
            let product = Self::row_to_product(row)?;
            locked.insert(product.id, product);
        }

        // All availability checks and pricing run against the locked
        // snapshot, never against anything read before the lock.
        let priced = price_items(&locked, &draft.quantities)?;

        for (product_id, quantity) in &draft.quantities {
            sqlx::query("UPDATE products SET stock = stock - $1 WHERE id = $2")
                .bind(i64::from(*quantity))
                .bind(product_id.as_i64())
                .execute(&mut *tx)
                .await?;
        }

        let mut order_number = None;
        for _ in 0..MAX_ORDER_NUMBER_ATTEMPTS {
            // Scoped so the rng is not held across the await.
            let candidate = {
                let mut rng = rand::thread_rng();
                generate_order_number(Utc::now(), &mut rng)
            };

            let exists: bool =
                sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM orders WHERE order_number = $1)")
                    .bind(candidate.as_str())
                    .fetch_one(&mut *tx)
                    .await?;

            if !exists {
                order_number = Some(candidate);
                break;
            }
        }
        let order_number = order_number.ok_or(StoreError::OrderNumberExhausted {
            attempts: MAX_ORDER_NUMBER_ATTEMPTS,
        })?;

        let tax = round2(draft.tax);
        let total = round2(priced.subtotal + tax);
        let items_json = serde_json::to_value(&priced.line_items)?;

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO orders (order_number, customer_name, customer_email, items,
                                subtotal, tax, total, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(order_number.as_str())
        .bind(&draft.customer_name)
        .bind(&draft.customer_email)
        .bind(&items_json)
        .bind(priced.subtotal)
        .bind(tax)
        .bind(total)
        .bind(OrderStatus::Pending.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            // Two same-second transactions can pass the EXISTS check with
            // the same candidate; the unique index breaks the tie and the
            // loser reports a retryable failure.
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.constraint() == Some("unique_order_number")
            {
                return StoreError::OrderNumberExhausted {
                    attempts: MAX_ORDER_NUMBER_ATTEMPTS,
                };
            }
            StoreError::Database(e)
        })?;

        let order = Self::row_to_order(row)?;
        tx.commit().await?;
        tracing::debug!(
            order_id = order.id.as_i64(),
            order_number = %order.order_number,
            products = ids.len(),
            "checkout committed"
        );
        Ok(order)
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_order).transpose()
    }

    async fn get_order_by_number(&self, number: &OrderNumber) -> Result<Option<Order>> {
        let row = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE order_number = $1"
        ))
        .bind(number.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_order).transpose()
    }

    async fn list_orders(&self) -> Result<Vec<Order>> {
        let rows = sqlx::query(&format!("SELECT {ORDER_COLUMNS} FROM orders ORDER BY id DESC"))
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Self::row_to_order).collect()
    }

    async fn update_status(&self, id: OrderId, status: OrderStatus) -> Result<Option<Order>> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 FOR UPDATE"
        ))
        .bind(id.as_i64())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let mut order = Self::row_to_order(row)?;

        if !order.status.can_transition_to(status) {
            return Err(StoreError::InvalidTransition {
                from: order.status,
                to: status,
            });
        }

        // Restoration fires only on the actual transition into Canceled.
        // The order row lock above is the single guard that makes it
        // once-per-order, whichever entry point asked for the cancel.
        if status == OrderStatus::Canceled && order.status != OrderStatus::Canceled {
            let mut items: Vec<&LineItem> = order.items.iter().collect();
            items.sort_by_key(|item| item.product_id);

            for item in items {
                // UPDATE takes the product row lock; a since-deleted
                // product restores nothing, matching the decrement no
                // longer having anything to undo.
                sqlx::query("UPDATE products SET stock = stock + $1 WHERE id = $2")
                    .bind(i64::from(item.quantity))
                    .bind(item.product_id.as_i64())
                    .execute(&mut *tx)
                    .await?;
            }
        }

        sqlx::query("UPDATE orders SET status = $2 WHERE id = $1")
            .bind(id.as_i64())
            .bind(status.as_str())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::debug!(order_id = id.as_i64(), status = %status, "status transition committed");
        order.status = status;
        Ok(Some(order))
    }
}
