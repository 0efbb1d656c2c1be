//! Storage layer for the order service.
//!
//! This crate owns the persisted data model (products, orders, line items)
//! and the transactional core around it:
//! - `OrderStore` trait for storage backends
//! - pure checkout helpers (duplicate grouping, stock checks, pricing)
//! - order number generation
//! - in-memory and PostgreSQL implementations
//!
//! Both backends run order creation and cancellation as single atomic
//! units: product rows are locked in ascending id order, checked and
//! mutated under the lock, and either everything commits or nothing does.

pub mod checkout;
pub mod error;
pub mod memory;
pub mod order;
pub mod order_number;
pub mod postgres;
pub mod product;
pub mod status;
pub mod store;

pub use checkout::{PricedItems, group_items, price_items, round2};
pub use error::{Result, StoreError};
pub use memory::InMemoryStore;
pub use order::{LineItem, Order};
pub use order_number::generate_order_number;
pub use postgres::PostgresStore;
pub use product::{NewProduct, Product, ProductPatch};
pub use status::OrderStatus;
pub use store::{OrderDraft, OrderStore};
