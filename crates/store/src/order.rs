//! Persisted order model.

use chrono::{DateTime, Utc};
use common::{OrderId, OrderNumber, ProductId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::status::OrderStatus;

/// A single line of an order, immutable once the order is persisted.
///
/// Name and price are snapshotted from the product at order time so that
/// historical receipts survive later catalog edits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: ProductId,
    pub name: String,
    /// Unit price at order time.
    pub price: Decimal,
    pub quantity: u32,
    /// `round(price * quantity, 2)`.
    pub line_total: Decimal,
}

/// A persisted order with its embedded line items.
///
/// Monetary invariants, maintained by the checkout path and never touched
/// afterwards: `subtotal == round(sum(line_total), 2)` and
/// `total == round(subtotal + tax, 2)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub order_number: OrderNumber,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    /// Line items in ascending product id order.
    pub items: Vec<LineItem>,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Returns the total quantity across all line items.
    pub fn total_quantity(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn order_serializes_status_and_money_fields() {
        let order = Order {
            id: OrderId::new(1),
            order_number: OrderNumber::from("ORD-20260827-120000-AB12"),
            customer_name: Some("Ada".to_string()),
            customer_email: None,
            items: vec![LineItem {
                product_id: ProductId::new(1),
                name: "Widget".to_string(),
                price: dec!(10.00),
                quantity: 5,
                line_total: dec!(50.00),
            }],
            subtotal: dec!(50.00),
            tax: dec!(2.00),
            total: dec!(52.00),
            status: OrderStatus::Pending,
            created_at: Utc::now(),
        };

        let json = serde_json::to_value(&order).unwrap();
        assert_eq!(json["status"], "pending");
        assert_eq!(json["subtotal"], "50.00");
        assert_eq!(json["items"][0]["line_total"], "50.00");
        assert_eq!(order.total_quantity(), 5);
    }

    #[test]
    fn line_items_roundtrip_through_json() {
        let items = vec![
            LineItem {
                product_id: ProductId::new(1),
                name: "Widget".to_string(),
                price: dec!(10.00),
                quantity: 2,
                line_total: dec!(20.00),
            },
            LineItem {
                product_id: ProductId::new(2),
                name: "Gadget".to_string(),
                price: dec!(3.25),
                quantity: 1,
                line_total: dec!(3.25),
            },
        ];

        let json = serde_json::to_value(&items).unwrap();
        let back: Vec<LineItem> = serde_json::from_value(json).unwrap();
        assert_eq!(back, items);
    }
}
