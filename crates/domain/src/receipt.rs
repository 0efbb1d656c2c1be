//! Receipt formatting.

use rust_decimal::Decimal;
use serde::Serialize;
use store::{LineItem, Order};

const SEPARATOR_WIDTH: usize = 30;

/// A human-readable receipt plus its numeric summary, derived from a
/// persisted order.
///
/// Pure and side-effect-free: building a receipt never fails and never
/// touches storage, so receipts can be produced for any order the store
/// hands back.
#[derive(Debug, Clone, Serialize)]
pub struct Receipt {
    /// Multi-line text receipt.
    pub text: String,
    /// The order's line items, as charged.
    pub items: Vec<LineItem>,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

impl Receipt {
    /// Derives a receipt from a persisted order.
    pub fn for_order(order: &Order) -> Self {
        let separator = "-".repeat(SEPARATOR_WIDTH);
        let mut lines = vec![format!("Receipt #{}", order.order_number)];

        if let Some(ref name) = order.customer_name {
            lines.push(format!("Customer: {name}"));
        }
        if let Some(ref email) = order.customer_email {
            lines.push(format!("Email: {email}"));
        }
        lines.push(format!("Status: {}", order.status));
        lines.push(format!(
            "Date: {}",
            order.created_at.format("%Y-%m-%d %H:%M:%S")
        ));
        lines.push(separator.clone());

        for item in &order.items {
            lines.push(format!(
                "{} x{} @ {} = {}",
                item.name, item.quantity, item.price, item.line_total
            ));
        }

        lines.push(separator);
        lines.push(format!("Subtotal: {}", order.subtotal));
        lines.push(format!("Tax: {}", order.tax));
        lines.push(format!("Total: {}", order.total));

        Self {
            text: lines.join("\n"),
            items: order.items.clone(),
            subtotal: order.subtotal,
            tax: order.tax,
            total: order.total,
        }
    }
}
