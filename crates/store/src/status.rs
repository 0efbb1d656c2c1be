//! Order status state machine.

use serde::{Deserialize, Serialize};

/// The status of an order in its lifecycle.
///
/// Status transitions:
/// ```text
/// Pending ──┬──► Paid ──► Completed
///           │      │          │
///           └──────┴──────────┴──► Canceled
/// ```
///
/// Canceled is terminal. A same-status write is always permitted and is a
/// no-op; everything else not in the diagram is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Order has been placed and stock reserved, awaiting payment.
    #[default]
    Pending,

    /// Payment has been received.
    Paid,

    /// Order has been fulfilled (still cancelable, e.g. on return).
    Completed,

    /// Order was canceled and its stock restored (terminal).
    Canceled,
}

impl OrderStatus {
    /// Returns true if the lifecycle allows moving from `self` to `next`.
    ///
    /// Same-status writes are allowed as no-ops; this is what makes a
    /// generic update to `Canceled` on an already-canceled order harmless.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::{Canceled, Completed, Paid, Pending};

        match (self, next) {
            (from, to) if from == to => true,
            (Pending, Paid | Completed | Canceled) => true,
            (Paid, Completed | Canceled) => true,
            (Completed, Canceled) => true,
            _ => false,
        }
    }

    /// Returns true if no further state change is possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Canceled)
    }

    /// Returns the wire representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Paid => "paid",
            OrderStatus::Completed => "completed",
            OrderStatus::Canceled => "canceled",
        }
    }

    /// Parses a wire representation, returning `None` for unknown values.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(OrderStatus::Pending),
            "paid" => Some(OrderStatus::Paid),
            "completed" => Some(OrderStatus::Completed),
            "canceled" => Some(OrderStatus::Canceled),
            _ => None,
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
