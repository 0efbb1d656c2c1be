//! Order number generation.

use chrono::{DateTime, Utc};
use common::OrderNumber;
use rand::Rng;

/// Alphabet for the random suffix: uppercase alphanumerics.
const SUFFIX_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Length of the random suffix.
const SUFFIX_LEN: usize = 4;

/// How many candidates a backend tries before giving up with
/// `OrderNumberExhausted`. Collisions require a same-second order with the
/// same suffix, so in practice the first candidate wins.
pub const MAX_ORDER_NUMBER_ATTEMPTS: u32 = 16;

/// Generates an order number candidate: `ORD-YYYYMMDD-HHMMSS-XXXX`.
///
/// The format is a stable external contract. Candidates are not unique by
/// construction; backends check uniqueness against the order table and
/// retry on collision.
pub fn generate_order_number(now: DateTime<Utc>, rng: &mut impl Rng) -> OrderNumber {
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| {
            let idx = rng.gen_range(0..SUFFIX_CHARSET.len());
            SUFFIX_CHARSET[idx] as char
        })
        .collect();

    OrderNumber::new(format!("ORD-{}-{}", now.format("%Y%m%d-%H%M%S"), suffix))
}
