//! Deals and per-intent outcomes.
//!
//! A [`NewDeal`] is produced by matching; the store assigns its [`DealId`] on
//! commit and hands back the write-once [`Deal`].

use crate::types::{DealId, Order, OrderId};
use rust_decimal::Decimal;

/// A trade produced by the matching loop, not yet committed.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct NewDeal {
    pub taker_order_id: OrderId,
    pub maker_order_id: OrderId,
    pub quantity: u64,
    pub price: Decimal,
}

impl NewDeal {
    pub fn with_id(self, id: DealId) -> Deal {
        Deal {
            id,
            taker_order_id: self.taker_order_id,
            maker_order_id: self.maker_order_id,
            quantity: self.quantity,
            price: self.price,
        }
    }
}

/// Committed trade between a taker and a maker.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Deal {
    pub id: DealId,
    pub taker_order_id: OrderId,
    pub maker_order_id: OrderId,
    pub quantity: u64,
    pub price: Decimal,
}

/// Result of applying one intent to the book.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Outcome {
    /// New order processed: `order` is the taker after matching.
    Matched { order: Order, deals: Vec<Deal> },
    /// Cancel processed. `removed` is false when no book held the id.
    Cancelled { order_id: OrderId, removed: bool },
}

impl Outcome {
    pub fn deals(&self) -> &[Deal] {
        match self {
            Outcome::Matched { deals, .. } => deals,
            Outcome::Cancelled { .. } => &[],
        }
    }
}
