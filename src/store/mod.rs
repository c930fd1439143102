//! Persistence gateway: durable orders and deals.
//!
//! [`OrderStore`] is the boundary the engine and the ingress commit through.
//! Both backends share [`Tables`], which implements the row semantics once:
//! orders keyed by id with upsert-on-commit, deals append-only with
//! store-assigned ids.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use std::collections::BTreeMap;

use crate::error::{StoreError, StoreResult};
use crate::execution::{Deal, NewDeal};
use crate::types::{DealId, NewOrder, Order, OrderId};

/// Storage for orders and deals.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Records a new order and assigns its id.
    async fn insert_order(&self, order: NewOrder) -> StoreResult<Order>;

    /// Flags the order as cancelled. Unknown, filled, or already cancelled ids are not an error.
    async fn mark_cancelled(&self, order_id: OrderId) -> StoreResult<()>;

    /// In one transaction: upsert `orders` (existing rows only get `remaining_quantity`
    /// updated) and insert `deals`. Nothing is visible if any part fails.
    async fn commit(&self, orders: &[Order], deals: &[NewDeal]) -> StoreResult<Vec<Deal>>;

    async fn order(&self, order_id: OrderId) -> StoreResult<Option<Order>>;

    /// All deals in id order.
    async fn deals(&self) -> StoreResult<Vec<Deal>>;

    /// Orders that should be resting: remaining quantity left and not cancelled, in id order.
    async fn resting_orders(&self) -> StoreResult<Vec<Order>>;

    async fn last_deal(&self) -> StoreResult<Option<Deal>>;
}

/// Order and deal rows plus id sequences.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Tables {
    orders: BTreeMap<u64, Order>,
    deals: Vec<Deal>,
    next_order_id: u64,
    next_deal_id: u64,
}

impl Default for Tables {
    fn default() -> Self {
        Self {
            orders: BTreeMap::new(),
            deals: Vec::new(),
            next_order_id: 1,
            next_deal_id: 1,
        }
    }
}

impl Tables {
    pub fn insert_order(&mut self, order: NewOrder) -> Order {
        let id = OrderId(self.next_order_id);
        self.next_order_id += 1;
        let order = order.into_order(id);
        self.orders.insert(id.0, order.clone());
        order
    }

    pub fn mark_cancelled(&mut self, order_id: OrderId) {
        if let Some(row) = self.orders.get_mut(&order_id.0) {
            row.cancel_requested = true;
        }
    }

    /// Validates every row first, then writes, so an error leaves the tables untouched.
    pub fn commit(&mut self, orders: &[Order], deals: &[NewDeal]) -> StoreResult<Vec<Deal>> {
        for order in orders {
            let quantity = match self.orders.get(&order.id.0) {
                Some(row) => row.quantity,
                None => order.quantity,
            };
            if order.remaining_quantity > quantity {
                return Err(StoreError::Conflict(order.id));
            }
        }

        for order in orders {
            match self.orders.get_mut(&order.id.0) {
                Some(row) => row.remaining_quantity = order.remaining_quantity,
                None => {
                    self.orders.insert(order.id.0, order.clone());
                    self.next_order_id = self.next_order_id.max(order.id.0 + 1);
                }
            }
        }

        let committed: Vec<Deal> = deals
            .iter()
            .map(|deal| {
                let id = DealId(self.next_deal_id);
                self.next_deal_id += 1;
                deal.clone().with_id(id)
            })
            .collect();
        self.deals.extend(committed.iter().cloned());
        Ok(committed)
    }

    pub fn order(&self, order_id: OrderId) -> Option<Order> {
        self.orders.get(&order_id.0).cloned()
    }

    pub fn deals(&self) -> Vec<Deal> {
        self.deals.clone()
    }

    pub fn resting_orders(&self) -> Vec<Order> {
        self.orders
            .values()
            .filter(|o| o.remaining_quantity > 0 && !o.cancel_requested)
            .cloned()
            .collect()
    }

    pub fn last_deal(&self) -> Option<Deal> {
        self.deals.last().cloned()
    }
}
