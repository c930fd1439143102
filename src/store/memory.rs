//! In-memory store. Fast and non-persistent: data is lost on restart.

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{OrderStore, Tables};
use crate::error::StoreResult;
use crate::execution::{Deal, NewDeal};
use crate::types::{NewOrder, Order, OrderId};

/// Tables behind one lock; each commit runs under a single acquisition.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn insert_order(&self, order: NewOrder) -> StoreResult<Order> {
        Ok(self.tables.lock().await.insert_order(order))
    }

    async fn mark_cancelled(&self, order_id: OrderId) -> StoreResult<()> {
        self.tables.lock().await.mark_cancelled(order_id);
        Ok(())
    }

    async fn commit(&self, orders: &[Order], deals: &[NewDeal]) -> StoreResult<Vec<Deal>> {
        self.tables.lock().await.commit(orders, deals)
    }

    async fn order(&self, order_id: OrderId) -> StoreResult<Option<Order>> {
        Ok(self.tables.lock().await.order(order_id))
    }

    async fn deals(&self) -> StoreResult<Vec<Deal>> {
        Ok(self.tables.lock().await.deals())
    }

    async fn resting_orders(&self) -> StoreResult<Vec<Order>> {
        Ok(self.tables.lock().await.resting_orders())
    }

    async fn last_deal(&self) -> StoreResult<Option<Deal>> {
        Ok(self.tables.lock().await.last_deal())
    }
}
