//! File-backed store: all tables in one pretty-printed JSON file.
//!
//! Every write goes to a sibling temp file that is then renamed over the
//! original, so a failed write leaves the previous state on disk. The in-memory
//! copy is only replaced after the rename succeeds.

use async_trait::async_trait;
use log::info;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use super::{OrderStore, Tables};
use crate::error::StoreResult;
use crate::execution::{Deal, NewDeal};
use crate::types::{NewOrder, Order, OrderId};

#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    tables: Mutex<Tables>,
}

impl FileStore {
    /// Opens the store at `path`, starting empty if the file does not exist.
    pub async fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        let tables = match tokio::fs::read_to_string(&path).await {
            Ok(data) => serde_json::from_str(&data)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Tables::default(),
            Err(e) => return Err(e.into()),
        };
        info!("file store opened path={}", path.display());
        Ok(Self {
            path,
            tables: Mutex::new(tables),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn save(&self, tables: &Tables) -> StoreResult<()> {
        let json = serde_json::to_vec_pretty(tables)?;
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    /// Applies `change` to a copy of the tables, persists the copy, then swaps it in.
    async fn write<T>(&self, change: impl FnOnce(&mut Tables) -> StoreResult<T>) -> StoreResult<T> {
        let mut tables = self.tables.lock().await;
        let mut staged = tables.clone();
        let out = change(&mut staged)?;
        self.save(&staged).await?;
        *tables = staged;
        Ok(out)
    }
}

#[async_trait]
impl OrderStore for FileStore {
    async fn insert_order(&self, order: NewOrder) -> StoreResult<Order> {
        self.write(|t| Ok(t.insert_order(order))).await
    }

    async fn mark_cancelled(&self, order_id: OrderId) -> StoreResult<()> {
        self.write(|t| {
            t.mark_cancelled(order_id);
            Ok(())
        })
        .await
    }

    async fn commit(&self, orders: &[Order], deals: &[NewDeal]) -> StoreResult<Vec<Deal>> {
        self.write(|t| t.commit(orders, deals)).await
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PriceKind, Side};
    use rust_decimal::Decimal;

    fn new_limit(side: Side, qty: u64, price: i64) -> NewOrder {
        NewOrder {
            side,
            quantity: qty,
            price_kind: PriceKind::Limit,
            limit_price: Some(Decimal::from(price)),
        }
    }

    #[tokio::test]
    async fn open_missing_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().join("dealer.json")).await.unwrap();
        assert!(store.resting_orders().await.unwrap().is_empty());
        assert!(store.last_deal().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn state_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dealer.json");
        let store = FileStore::open(&path).await.unwrap();
        let maker = store.insert_order(new_limit(Side::Sell, 2, 10)).await.unwrap();
        let taker = store.insert_order(new_limit(Side::Buy, 1, 10)).await.unwrap();
        let mut maker_after = maker.clone();
        maker_after.remaining_quantity = 1;
        let mut taker_after = taker.clone();
        taker_after.remaining_quantity = 0;
        let deal = NewDeal {
            taker_order_id: taker.id,
            maker_order_id: maker.id,
            quantity: 1,
            price: Decimal::from(10),
        };
        store.commit(&[maker_after, taker_after], &[deal]).await.unwrap();
        drop(store);

        let reopened = FileStore::open(&path).await.unwrap();
        let resting = reopened.resting_orders().await.unwrap();
        assert_eq!(resting.len(), 1);
        assert_eq!(resting[0].id, maker.id);
        assert_eq!(resting[0].remaining_quantity, 1);
        assert_eq!(reopened.last_deal().await.unwrap().map(|d| d.price), Some(Decimal::from(10)));
        assert_eq!(
            reopened.insert_order(new_limit(Side::Buy, 1, 1)).await.unwrap().id,
            OrderId(3)
        );
    }

    #[tokio::test]
    async fn failed_write_keeps_previous_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dealer.json");
        let store = FileStore::open(&path).await.unwrap();
        let order = store.insert_order(new_limit(Side::Sell, 2, 10)).await.unwrap();

        // Occupy the temp path with a directory so the write fails.
        std::fs::create_dir(path.with_extension("tmp")).unwrap();
        let mut touched = order.clone();
        touched.remaining_quantity = 1;
        assert!(store.commit(&[touched], &[]).await.is_err());

        assert_eq!(store.order(order.id).await.unwrap().unwrap().remaining_quantity, 2);
        let reopened = FileStore::open(&path).await.unwrap();
        assert_eq!(reopened.order(order.id).await.unwrap().unwrap().remaining_quantity, 2);
    }
}
