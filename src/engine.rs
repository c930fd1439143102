//! Single-entry matching engine.
//!
//! Owns the bid and ask books, the last traded price, and a handle to the
//! store. [`Engine::process_order`] applies one intent: cancels touch only the
//! books; new orders are matched as a staged plan, committed, and applied to
//! the books only after the commit succeeds.
//!
//! The engine is not synchronized. Run it behind a single writer (see
//! [`crate::intake`]).

use crate::error::EngineError;
use crate::execution::Outcome;
use crate::matching::plan_match;
use crate::order_book::OrderBook;
use crate::store::OrderStore;
use crate::types::{Order, OrderId, Side};
use log::{error, info, warn};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;

/// Counters exposed through [`BookSnapshot`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct EngineStats {
    pub intents: u64,
    pub deals: u64,
    pub commit_failures: u64,
    /// Commits that timed out: the store may hold state the books do not.
    pub suspected_divergences: u64,
    /// Limit takers that stopped at a market maker because nothing has traded yet.
    pub deferred_market_matches: u64,
    /// Market takers rejected for the same reason.
    pub rejected_market_orders: u64,
}

/// Point-in-time view of both books, in matching priority.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct BookSnapshot {
    pub bids: Vec<Order>,
    pub asks: Vec<Order>,
    pub last_traded_price: Option<Decimal>,
    pub stats: EngineStats,
}

/// Single-instrument matching engine.
pub struct Engine {
    buy_book: OrderBook,
    sell_book: OrderBook,
    last_traded_price: Option<Decimal>,
    store: Arc<dyn OrderStore>,
    commit_timeout: Duration,
    stats: EngineStats,
}

impl Engine {
    /// Creates an engine with empty books. Commits are bounded by `commit_timeout`.
    pub fn new(store: Arc<dyn OrderStore>, commit_timeout: Duration) -> Self {
        Self {
            buy_book: OrderBook::new(Side::Buy),
            sell_book: OrderBook::new(Side::Sell),
            last_traded_price: None,
            store,
            commit_timeout,
            stats: EngineStats::default(),
        }
    }

    /// Creates an engine and rebuilds its books and last traded price from the store.
    pub async fn restore(store: Arc<dyn OrderStore>, commit_timeout: Duration) -> Result<Self, EngineError> {
        let resting = store.resting_orders().await?;
        let last_deal = store.last_deal().await?;
        let mut engine = Self::new(store, commit_timeout);
        let count = resting.len();
        for order in resting {
            engine.book_mut(order.side).insert(order);
        }
        engine.last_traded_price = last_deal.map(|d| d.price);
        info!(
            "engine restored resting_orders={} last_traded_price={:?}",
            count, engine.last_traded_price
        );
        Ok(engine)
    }

    /// Applies one intent.
    ///
    /// Returns `Err` for an invalid order, a market order with no price to trade
    /// at, a failed commit, or a commit timeout (store state unknown). The books
    /// are untouched in every case.
    pub async fn process_order(&mut self, order: Order) -> Result<Outcome, EngineError> {
        self.stats.intents += 1;
        if order.cancel_requested {
            let removed = self.cancel_order(order.id);
            return Ok(Outcome::Cancelled {
                order_id: order.id,
                removed,
            });
        }
        order.validate()?;
        info!(
            "order received order_id={} side={:?} quantity={} price_kind={:?} limit_price={:?}",
            order.id.0, order.side, order.quantity, order.price_kind, order.limit_price
        );

        let plan = plan_match(&order, self.book(order.side.opposite()), self.last_traded_price);
        if plan.deferred {
            if order.is_market() {
                self.stats.rejected_market_orders += 1;
                warn!("market order rejected before first trade order_id={}", order.id.0);
                return Err(EngineError::NoReferencePrice(order.id));
            }
            self.stats.deferred_market_matches += 1;
            warn!(
                "market maker skipped before first trade order_id={}, taker rests",
                order.id.0
            );
        }

        let touched = plan.touched_orders();
        let new_deals = plan.deals();
        let commit = self.store.commit(&touched, &new_deals);
        let deals = match tokio::time::timeout(self.commit_timeout, commit).await {
            Ok(Ok(deals)) => deals,
            Ok(Err(e)) => {
                self.stats.commit_failures += 1;
                error!("commit failed order_id={} deals={}: {}", order.id.0, new_deals.len(), e);
                return Err(e.into());
            }
            Err(_) => {
                self.stats.commit_failures += 1;
                self.stats.suspected_divergences += 1;
                error!(
                    "commit timed out order_id={} after {:?}; store may diverge from book",
                    order.id.0, self.commit_timeout
                );
                return Err(EngineError::CommitTimeout(self.commit_timeout));
            }
        };

        let (maker_book, taker_book) = self.books_mut(order.side);
        plan.apply(maker_book, taker_book);
        self.last_traded_price = plan.last_traded_price;
        self.stats.deals += deals.len() as u64;
        for deal in &deals {
            info!(
                "deal deal_id={} taker_order={} maker_order={} price={} quantity={}",
                deal.id.0, deal.taker_order_id.0, deal.maker_order_id.0, deal.price, deal.quantity
            );
        }
        if plan.rests() {
            info!(
                "order resting order_id={} remaining={}",
                plan.taker.id.0, plan.taker.remaining_quantity
            );
        }
        Ok(Outcome::Matched {
            order: plan.taker,
            deals,
        })
    }

    /// Removes a resting order from whichever book holds it. Returns `true` if one did.
    pub fn cancel_order(&mut self, order_id: OrderId) -> bool {
        let removed = self.buy_book.remove_by_id(order_id).is_some()
            | self.sell_book.remove_by_id(order_id).is_some();
        if removed {
            info!("order canceled order_id={}", order_id.0);
        }
        removed
    }

    pub fn book(&self, side: Side) -> &OrderBook {
        match side {
            Side::Buy => &self.buy_book,
            Side::Sell => &self.sell_book,
        }
    }

    fn book_mut(&mut self, side: Side) -> &mut OrderBook {
        match side {
            Side::Buy => &mut self.buy_book,
            Side::Sell => &mut self.sell_book,
        }
    }

    /// (maker book, taker book) for a taker on `side`.
    fn books_mut(&mut self, side: Side) -> (&mut OrderBook, &mut OrderBook) {
        match side {
            Side::Buy => (&mut self.sell_book, &mut self.buy_book),
            Side::Sell => (&mut self.buy_book, &mut self.sell_book),
        }
    }

    pub fn last_traded_price(&self) -> Option<Decimal> {
        self.last_traded_price
    }

    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    pub fn snapshot(&self) -> BookSnapshot {
        BookSnapshot {
            bids: self.buy_book.iter().cloned().collect(),
            asks: self.sell_book.iter().cloned().collect(),
            last_traded_price: self.last_traded_price,
            stats: self.stats,
        }
    }
}
