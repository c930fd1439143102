//! Price-time priority matching.
//!
//! [`plan_match`] runs one taker against the opposite book without touching it
//! and returns a [`MatchPlan`]: the deals, every touched order with its new
//! remaining quantity, and the resulting last traded price. The engine commits
//! the plan and only then applies it with [`MatchPlan::apply`], so a failed
//! commit leaves the books as they were.

use crate::execution::NewDeal;
use crate::order_book::OrderBook;
use crate::types::Order;
use rust_decimal::Decimal;

/// One maker touched by the taker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fill {
    /// Maker after the fill (reduced `remaining_quantity`).
    pub maker: Order,
    pub quantity: u64,
    pub price: Decimal,
}

/// Staged effect of matching one taker.
#[derive(Clone, Debug)]
pub struct MatchPlan {
    /// Taker after matching.
    pub taker: Order,
    /// Fills in maker priority order. Only the last one can leave its maker resting.
    pub fills: Vec<Fill>,
    pub last_traded_price: Option<Decimal>,
    /// Matching stopped at a market maker because no trade has happened yet.
    pub deferred: bool,
}

impl MatchPlan {
    pub fn deals(&self) -> Vec<NewDeal> {
        self.fills
            .iter()
            .map(|f| NewDeal {
                taker_order_id: self.taker.id,
                maker_order_id: f.maker.id,
                quantity: f.quantity,
                price: f.price,
            })
            .collect()
    }

    /// Orders whose state must be persisted: every touched maker, then the taker.
    pub fn touched_orders(&self) -> Vec<Order> {
        let mut orders: Vec<Order> = self.fills.iter().map(|f| f.maker.clone()).collect();
        orders.push(self.taker.clone());
        orders
    }

    /// Taker should rest in its own book.
    pub fn rests(&self) -> bool {
        self.taker.remaining_quantity > 0
    }

    /// Applies the plan to the books it was computed against.
    pub fn apply(&self, maker_book: &mut OrderBook, taker_book: &mut OrderBook) {
        for fill in &self.fills {
            if fill.maker.is_filled() {
                let removed = maker_book.dequeue_top();
                debug_assert_eq!(removed.map(|o| o.id), Some(fill.maker.id));
            } else {
                maker_book.set_remaining(fill.maker.id, fill.maker.remaining_quantity);
            }
        }
        if self.rests() {
            taker_book.insert(self.taker.clone());
        }
    }
}

/// Matches `taker` against `maker_book` in priority order.
///
/// A market maker trades at `last_traded_price`; when no trade has happened yet
/// the plan stops there and is marked `deferred`. The engine rejects a deferred
/// market taker and rests a deferred limit taker. A resting limit taker can then
/// cross limit makers queued behind the market maker; the book stays crossed
/// until the next trade sets a price. A limit taker stops at the first maker
/// whose price it does not accept.
pub fn plan_match(
    taker: &Order,
    maker_book: &OrderBook,
    last_traded_price: Option<Decimal>,
) -> MatchPlan {
    let mut taker = taker.clone();
    let mut last = last_traded_price;
    let mut fills = Vec::new();
    let mut deferred = false;

    for maker in maker_book.iter() {
        let price = match maker.reference_price().or(last) {
            Some(p) => p,
            None => {
                deferred = true;
                break;
            }
        };
        if !taker.accepts(price) {
            break;
        }
        let quantity = taker.remaining_quantity.min(maker.remaining_quantity);
        last = Some(price);

        let mut maker = maker.clone();
        taker.remaining_quantity -= quantity;
        maker.remaining_quantity -= quantity;
        fills.push(Fill {
            maker,
            quantity,
            price,
        });

        if taker.remaining_quantity == 0 {
            break;
        }
    }

    MatchPlan {
        taker,
        fills,
        last_traded_price: last,
        deferred,
    }
}
