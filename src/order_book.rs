//! One side of a single-instrument order book, kept in strict matching priority.
//!
//! Market orders rank ahead of every limit order. Among limit orders the best
//! price wins (highest for the bid book, lowest for the ask book), and equal
//! prices fall back to FIFO by order id. Orders are keyed by [`Priority`] in a
//! `BTreeMap`, so insert and top-of-book access are O(log n); an id index makes
//! cancellation O(log n) as well.

use crate::types::{Order, OrderId, Side};
use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

/// Sort key for one resting order. `Less` means higher matching priority.
#[derive(Clone, Copy, Debug)]
struct Priority {
    side: Side,
    market: bool,
    price: Decimal,
    id: OrderId,
}

impl Priority {
    fn of(side: Side, order: &Order) -> Self {
        Self {
            side,
            market: order.is_market(),
            price: order.reference_price().unwrap_or(Decimal::ZERO),
            id: order.id,
        }
    }
}

impl Ord for Priority {
    fn cmp(&self, other: &Self) -> Ordering {
        // Market first: `true` sorts ahead of `false`.
        other
            .market
            .cmp(&self.market)
            .then_with(|| {
                if self.market {
                    return Ordering::Equal;
                }
                match self.side {
                    Side::Buy => other.price.cmp(&self.price),
                    Side::Sell => self.price.cmp(&other.price),
                }
            })
            .then_with(|| self.id.cmp(&other.id))
    }
}

impl PartialOrd for Priority {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Priority {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Priority {}

/// Compares two orders as they would rank in a book on `side`.
/// `Ordering::Less` means `a` is matched before `b`.
pub fn compare_priority(side: Side, a: &Order, b: &Order) -> Ordering {
    Priority::of(side, a).cmp(&Priority::of(side, b))
}

/// Resting orders for one side of the market.
#[derive(Clone, Debug)]
pub struct OrderBook {
    side: Side,
    orders: BTreeMap<Priority, Order>,
    index: HashMap<OrderId, Priority>,
}

impl OrderBook {
    pub fn new(side: Side) -> Self {
        Self {
            side,
            orders: BTreeMap::new(),
            index: HashMap::new(),
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    /// Adds an order at its priority position. An order already resting under the
    /// same id is replaced.
    pub fn insert(&mut self, order: Order) {
        debug_assert_eq!(order.side, self.side, "order inserted into the wrong book");
        debug_assert!(order.remaining_quantity > 0, "filled order inserted into book");
        self.remove_by_id(order.id);
        let key = Priority::of(self.side, &order);
        self.index.insert(order.id, key);
        self.orders.insert(key, order);
    }

    /// Highest-priority order, if any.
    pub fn peek_top(&self) -> Option<&Order> {
        self.orders.values().next()
    }

    /// Removes and returns the highest-priority order, if any.
    pub fn dequeue_top(&mut self) -> Option<Order> {
        let (_, order) = self.orders.pop_first()?;
        self.index.remove(&order.id);
        Some(order)
    }

    /// Removes the order with `order_id`. Absent ids are a no-op so cancels stay idempotent.
    pub fn remove_by_id(&mut self, order_id: OrderId) -> Option<Order> {
        let key = self.index.remove(&order_id)?;
        self.orders.remove(&key)
    }

    pub fn get(&self, order_id: OrderId) -> Option<&Order> {
        let key = self.index.get(&order_id)?;
        self.orders.get(key)
    }

    pub fn contains(&self, order_id: OrderId) -> bool {
        self.index.contains_key(&order_id)
    }

    /// Updates the remaining quantity of a resting order in place; priority does not
    /// depend on quantity. Setting it to zero removes the order.
    /// Returns false if the order is not in this book.
    pub fn set_remaining(&mut self, order_id: OrderId, remaining: u64) -> bool {
        if remaining == 0 {
            return self.remove_by_id(order_id).is_some();
        }
        let Some(key) = self.index.get(&order_id) else {
            return false;
        };
        match self.orders.get_mut(key) {
            Some(order) => {
                order.remaining_quantity = remaining;
                true
            }
            None => false,
        }
    }

    /// Resting orders in matching priority.
    pub fn iter(&self) -> impl Iterator<Item = &Order> {
        self.orders.values()
    }

    /// Best limit price on this side (market orders have none).
    pub fn best_price(&self) -> Option<Decimal> {
        self.iter().find_map(Order::reference_price)
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn clear(&mut self) {
        self.orders.clear();
        self.index.clear();
    }
}
