//! Synthetic intent generator.
//!
//! Deterministic, configurable stream of new-order and cancel intents for replay
//! tests, property tests, and benchmarks. Same seed ⇒ same sequence.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;

use crate::engine::Engine;
use crate::error::EngineError;
use crate::types::{Order, OrderId, Side};

/// Configuration for the generator. All ranges are inclusive.
#[derive(Clone, Debug)]
pub struct GeneratorConfig {
    pub seed: u64,
    /// Number of intents produced by [`Generator::all_orders`].
    pub num_orders: usize,
    /// Probability of Buy (0.0..=1.0). Sell otherwise.
    pub buy_ratio: f64,
    /// Probability of Limit (0.0..=1.0). Market otherwise.
    pub limit_ratio: f64,
    /// Probability that an intent cancels an earlier order instead of placing one.
    pub cancel_ratio: f64,
    /// Limit price range in ticks.
    pub price_min: i64,
    pub price_max: i64,
    /// Decimal places of the generated prices (tick = 10^-price_scale).
    pub price_scale: u32,
    pub quantity_min: u64,
    pub quantity_max: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            num_orders: 1000,
            buy_ratio: 0.5,
            limit_ratio: 0.9,
            cancel_ratio: 0.05,
            price_min: 9_500,
            price_max: 10_500,
            price_scale: 2,
            quantity_min: 1,
            quantity_max: 100,
        }
    }
}

/// Deterministic intent stream.
pub struct Generator {
    rng: StdRng,
    config: GeneratorConfig,
    next_order_id: u64,
}

impl Generator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self {
            rng: StdRng::seed_from_u64(config.seed),
            config,
            next_order_id: 1,
        }
    }

    /// Next intent. Cancels only target ids already issued.
    pub fn next_order(&mut self) -> Order {
        let issued = self.next_order_id - 1;
        if issued > 0 && self.rng.gen::<f64>() < self.config.cancel_ratio {
            return Order::cancel(OrderId(self.rng.gen_range(1..=issued)));
        }

        let id = OrderId(self.next_order_id);
        self.next_order_id += 1;
        let side = if self.rng.gen::<f64>() < self.config.buy_ratio {
            Side::Buy
        } else {
            Side::Sell
        };
        let quantity = self
            .rng
            .gen_range(self.config.quantity_min..=self.config.quantity_max);
        if self.rng.gen::<f64>() < self.config.limit_ratio {
            let ticks = self
                .rng
                .gen_range(self.config.price_min..=self.config.price_max);
            Order::limit(id, side, quantity, Decimal::new(ticks, self.config.price_scale))
        } else {
            Order::market(id, side, quantity)
        }
    }

    pub fn take_orders(&mut self, n: usize) -> Vec<Order> {
        (0..n).map(|_| self.next_order()).collect()
    }

    pub fn all_orders(&mut self) -> Vec<Order> {
        self.take_orders(self.config.num_orders)
    }
}

/// Replays intents into the engine in order. Returns the total number of deals,
/// or the first error. Market orders rejected for lack of a reference price are skipped.
pub async fn replay_into_engine(
    engine: &mut Engine,
    orders: impl IntoIterator<Item = Order>,
) -> Result<usize, EngineError> {
    let mut total_deals = 0;
    for order in orders {
        match engine.process_order(order).await {
            Ok(outcome) => total_deals += outcome.deals().len(),
            Err(EngineError::NoReferencePrice(_)) => {}
            Err(e) => return Err(e),
        }
    }
    Ok(total_deals)
}
