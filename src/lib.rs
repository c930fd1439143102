//! # Dealer
//!
//! Single-instrument order matching engine: a bid book and an ask book in
//! strict price/time priority, a matching loop that settles limit and market
//! orders into deals, and a store that commits touched orders and deals in one
//! transaction.
//!
//! ## Entry point
//!
//! [`Engine::process_order`] applies one intent. Run the engine behind
//! [`intake::spawn`] so every intent, whether submitted directly or delivered
//! by the queue, is applied by a single writer. [`app::start`] wires the whole
//! service.
//!
//! ## Example
//!
//! ```rust
//! use dealer::{Engine, MemoryStore, Order, OrderId, Side};
//! use rust_decimal::Decimal;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let mut engine = Engine::new(Arc::new(MemoryStore::new()), Duration::from_secs(1));
//! engine
//!     .process_order(Order::limit(OrderId(1), Side::Sell, 2, Decimal::from(10)))
//!     .await
//!     .unwrap();
//! let outcome = engine
//!     .process_order(Order::market(OrderId(2), Side::Buy, 1))
//!     .await
//!     .unwrap();
//! assert_eq!(outcome.deals().len(), 1);
//! assert_eq!(outcome.deals()[0].price, Decimal::from(10));
//! # });
//! ```
//!
//! ## Lower-level API
//!
//! [`OrderBook`] and [`plan_match`] can be used directly; a plan only touches
//! the books when [`MatchPlan::apply`] is called.

pub mod api;
pub mod app;
pub mod audit;
pub mod config;
pub mod engine;
pub mod error;
pub mod execution;
pub mod intake;
pub mod market_data_gen;
pub mod matching;
pub mod order_book;
pub mod queue;
pub mod service;
pub mod store;
pub mod types;

pub use engine::{BookSnapshot, Engine, EngineStats};
pub use error::{ConfigError, EngineError, StoreError};
pub use execution::{Deal, NewDeal, Outcome};
pub use intake::EngineHandle;
pub use market_data_gen::{replay_into_engine, Generator, GeneratorConfig};
pub use matching::{plan_match, Fill, MatchPlan};
pub use order_book::{compare_priority, OrderBook};
pub use service::{OrderService, Submission};
pub use store::{FileStore, MemoryStore, OrderStore};
pub use types::{DealId, NewOrder, Order, OrderId, PriceKind, Side};
