//! Error types for the engine, its store, and configuration.

use std::time::Duration;

use rust_decimal::Decimal;
use thiserror::Error;

use crate::types::OrderId;

/// Errors raised while validating or processing one order intent.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("invalid side: {0}")]
    InvalidSide(String),

    #[error("invalid price kind: {0}")]
    InvalidPriceKind(String),

    #[error("quantity must be positive and not exceed the original quantity")]
    InvalidQuantity,

    #[error("limit order must have a price")]
    MissingLimitPrice,

    #[error("invalid limit price: {0}")]
    InvalidPrice(Decimal),

    #[error("cancel intent must carry an order id")]
    MissingOrderId,

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// The commit did not finish in time; its effect on the store is unknown.
    #[error("commit timed out after {0:?}")]
    CommitTimeout(Duration),

    /// A market order met a market maker before anything has traded.
    #[error("no reference price for market order {0:?}: nothing has traded yet")]
    NoReferencePrice(OrderId),

    #[error("intent queue error: {0}")]
    Queue(String),

    #[error("matching worker is not running")]
    WorkerUnavailable,
}

impl EngineError {
    /// Validation failures are the caller's fault and never reach the books.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            EngineError::InvalidSide(_)
                | EngineError::InvalidPriceKind(_)
                | EngineError::InvalidQuantity
                | EngineError::MissingLimitPrice
                | EngineError::InvalidPrice(_)
                | EngineError::MissingOrderId
        )
    }
}

/// Errors raised by an [`crate::store::OrderStore`] backend.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An upsert would leave more remaining quantity than the stored row was opened with.
    #[error("order {0:?} conflicts with stored row")]
    Conflict(OrderId),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised while reading configuration from the environment.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}
