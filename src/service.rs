//! Order submission: the boundary between ingress and the engine.
//!
//! New orders are validated, recorded (the store assigns the id), and sent
//! through the engine's synchronous path. A row the engine did not accept is
//! marked cancelled so it never reappears on restore. Cancels are recorded, then published
//! on the intent queue; the engine removes the order when the queue delivers.

use std::sync::Arc;

use log::{error, info, warn};

use crate::audit::{AuditEvent, AuditSink, INTENT_FAILED, ORDER_CANCEL, ORDER_SUBMIT};
use crate::error::EngineError;
use crate::execution::{Deal, Outcome};
use crate::intake::EngineHandle;
use crate::queue::{IntentMessage, QueuePublisher};
use crate::store::OrderStore;
use crate::types::{NewOrder, Order, OrderId};

/// Result of a new-order submission.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Submission {
    /// Order after matching (remaining quantity reflects fills).
    pub order: Order,
    pub deals: Vec<Deal>,
}

#[derive(Clone)]
pub struct OrderService {
    store: Arc<dyn OrderStore>,
    engine: EngineHandle,
    queue: QueuePublisher,
    audit: Arc<dyn AuditSink>,
}

impl OrderService {
    pub fn new(
        store: Arc<dyn OrderStore>,
        engine: EngineHandle,
        queue: QueuePublisher,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            store,
            engine,
            queue,
            audit,
        }
    }

    /// Records `order` and matches it. Store or engine failures are returned as-is;
    /// when matching fails the stored row is withdrawn.
    pub async fn submit(&self, order: NewOrder) -> Result<Submission, EngineError> {
        let order = self.store.insert_order(order).await?;
        let order_id = order.id;
        info!("order accepted order_id={}", order_id.0);
        let result = self.engine.process(order.clone()).await;
        if let Err(e) = &result {
            self.withdraw(order_id, e).await;
        }
        let outcome = if result.is_ok() { "success" } else { "error" };
        let detail = result.as_ref().err().map(|e| e.to_string());
        self.audit
            .emit(&AuditEvent::now(ORDER_SUBMIT, Some(order_id), outcome, detail));
        Ok(match result? {
            Outcome::Matched { order, deals } => Submission { order, deals },
            Outcome::Cancelled { .. } => Submission {
                order,
                deals: Vec::new(),
            },
        })
    }

    /// Marks the order cancelled and queues its removal from the book.
    /// Succeeds for unknown, filled, or already cancelled ids.
    pub async fn cancel(&self, order_id: OrderId) -> Result<(), EngineError> {
        self.store.mark_cancelled(order_id).await?;
        self.queue.publish(&IntentMessage::cancel(order_id)).await?;
        info!("cancel queued order_id={}", order_id.0);
        self.audit
            .emit(&AuditEvent::now(ORDER_CANCEL, Some(order_id), "success", None));
        Ok(())
    }

    async fn withdraw(&self, order_id: OrderId, cause: &EngineError) {
        warn!("order not matched order_id={}: {}; withdrawing", order_id.0, cause);
        if let Err(e) = self.store.mark_cancelled(order_id).await {
            error!("withdraw failed order_id={}: {}", order_id.0, e);
            self.audit.emit(&AuditEvent::now(
                INTENT_FAILED,
                Some(order_id),
                "error",
                Some(format!("withdraw after {}: {}", cause, e)),
            ));
        }
    }

    pub async fn order(&self, order_id: OrderId) -> Result<Option<Order>, EngineError> {
        Ok(self.store.order(order_id).await?)
    }

    pub async fn deals(&self) -> Result<Vec<Deal>, EngineError> {
        Ok(self.store.deals().await?)
    }

    pub fn engine(&self) -> &EngineHandle {
        &self.engine
    }
}
