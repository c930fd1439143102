//! Single-writer intake: every intent reaches the engine through one worker task.
//!
//! [`spawn`] moves the [`Engine`] into a task that drains a bounded channel and
//! runs each command to completion before taking the next. [`EngineHandle`] is
//! the cloneable sender side with two entry points:
//!
//! - [`EngineHandle::process`]: synchronous path, waits for the outcome.
//! - [`EngineHandle::enqueue`]: asynchronous path; failures are logged and
//!   audited by the worker, never retried.
//!
//! Book snapshots go through the same channel so reads never race a mutation.

use std::sync::Arc;

use log::{error, info, warn};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::audit::{AuditEvent, AuditSink, COMMIT_TIMEOUT, INTENT_FAILED};
use crate::engine::{BookSnapshot, Engine};
use crate::error::EngineError;
use crate::execution::Outcome;
use crate::types::Order;

type Reply = oneshot::Sender<Result<Outcome, EngineError>>;

enum Command {
    Process { order: Order, reply: Option<Reply> },
    Snapshot { reply: oneshot::Sender<BookSnapshot> },
}

/// Sender side of the engine's intake channel.
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<Command>,
}

impl EngineHandle {
    /// Sends an intent and waits for the engine's result.
    pub async fn process(&self, order: Order) -> Result<Outcome, EngineError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::Process {
                order,
                reply: Some(reply),
            })
            .await
            .map_err(|_| EngineError::WorkerUnavailable)?;
        rx.await.map_err(|_| EngineError::WorkerUnavailable)?
    }

    /// Queues an intent without waiting for it to be applied.
    pub async fn enqueue(&self, order: Order) -> Result<(), EngineError> {
        self.tx
            .send(Command::Process { order, reply: None })
            .await
            .map_err(|_| EngineError::WorkerUnavailable)
    }

    /// Book snapshot taken between intents.
    pub async fn snapshot(&self) -> Result<BookSnapshot, EngineError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::Snapshot { reply })
            .await
            .map_err(|_| EngineError::WorkerUnavailable)?;
        rx.await.map_err(|_| EngineError::WorkerUnavailable)
    }
}

/// Starts the worker. It stops once every handle is dropped and returns the engine.
pub fn spawn(engine: Engine, capacity: usize, audit: Arc<dyn AuditSink>) -> (EngineHandle, JoinHandle<Engine>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let worker = tokio::spawn(run(engine, rx, audit));
    (EngineHandle { tx }, worker)
}

async fn run(mut engine: Engine, mut rx: mpsc::Receiver<Command>, audit: Arc<dyn AuditSink>) -> Engine {
    info!("matching worker started");
    while let Some(command) = rx.recv().await {
        match command {
            Command::Process { order, reply } => {
                let order_id = order.id;
                let result = engine.process_order(order).await;
                if let Err(e) = &result {
                    let action = match e {
                        EngineError::CommitTimeout(_) => COMMIT_TIMEOUT,
                        _ => INTENT_FAILED,
                    };
                    audit.emit(&AuditEvent::now(action, Some(order_id), "error", Some(e.to_string())));
                }
                match reply {
                    Some(reply) => {
                        if reply.send(result).is_err() {
                            warn!("caller went away before outcome order_id={}", order_id.0);
                        }
                    }
                    None => {
                        if let Err(e) = result {
                            error!("queued intent failed order_id={}: {}", order_id.0, e);
                        }
                    }
                }
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(engine.snapshot());
            }
        }
    }
    info!("matching worker stopped");
    engine
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::InMemoryAuditSink;
    use crate::store::MemoryStore;
    use crate::types::{OrderId, Side};
    use rust_decimal::Decimal;
    use std::time::Duration;

    fn start() -> (EngineHandle, JoinHandle<Engine>, InMemoryAuditSink) {
        let _ = env_logger::try_init();
        let audit = InMemoryAuditSink::new();
        let engine = Engine::new(Arc::new(MemoryStore::new()), Duration::from_secs(1));
        let (handle, worker) = spawn(engine, 8, Arc::new(audit.clone()));
        (handle, worker, audit)
    }

    #[tokio::test]
    async fn queued_and_direct_intents_apply_in_order() {
        let (handle, worker, _) = start();
        handle
            .enqueue(Order::limit(OrderId(1), Side::Sell, 2, Decimal::from(10)))
            .await
            .unwrap();
        let outcome = handle
            .process(Order::limit(OrderId(2), Side::Buy, 1, Decimal::from(10)))
            .await
            .unwrap();
        assert_eq!(outcome.deals().len(), 1);

        handle.enqueue(Order::cancel(OrderId(1))).await.unwrap();
        let snapshot = handle.snapshot().await.unwrap();
        assert!(snapshot.asks.is_empty());
        assert_eq!(snapshot.stats.intents, 3);

        drop(handle);
        let engine = worker.await.unwrap();
        assert!(engine.book(Side::Sell).is_empty());
    }

    #[tokio::test]
    async fn queued_failure_is_audited_not_returned() {
        let (handle, _worker, audit) = start();
        let mut bad = Order::limit(OrderId(1), Side::Buy, 1, Decimal::from(10));
        bad.limit_price = None;
        handle.enqueue(bad).await.unwrap();
        handle.snapshot().await.unwrap();
        assert_eq!(audit.actions(), vec![INTENT_FAILED.to_string()]);
    }
}
