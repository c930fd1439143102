//! Wires store, engine worker, intent queue, and REST router together.

use std::sync::Arc;

use axum::Router;
use tokio::task::JoinHandle;

use crate::api;
use crate::audit::AuditSink;
use crate::config::Config;
use crate::engine::Engine;
use crate::error::EngineError;
use crate::intake::{self, EngineHandle};
use crate::queue;
use crate::service::OrderService;
use crate::store::{FileStore, MemoryStore, OrderStore};

/// A running dealer: the router to serve plus the background tasks.
pub struct App {
    pub router: Router<()>,
    pub service: OrderService,
    pub worker: JoinHandle<Engine>,
    pub consumer: JoinHandle<usize>,
}

impl App {
    pub fn engine(&self) -> &EngineHandle {
        self.service.engine()
    }
}

/// Opens the store named by `config`.
pub async fn open_store(config: &Config) -> Result<Arc<dyn OrderStore>, EngineError> {
    Ok(match &config.store_path {
        Some(path) => Arc::new(FileStore::open(path).await?),
        None => Arc::new(MemoryStore::new()),
    })
}

/// Restores the engine from `store` and starts the worker and queue consumer.
pub async fn start(
    config: &Config,
    store: Arc<dyn OrderStore>,
    audit: Arc<dyn AuditSink>,
) -> Result<App, EngineError> {
    let engine = Engine::restore(store.clone(), config.commit_timeout).await?;
    let (handle, worker) = intake::spawn(engine, config.queue_capacity, audit.clone());
    let (publisher, deliveries) = queue::channel(config.queue_capacity);
    let consumer = tokio::spawn(queue::consume(deliveries, handle.clone()));
    let service = OrderService::new(store, handle, publisher, audit);
    Ok(App {
        router: api::create_router(service.clone()),
        service,
        worker,
        consumer,
    })
}
