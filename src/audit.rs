//! Structured audit trail for material actions.
//!
//! Events: order submit, order cancel, failed intents, commit timeouts. One JSON
//! line per event with timestamp, action, order id, outcome, and detail. Failures
//! on the asynchronous path are only visible here and in the log, so the sink is
//! where store/book divergence surfaces.

use serde::Serialize;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::types::OrderId;

pub const ORDER_SUBMIT: &str = "order_submit";
pub const ORDER_CANCEL: &str = "order_cancel";
pub const INTENT_FAILED: &str = "intent_failed";
pub const COMMIT_TIMEOUT: &str = "commit_timeout";

/// Single audit record.
#[derive(Clone, Debug, Serialize)]
pub struct AuditEvent {
    /// Unix timestamp (seconds since epoch).
    pub timestamp_secs: u64,
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<OrderId>,
    /// success, rejected, error.
    pub outcome: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl AuditEvent {
    pub fn now(
        action: impl Into<String>,
        order_id: Option<OrderId>,
        outcome: impl Into<String>,
        detail: Option<String>,
    ) -> Self {
        let timestamp_secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Self {
            timestamp_secs,
            action: action.into(),
            order_id,
            outcome: outcome.into(),
            detail,
        }
    }
}

/// Sink for audit events.
pub trait AuditSink: Send + Sync {
    fn emit(&self, event: &AuditEvent);
}

/// Writes one JSON line per event to stdout.
pub struct StdoutAuditSink;

impl AuditSink for StdoutAuditSink {
    fn emit(&self, event: &AuditEvent) {
        if let Ok(line) = serde_json::to_string(event) {
            println!("{}", line);
        }
    }
}

/// Keeps events in memory for tests. Clones share the same buffer.
#[derive(Clone, Default)]
pub struct InMemoryAuditSink {
    events: Arc<Mutex<Vec<AuditEvent>>>,
}

impl InMemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn actions(&self) -> Vec<String> {
        self.events().into_iter().map(|e| e.action).collect()
    }
}

impl AuditSink for InMemoryAuditSink {
    fn emit(&self, event: &AuditEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}
