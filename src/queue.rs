//! Intent queue: JSON payloads between the ingress and the matching worker.
//!
//! A bounded in-process channel stands in for the durable queue. The ingress
//! publishes with [`QueuePublisher`]; [`consume`] decodes each delivery into an
//! [`Order`] and forwards it to the engine's asynchronous path. Malformed
//! deliveries are logged and dropped.

use log::{info, warn};
use rust_decimal::Decimal;
use tokio::sync::mpsc;

use crate::error::EngineError;
use crate::intake::EngineHandle;
use crate::types::{NewOrder, Order, OrderId};

/// Wire form of an intent. Side and price kind stay strings until decoded so an
/// unknown value is reported as such rather than as a parse failure.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct IntentMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub side: Option<String>,
    #[serde(default)]
    pub quantity: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining_quantity: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit_price: Option<Decimal>,
    #[serde(default)]
    pub cancel_requested: bool,
}

impl IntentMessage {
    pub fn cancel(order_id: OrderId) -> Self {
        Self {
            id: Some(order_id.0),
            cancel_requested: true,
            ..Default::default()
        }
    }

    pub fn from_order(order: &Order) -> Self {
        if order.cancel_requested {
            return Self::cancel(order.id);
        }
        Self {
            id: Some(order.id.0),
            side: Some(format!("{:?}", order.side)),
            quantity: order.quantity,
            remaining_quantity: Some(order.remaining_quantity),
            price_kind: Some(format!("{:?}", order.price_kind)),
            limit_price: order.limit_price,
            cancel_requested: false,
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

impl TryFrom<IntentMessage> for Order {
    type Error = EngineError;

    fn try_from(msg: IntentMessage) -> Result<Self, Self::Error> {
        let id = OrderId(msg.id.ok_or(EngineError::MissingOrderId)?);
        if msg.cancel_requested {
            return Ok(Order::cancel(id));
        }
        let new = NewOrder::parse(
            msg.side.as_deref().unwrap_or_default(),
            msg.quantity,
            msg.price_kind.as_deref().unwrap_or_default(),
            msg.limit_price,
        )?;
        let mut order = new.into_order(id);
        if let Some(remaining) = msg.remaining_quantity {
            order.remaining_quantity = remaining;
        }
        order.validate()?;
        Ok(order)
    }
}

/// Decodes one delivery body.
pub fn decode(body: &[u8]) -> Result<Order, String> {
    let msg: IntentMessage = serde_json::from_slice(body).map_err(|e| e.to_string())?;
    Order::try_from(msg).map_err(|e| e.to_string())
}

/// Publishing side of the intent queue.
#[derive(Clone)]
pub struct QueuePublisher {
    tx: mpsc::Sender<Vec<u8>>,
}

impl QueuePublisher {
    pub async fn publish(&self, msg: &IntentMessage) -> Result<(), EngineError> {
        let body = msg
            .encode()
            .map_err(|e| EngineError::Queue(format!("encode failed: {}", e)))?;
        self.tx
            .send(body)
            .await
            .map_err(|_| EngineError::Queue("queue closed".to_string()))
    }
}

/// Creates the queue: a publisher and the receiver [`consume`] drains.
pub fn channel(capacity: usize) -> (QueuePublisher, mpsc::Receiver<Vec<u8>>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (QueuePublisher { tx }, rx)
}

/// Drains deliveries into the engine until the queue closes or the worker stops.
/// Returns the number of intents forwarded.
pub async fn consume(mut deliveries: mpsc::Receiver<Vec<u8>>, engine: EngineHandle) -> usize {
    let mut forwarded = 0;
    while let Some(body) = deliveries.recv().await {
        let order = match decode(&body) {
            Ok(order) => order,
            Err(e) => {
                warn!("dropping malformed intent: {}", e);
                continue;
            }
        };
        if engine.enqueue(order).await.is_err() {
            warn!("matching worker gone, queue consumer stopping");
            break;
        }
        forwarded += 1;
    }
    info!("queue consumer stopped forwarded={}", forwarded);
    forwarded
}
