use serde::Serialize;
use tokio::sync::broadcast;

use crate::models::order::Order;

/// Receives every committed order write. Implementations must not block and
/// must swallow their own failures.
pub trait OrderMirror: Send + Sync {
    fn on_create(&self, order: &Order);
    fn on_update(&self, order: &Order);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderEventKind {
    Created,
    Updated,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderEvent {
    pub kind: OrderEventKind,
    pub order: Order,
}

#[derive(Clone)]
pub struct BroadcastMirror {
    tx: broadcast::Sender<OrderEvent>,
}

impl BroadcastMirror {
    pub fn new(buffer: usize) -> Self {
        let (tx, _unused_rx) = broadcast::channel(buffer);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<OrderEvent> {
        self.tx.subscribe()
    }

    fn publish(&self, kind: OrderEventKind, order: &Order) {
        let _ = self.tx.send(OrderEvent {
            kind,
            order: order.clone(),
        });
    }
}

impl OrderMirror for BroadcastMirror {
    fn on_create(&self, order: &Order) {
        self.publish(OrderEventKind::Created, order);
    }

    fn on_update(&self, order: &Order) {
        self.publish(OrderEventKind::Updated, order);
    }
}
