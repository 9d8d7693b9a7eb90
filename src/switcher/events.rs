//! 事件总线
//!
//! 基于 `tokio::broadcast` 的类型化事件。没有订阅者时发布的事件直接丢弃；
//! 订阅者落后超过缓冲区容量时，最早的事件被丢弃。

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast::{self, Receiver, Sender};

pub type EventId = u64;

const DEFAULT_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    LanguageChanged {
        new_language: String,
        old_language: String,
    },
    FlagsInitialized {
        flags: Value,
    },
}

impl Event {
    /// 事件名，与 `on()` 使用的名称一致
    pub fn kind(&self) -> &'static str {
        match self {
            Event::LanguageChanged { .. } => "languageChanged",
            Event::FlagsInitialized { .. } => "initFlags",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub id: EventId,
    pub timestamp: DateTime<Utc>,
    pub event: Event,
}

#[derive(Clone)]
pub struct EventBus {
    sender: Sender<EventEnvelope>,
    next_id: Arc<AtomicU64>,
}

impl EventBus {
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// 发布事件，返回分配的序号
    pub fn publish(&self, event: Event) -> EventId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        tracing::debug!("发布事件 #{}: {}", id, event.kind());

        let envelope = EventEnvelope {
            id,
            timestamp: Utc::now(),
            event,
        };
        let _ = self.sender.send(envelope);
        id
    }

    pub fn subscribe(&self) -> Receiver<EventEnvelope> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
