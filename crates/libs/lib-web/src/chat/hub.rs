//! # Chat Broadcast Hub
//!
//! Fans out stored chat messages to every connected realtime subscriber.
//!
//! Each subscriber owns a bounded queue. [`ChatHub::publish`] never waits on a
//! subscriber: it snapshots the subscriber map, releases the lock, then uses
//! `try_send`. A full queue drops that message for that subscriber only; a
//! closed queue means the subscriber went away and it is removed after the
//! fan-out pass.
//!
//! Publishes are serialized, so every subscriber sees concurrent publishes in
//! the same relative order.
//!
//! There is no replay. A subscriber sees only what is published after it
//! subscribed; history comes from the store.

use lib_core::ChatMessage;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc::error::{TryRecvError, TrySendError};
use tokio::sync::{mpsc, Mutex, RwLock};
use tracing::{debug, info, warn};

/// Identifies one registered subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Receiving end of a subscription.
///
/// Yields messages in publish order until the subscriber is removed from the
/// hub or the hub is closed. Dropping it is enough to be removed on the next
/// publish; [`ChatHub::unsubscribe`] removes it right away.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriberId,
    rx: mpsc::Receiver<Arc<ChatMessage>>,
}

impl Subscription {
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Wait for the next message. `None` once the subscription has ended.
    pub async fn recv(&mut self) -> Option<Arc<ChatMessage>> {
        self.rx.recv().await
    }

    /// Take an already queued message without waiting.
    pub fn try_recv(&mut self) -> Option<Arc<ChatMessage>> {
        match self.rx.try_recv() {
            Ok(chat) => Some(chat),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }
}

/// Outcome of one [`ChatHub::publish`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FanOut {
    /// Subscribers the message was queued for
    pub delivered: usize,
    /// Subscribers whose queue was full; they miss this message
    pub lagged: usize,
    /// Subscribers found disconnected and removed
    pub removed: usize,
}

/// Registry of realtime subscribers.
pub struct ChatHub {
    subscribers: RwLock<HashMap<SubscriberId, mpsc::Sender<Arc<ChatMessage>>>>,
    next_id: AtomicU64,
    buffer: usize,
    publish_lock: Mutex<()>,
}

impl ChatHub {
    /// Create a hub whose subscribers each buffer up to `buffer` messages.
    pub fn new(buffer: usize) -> Self {
        Self {
            subscribers: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            buffer: buffer.max(1),
            publish_lock: Mutex::new(()),
        }
    }

    /// Register a new subscriber.
    pub async fn subscribe(&self) -> Subscription {
        let id = SubscriberId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = mpsc::channel(self.buffer);

        let total = {
            let mut subscribers = self.subscribers.write().await;
            subscribers.insert(id, tx);
            subscribers.len()
        };

        debug!(subscriber_id = %id, total, "[HUB] SUBSCRIBED");
        Subscription { id, rx }
    }

    /// Remove a subscriber. Unknown or already removed ids are ignored.
    pub async fn unsubscribe(&self, id: SubscriberId) {
        let removed = self.subscribers.write().await.remove(&id).is_some();
        if removed {
            debug!(subscriber_id = %id, "[HUB] UNSUBSCRIBED");
        }
    }

    /// Queue `chat` for every current subscriber.
    pub async fn publish(&self, chat: ChatMessage) -> FanOut {
        let chat = Arc::new(chat);
        // Held for the whole pass; `try_send` never waits, so this stays short.
        let _publishing = self.publish_lock.lock().await;

        let snapshot: Vec<(SubscriberId, mpsc::Sender<Arc<ChatMessage>>)> = {
            let subscribers = self.subscribers.read().await;
            subscribers
                .iter()
                .map(|(id, tx)| (*id, tx.clone()))
                .collect()
        };

        let mut fan_out = FanOut::default();
        let mut closed = Vec::new();

        for (id, tx) in snapshot {
            match tx.try_send(Arc::clone(&chat)) {
                Ok(()) => fan_out.delivered += 1,
                Err(TrySendError::Full(_)) => {
                    fan_out.lagged += 1;
                    warn!(
                        subscriber_id = %id,
                        chat_id = chat.id,
                        "[HUB] LAGGED subscriber={} - queue full, message dropped for this subscriber",
                        id
                    );
                }
                Err(TrySendError::Closed(_)) => closed.push(id),
            }
        }

        if !closed.is_empty() {
            let mut subscribers = self.subscribers.write().await;
            for id in &closed {
                if subscribers.remove(id).is_some() {
                    fan_out.removed += 1;
                    debug!(subscriber_id = %id, "[HUB] REMOVED disconnected subscriber");
                }
            }
        }

        debug!(
            chat_id = chat.id,
            delivered = fan_out.delivered,
            lagged = fan_out.lagged,
            removed = fan_out.removed,
            "[HUB] PUBLISHED"
        );

        fan_out
    }

    /// Number of registered subscribers.
    pub async fn subscriber_count(&self) -> usize {
        self.subscribers.read().await.len()
    }

    /// Drop every subscriber, ending all live subscriptions.
    pub async fn close_all(&self) {
        let mut subscribers = self.subscribers.write().await;
        let count = subscribers.len();
        subscribers.clear();
        info!(subscribers = count, "[HUB] CLOSED all subscriptions");
    }
}

impl Default for ChatHub {
    fn default() -> Self {
        Self::new(lib_core::config::DEFAULT_SUBSCRIBER_BUFFER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn chat(id: i64, content: &str) -> ChatMessage {
        let now = Utc::now();
        ChatMessage {
            id,
            email: "a@b.com".to_string(),
            username: "alice".to_string(),
            content: content.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_publish_reaches_every_subscriber_in_order() {
        let hub = ChatHub::new(8);
        let mut first = hub.subscribe().await;
        let mut second = hub.subscribe().await;

        hub.publish(chat(1, "A")).await;
        let fan_out = hub.publish(chat(2, "B")).await;
        assert_eq!(fan_out.delivered, 2);

        for sub in [&mut first, &mut second] {
            assert_eq!(sub.recv().await.unwrap().content, "A");
            assert_eq!(sub.recv().await.unwrap().content, "B");
        }
    }

    #[tokio::test]
    async fn test_no_replay_for_late_subscriber() {
        let hub = ChatHub::new(8);
        hub.publish(chat(1, "before")).await;

        let mut late = hub.subscribe().await;
        assert!(late.try_recv().is_none());

        hub.publish(chat(2, "after")).await;
        assert_eq!(late.recv().await.unwrap().content, "after");
    }

    #[tokio::test]
    async fn test_unsubscribe_is_idempotent() {
        let hub = ChatHub::new(8);
        let first = hub.subscribe().await;
        let mut second = hub.subscribe().await;

        hub.unsubscribe(first.id()).await;
        hub.unsubscribe(first.id()).await;
        hub.unsubscribe(SubscriberId(9_999)).await;
        assert_eq!(hub.subscriber_count().await, 1);

        let fan_out = hub.publish(chat(1, "still here")).await;
        assert_eq!(fan_out.delivered, 1);
        assert_eq!(second.recv().await.unwrap().content, "still here");
    }

    #[tokio::test]
    async fn test_unsubscribed_handle_ends() {
        let hub = ChatHub::new(8);
        let mut sub = hub.subscribe().await;

        hub.unsubscribe(sub.id()).await;
        assert!(sub.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_dropped_subscriber_removed_on_publish() {
        let hub = ChatHub::new(8);
        let gone = hub.subscribe().await;
        let mut kept = hub.subscribe().await;
        drop(gone);

        assert_eq!(hub.subscriber_count().await, 2);
        let fan_out = hub.publish(chat(1, "hi")).await;

        assert_eq!(fan_out, FanOut { delivered: 1, lagged: 0, removed: 1 });
        assert_eq!(hub.subscriber_count().await, 1);
        assert_eq!(kept.recv().await.unwrap().content, "hi");
    }

    #[tokio::test]
    async fn test_slow_subscriber_does_not_block_others() {
        let hub = ChatHub::new(1);
        let _stalled = hub.subscribe().await;
        let mut reader = hub.subscribe().await;

        for i in 0..10 {
            let fan_out = tokio::time::timeout(
                std::time::Duration::from_secs(1),
                hub.publish(chat(i, &format!("m{}", i))),
            )
            .await
            .expect("publish must not wait on a stalled subscriber");

            assert_eq!(fan_out.delivered, if i == 0 { 2 } else { 1 });
            assert_eq!(reader.recv().await.unwrap().id, i);
        }

        // The stalled subscriber is still registered; only its deliveries were dropped.
        assert_eq!(hub.subscriber_count().await, 2);
    }

    #[tokio::test]
    async fn test_close_all_ends_subscriptions() {
        let hub = ChatHub::new(8);
        let mut sub = hub.subscribe().await;
        hub.publish(chat(1, "queued")).await;

        hub.close_all().await;

        assert_eq!(hub.subscriber_count().await, 0);
        assert_eq!(sub.recv().await.unwrap().content, "queued");
        assert!(sub.recv().await.is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_publishes_arrive_in_same_order_everywhere() {
        let hub = Arc::new(ChatHub::new(256));
        let mut first = hub.subscribe().await;
        let mut second = hub.subscribe().await;

        let handles: Vec<_> = (0..200)
            .map(|i| {
                let hub = Arc::clone(&hub);
                tokio::spawn(async move { hub.publish(chat(i, "race")).await })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.await.unwrap().delivered, 2);
        }

        let mut seen_first = Vec::new();
        let mut seen_second = Vec::new();
        while let Some(chat) = first.try_recv() {
            seen_first.push(chat.id);
        }
        while let Some(chat) = second.try_recv() {
            seen_second.push(chat.id);
        }

        assert_eq!(seen_first.len(), 200);
        assert_eq!(seen_first, seen_second);
    }

    #[tokio::test]
    async fn test_subscriber_ids_are_unique() {
        let hub = ChatHub::new(8);
        let a = hub.subscribe().await;
        let b = hub.subscribe().await;
        assert_ne!(a.id(), b.id());
    }
}
