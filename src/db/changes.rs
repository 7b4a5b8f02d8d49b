// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Document change feed.
//!
//! Every successful write made through a [`Store`](crate::db::Store) is
//! published on a broadcast channel with a full snapshot of the new document.
//! Subscribers filter by collection and, optionally, document ID.
//!
//! A subscription holds one broadcast receiver. It is released exactly once,
//! either by [`ChangeSubscription::unsubscribe`] or by dropping it.

use serde_json::Value;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Channel capacity for the change feed.
const CHANNEL_CAPACITY: usize = 1024;

/// What happened to a document.
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeKind {
    /// Created or replaced; carries the stored document
    Upserted(Value),
    Deleted,
}

/// A single document change.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    pub collection: String,
    pub document_id: String,
    pub kind: ChangeKind,
}

/// Publisher side of the feed, shared by all clones of a store.
#[derive(Clone)]
pub struct ChangeFeed {
    sender: broadcast::Sender<Arc<ChangeEvent>>,
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeFeed {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn publish(&self, event: ChangeEvent) {
        // No receivers is fine: nobody is watching.
        let receivers = self.sender.send(Arc::new(event)).unwrap_or(0);
        tracing::trace!(receivers, "Published document change");
    }

    /// Watch one collection, or one document when `document_id` is set.
    pub fn subscribe(&self, collection: &str, document_id: Option<&str>) -> ChangeSubscription {
        ChangeSubscription {
            receiver: self.sender.subscribe(),
            collection: collection.to_string(),
            document_id: document_id.map(str::to_string),
        }
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// Live listener on the change feed.
pub struct ChangeSubscription {
    receiver: broadcast::Receiver<Arc<ChangeEvent>>,
    collection: String,
    document_id: Option<String>,
}

impl ChangeSubscription {
    /// Wait for the next matching change.
    ///
    /// Returns `None` once the store has been dropped. If this subscriber
    /// fell behind, the skipped events are logged and the next available
    /// one is returned.
    pub async fn next(&mut self) -> Option<Arc<ChangeEvent>> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if self.matches(&event) => return Some(event),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(
                        collection = %self.collection,
                        document_id = ?self.document_id,
                        skipped,
                        "Change subscriber lagged, skipped events"
                    );
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Release the listener.
    pub fn unsubscribe(self) {
        tracing::debug!(
            collection = %self.collection,
            document_id = ?self.document_id,
            "Change subscription released"
        );
    }

    fn matches(&self, event: &ChangeEvent) -> bool {
        event.collection == self.collection
            && self
                .document_id
                .as_deref()
                .map_or(true, |id| id == event.document_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upsert(collection: &str, id: &str, n: i64) -> ChangeEvent {
        ChangeEvent {
            collection: collection.to_string(),
            document_id: id.to_string(),
            kind: ChangeKind::Upserted(serde_json::json!({ "n": n })),
        }
    }

    #[tokio::test]
    async fn test_document_filter() {
        let feed = ChangeFeed::new();
        let mut sub = feed.subscribe("carts", Some("u1"));

        feed.publish(upsert("carts", "u2", 1));
        feed.publish(upsert("orders", "u1", 2));
        feed.publish(upsert("carts", "u1", 3));

        let event = sub.next().await.unwrap();
        assert_eq!(event.document_id, "u1");
        assert_eq!(event.kind, ChangeKind::Upserted(serde_json::json!({ "n": 3 })));
    }

    #[tokio::test]
    async fn test_collection_filter_sees_every_document() {
        let feed = ChangeFeed::new();
        let mut sub = feed.subscribe("orders", None);

        feed.publish(upsert("orders", "o1", 1));
        feed.publish(upsert("orders", "o2", 2));

        assert_eq!(sub.next().await.unwrap().document_id, "o1");
        assert_eq!(sub.next().await.unwrap().document_id, "o2");
    }

    #[tokio::test]
    async fn test_unsubscribe_releases_receiver() {
        let feed = ChangeFeed::new();
        let sub = feed.subscribe("carts", None);
        let other = feed.subscribe("carts", None);
        assert_eq!(feed.subscriber_count(), 2);

        sub.unsubscribe();
        assert_eq!(feed.subscriber_count(), 1);
        drop(other);
        assert_eq!(feed.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_closed_feed_ends_subscription() {
        let feed = ChangeFeed::new();
        let mut sub = feed.subscribe("carts", None);
        drop(feed);
        assert!(sub.next().await.is_none());
    }
}
