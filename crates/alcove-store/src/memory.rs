//! In-process [`DocumentStore`] implementation.
//!
//! Backs the test suite and local development. All mutations to a
//! collection fan the full snapshot out to that collection's subscribers,
//! mirroring the push-on-change behaviour of the hosted backend. The single
//! lock makes `mutate` trivially atomic.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::debug;

use crate::error::Result;
use crate::paths::split_doc_path;
use crate::store::{Direction, Document, DocumentStore, Mutation, Subscription};

#[derive(Default)]
struct Inner {
    collections: HashMap<String, BTreeMap<String, Value>>,
    watchers: HashMap<String, Vec<mpsc::UnboundedSender<Vec<Document>>>>,
}

impl Inner {
    fn snapshot(&self, collection: &str) -> Vec<Document> {
        self.collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, data)| Document {
                        id: id.clone(),
                        data: data.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Push the current snapshot to every live watcher of `collection`,
    /// pruning watchers whose receiving side has been dropped.
    fn publish(&mut self, collection: &str) {
        let Some(watchers) = self.watchers.get_mut(collection) else {
            return;
        };
        let snapshot = self
            .collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, data)| Document {
                        id: id.clone(),
                        data: data.clone(),
                    })
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();
        watchers.retain(|tx| tx.send(snapshot.clone()).is_ok());
        if watchers.is_empty() {
            self.watchers.remove(collection);
        }
    }
}

/// In-memory document store.
///
/// Cloning is cheap and every clone shares the same state.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().expect("memory store lock poisoned")
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn put(&self, path: &str, data: Value, merge: bool) -> Result<()> {
        let (collection, id) = split_doc_path(path)?;
        let mut inner = self.lock();
        let docs = inner.collections.entry(collection.to_string()).or_default();

        let new_doc = match (merge, docs.get(id)) {
            (true, Some(Value::Object(existing))) => {
                let mut merged = existing.clone();
                if let Value::Object(fields) = data {
                    for (k, v) in fields {
                        merged.insert(k, v);
                    }
                }
                Value::Object(merged)
            }
            _ => data,
        };
        docs.insert(id.to_string(), new_doc);

        debug!(path, merge, "put document");
        inner.publish(collection);
        Ok(())
    }

    async fn get(&self, path: &str) -> Result<Option<Value>> {
        let (collection, id) = split_doc_path(path)?;
        let inner = self.lock();
        Ok(inner
            .collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .cloned())
    }

    async fn query(
        &self,
        collection: &str,
        order_by: &str,
        direction: Direction,
    ) -> Result<Vec<Document>> {
        let inner = self.lock();
        let mut docs = inner.snapshot(collection);
        docs.sort_by(|a, b| {
            let ord = cmp_field(a.data.get(order_by), b.data.get(order_by));
            match direction {
                Direction::Ascending => ord,
                Direction::Descending => ord.reverse(),
            }
        });
        Ok(docs)
    }

    async fn subscribe(&self, collection: &str) -> Result<Subscription> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.lock();
        // Initial snapshot, then push-on-change.
        let _ = tx.send(inner.snapshot(collection));
        inner
            .watchers
            .entry(collection.to_string())
            .or_default()
            .push(tx);
        debug!(collection, "listener attached");
        Ok(Subscription::new(rx))
    }

    async fn del(&self, path: &str) -> Result<()> {
        let (collection, id) = split_doc_path(path)?;
        let mut inner = self.lock();
        let removed = inner
            .collections
            .get_mut(collection)
            .map(|docs| docs.remove(id).is_some())
            .unwrap_or(false);
        if removed {
            debug!(path, "deleted document");
            inner.publish(collection);
        }
        Ok(())
    }

    async fn mutate(&self, path: &str, mutation: Mutation) -> Result<()> {
        let (collection, id) = split_doc_path(path)?;
        let mut inner = self.lock();
        let current = inner
            .collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .cloned();
        match mutation(current) {
            Some(new_doc) => {
                inner
                    .collections
                    .entry(collection.to_string())
                    .or_default()
                    .insert(id.to_string(), new_doc);
            }
            None => {
                if let Some(docs) = inner.collections.get_mut(collection) {
                    docs.remove(id);
                }
            }
        }
        inner.publish(collection);
        Ok(())
    }
}

/// Field comparison for `query`: numbers numerically, strings
/// lexicographically, everything else by its JSON rendering. Missing fields
/// sort first.
fn cmp_field(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn put_get_round_trip() {
        let store = MemoryStore::new();
        store
            .put("groups/ops", json!({"name": "ops"}), false)
            .await
            .unwrap();
        let doc = store.get("groups/ops").await.unwrap().unwrap();
        assert_eq!(doc["name"], "ops");
        assert!(store.get("groups/missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn merge_put_keeps_other_fields() {
        let store = MemoryStore::new();
        store
            .put("groups/ops", json!({"name": "ops", "created_at": 1}), false)
            .await
            .unwrap();
        store
            .put("groups/ops", json!({"password_hash": "ff"}), true)
            .await
            .unwrap();
        let doc = store.get("groups/ops").await.unwrap().unwrap();
        assert_eq!(doc["name"], "ops");
        assert_eq!(doc["password_hash"], "ff");
    }

    #[tokio::test]
    async fn non_merge_put_replaces() {
        let store = MemoryStore::new();
        store
            .put("groups/ops", json!({"a": 1, "b": 2}), false)
            .await
            .unwrap();
        store.put("groups/ops", json!({"a": 9}), false).await.unwrap();
        let doc = store.get("groups/ops").await.unwrap().unwrap();
        assert_eq!(doc, json!({"a": 9}));
    }

    #[tokio::test]
    async fn query_orders_by_field() {
        let store = MemoryStore::new();
        for (id, ts) in [("a", 3), ("b", 1), ("c", 2)] {
            store
                .put(&format!("groups/g/messages/{id}"), json!({"sent_at": ts}), false)
                .await
                .unwrap();
        }
        let asc = store
            .query("groups/g/messages", "sent_at", Direction::Ascending)
            .await
            .unwrap();
        let ids: Vec<&str> = asc.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, ["b", "c", "a"]);

        let desc = store
            .query("groups/g/messages", "sent_at", Direction::Descending)
            .await
            .unwrap();
        let ids: Vec<&str> = desc.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, ["a", "c", "b"]);
    }

    #[tokio::test]
    async fn subscribe_sees_initial_and_updates() {
        let store = MemoryStore::new();
        store
            .put("groups/g/presence/u1", json!({"user_id": "u1"}), false)
            .await
            .unwrap();

        let mut sub = store.subscribe("groups/g/presence").await.unwrap();
        let initial = sub.recv().await.unwrap();
        assert_eq!(initial.len(), 1);

        store
            .put("groups/g/presence/u2", json!({"user_id": "u2"}), false)
            .await
            .unwrap();
        let next = sub.recv().await.unwrap();
        assert_eq!(next.len(), 2);

        store.del("groups/g/presence/u1").await.unwrap();
        let after_del = sub.recv().await.unwrap();
        assert_eq!(after_del.len(), 1);
        assert_eq!(after_del[0].id, "u2");
    }

    #[tokio::test]
    async fn dropped_subscription_is_pruned() {
        let store = MemoryStore::new();
        let sub = store.subscribe("groups/g/typing").await.unwrap();
        drop(sub);
        // The next publish prunes the dead sender.
        store
            .put("groups/g/typing/u1", json!({"user_name": "a"}), false)
            .await
            .unwrap();
        assert!(store.lock().watchers.get("groups/g/typing").is_none());
    }

    #[tokio::test]
    async fn del_is_idempotent() {
        let store = MemoryStore::new();
        store.del("groups/g/messages/none").await.unwrap();
        store.del("groups/g/messages/none").await.unwrap();
    }

    #[tokio::test]
    async fn mutate_is_atomic_under_contention() {
        let store = MemoryStore::new();
        store
            .put("groups/g/messages/m", json!({"read_by": []}), false)
            .await
            .unwrap();

        let mut handles = Vec::new();
        for i in 0..50 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .mutate(
                        "groups/g/messages/m",
                        Box::new(move |doc| {
                            let mut doc = doc.unwrap_or_else(|| json!({"read_by": []}));
                            let readers = doc["read_by"].as_array_mut().unwrap();
                            readers.push(json!(format!("u{i}")));
                            Some(doc)
                        }),
                    )
                    .await
                    .unwrap();
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        let doc = store.get("groups/g/messages/m").await.unwrap().unwrap();
        assert_eq!(doc["read_by"].as_array().unwrap().len(), 50);
    }

    #[tokio::test]
    async fn mutate_can_delete() {
        let store = MemoryStore::new();
        store.put("sessions/s1", json!({"x": 1}), false).await.unwrap();
        store
            .mutate("sessions/s1", Box::new(|_| None))
            .await
            .unwrap();
        assert!(store.get("sessions/s1").await.unwrap().is_none());
    }
}
