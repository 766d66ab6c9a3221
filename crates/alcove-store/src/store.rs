//! The [`DocumentStore`] trait and its supporting types.

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::error::Result;

/// One document in a collection snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Final path segment of the document.
    pub id: String,
    /// The document body.
    pub data: Value,
}

/// Query ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// Atomic document transform: receives the current document (or `None` when
/// absent) and returns the new document (or `None` to delete it).
pub type Mutation = Box<dyn FnOnce(Option<Value>) -> Option<Value> + Send>;

/// Live collection listener.
///
/// Delivers the full collection snapshot once on registration and again
/// after every write or delete in the collection. Dropping the subscription
/// detaches the listener; there is no explicit unsubscribe call to forget.
pub struct Subscription {
    rx: mpsc::UnboundedReceiver<Vec<Document>>,
}

impl Subscription {
    pub fn new(rx: mpsc::UnboundedReceiver<Vec<Document>>) -> Self {
        Self { rx }
    }

    /// Next snapshot, or `None` once the store side has shut down.
    pub async fn recv(&mut self) -> Option<Vec<Document>> {
        self.rx.recv().await
    }
}

/// Interface of the hosted document database, reduced to the primitives the
/// chat core needs.
///
/// Semantics the core relies on:
/// - writes to a single document are observed in order; there is no
///   ordering guarantee across documents,
/// - `get` on a missing document is `Ok(None)`, never an error,
/// - `del` is idempotent,
/// - `mutate` applies its transform atomically with respect to every other
///   write to the same document.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Create or overwrite a document. With `merge`, top-level fields of
    /// `data` are merged into the existing document instead of replacing it.
    async fn put(&self, path: &str, data: Value, merge: bool) -> Result<()>;

    /// Point read. Missing documents are a valid empty result.
    async fn get(&self, path: &str) -> Result<Option<Value>>;

    /// One-shot ordered listing of a collection. Documents missing the
    /// `order_by` field sort first in ascending order.
    async fn query(
        &self,
        collection: &str,
        order_by: &str,
        direction: Direction,
    ) -> Result<Vec<Document>>;

    /// Attach a live listener to a collection.
    async fn subscribe(&self, collection: &str) -> Result<Subscription>;

    /// Delete a document. Deleting an absent document is not an error.
    async fn del(&self, path: &str) -> Result<()>;

    /// Atomic read-modify-write of one document.
    async fn mutate(&self, path: &str, mutation: Mutation) -> Result<()>;
}
