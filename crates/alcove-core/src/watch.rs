//! Scoped wrapper around a store subscription plus its derivation task.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use alcove_store::{Document, Subscription};

/// A live derived view over one collection.
///
/// Holds the background task that turns raw snapshots into `T`; dropping
/// the watch aborts the task and detaches the underlying listener, so the
/// callback can never fire after the owning scope is gone.
pub struct Watch<T> {
    rx: mpsc::UnboundedReceiver<T>,
    task: JoinHandle<()>,
}

impl<T: Send + 'static> Watch<T> {
    /// Spawn the derivation loop: every snapshot from `sub` is mapped
    /// through `derive` and forwarded to the watch.
    pub(crate) fn spawn<F>(mut sub: Subscription, mut derive: F) -> Self
    where
        F: FnMut(Vec<Document>) -> T + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(async move {
            while let Some(docs) = sub.recv().await {
                if tx.send(derive(docs)).is_err() {
                    break;
                }
            }
        });
        Self { rx, task }
    }

    /// Next derived view, or `None` once the store side has shut down.
    pub async fn recv(&mut self) -> Option<T> {
        self.rx.recv().await
    }

    /// Drain without blocking; returns the most recent buffered view.
    pub fn latest(&mut self) -> Option<T> {
        let mut latest = None;
        while let Ok(v) = self.rx.try_recv() {
            latest = Some(v);
        }
        latest
    }
}

impl<T> Drop for Watch<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}
