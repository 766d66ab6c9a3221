//! Typing indicators: ephemeral "X is typing" records with debounced
//! clearing.
//!
//! The writer owns its record: every keystroke upserts it with a fresh
//! timestamp, and it is deleted after two idle seconds, when the input
//! empties, or when the composing session is dropped. For the unavoidable
//! case of an abruptly-terminated writer, readers apply the same read-time
//! staleness filter presence uses, so no indicator can stick forever.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::warn;

use alcove_shared::constants::{TYPING_IDLE, TYPING_STALE_MS};
use alcove_shared::time::{is_stale, now_millis};
use alcove_shared::{GroupName, UserId};
use alcove_store::paths;

use crate::chat::Chat;
use crate::error::Result;
use crate::models::TypingRecord;
use crate::watch::Watch;

/// Live list of names currently typing in a group.
pub type TypingWatch = Watch<Vec<String>>;

impl Chat {
    /// Upsert (`is_typing = true`) or delete (`false`) this user's typing
    /// record.
    pub async fn set_typing(
        &self,
        group: &GroupName,
        user_id: &UserId,
        user_name: &str,
        is_typing: bool,
    ) -> Result<()> {
        let path = paths::typing_doc(group, user_id);
        if is_typing {
            let record = TypingRecord {
                user_name: user_name.to_string(),
                timestamp: now_millis(),
            };
            self.store()
                .put(&path, serde_json::to_value(&record)?, false)
                .await?;
        } else {
            self.store().del(&path).await?;
        }
        Ok(())
    }

    /// Watch the names of users typing in a group, oldest keystroke first.
    pub async fn observe_typing(&self, group: &GroupName) -> Result<TypingWatch> {
        let sub = self.store().subscribe(&paths::typing(group)).await?;
        Ok(Watch::spawn(sub, |docs| {
            let now = now_millis();
            let mut records: Vec<TypingRecord> = docs
                .iter()
                .filter_map(|doc| serde_json::from_value(doc.data.clone()).ok())
                .filter(|r: &TypingRecord| !is_stale(r.timestamp, now, TYPING_STALE_MS))
                .collect();
            records.sort_by_key(|r| r.timestamp);
            records.into_iter().map(|r| r.user_name).collect()
        }))
    }
}

enum TypingCmd {
    Set,
    Clear,
}

/// Debounced typing-state writer for one composing session.
///
/// Feed it every input change via [`keystroke`](Self::keystroke). Each
/// non-empty keystroke upserts the record with a fresh timestamp, so a
/// continuous typist never ages past the readers' staleness filter, and
/// restarts the idle timer that clears the record two seconds after the
/// last one. Empty input clears immediately; dropping the debouncer cancels
/// any pending timer and clears, so the typing record cannot outlive the UI
/// that created it.
///
/// All writes are funnelled through one worker task in submission order: a
/// set followed by a clear cannot be reordered into a stuck record.
pub struct TypingDebouncer {
    tx: mpsc::UnboundedSender<TypingCmd>,
    /// Whether this session has a typing record in the store or queued.
    active: Arc<AtomicBool>,
    idle_timer: Option<JoinHandle<()>>,
}

impl TypingDebouncer {
    pub fn new(chat: Chat, group: GroupName, user_id: UserId, user_name: String) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            while let Some(cmd) = rx.recv().await {
                let is_typing = matches!(cmd, TypingCmd::Set);
                if let Err(e) = chat.set_typing(&group, &user_id, &user_name, is_typing).await {
                    warn!(group = %group, user = %user_id, error = %e, "typing write failed");
                }
            }
        });
        Self {
            tx,
            active: Arc::new(AtomicBool::new(false)),
            idle_timer: None,
        }
    }

    /// Record an input change.
    ///
    /// Empty input clears the typing state immediately; anything else
    /// refreshes the record's timestamp and restarts the idle timer.
    pub fn keystroke(&mut self, input: &str) {
        if input.is_empty() {
            self.clear();
            return;
        }

        self.active.store(true, Ordering::SeqCst);
        let _ = self.tx.send(TypingCmd::Set);

        if let Some(timer) = self.idle_timer.take() {
            timer.abort();
        }
        let tx = self.tx.clone();
        let active = self.active.clone();
        self.idle_timer = Some(tokio::spawn(async move {
            tokio::time::sleep(TYPING_IDLE).await;
            if active.swap(false, Ordering::SeqCst) {
                let _ = tx.send(TypingCmd::Clear);
            }
        }));
    }

    /// Clear the typing state now, cancelling any pending idle timer.
    pub fn clear(&mut self) {
        if let Some(timer) = self.idle_timer.take() {
            timer.abort();
        }
        if self.active.swap(false, Ordering::SeqCst) {
            let _ = self.tx.send(TypingCmd::Clear);
        }
    }
}

impl Drop for TypingDebouncer {
    fn drop(&mut self) {
        if let Some(timer) = self.idle_timer.take() {
            timer.abort();
        }
        // The worker drains its queue and exits once the sender side is
        // gone, so a clear queued here still lands.
        if self.active.swap(false, Ordering::SeqCst) {
            let _ = self.tx.send(TypingCmd::Clear);
        }
    }
}
