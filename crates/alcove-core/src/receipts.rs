//! Read receipts and the derived message-status state machine.
//!
//! A receipt is a `(user, timestamp)` pair appended to a message exactly
//! once per reader. The append is an atomic document mutation, so two
//! readers marking the same message concurrently cannot lose each other's
//! update. The read set only ever grows; there is no retraction.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::debug;

use alcove_shared::constants::{DELIVERED_AFTER_MS, SENDING_GRACE_MS};
use alcove_shared::time::now_millis;
use alcove_shared::{GroupName, MessageId, UserId};
use alcove_store::paths;

use crate::chat::Chat;
use crate::error::Result;
use crate::models::{MessageStatus, ReadReceipt, RegisteredUser};

impl Chat {
    /// Record that `user_id` has read a message.
    ///
    /// Idempotent: a user already in the read set leaves the message
    /// untouched, including their original timestamp. Marking a message
    /// that no longer exists is a silent no-op.
    pub async fn mark_read(
        &self,
        group: &GroupName,
        message_id: &MessageId,
        user_id: &UserId,
    ) -> Result<()> {
        let path = paths::message_doc(group, message_id);
        self.store()
            .mutate(&path, receipt_mutation(user_id.clone(), now_millis()))
            .await?;
        Ok(())
    }

    /// Mark every message in the group as read by `user_id`, skipping those
    /// already marked. All new receipts share one timestamp.
    pub async fn mark_all_read(&self, group: &GroupName, user_id: &UserId) -> Result<()> {
        let docs = self
            .store()
            .query(
                &paths::messages(group),
                "sent_at",
                alcove_store::Direction::Ascending,
            )
            .await?;

        let now = now_millis();
        let mut marked = 0usize;
        for doc in docs {
            if already_read(&doc.data, user_id) {
                continue;
            }
            let path = format!("{}/{}", paths::messages(group), doc.id);
            self.store()
                .mutate(&path, receipt_mutation(user_id.clone(), now))
                .await?;
            marked += 1;
        }
        debug!(group = %group, user = %user_id, marked, "marked all read");
        Ok(())
    }

    /// Resolve the read set into tooltip entries: display names (falling
    /// back to a truncated anonymized id when the registry has no entry or
    /// the lookup fails) ordered by read time, most recent reader first.
    pub async fn resolve_readers(
        &self,
        read_by: &[UserId],
        read_by_timestamps: &BTreeMap<String, i64>,
    ) -> Vec<ReadReceipt> {
        let now = now_millis();
        let mut receipts = Vec::with_capacity(read_by.len());
        for user_id in read_by {
            let display_name = match self.registered_user(user_id).await {
                Ok(Some(RegisteredUser { display_name, .. })) => display_name,
                _ => format!("User_{}", user_id.short()),
            };
            let read_at = read_by_timestamps
                .get(user_id.as_str())
                .copied()
                .unwrap_or(now);
            receipts.push(ReadReceipt {
                display_name,
                read_at,
            });
        }
        receipts.sort_by(|a, b| b.read_at.cmp(&a.read_at));
        receipts
    }
}

/// Atomic transform appending one receipt to a message document.
fn receipt_mutation(user_id: UserId, now: i64) -> alcove_store::Mutation {
    Box::new(move |doc| {
        let mut fields = match doc {
            Some(Value::Object(fields)) => fields,
            // Absent message: leave absent. Anything malformed: leave as-is.
            Some(other) => return Some(other),
            None => return None,
        };

        let mut read_by: Vec<Value> = fields
            .get("read_by")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        if read_by.iter().any(|v| v.as_str() == Some(user_id.as_str())) {
            return Some(Value::Object(fields));
        }

        read_by.push(Value::String(user_id.as_str().to_string()));
        let mut stamps = fields
            .get("read_by_timestamps")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        stamps.insert(user_id.as_str().to_string(), Value::from(now));

        fields.insert("read_by".to_string(), Value::Array(read_by));
        fields.insert("read_by_timestamps".to_string(), Value::Object(stamps));
        Some(Value::Object(fields))
    })
}

fn already_read(data: &Value, user_id: &UserId) -> bool {
    data.get("read_by")
        .and_then(Value::as_array)
        .map(|arr| arr.iter().any(|v| v.as_str() == Some(user_id.as_str())))
        .unwrap_or(false)
}

/// Classify a message's display status from its read count and age.
///
/// Pure and time-driven: the same unchanged message can move from `Sent`
/// to `Delivered` between two calls purely because time passed, so callers
/// must recompute on a timer or re-render rather than cache the result.
pub fn classify(read_count: usize, sent_at: i64, now: i64) -> MessageStatus {
    let age = now - sent_at;
    // The grace period masks push latency and wins over everything,
    // including an already-present receipt.
    if age < SENDING_GRACE_MS {
        return MessageStatus::Sending;
    }
    if read_count > 0 {
        return MessageStatus::Read {
            readers: read_count,
        };
    }
    if age > DELIVERED_AFTER_MS {
        return MessageStatus::Delivered;
    }
    MessageStatus::Sent
}
