//! Admin console operations: moderation, group deletion, and the
//! cross-group online monitor.
//!
//! Unlike the regular client paths, explicit admin deletes and updates
//! verify their target first and fail with a NotFound-style error when it
//! is absent.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use alcove_shared::constants::PRESENCE_STALE_MS;
use alcove_shared::security::RateLimiter;
use alcove_shared::time::{is_stale, now_millis};
use alcove_shared::{GroupName, MessageId, UserId};
use alcove_store::{paths, Direction};

use crate::chat::Chat;
use crate::error::{ChatError, Result};
use crate::messages::parse_messages;
use crate::models::{Message, PresenceRecord};

/// One group's currently-present users, as seen by the admin monitor.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupPresence {
    pub group: GroupName,
    pub users: Vec<PresenceRecord>,
}

impl Chat {
    /// Delete one message. Fails with [`ChatError::MessageNotFound`] when
    /// the target is absent.
    pub async fn delete_message(
        &self,
        group: &GroupName,
        message_id: &MessageId,
    ) -> Result<()> {
        let path = paths::message_doc(group, message_id);
        if self.store().get(&path).await?.is_none() {
            return Err(ChatError::MessageNotFound(*message_id));
        }
        self.store().del(&path).await?;
        info!(group = %group, id = %message_id, "message deleted");
        Ok(())
    }

    /// Delete a batch of messages. All targets are verified before any
    /// delete happens, so a missing id fails the whole batch untouched.
    pub async fn bulk_delete_messages(
        &self,
        group: &GroupName,
        message_ids: &[MessageId],
    ) -> Result<()> {
        for id in message_ids {
            if self
                .store()
                .get(&paths::message_doc(group, id))
                .await?
                .is_none()
            {
                return Err(ChatError::MessageNotFound(*id));
            }
        }
        for id in message_ids {
            self.store().del(&paths::message_doc(group, id)).await?;
        }
        info!(group = %group, count = message_ids.len(), "bulk deleted messages");
        Ok(())
    }

    /// Every group with its messages, newest first (admin review order).
    pub async fn groups_with_messages(&self) -> Result<Vec<(GroupName, Vec<Message>)>> {
        let groups = self.list_groups().await?;
        let mut result = Vec::with_capacity(groups.len());
        for group in groups {
            let docs = self
                .store()
                .query(&paths::messages(&group.name), "sent_at", Direction::Descending)
                .await?;
            result.push((group.name, parse_messages(&docs)));
        }
        Ok(result)
    }

    /// Delete a group and everything scoped to it: messages, presence, and
    /// typing records, then the group document itself. Fails with
    /// [`ChatError::GroupNotFound`] when the group does not exist.
    pub async fn delete_group(&self, group: &GroupName) -> Result<()> {
        if self.group(group).await?.is_none() {
            return Err(ChatError::GroupNotFound(group.clone()));
        }

        let scoped = [
            (paths::messages(group), "sent_at"),
            (paths::presence(group), "last_active"),
            (paths::typing(group), "timestamp"),
        ];
        for (collection, order_by) in scoped {
            let docs = self
                .store()
                .query(&collection, order_by, Direction::Ascending)
                .await?;
            for doc in docs {
                self.store()
                    .del(&format!("{collection}/{}", doc.id))
                    .await?;
            }
        }

        self.store().del(&paths::group_doc(group)).await?;
        info!(group = %group, "group deleted");
        Ok(())
    }

    /// One-shot, stale-filtered presence across every group.
    pub async fn all_online_users(&self) -> Result<Vec<GroupPresence>> {
        let groups = self.list_groups().await?;
        let now = now_millis();
        let mut result = Vec::with_capacity(groups.len());
        for group in groups {
            let docs = self
                .store()
                .query(&paths::presence(&group.name), "last_active", Direction::Ascending)
                .await?;
            let users = docs
                .iter()
                .filter_map(|doc| serde_json::from_value::<PresenceRecord>(doc.data.clone()).ok())
                .filter(|r| !is_stale(r.last_active, now, PRESENCE_STALE_MS))
                .collect();
            result.push(GroupPresence {
                group: group.name,
                users,
            });
        }
        Ok(result)
    }

    /// Watch presence across every group that exists right now: any change
    /// in any group's presence collection re-derives the whole view.
    pub async fn observe_all_online(&self) -> Result<AllOnlineWatch> {
        let groups = self.list_groups().await?;
        let (tick_tx, mut tick_rx) = mpsc::unbounded_channel();
        let mut tasks = Vec::with_capacity(groups.len() + 1);

        for group in &groups {
            let mut sub = self.store().subscribe(&paths::presence(&group.name)).await?;
            let tick = tick_tx.clone();
            tasks.push(tokio::spawn(async move {
                while sub.recv().await.is_some() {
                    if tick.send(()).is_err() {
                        break;
                    }
                }
            }));
        }
        drop(tick_tx);

        let chat = self.clone();
        let (tx, rx) = mpsc::unbounded_channel();
        tasks.push(tokio::spawn(async move {
            while tick_rx.recv().await.is_some() {
                // Coalesce bursts: one recompute covers any backlog.
                while tick_rx.try_recv().is_ok() {}
                match chat.all_online_users().await {
                    Ok(view) => {
                        if tx.send(view).is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!(error = %e, "online monitor recompute failed"),
                }
            }
        }));

        Ok(AllOnlineWatch { rx, tasks })
    }

    /// Kick a user's presence record (they reappear on their next
    /// heartbeat).
    pub async fn force_user_offline(&self, group: &GroupName, user_id: &UserId) -> Result<()> {
        self.retract_presence(group, user_id).await?;
        info!(group = %group, user = %user_id, "forced user offline");
        Ok(())
    }
}

/// Live cross-group presence view for the admin monitor.
///
/// Dropping it detaches every per-group listener.
pub struct AllOnlineWatch {
    rx: mpsc::UnboundedReceiver<Vec<GroupPresence>>,
    tasks: Vec<JoinHandle<()>>,
}

impl AllOnlineWatch {
    pub async fn recv(&mut self) -> Option<Vec<GroupPresence>> {
        self.rx.recv().await
    }
}

impl Drop for AllOnlineWatch {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

/// The admin console gate: a client-side passcode compare behind a rate
/// limiter. This is obscurity, not authentication, and is documented as
/// such.
pub struct AdminGate {
    passcode: String,
    limiter: RateLimiter,
}

impl AdminGate {
    const LIMITER_KEY: &'static str = "admin_login";

    pub fn new(passcode: impl Into<String>) -> Self {
        Self {
            passcode: passcode.into(),
            limiter: RateLimiter::new(5, Duration::from_secs(900)),
        }
    }

    /// Check a passcode attempt. Rate-limited; a success resets the
    /// limiter.
    pub fn verify(&self, input: &str) -> bool {
        if !self.limiter.check(Self::LIMITER_KEY) {
            return false;
        }
        if input == self.passcode {
            self.limiter.clear(Self::LIMITER_KEY);
            true
        } else {
            false
        }
    }
}
