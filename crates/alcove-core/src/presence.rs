//! Presence tracking: who is in a group right now.
//!
//! Each participating client overwrites its own `(group, user)` record on a
//! fixed heartbeat cadence. There is no server-side expiry: readers filter
//! out records older than the staleness threshold at derivation time, so a
//! client that vanished without retracting simply ages out of the view.

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use alcove_shared::constants::{
    AWAY_WINDOW_MS, HEARTBEAT_INTERVAL, ONLINE_WINDOW_MS, PRESENCE_STALE_MS,
};
use alcove_shared::time::{is_stale, now_millis};
use alcove_shared::{GroupName, UserId};
use alcove_store::{paths, Document};

use crate::chat::Chat;
use crate::error::Result;
use crate::models::{OnlineState, PresenceRecord, PresenceStatus};
use crate::watch::Watch;

/// Live, staleness-filtered list of a group's present users.
pub type PresenceWatch = Watch<Vec<PresenceRecord>>;

impl Chat {
    /// Overwrite this user's presence record with a fresh timestamp.
    ///
    /// No existence check on the group: announcing into an unknown group
    /// implicitly creates the presence collection.
    pub async fn announce_presence(
        &self,
        group: &GroupName,
        user_id: &UserId,
        user_name: &str,
        status: PresenceStatus,
    ) -> Result<()> {
        let record = PresenceRecord {
            user_id: user_id.clone(),
            user_name: user_name.to_string(),
            last_active: now_millis(),
            status,
        };
        self.store()
            .put(
                &paths::presence_doc(group, user_id),
                serde_json::to_value(&record)?,
                false,
            )
            .await?;
        Ok(())
    }

    /// Delete this user's presence record (graceful leave).
    ///
    /// If the client terminates abruptly instead, the record lingers and is
    /// excluded by staleness filtering in every reader.
    pub async fn retract_presence(&self, group: &GroupName, user_id: &UserId) -> Result<()> {
        self.store()
            .del(&paths::presence_doc(group, user_id))
            .await?;
        debug!(group = %group, user = %user_id, "presence retracted");
        Ok(())
    }

    /// Watch the group's currently-present users.
    ///
    /// Every underlying change re-derives the filtered list; staleness is
    /// evaluated against the receiving client's clock, independently of
    /// every other subscriber.
    pub async fn observe_presence(&self, group: &GroupName) -> Result<PresenceWatch> {
        let sub = self.store().subscribe(&paths::presence(group)).await?;
        Ok(Watch::spawn(sub, |docs| {
            let now = now_millis();
            parse_records(&docs)
                .into_iter()
                .filter(|r| !is_stale(r.last_active, now, PRESENCE_STALE_MS))
                .collect()
        }))
    }

    /// Announce presence now and keep re-announcing on the heartbeat
    /// interval until the returned handle is stopped or dropped.
    ///
    /// The initial announcement is awaited so a join failure surfaces to
    /// the caller; subsequent tick failures are logged and swallowed, the
    /// next tick retries naturally.
    pub async fn start_heartbeat(
        &self,
        group: &GroupName,
        user_id: &UserId,
        user_name: &str,
    ) -> Result<PresenceHeartbeat> {
        self.announce_presence(group, user_id, user_name, PresenceStatus::Online)
            .await?;

        let chat = self.clone();
        let hb_group = group.clone();
        let hb_user = user_id.clone();
        let hb_name = user_name.to_string();
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(HEARTBEAT_INTERVAL);
            // The first tick fires immediately; the announce above covered it.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if let Err(e) = chat
                    .announce_presence(&hb_group, &hb_user, &hb_name, PresenceStatus::Online)
                    .await
                {
                    warn!(group = %hb_group, user = %hb_user, error = %e, "heartbeat write failed");
                }
            }
        });

        Ok(PresenceHeartbeat {
            chat: self.clone(),
            group: group.clone(),
            user_id: user_id.clone(),
            task,
            retracted: false,
        })
    }
}

/// Running presence heartbeat for one user in one group.
///
/// Stop it explicitly with [`PresenceHeartbeat::stop`] to await the
/// retraction; dropping it also stops the loop and retracts best-effort.
pub struct PresenceHeartbeat {
    chat: Chat,
    group: GroupName,
    user_id: UserId,
    task: JoinHandle<()>,
    retracted: bool,
}

impl PresenceHeartbeat {
    /// Stop heartbeating and retract presence, awaiting the delete.
    pub async fn stop(mut self) -> Result<()> {
        self.task.abort();
        self.retracted = true;
        self.chat.retract_presence(&self.group, &self.user_id).await
    }
}

impl Drop for PresenceHeartbeat {
    fn drop(&mut self) {
        self.task.abort();
        if self.retracted {
            return;
        }
        // Best-effort retraction on scope exit. Outside a runtime (process
        // teardown) the record simply ages out via staleness filtering.
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let chat = self.chat.clone();
            let group = self.group.clone();
            let user_id = self.user_id.clone();
            handle.spawn(async move {
                if let Err(e) = chat.retract_presence(&group, &user_id).await {
                    warn!(group = %group, user = %user_id, error = %e, "presence retraction failed");
                }
            });
        }
    }
}

fn parse_records(docs: &[Document]) -> Vec<PresenceRecord> {
    docs.iter()
        .filter_map(|doc| match serde_json::from_value(doc.data.clone()) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(doc = %doc.id, error = %e, "skipping malformed presence record");
                None
            }
        })
        .collect()
}

/// Derive the activity badge for a record of the given age.
pub fn online_state(last_active: i64, now: i64) -> OnlineState {
    let age = now - last_active;
    if age < ONLINE_WINDOW_MS {
        OnlineState::Online
    } else if age < AWAY_WINDOW_MS {
        OnlineState::Away
    } else {
        OnlineState::Offline
    }
}

/// Human-readable "last seen" label.
pub fn format_last_seen(last_active: i64, now: i64) -> String {
    let seconds = (now - last_active) / 1000;
    let minutes = seconds / 60;
    let hours = minutes / 60;
    let days = hours / 24;

    if seconds < 60 {
        "just now".to_string()
    } else if minutes < 60 {
        format!("{minutes}m ago")
    } else if hours < 24 {
        format!("{hours}h ago")
    } else if days < 7 {
        format!("{days}d ago")
    } else {
        chrono::DateTime::from_timestamp_millis(last_active)
            .map(|dt| dt.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "long ago".to_string())
    }
}
