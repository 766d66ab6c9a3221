//! Domain model structs stored as documents in the hosted database.
//!
//! Every struct derives `Serialize` and `Deserialize`; the serialized form
//! is the document body, with the document key carried separately (group
//! name, user id, or message id depending on the collection).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use alcove_shared::{GroupName, MessageId, SessionId, UserId};

// ---------------------------------------------------------------------------
// Presence
// ---------------------------------------------------------------------------

/// Self-reported status carried by a presence heartbeat.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PresenceStatus {
    Online,
    Away,
}

/// Per-user-per-group heartbeat document, keyed by user id within
/// `groups/<g>/presence`. Overwritten on every heartbeat; a user with
/// several tabs open collapses to one record (last heartbeat wins).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PresenceRecord {
    pub user_id: UserId,
    pub user_name: String,
    /// Epoch millis of the last heartbeat.
    pub last_active: i64,
    pub status: PresenceStatus,
}

/// Activity badge derived from a record's age, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnlineState {
    Online,
    Away,
    Offline,
}

// ---------------------------------------------------------------------------
// Typing
// ---------------------------------------------------------------------------

/// Ephemeral "is typing" document, keyed by user id within
/// `groups/<g>/typing`. The writer deletes it when typing stops; readers
/// additionally ignore records past the staleness window in case the writer
/// terminated abruptly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TypingRecord {
    pub user_name: String,
    /// Epoch millis of the last keystroke that refreshed the record.
    pub timestamp: i64,
}

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

/// Message payload, discriminated by an explicit `kind` tag.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum MessageBody {
    Text {
        content: String,
    },
    Image {
        media_url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        file_name: Option<String>,
    },
    Video {
        media_url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        file_name: Option<String>,
    },
    File {
        media_url: String,
        file_name: String,
    },
}

/// A single chat message.
///
/// Immutable once created, except that `read_by` / `read_by_timestamps`
/// grow monotonically as readers mark it read. No retraction: the read set
/// never shrinks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub id: MessageId,
    pub user_id: UserId,
    pub user_name: String,
    /// Epoch millis at send time, as reported by the sender.
    pub sent_at: i64,
    #[serde(flatten)]
    pub body: MessageBody,
    /// Users who have read this message, each at most once.
    #[serde(default)]
    pub read_by: Vec<UserId>,
    /// When each reader first marked the message read.
    #[serde(default)]
    pub read_by_timestamps: BTreeMap<String, i64>,
}

/// Display status of a message, derived from elapsed time and the size of
/// its read set. Time-driven: recompute on every render, never cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageStatus {
    /// Within the send grace period, regardless of receipts.
    Sending,
    /// Past the grace period, unread, not yet old enough to assume delivery.
    Sent,
    /// Old enough to assume delivery, still unread.
    Delivered,
    /// At least one reader.
    Read { readers: usize },
}

/// One resolved entry of the "read by" tooltip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadReceipt {
    pub display_name: String,
    /// Epoch millis when the reader marked the message read.
    pub read_at: i64,
}

// ---------------------------------------------------------------------------
// Groups, sessions, users
// ---------------------------------------------------------------------------

/// A password-protected chat room; the name doubles as the document key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Group {
    pub name: GroupName,
    pub password_hash: String,
    /// Epoch millis at creation.
    pub created_at: i64,
}

/// A user's membership of one group for the lifetime of a browser tab.
/// Passed explicitly to whatever needs it; never read from ambient state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Session {
    pub session_id: SessionId,
    pub user_id: UserId,
    pub display_name: String,
    pub group_name: GroupName,
}

/// Registry entry mapping a user id to a display name, used when resolving
/// read receipts into the tooltip.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegisteredUser {
    pub user_id: UserId,
    pub display_name: String,
    /// Epoch millis at registration.
    pub registered_at: i64,
}
