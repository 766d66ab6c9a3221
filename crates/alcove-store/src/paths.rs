//! Document and collection path builders.
//!
//! A document path is its collection path plus a trailing id segment:
//! `groups/ops` is the group document, `groups/ops/messages` the message
//! collection, `groups/ops/messages/<uuid>` one message. Keeping these in
//! one module means no other crate ever concatenates path strings by hand.

use alcove_shared::{GroupName, MessageId, SessionId, UserId};

use crate::error::{Result, StoreError};

pub const GROUPS: &str = "groups";
pub const SESSIONS: &str = "sessions";
pub const USERS: &str = "users";

pub fn group_doc(group: &GroupName) -> String {
    format!("{GROUPS}/{group}")
}

pub fn messages(group: &GroupName) -> String {
    format!("{GROUPS}/{group}/messages")
}

pub fn message_doc(group: &GroupName, id: &MessageId) -> String {
    format!("{GROUPS}/{group}/messages/{id}")
}

pub fn presence(group: &GroupName) -> String {
    format!("{GROUPS}/{group}/presence")
}

pub fn presence_doc(group: &GroupName, user: &UserId) -> String {
    format!("{GROUPS}/{group}/presence/{user}")
}

pub fn typing(group: &GroupName) -> String {
    format!("{GROUPS}/{group}/typing")
}

pub fn typing_doc(group: &GroupName, user: &UserId) -> String {
    format!("{GROUPS}/{group}/typing/{user}")
}

pub fn session_doc(session: &SessionId) -> String {
    format!("{SESSIONS}/{session}")
}

pub fn user_doc(user: &UserId) -> String {
    format!("{USERS}/{user}")
}

/// Split a document path into `(collection_path, doc_id)`.
///
/// A document path always has an even number of segments with none empty.
pub fn split_doc_path(path: &str) -> Result<(&str, &str)> {
    let segments: Vec<&str> = path.split('/').collect();
    if segments.len() < 2 || segments.len() % 2 != 0 || segments.iter().any(|s| s.is_empty()) {
        return Err(StoreError::InvalidPath(path.to_string()));
    }
    // Unwrap is safe: at least two non-empty segments.
    let (collection, id) = path.rsplit_once('/').unwrap();
    Ok((collection, id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_nested_paths() {
        let group = GroupName::new("ops");
        let user = UserId("user_1_abc".to_string());
        assert_eq!(group_doc(&group), "groups/ops");
        assert_eq!(presence_doc(&group, &user), "groups/ops/presence/user_1_abc");
        assert_eq!(typing(&group), "groups/ops/typing");
    }

    #[test]
    fn splits_doc_paths() {
        let (collection, id) = split_doc_path("groups/ops/messages/m1").unwrap();
        assert_eq!(collection, "groups/ops/messages");
        assert_eq!(id, "m1");

        let (collection, id) = split_doc_path("groups/ops").unwrap();
        assert_eq!(collection, "groups");
        assert_eq!(id, "ops");
    }

    #[test]
    fn rejects_collection_and_empty_segments() {
        assert!(split_doc_path("groups/ops/messages").is_err());
        assert!(split_doc_path("groups//x/y").is_err());
        assert!(split_doc_path("groups").is_err());
    }
}
