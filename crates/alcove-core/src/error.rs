use alcove_shared::{GroupName, MessageId, SessionId};
use thiserror::Error;

/// Errors produced by the chat core.
///
/// Nothing here is fatal to the process; every failure is scoped to the
/// operation that raised it and is surfaced to the caller undecorated.
#[derive(Error, Debug)]
pub enum ChatError {
    /// Propagated storage failure.
    #[error("Store error: {0}")]
    Store(#[from] alcove_store::StoreError),

    /// A document could not be decoded into its model type.
    #[error("Malformed document: {0}")]
    Serde(#[from] serde_json::Error),

    /// Explicit admin operation targeting a group that does not exist.
    #[error("Group not found: {0}")]
    GroupNotFound(GroupName),

    /// Explicit admin operation targeting a message that does not exist.
    #[error("Message not found: {0}")]
    MessageNotFound(MessageId),

    /// Session lookup for a join that requires one.
    #[error("Session not found: {0}")]
    SessionNotFound(SessionId),

    /// Group password did not match.
    #[error("Wrong password for group: {0}")]
    WrongPassword(GroupName),

    /// Rejected group name (length or character set).
    #[error("Invalid group name: {0:?}")]
    InvalidGroupName(String),

    /// Rejected display name (length).
    #[error("Invalid display name: {0:?}")]
    InvalidDisplayName(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ChatError>;
