//! # alcove-core
//!
//! Client-side logic of the Alcove group chat: presence tracking, typing
//! indicators, read receipts with a derived message-status state machine,
//! plus message/group CRUD, sessions, and admin moderation.
//!
//! Everything is built on the five document-store primitives from
//! `alcove-store`. There is no server-side coordination: each client writes
//! small timestamped records under paths scoped by group and user, and every
//! subscriber independently derives its view (who is online, who is typing,
//! which messages are read) by filtering on elapsed time or set membership.
//!
//! All `observe_*` calls return watch handles that detach their listener
//! when dropped, so a listener can never outlive the UI that created it.

pub mod admin;
pub mod chat;
pub mod error;
pub mod groups;
pub mod messages;
pub mod models;
pub mod presence;
pub mod receipts;
pub mod session;
pub mod typing;
pub mod watch;

pub use admin::{AdminGate, AllOnlineWatch, GroupPresence};
pub use chat::Chat;
pub use error::{ChatError, Result};
pub use models::*;
pub use presence::PresenceHeartbeat;
pub use session::{DocumentSessionStore, SessionStore};
pub use typing::TypingDebouncer;
pub use watch::Watch;
