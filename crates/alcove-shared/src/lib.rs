//! # alcove-shared
//!
//! Types, constants, and security helpers shared by every Alcove crate.
//!
//! Alcove is the client-side core of a group chat application built on a
//! hosted document database: groups are password-protected rooms, and all
//! derived state (who is online, who is typing, who has read what) is
//! recomputed by each client from timestamped records.

pub mod constants;
pub mod security;
pub mod time;
pub mod types;

pub use types::{GroupName, MessageId, SessionId, UserId};
