//! # alcove-store
//!
//! The document-database seam for Alcove.
//!
//! The hosted backend is a black box to the rest of the workspace: the core
//! only ever talks to a [`DocumentStore`], which exposes upsert, point read,
//! ordered one-shot query, live collection snapshots, delete, and an atomic
//! per-document read-modify-write. [`MemoryStore`] is the in-process
//! implementation used by tests and local development.

pub mod memory;
pub mod paths;
pub mod store;

mod error;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use store::{Direction, Document, DocumentStore, Mutation, Subscription};
