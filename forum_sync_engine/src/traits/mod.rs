//! # Storage backends
//!
//! This module defines the interface contracts of the two stores the synchronisation engine works against.
//!
//! * [`ForumStore`] is the relational forum database that threads and posts are written to. It is owned by the
//!   forum software; this service only ever creates one thread and one post per match and edits that post afterwards.
//! * [`LinkStateStore`] is owned by this service. It remembers which thread and post belong to which match, so that a
//!   repeated event results in an edit rather than a duplicate thread.
//!
//! The SQLite implementations live in [`crate::sqlite`].
mod data_objects;
mod forum_store;
mod link_state_store;

pub use data_objects::LinkStateQueryFilter;
pub use forum_store::{ForumStore, ForumStoreError};
pub use link_state_store::{LinkStateError, LinkStateStore};
