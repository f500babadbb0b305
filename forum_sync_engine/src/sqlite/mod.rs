//! SQLite backends for the forum sync engine.
//!
//! * [`SqliteForumDatabase`] talks to the forum's relational database.
//! * [`SqliteLinkStateStore`] keeps the link state records that this service owns.
//!
//! Each has its own pool and URL. The forum database belongs to the forum software, the link state database to this
//! service.
mod forum_impl;
mod link_state_impl;

pub mod db;
pub use forum_impl::SqliteForumDatabase;
pub use link_state_impl::{SqliteLinkStateStore, LINK_STATE_TIMEOUT};
