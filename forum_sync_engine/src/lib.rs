//! Forum Sync Engine
//!
//! The forum sync engine keeps a dotlan forum thread in step with every tournament match. Whenever something happens
//! to a match, a [`MatchEvent`] is handed to the engine, which makes sure the match has exactly one thread with exactly
//! one post by the service account, and that the post shows the latest rendering of the match.
//!
//! The library is divided into these sections:
//! 1. Storage ([`mod@traits`] and [`mod@sqlite`]). There are two stores: the forum's own relational database, which
//!    the engine writes threads and posts to, and the link state store, which remembers which thread and post belong
//!    to which match. The traits describe what the engine needs from each; SQLite implementations are provided.
//! 2. The public API ([`ForumSyncApi`]). It decides, per event, whether to create or update forum content, and drives
//!    the two stores accordingly. Execution is serialised system-wide by a [`ConcurrencyGate`].
//! 3. Plumbing: a bounded [`EventHandler`] worker pool that events are fed through, and the [`TemplateRenderer`] that
//!    turns events into post bodies.
pub mod db_types;
pub mod events;
mod fsm_api;
pub mod gate;
pub mod render;
#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

#[cfg(test)]
mod test;

pub use events::{EventHandler, EventProducer, MatchEvent};
pub use fsm_api::{
    errors::SyncError,
    forum_sync_api::{ForumSyncApi, DEFAULT_EVENT_TIMEOUT},
    sync_objects::SyncOutcome,
};
pub use gate::ConcurrencyGate;
pub use render::{PostRenderer, RenderError, TemplateRenderer, DEFAULT_POST_TEMPLATE};
#[cfg(feature = "sqlite")]
pub use sqlite::{SqliteForumDatabase, SqliteLinkStateStore, LINK_STATE_TIMEOUT};
pub use traits::{ForumStore, ForumStoreError, LinkStateError, LinkStateQueryFilter, LinkStateStore};
