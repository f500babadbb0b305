//! # Forum sync engine public API
//!
//! [`forum_sync_api::ForumSyncApi`] is the entry point for match events. An API instance is created by supplying the
//! two storage backends, a post renderer and (optionally) a shared [`ConcurrencyGate`](crate::ConcurrencyGate).
//!
//! ```rust,ignore
//! use forum_sync_engine::{ForumSyncApi, SqliteForumDatabase, SqliteLinkStateStore, TemplateRenderer};
//! let forum = SqliteForumDatabase::new_with_url(..., 5, settings).await?;
//! let links = SqliteLinkStateStore::new_with_url(..., 5).await?;
//! let api = ForumSyncApi::new(forum, links, Arc::new(TemplateRenderer::new(template)?));
//! let outcome = api.process_match_event(&event).await?;
//! ```
pub mod errors;
pub mod forum_sync_api;
pub mod sync_objects;
