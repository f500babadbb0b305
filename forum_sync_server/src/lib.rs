//! # Forum sync server
//! This crate hosts the process around the forum sync engine. It is responsible for:
//! Reading match events from the message feed.
//! Decoding them and queueing them for the worker pool.
//! Wiring the worker pool to the [`forum_sync_engine::ForumSyncApi`], backed by the forum and link state databases.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Input
//! Events are read from stdin, one broker message per line. See [ingest](ingest/index.html) for the message format.
pub mod cli;
pub mod config;
pub mod errors;
pub mod ingest;
pub mod server;
