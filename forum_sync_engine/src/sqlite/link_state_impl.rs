//! `SqliteLinkStateStore` keeps the match → forum thread/post mapping in its own SQLite database.
//!
//! Every operation is bounded by a fixed timeout ([`LINK_STATE_TIMEOUT`] unless configured otherwise). The timeout is
//! applied here, inside the store, so it holds no matter what deadline the caller wraps around the call.
use std::{fmt::Debug, future::Future, time::Duration};

use log::*;
use sqlx::SqlitePool;

use super::db::{link_states, new_pool};
use crate::{
    db_types::{ForumLinkState, MatchId},
    traits::{LinkStateError, LinkStateQueryFilter, LinkStateStore},
};

pub const LINK_STATE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct SqliteLinkStateStore {
    url: String,
    pool: SqlitePool,
    timeout: Duration,
}

impl Debug for SqliteLinkStateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteLinkStateStore ({:?}, timeout {:?})", self.pool, self.timeout)
    }
}

impl LinkStateStore for SqliteLinkStateStore {
    async fn fetch_link_state(&self, match_id: &MatchId) -> Result<Option<ForumLinkState>, LinkStateError> {
        self.bounded(async {
            let mut conn = self.pool.acquire().await?;
            let state = link_states::fetch_link_state(match_id, &mut conn).await?;
            Ok::<_, LinkStateError>(state)
        })
        .await
    }

    async fn upsert_link_state(&self, state: &ForumLinkState) -> Result<(), LinkStateError> {
        self.bounded(async {
            let mut conn = self.pool.acquire().await?;
            link_states::upsert_link_state(state, &mut conn).await?;
            debug!("🔗️ Link state for match {} saved", state.match_id);
            Ok::<_, LinkStateError>(())
        })
        .await
    }

    async fn list_link_states(&self, filter: LinkStateQueryFilter) -> Result<Vec<ForumLinkState>, LinkStateError> {
        self.bounded(async {
            let mut conn = self.pool.acquire().await?;
            let states = link_states::fetch_link_states(filter, &mut conn).await?;
            Ok::<_, LinkStateError>(states)
        })
        .await
    }
}

impl SqliteLinkStateStore {
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("Creating new link state connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool, timeout: LINK_STATE_TIMEOUT })
    }

    /// Overrides the per-operation timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Brings the link state schema up to date. The link state database is owned by this service, so this is safe to
    /// run on every start.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./src/sqlite/migrations/link_state").run(&self.pool).await
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn bounded<T, F>(&self, op: F) -> Result<T, LinkStateError>
    where F: Future<Output = Result<T, LinkStateError>> {
        match tokio::time::timeout(self.timeout, op).await {
            Ok(result) => result,
            Err(_) => {
                warn!("🔗️ Link state operation timed out after {:?}", self.timeout);
                Err(LinkStateError::Timeout(self.timeout))
            },
        }
    }
}
