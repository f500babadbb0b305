//! `SqliteForumDatabase` is a concrete implementation of the [`ForumStore`] backend.
//!
//! The forum schema belongs to the forum software. Apart from the `t_contest.comments` counter, this service only
//! touches the `forum_thread` and `forum_post` rows of the threads it created itself.
use std::fmt::Debug;

use log::*;
use sqlx::SqlitePool;

use super::db::{contests, new_pool, posts, threads, InsertResult};
use crate::{
    db_types::{ForumPost, ForumSettings, ForumThread, MatchId, ThreadAndPost},
    traits::{ForumStore, ForumStoreError},
};

#[derive(Clone)]
pub struct SqliteForumDatabase {
    url: String,
    pool: SqlitePool,
    settings: ForumSettings,
}

impl Debug for SqliteForumDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteForumDatabase ({:?}, {:?})", self.pool, self.settings)
    }
}

impl ForumStore for SqliteForumDatabase {
    async fn find_or_create_thread_and_post(
        &self,
        match_id: &MatchId,
        match_title: &str,
        body: &str,
    ) -> Result<ThreadAndPost, ForumStoreError> {
        let author_id = self.settings.author_id;
        let mut tx = self.pool.begin().await?;
        let thread = threads::idempotent_insert(match_id, match_title, self.settings.forum_id, &mut tx).await?;
        let thread_id = thread.id();
        match thread {
            InsertResult::Inserted(_) => info!("🧵️ Created thread #{thread_id} for match {match_id}"),
            InsertResult::AlreadyExists(_) => debug!("🧵️ Found existing thread #{thread_id} for match {match_id}"),
        }
        let (post_id, post_created) = match posts::fetch_post_by_author(thread_id, author_id, &mut tx).await? {
            Some(post) => {
                debug!("🧵️ Post #{} in thread #{thread_id} exists and will be updated", post.id);
                posts::update_body(post.id, body, &mut tx).await?;
                (post.id, false)
            },
            None => {
                let post_id = posts::insert_post(thread_id, author_id, body, &mut tx).await?;
                info!("🧵️ Created post #{post_id} in thread #{thread_id} for match {match_id}");
                if contests::increment_comments(match_id, &mut tx).await? == 0 {
                    debug!("🧵️ Match {match_id} has no contest entry. The comment counter was not incremented.");
                }
                (post_id, true)
            },
        };
        tx.commit().await?;
        Ok(ThreadAndPost { thread_id, post_id, thread_created: thread.was_inserted(), post_created })
    }

    async fn update_post(&self, post_id: i64, body: &str) -> Result<(), ForumStoreError> {
        let mut tx = self.pool.begin().await?;
        if !posts::update_body(post_id, body, &mut tx).await? {
            // Dropping the transaction rolls it back
            return Err(ForumStoreError::PostNotFound(post_id));
        }
        tx.commit().await?;
        trace!("🧵️ Post #{post_id} has been updated.");
        Ok(())
    }

    async fn fetch_thread_for_match(&self, match_id: &MatchId) -> Result<Option<ForumThread>, ForumStoreError> {
        let mut conn = self.pool.acquire().await?;
        let thread = threads::fetch_thread_for_match(match_id, &mut conn).await?;
        Ok(thread)
    }

    async fn fetch_post(&self, post_id: i64) -> Result<Option<ForumPost>, ForumStoreError> {
        let mut conn = self.pool.acquire().await?;
        let post = posts::fetch_post(post_id, &mut conn).await?;
        Ok(post)
    }

    async fn fetch_posts_for_thread(&self, thread_id: i64) -> Result<Vec<ForumPost>, ForumStoreError> {
        let mut conn = self.pool.acquire().await?;
        let posts = posts::fetch_posts_for_thread(thread_id, &mut conn).await?;
        Ok(posts)
    }
}

impl SqliteForumDatabase {
    pub async fn new_with_url(url: &str, max_connections: u32, settings: ForumSettings) -> Result<Self, sqlx::Error> {
        trace!("Creating new forum database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool, settings })
    }

    /// Creates the subset of the forum schema that this service uses, if it does not exist. Only meant for development
    /// and test databases. In production, the forum owns its schema.
    pub async fn create_schema(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./src/sqlite/migrations/forum").run(&self.pool).await
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    pub fn settings(&self) -> ForumSettings {
        self.settings
    }

    /// Returns the current comment counter for the match, or `None` if the match has no contest entry.
    pub async fn comment_count(&self, match_id: &MatchId) -> Result<Option<i64>, ForumStoreError> {
        let mut conn = self.pool.acquire().await?;
        let count = contests::fetch_comment_count(match_id, &mut conn).await?;
        Ok(count)
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
