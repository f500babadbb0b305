use thiserror::Error;

use crate::db_types::{ForumPost, ForumThread, MatchId, ThreadAndPost};

#[derive(Debug, Clone, Error)]
pub enum ForumStoreError {
    #[error("We have an internal database engine (configuration/uptime etc.) : {0}")]
    DatabaseError(String),
    #[error("The forum post {0} does not exist")]
    PostNotFound(i64),
    #[error("Lost the race to create {0} for match {1}, and the winning row could not be found either")]
    InsertConflict(&'static str, MatchId),
}

impl From<sqlx::Error> for ForumStoreError {
    fn from(e: sqlx::Error) -> Self {
        ForumStoreError::DatabaseError(e.to_string())
    }
}

/// The `ForumStore` trait defines the behaviour of the relational forum backend that match threads live in.
///
/// Only two mutations are supported. Threads and posts are never deleted, and the service only ever writes a single
/// post per match thread.
#[allow(async_fn_in_trait)]
pub trait ForumStore {
    /// Makes sure that a thread for `match_id` exists, and that it contains a post by the service account whose body
    /// is `body`. Everything happens in a single atomic transaction:
    /// * The thread is looked up by its external id. If there is none, a new thread titled `match_title` is created.
    /// * The service account's post in that thread is looked up. If there is none, it is created and the comment
    ///   counter of the match is incremented. Otherwise, the existing post body is replaced with `body`.
    ///
    /// If any step fails, nothing is committed.
    async fn find_or_create_thread_and_post(
        &self,
        match_id: &MatchId,
        match_title: &str,
        body: &str,
    ) -> Result<ThreadAndPost, ForumStoreError>;

    /// Replaces the body of the post with the given id. Returns [`ForumStoreError::PostNotFound`] if there is no such
    /// post.
    async fn update_post(&self, post_id: i64, body: &str) -> Result<(), ForumStoreError>;

    /// Fetches the thread that was created for the given match, if any.
    async fn fetch_thread_for_match(&self, match_id: &MatchId) -> Result<Option<ForumThread>, ForumStoreError>;

    async fn fetch_post(&self, post_id: i64) -> Result<Option<ForumPost>, ForumStoreError>;

    /// All posts in the thread, ordered by post id.
    async fn fetch_posts_for_thread(&self, thread_id: i64) -> Result<Vec<ForumPost>, ForumStoreError>;
}
