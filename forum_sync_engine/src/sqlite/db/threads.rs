use chrono::Utc;
use log::{debug, warn};
use sqlx::SqliteConnection;

use super::InsertResult;
use crate::{
    db_types::{ForumThread, MatchId, MATCH_THREAD_EXT},
    traits::ForumStoreError,
};

/// Returns the first thread (by thread id) whose external id is the given match.
pub async fn fetch_thread_for_match(
    match_id: &MatchId,
    conn: &mut SqliteConnection,
) -> Result<Option<ForumThread>, sqlx::Error> {
    let thread = sqlx::query_as(
        r#"
            SELECT threadid, title, forumid, lastposttime, replies, hits, ext, ext_id
            FROM forum_thread
            WHERE ext = $1 AND ext_id = $2
            ORDER BY threadid ASC
            LIMIT 1;
        "#,
    )
    .bind(MATCH_THREAD_EXT)
    .bind(match_id.as_str())
    .fetch_optional(conn)
    .await?;
    Ok(thread)
}

/// Returns the thread for the match, creating it if it does not exist yet.
pub async fn idempotent_insert(
    match_id: &MatchId,
    title: &str,
    forum_id: i64,
    conn: &mut SqliteConnection,
) -> Result<InsertResult, ForumStoreError> {
    match fetch_thread_for_match(match_id, conn).await? {
        Some(thread) => Ok(InsertResult::AlreadyExists(thread.id)),
        None => insert_thread(match_id, title, forum_id, conn).await,
    }
}

/// Inserts a new match thread. This is not atomic. You can embed this call inside a transaction if you need to ensure
/// atomicity, and pass `&mut tx` as the connection argument.
///
/// If another writer created the thread between our lookup and this insert, the unique index on the external id
/// rejects the insert. In that case the lookup is repeated once and the winner's thread is returned.
pub async fn insert_thread(
    match_id: &MatchId,
    title: &str,
    forum_id: i64,
    conn: &mut SqliteConnection,
) -> Result<InsertResult, ForumStoreError> {
    let result = sqlx::query_scalar::<_, i64>(
        r#"
            INSERT INTO forum_thread (title, forumid, lastposttime, replies, hits, ext, ext_id)
            VALUES ($1, $2, $3, 1, 1, $4, $5)
            RETURNING threadid;
        "#,
    )
    .bind(title)
    .bind(forum_id)
    .bind(Utc::now())
    .bind(MATCH_THREAD_EXT)
    .bind(match_id.as_str())
    .fetch_one(&mut *conn)
    .await;
    match result {
        Ok(id) => {
            debug!("🧵️ Thread #{id} inserted for match {match_id}");
            Ok(InsertResult::Inserted(id))
        },
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            warn!("🧵️ A thread for match {match_id} was created concurrently. Looking it up again.");
            fetch_thread_for_match(match_id, conn)
                .await?
                .map(|t| InsertResult::AlreadyExists(t.id))
                .ok_or_else(|| ForumStoreError::InsertConflict("thread", match_id.clone()))
        },
        Err(e) => Err(e.into()),
    }
}
