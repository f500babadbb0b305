use chrono::Utc;
use sqlx::SqliteConnection;

use crate::db_types::ForumPost;

const POST_COLUMNS: &str = "postid, threadid, userid, dateline, htmltext";

/// Returns the first post (by post id) that `author_id` wrote in the thread.
pub async fn fetch_post_by_author(
    thread_id: i64,
    author_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<ForumPost>, sqlx::Error> {
    let sql = format!(
        "SELECT {POST_COLUMNS} FROM forum_post WHERE threadid = $1 AND userid = $2 ORDER BY postid ASC LIMIT 1"
    );
    let post = sqlx::query_as(&sql).bind(thread_id).bind(author_id).fetch_optional(conn).await?;
    Ok(post)
}

pub async fn fetch_post(post_id: i64, conn: &mut SqliteConnection) -> Result<Option<ForumPost>, sqlx::Error> {
    let sql = format!("SELECT {POST_COLUMNS} FROM forum_post WHERE postid = $1");
    let post = sqlx::query_as(&sql).bind(post_id).fetch_optional(conn).await?;
    Ok(post)
}

pub async fn fetch_posts_for_thread(
    thread_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<ForumPost>, sqlx::Error> {
    let sql = format!("SELECT {POST_COLUMNS} FROM forum_post WHERE threadid = $1 ORDER BY postid ASC");
    let posts = sqlx::query_as(&sql).bind(thread_id).fetch_all(conn).await?;
    Ok(posts)
}

/// Inserts a new post and returns its id.
pub async fn insert_post(
    thread_id: i64,
    author_id: i64,
    body: &str,
    conn: &mut SqliteConnection,
) -> Result<i64, sqlx::Error> {
    let id = sqlx::query_scalar::<_, i64>(
        r#"
            INSERT INTO forum_post (threadid, userid, dateline, htmltext)
            VALUES ($1, $2, $3, $4)
            RETURNING postid;
        "#,
    )
    .bind(thread_id)
    .bind(author_id)
    .bind(Utc::now())
    .bind(body)
    .fetch_one(conn)
    .await?;
    Ok(id)
}

/// Replaces the body of the post. Returns `false` if there is no post with the given id.
pub async fn update_body(post_id: i64, body: &str, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let result =
        sqlx::query("UPDATE forum_post SET htmltext = $1 WHERE postid = $2").bind(body).bind(post_id).execute(conn).await?;
    Ok(result.rows_affected() > 0)
}
