use sqlx::SqliteConnection;

use crate::db_types::MatchId;

/// Adds one to the comment counter of the match. Returns the number of rows touched, which is zero if the match has
/// no row in `t_contest`.
pub async fn increment_comments(match_id: &MatchId, conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("UPDATE t_contest SET comments = comments + 1 WHERE tcid = $1")
        .bind(match_id.as_str())
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}

pub async fn fetch_comment_count(match_id: &MatchId, conn: &mut SqliteConnection) -> Result<Option<i64>, sqlx::Error> {
    let count = sqlx::query_scalar::<_, i64>("SELECT comments FROM t_contest WHERE tcid = $1")
        .bind(match_id.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(count)
}
