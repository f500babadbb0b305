use log::trace;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use crate::{
    db_types::{ForumLinkState, MatchId},
    traits::LinkStateQueryFilter,
};

pub async fn fetch_link_state(
    match_id: &MatchId,
    conn: &mut SqliteConnection,
) -> Result<Option<ForumLinkState>, sqlx::Error> {
    let state = sqlx::query_as(
        r#"
            SELECT match_id, post_id, thread_id, created_at, updated_at
            FROM forum_link_state
            WHERE match_id = $1;
        "#,
    )
    .bind(match_id.as_str())
    .fetch_optional(conn)
    .await?;
    Ok(state)
}

/// Writes the whole record. An existing record for the same match is overwritten, field for field.
pub async fn upsert_link_state(state: &ForumLinkState, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    let result = sqlx::query(
        r#"
            INSERT INTO forum_link_state (match_id, post_id, thread_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (match_id) DO UPDATE SET
                post_id = excluded.post_id,
                thread_id = excluded.thread_id,
                created_at = excluded.created_at,
                updated_at = excluded.updated_at;
        "#,
    )
    .bind(state.match_id.as_str())
    .bind(state.post_id)
    .bind(state.thread_id)
    .bind(state.created_at)
    .bind(state.updated_at)
    .execute(conn)
    .await?;
    trace!("🔗️ Result of upsert_link_state: {result:?}");
    Ok(())
}

/// Fetches link states according to the criteria in the filter, ordered by `created_at` in ascending order.
pub async fn fetch_link_states(
    filter: LinkStateQueryFilter,
    conn: &mut SqliteConnection,
) -> Result<Vec<ForumLinkState>, sqlx::Error> {
    let mut builder: QueryBuilder<Sqlite> =
        QueryBuilder::new("SELECT match_id, post_id, thread_id, created_at, updated_at FROM forum_link_state ");
    if !filter.is_empty() {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(match_id) = filter.match_id {
        where_clause.push("match_id = ");
        where_clause.push_bind_unseparated(match_id.0);
    }
    if let Some(thread_id) = filter.thread_id {
        where_clause.push("thread_id = ");
        where_clause.push_bind_unseparated(thread_id);
    }
    if let Some(since) = filter.created_since {
        where_clause.push("created_at >= ");
        where_clause.push_bind_unseparated(since);
    }
    if let Some(since) = filter.updated_since {
        where_clause.push("updated_at >= ");
        where_clause.push_bind_unseparated(since);
    }
    builder.push(" ORDER BY created_at ASC");
    trace!("🔗️ Executing query: {}", builder.sql());
    let states = builder.build_query_as::<ForumLinkState>().fetch_all(conn).await?;
    trace!("🔗️ Result of fetch_link_states: {}", states.len());
    Ok(states)
}
