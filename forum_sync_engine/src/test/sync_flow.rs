use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use serde_json::json;

use crate::{
    db_types::{ForumLinkState, ForumSettings, MatchId},
    events::MatchEvent,
    test_utils::prepare_env::{add_contest, prepare_test_env, TestStores},
    traits::{ForumStore, LinkStateError, LinkStateQueryFilter, LinkStateStore},
    ForumSyncApi,
    RenderError,
    SqliteForumDatabase,
    SqliteLinkStateStore,
    SyncError,
    SyncOutcome,
    TemplateRenderer,
};

const TEMPLATE: &str = "<h3>{{match_title}}</h3><p>{{payload.status}}</p>";

type Api = ForumSyncApi<SqliteForumDatabase, SqliteLinkStateStore>;

async fn setup() -> (TestStores, Api) {
    let stores = prepare_test_env(ForumSettings { forum_id: 9, author_id: 1 }).await;
    let renderer = Arc::new(TemplateRenderer::new(TEMPLATE).unwrap());
    let api = ForumSyncApi::new(stores.forum.clone(), stores.links.clone(), renderer);
    (stores, api)
}

fn event(id: &str, status: &str) -> MatchEvent {
    MatchEvent::new(id.into(), "Alpha vs Beta").with_payload(json!({ "status": status }))
}

async fn thread_count(stores: &TestStores, id: &str) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM forum_thread WHERE ext_id = $1")
        .bind(id)
        .fetch_one(stores.forum.pool())
        .await
        .unwrap()
}

#[tokio::test]
async fn match_lifecycle_creates_then_updates() {
    let (stores, api) = setup().await;
    let id = MatchId::from("M100");

    let created = api.process_match_event(&event("M100", "scheduled")).await.unwrap();
    let SyncOutcome::Created(link) = created else { panic!("expected the first event to create the link") };
    assert!(link.updated_at.is_none());
    let thread = stores.forum.fetch_thread_for_match(&id).await.unwrap().unwrap();
    assert_eq!(thread.id, link.thread_id);
    let post = stores.forum.fetch_post(link.post_id).await.unwrap().unwrap();
    assert_eq!(post.author_id, 1);
    assert_eq!(post.body, "<h3>Alpha vs Beta</h3><p>scheduled</p>");
    let stored = stores.links.fetch_link_state(&id).await.unwrap().unwrap();
    assert_eq!(stored, link);

    tokio::time::sleep(Duration::from_millis(5)).await;
    let updated = api.process_match_event(&event("M100", "finished")).await.unwrap();
    let SyncOutcome::Updated(relinked) = updated else { panic!("expected the second event to update the link") };
    assert_eq!(relinked.thread_id, link.thread_id);
    assert_eq!(relinked.post_id, link.post_id);
    assert_eq!(relinked.created_at, link.created_at);
    assert!(relinked.updated_at.unwrap() > link.created_at);
    let post = stores.forum.fetch_post(link.post_id).await.unwrap().unwrap();
    assert_eq!(post.body, "<h3>Alpha vs Beta</h3><p>finished</p>");
    let stored = stores.links.fetch_link_state(&id).await.unwrap().unwrap();
    assert_eq!(stored, relinked);
    assert_eq!(thread_count(&stores, "M100").await, 1);
    stores.tear_down().await;
}

#[tokio::test]
async fn repeated_event_is_idempotent() {
    let (stores, api) = setup().await;
    add_contest(&stores.forum, "M200").await;
    let ev = event("M200", "scheduled");
    let first = api.process_match_event(&ev).await.unwrap();
    let second = api.process_match_event(&ev).await.unwrap();
    assert!(first.was_created());
    assert!(!second.was_created());
    assert_eq!(first.link_state().thread_id, second.link_state().thread_id);
    assert_eq!(first.link_state().post_id, second.link_state().post_id);
    assert_eq!(thread_count(&stores, "M200").await, 1);
    let posts = stores.forum.fetch_posts_for_thread(first.link_state().thread_id).await.unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(stores.forum.comment_count(&"M200".into()).await.unwrap(), Some(1));
    let links = stores.links.list_link_states(LinkStateQueryFilter::default()).await.unwrap();
    assert_eq!(links.len(), 1);
    stores.tear_down().await;
}

#[tokio::test]
async fn concurrent_first_events_create_one_thread() {
    let (stores, api) = setup().await;
    let api = Arc::new(api);
    let tasks = (0..4)
        .map(|i| {
            let api = Arc::clone(&api);
            tokio::spawn(async move { api.process_match_event(&event("M300", &format!("v{i}"))).await })
        })
        .collect::<Vec<_>>();
    let mut created = 0;
    for task in tasks {
        if task.await.unwrap().unwrap().was_created() {
            created += 1;
        }
    }
    assert_eq!(created, 1);
    assert_eq!(thread_count(&stores, "M300").await, 1);
    let thread = stores.forum.fetch_thread_for_match(&"M300".into()).await.unwrap().unwrap();
    let posts = stores.forum.fetch_posts_for_thread(thread.id).await.unwrap();
    assert_eq!(posts.len(), 1);
    stores.tear_down().await;
}

#[tokio::test]
async fn render_failure_leaves_stores_untouched() {
    let (stores, api) = setup().await;
    let ev = MatchEvent::new("M400".into(), "No status here");
    let err = api.process_match_event(&ev).await.unwrap_err();
    assert!(matches!(err, SyncError::RenderError(RenderError::RenderFailed { .. })));
    assert_eq!(thread_count(&stores, "M400").await, 0);
    assert!(stores.links.fetch_link_state(&"M400".into()).await.unwrap().is_none());
    stores.tear_down().await;
}

#[tokio::test]
async fn render_failure_on_linked_match_keeps_the_old_post() {
    let (stores, api) = setup().await;
    let link = api.process_match_event(&event("M500", "scheduled")).await.unwrap().into_link_state();
    let ev = MatchEvent::new("M500".into(), "Alpha vs Beta");
    assert!(api.process_match_event(&ev).await.is_err());
    let post = stores.forum.fetch_post(link.post_id).await.unwrap().unwrap();
    assert_eq!(post.body, "<h3>Alpha vs Beta</h3><p>scheduled</p>");
    let stored = stores.links.fetch_link_state(&"M500".into()).await.unwrap().unwrap();
    assert!(stored.updated_at.is_none());
    stores.tear_down().await;
}

#[tokio::test]
async fn dangling_link_reports_missing_post() {
    let (stores, api) = setup().await;
    let link = api.process_match_event(&event("M600", "scheduled")).await.unwrap().into_link_state();
    sqlx::query("DELETE FROM forum_post WHERE postid = $1").bind(link.post_id).execute(stores.forum.pool()).await.unwrap();
    let err = api.process_match_event(&event("M600", "finished")).await.unwrap_err();
    assert!(matches!(err, SyncError::ForumStoreError(crate::ForumStoreError::PostNotFound(id)) if id == link.post_id));
    let stored = stores.links.fetch_link_state(&"M600".into()).await.unwrap().unwrap();
    assert!(stored.updated_at.is_none());
    stores.tear_down().await;
}

/// Delegates to a SQLite link store, but rejects the next upsert while `fail_upsert` is set.
struct FlakyLinks {
    inner: SqliteLinkStateStore,
    fail_upsert: AtomicBool,
}

impl LinkStateStore for FlakyLinks {
    async fn fetch_link_state(&self, match_id: &MatchId) -> Result<Option<ForumLinkState>, LinkStateError> {
        self.inner.fetch_link_state(match_id).await
    }

    async fn upsert_link_state(&self, state: &ForumLinkState) -> Result<(), LinkStateError> {
        if self.fail_upsert.swap(false, Ordering::SeqCst) {
            return Err(LinkStateError::DatabaseError("connection reset".into()));
        }
        self.inner.upsert_link_state(state).await
    }

    async fn list_link_states(&self, filter: LinkStateQueryFilter) -> Result<Vec<ForumLinkState>, LinkStateError> {
        self.inner.list_link_states(filter).await
    }
}

#[tokio::test]
async fn failed_link_write_is_recovered_by_the_next_event() {
    let stores = prepare_test_env(ForumSettings { forum_id: 9, author_id: 1 }).await;
    add_contest(&stores.forum, "M700").await;
    let links = FlakyLinks { inner: stores.links.clone(), fail_upsert: AtomicBool::new(true) };
    let renderer = Arc::new(TemplateRenderer::new(TEMPLATE).unwrap());
    let api = ForumSyncApi::new(stores.forum.clone(), links, renderer);
    let id = MatchId::from("M700");

    let err = api.process_match_event(&event("M700", "scheduled")).await.unwrap_err();
    assert!(matches!(err, SyncError::LinkStateError(LinkStateError::DatabaseError(_))));
    assert!(stores.links.fetch_link_state(&id).await.unwrap().is_none());
    // The forum side was committed before the link write failed
    let thread = stores.forum.fetch_thread_for_match(&id).await.unwrap().unwrap();
    let posts = stores.forum.fetch_posts_for_thread(thread.id).await.unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(stores.forum.comment_count(&id).await.unwrap(), Some(1));

    let outcome = api.process_match_event(&event("M700", "live")).await.unwrap();
    let SyncOutcome::Created(link) = outcome else { panic!("an unlinked match must go through the create path") };
    assert_eq!(link.thread_id, thread.id);
    assert_eq!(link.post_id, posts[0].id);
    assert_eq!(stores.links.fetch_link_state(&id).await.unwrap(), Some(link.clone()));
    let posts = stores.forum.fetch_posts_for_thread(thread.id).await.unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].body, "<h3>Alpha vs Beta</h3><p>live</p>");
    assert_eq!(stores.forum.comment_count(&id).await.unwrap(), Some(1));
    assert_eq!(thread_count(&stores, "M700").await, 1);
    stores.tear_down().await;
}
