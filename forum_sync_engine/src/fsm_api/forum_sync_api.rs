use std::{fmt::Debug, sync::Arc, time::Duration};

use log::*;

use crate::{
    db_types::ForumLinkState,
    events::MatchEvent,
    fsm_api::{errors::SyncError, sync_objects::SyncOutcome},
    gate::ConcurrencyGate,
    render::PostRenderer,
    traits::{ForumStore, LinkStateStore},
};

/// The longest time a single event may take from the first link state lookup to the final link state write.
pub const DEFAULT_EVENT_TIMEOUT: Duration = Duration::from_secs(30);

/// `ForumSyncApi` keeps a forum thread and post in step with every match it receives events for.
///
/// Each match is either *unlinked* (there is no link state for it) or *linked*. The first event for a match finds or
/// creates the thread and post, and records the link. Every later event rewrites the post and refreshes the link's
/// `updated_at`. Handling is serialised by the [`ConcurrencyGate`], so events for the same match never race, even when
/// several workers share the API.
pub struct ForumSyncApi<F, L> {
    forum: F,
    links: L,
    renderer: Arc<dyn PostRenderer + Send + Sync>,
    gate: ConcurrencyGate,
    event_timeout: Duration,
}

impl<F, L> Debug for ForumSyncApi<F, L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ForumSyncApi (event timeout {:?})", self.event_timeout)
    }
}

impl<F, L> ForumSyncApi<F, L> {
    pub fn new(forum: F, links: L, renderer: Arc<dyn PostRenderer + Send + Sync>) -> Self {
        Self { forum, links, renderer, gate: ConcurrencyGate::new(), event_timeout: DEFAULT_EVENT_TIMEOUT }
    }

    /// Use a gate that is shared with other API instances, instead of a private one.
    pub fn with_gate(mut self, gate: ConcurrencyGate) -> Self {
        self.gate = gate;
        self
    }

    pub fn with_event_timeout(mut self, timeout: Duration) -> Self {
        self.event_timeout = timeout;
        self
    }

    pub fn forum(&self) -> &F {
        &self.forum
    }

    pub fn links(&self) -> &L {
        &self.links
    }

    pub fn gate(&self) -> &ConcurrencyGate {
        &self.gate
    }

    pub fn event_timeout(&self) -> Duration {
        self.event_timeout
    }
}

impl<F, L> ForumSyncApi<F, L>
where
    F: ForumStore,
    L: LinkStateStore,
{
    /// Handles a match event and swallows the result. Failures are logged along with the match id; the event is not
    /// retried.
    pub async fn handle(&self, event: MatchEvent) {
        let match_id = event.match_id.clone();
        match self.process_match_event(&event).await {
            Ok(outcome) => info!("🔄️ {outcome}"),
            Err(e) if e.is_transient() => {
                warn!("🔄️ Match {match_id} could not be synced to the forum and the event is dropped. {e}")
            },
            Err(e) => error!("🔄️ Match {match_id} could not be synced to the forum and the event is dropped. {e}"),
        }
    }

    /// Brings the forum in line with the given match event.
    ///
    /// The whole sequence runs inside the concurrency gate. The post body is rendered first, so a rendering failure
    /// leaves both stores untouched. After that, everything up to and including the link state write has to finish
    /// within the event timeout, otherwise [`SyncError::Timeout`] is returned. Forum changes that were not committed
    /// by then are rolled back; committed ones stay.
    pub async fn process_match_event(&self, event: &MatchEvent) -> Result<SyncOutcome, SyncError> {
        let _guard = self.gate.enter().await;
        trace!("🔄️ Processing event for match {}", event.match_id);
        let body = self.renderer.render(event)?;
        match tokio::time::timeout(self.event_timeout, self.sync(event, &body)).await {
            Ok(result) => result,
            Err(_) => {
                warn!("🔄️ Syncing match {} took longer than {:?}. Giving up.", event.match_id, self.event_timeout);
                Err(SyncError::Timeout(self.event_timeout))
            },
        }
    }

    async fn sync(&self, event: &MatchEvent, body: &str) -> Result<SyncOutcome, SyncError> {
        let match_id = &event.match_id;
        match self.links.fetch_link_state(match_id).await? {
            None => {
                debug!("🔄️ Match {match_id} is not linked yet. Finding or creating its thread.");
                let ids = self.forum.find_or_create_thread_and_post(match_id, &event.match_title, body).await?;
                let state = ForumLinkState::new(match_id.clone(), ids.thread_id, ids.post_id);
                self.links.upsert_link_state(&state).await?;
                Ok(SyncOutcome::Created(state))
            },
            Some(state) => {
                debug!("🔄️ Match {match_id} is linked to post #{}. Updating it.", state.post_id);
                self.forum.update_post(state.post_id, body).await?;
                let state = state.touched();
                self.links.upsert_link_state(&state).await?;
                Ok(SyncOutcome::Updated(state))
            },
        }
    }
}

#[cfg(test)]
mod test {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::{Duration as ChronoDuration, Utc};

    use super::*;
    use crate::{
        db_types::{MatchId, ThreadAndPost},
        test::mocks::{MockForumDb, MockLinkStore},
        render::{RenderError, TemplateRenderer},
        traits::{ForumStoreError, LinkStateError},
    };

    fn renderer() -> Arc<dyn PostRenderer + Send + Sync> {
        Arc::new(TemplateRenderer::new("<p>{{match_title}}</p>").unwrap())
    }

    fn event() -> MatchEvent {
        MatchEvent::new("M100".into(), "Alpha vs Beta")
    }

    fn ids() -> ThreadAndPost {
        ThreadAndPost { thread_id: 7, post_id: 70, thread_created: true, post_created: true }
    }

    #[tokio::test]
    async fn unlinked_match_creates_thread_and_link() {
        let mut forum = MockForumDb::new();
        forum
            .expect_find_or_create_thread_and_post()
            .withf(|id, title, body| {
                id.as_str() == "M100" && title.to_string() == "Alpha vs Beta" && body.to_string() == "<p>Alpha vs Beta</p>"
            })
            .times(1)
            .returning(|_, _, _| Ok(ids()));
        forum.expect_update_post().never();
        let mut links = MockLinkStore::new();
        links.expect_fetch_link_state().times(1).returning(|_| Ok(None));
        links
            .expect_upsert_link_state()
            .withf(|s| s.thread_id == 7 && s.post_id == 70 && s.updated_at.is_none())
            .times(1)
            .returning(|_| Ok(()));
        let api = ForumSyncApi::new(forum, links, renderer());
        let outcome = api.process_match_event(&event()).await.unwrap();
        assert!(outcome.was_created());
        assert_eq!(outcome.link_state().match_id, MatchId::from("M100"));
    }

    #[tokio::test]
    async fn linked_match_updates_post_and_touches_link() {
        let created_at = Utc::now() - ChronoDuration::hours(1);
        let existing = ForumLinkState {
            match_id: "M100".into(),
            post_id: 70,
            thread_id: 7,
            created_at,
            updated_at: None,
        };
        let mut forum = MockForumDb::new();
        forum.expect_find_or_create_thread_and_post().never();
        forum.expect_update_post().withf(|id, _| *id == 70).times(1).returning(|_, _| Ok(()));
        let mut links = MockLinkStore::new();
        links.expect_fetch_link_state().returning(move |_| Ok(Some(existing.clone())));
        links
            .expect_upsert_link_state()
            .withf(move |s| s.created_at == created_at && s.updated_at.is_some() && s.post_id == 70)
            .times(1)
            .returning(|_| Ok(()));
        let api = ForumSyncApi::new(forum, links, renderer());
        let outcome = api.process_match_event(&event()).await.unwrap();
        assert!(!outcome.was_created());
        assert!(outcome.link_state().updated_at.unwrap() > created_at);
    }

    #[tokio::test]
    async fn render_failure_touches_no_store() {
        let mut forum = MockForumDb::new();
        forum.expect_find_or_create_thread_and_post().never();
        forum.expect_update_post().never();
        let mut links = MockLinkStore::new();
        links.expect_fetch_link_state().never();
        links.expect_upsert_link_state().never();
        let renderer = Arc::new(TemplateRenderer::new("{{payload.winner}}").unwrap());
        let api = ForumSyncApi::new(forum, links, renderer);
        let err = api.process_match_event(&event()).await.unwrap_err();
        assert!(matches!(err, SyncError::RenderError(RenderError::RenderFailed { .. })));
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn forum_failure_records_no_link() {
        let mut forum = MockForumDb::new();
        forum
            .expect_find_or_create_thread_and_post()
            .returning(|_, _, _| Err(ForumStoreError::DatabaseError("disk I/O error".into())));
        let mut links = MockLinkStore::new();
        links.expect_fetch_link_state().returning(|_| Ok(None));
        links.expect_upsert_link_state().never();
        let api = ForumSyncApi::new(forum, links, renderer());
        let err = api.process_match_event(&event()).await.unwrap_err();
        assert!(matches!(err, SyncError::ForumStoreError(ForumStoreError::DatabaseError(_))));
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn link_store_failures_are_classified() {
        let forum = MockForumDb::new();
        let mut links = MockLinkStore::new();
        links.expect_fetch_link_state().returning(|_| Err(LinkStateError::Timeout(Duration::from_secs(10))));
        links.expect_upsert_link_state().never();
        let api = ForumSyncApi::new(forum, links, renderer());
        let err = api.process_match_event(&event()).await.unwrap_err();
        assert!(matches!(err, SyncError::LinkStateError(LinkStateError::Timeout(_))));
    }

    #[tokio::test]
    async fn failed_update_does_not_refresh_the_link() {
        let existing = ForumLinkState::new("M100".into(), 7, 70);
        let mut forum = MockForumDb::new();
        forum.expect_update_post().returning(|id, _| Err(ForumStoreError::PostNotFound(id)));
        let mut links = MockLinkStore::new();
        links.expect_fetch_link_state().returning(move |_| Ok(Some(existing.clone())));
        links.expect_upsert_link_state().never();
        let api = ForumSyncApi::new(forum, links, renderer());
        let err = api.process_match_event(&event()).await.unwrap_err();
        assert!(matches!(err, SyncError::ForumStoreError(ForumStoreError::PostNotFound(70))));
    }

    #[tokio::test]
    async fn link_write_failure_after_update_is_a_link_state_error() {
        let existing = ForumLinkState::new("M100".into(), 7, 70);
        let mut forum = MockForumDb::new();
        forum.expect_update_post().times(1).returning(|_, _| Ok(()));
        let mut links = MockLinkStore::new();
        links.expect_fetch_link_state().returning(move |_| Ok(Some(existing.clone())));
        links
            .expect_upsert_link_state()
            .returning(|_| Err(LinkStateError::DatabaseError("connection refused".into())));
        let api = ForumSyncApi::new(forum, links, renderer());
        let err = api.process_match_event(&event()).await.unwrap_err();
        assert!(matches!(err, SyncError::LinkStateError(LinkStateError::DatabaseError(_))));
    }

    #[tokio::test]
    async fn handle_swallows_errors() {
        let calls = Arc::new(AtomicUsize::new(0));
        let c2 = calls.clone();
        let forum = MockForumDb::new();
        let mut links = MockLinkStore::new();
        links.expect_fetch_link_state().returning(move |_| {
            c2.fetch_add(1, Ordering::SeqCst);
            Err(LinkStateError::DecodeError("bad timestamp".into()))
        });
        let api = ForumSyncApi::new(forum, links, renderer());
        api.handle(event()).await;
        api.handle(event()).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    struct SlowLinks;

    impl LinkStateStore for SlowLinks {
        async fn fetch_link_state(&self, _: &MatchId) -> Result<Option<ForumLinkState>, LinkStateError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(None)
        }

        async fn upsert_link_state(&self, _: &ForumLinkState) -> Result<(), LinkStateError> {
            Ok(())
        }

        async fn list_link_states(
            &self,
            _: crate::traits::LinkStateQueryFilter,
        ) -> Result<Vec<ForumLinkState>, LinkStateError> {
            Ok(vec![])
        }
    }

    #[tokio::test]
    async fn slow_events_time_out_and_release_the_gate() {
        let mut forum = MockForumDb::new();
        forum.expect_find_or_create_thread_and_post().never();
        let api = ForumSyncApi::new(forum, SlowLinks, renderer()).with_event_timeout(Duration::from_millis(50));
        let err = api.process_match_event(&event()).await.unwrap_err();
        assert!(matches!(err, SyncError::Timeout(d) if d == Duration::from_millis(50)));
        assert!(!api.gate().is_held());
    }
}
