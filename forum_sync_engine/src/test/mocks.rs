use mockall::mock;

use crate::{
    db_types::{ForumLinkState, ForumPost, ForumThread, MatchId, ThreadAndPost},
    traits::{ForumStore, ForumStoreError, LinkStateError, LinkStateQueryFilter, LinkStateStore},
};

mock! {
    pub ForumDb {}
    impl ForumStore for ForumDb {
        async fn find_or_create_thread_and_post(&self, match_id: &MatchId, match_title: &str, body: &str) -> Result<ThreadAndPost, ForumStoreError>;
        async fn update_post(&self, post_id: i64, body: &str) -> Result<(), ForumStoreError>;
        async fn fetch_thread_for_match(&self, match_id: &MatchId) -> Result<Option<ForumThread>, ForumStoreError>;
        async fn fetch_post(&self, post_id: i64) -> Result<Option<ForumPost>, ForumStoreError>;
        async fn fetch_posts_for_thread(&self, thread_id: i64) -> Result<Vec<ForumPost>, ForumStoreError>;
    }
}

mock! {
    pub LinkStore {}
    impl LinkStateStore for LinkStore {
        async fn fetch_link_state(&self, match_id: &MatchId) -> Result<Option<ForumLinkState>, LinkStateError>;
        async fn upsert_link_state(&self, state: &ForumLinkState) -> Result<(), LinkStateError>;
        async fn list_link_states(&self, filter: LinkStateQueryFilter) -> Result<Vec<ForumLinkState>, LinkStateError>;
    }
}
