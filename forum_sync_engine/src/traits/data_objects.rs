use chrono::{DateTime, Utc};

use crate::db_types::MatchId;

/// Criteria for [`crate::LinkStateStore::list_link_states`]. All the criteria that are set must hold.
#[derive(Debug, Clone, Default)]
pub struct LinkStateQueryFilter {
    pub match_id: Option<MatchId>,
    pub thread_id: Option<i64>,
    pub created_since: Option<DateTime<Utc>>,
    pub updated_since: Option<DateTime<Utc>>,
}

impl LinkStateQueryFilter {
    pub fn with_match_id(mut self, match_id: MatchId) -> Self {
        self.match_id = Some(match_id);
        self
    }

    pub fn with_thread_id(mut self, thread_id: i64) -> Self {
        self.thread_id = Some(thread_id);
        self
    }

    pub fn created_since(mut self, since: DateTime<Utc>) -> Self {
        self.created_since = Some(since);
        self
    }

    pub fn updated_since(mut self, since: DateTime<Utc>) -> Self {
        self.updated_since = Some(since);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.match_id.is_none() &&
            self.thread_id.is_none() &&
            self.created_since.is_none() &&
            self.updated_since.is_none()
    }
}
