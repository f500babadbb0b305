use std::fmt::Display;

use crate::db_types::ForumLinkState;

/// The result of successfully handling a match event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The match was not linked yet. A thread and post were found or created, and a new link state was recorded.
    Created(ForumLinkState),
    /// The match was already linked. Its post was rewritten and the link state's `updated_at` was refreshed.
    Updated(ForumLinkState),
}

impl SyncOutcome {
    pub fn link_state(&self) -> &ForumLinkState {
        match self {
            SyncOutcome::Created(s) | SyncOutcome::Updated(s) => s,
        }
    }

    pub fn into_link_state(self) -> ForumLinkState {
        match self {
            SyncOutcome::Created(s) | SyncOutcome::Updated(s) => s,
        }
    }

    pub fn was_created(&self) -> bool {
        matches!(self, SyncOutcome::Created(_))
    }
}

impl Display for SyncOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (verb, s) = match self {
            SyncOutcome::Created(s) => ("linked to", s),
            SyncOutcome::Updated(s) => ("updated in", s),
        };
        write!(f, "Match {} {verb} thread #{} (post #{})", s.match_id, s.thread_id, s.post_id)
    }
}
