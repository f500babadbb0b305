use std::time::Duration;

use thiserror::Error;

use crate::{
    db_types::{ForumLinkState, MatchId},
    traits::data_objects::LinkStateQueryFilter,
};

#[derive(Debug, Clone, Error)]
pub enum LinkStateError {
    #[error("The link state store is unavailable: {0}")]
    DatabaseError(String),
    #[error("The link state operation did not complete within {0:?}")]
    Timeout(Duration),
    #[error("Could not decode link state record: {0}")]
    DecodeError(String),
}

impl From<sqlx::Error> for LinkStateError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) | sqlx::Error::ColumnNotFound(_) => {
                LinkStateError::DecodeError(e.to_string())
            },
            _ => LinkStateError::DatabaseError(e.to_string()),
        }
    }
}

/// The `LinkStateStore` trait defines the durable mapping from a match to the forum thread and post that were created
/// for it. It is what lets the synchronisation flow decide between creating and updating forum content.
#[allow(async_fn_in_trait)]
pub trait LinkStateStore {
    /// Fetches the link state for the match. A match that has never been linked results in `Ok(None)`, never an
    /// error, so that callers can tell "not linked yet" apart from "store unavailable".
    async fn fetch_link_state(&self, match_id: &MatchId) -> Result<Option<ForumLinkState>, LinkStateError>;

    /// Inserts the link state, or replaces the existing record for the same match in full. Callers must provide every
    /// field, including those that have not changed since the last write.
    async fn upsert_link_state(&self, state: &ForumLinkState) -> Result<(), LinkStateError>;

    /// Lists link states matching the filter, ordered by `created_at`. An empty filter returns every record.
    async fn list_link_states(&self, filter: LinkStateQueryFilter) -> Result<Vec<ForumLinkState>, LinkStateError>;
}
