use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::db_types::MatchId;

/// A notification that a match reached some point in its lifecycle (created, teams ready, finished...).
///
/// Only `match_id` and `match_title` are written to the stores. The rest of the match data is carried in `payload`
/// and is only used to render the forum post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchEvent {
    pub match_id: MatchId,
    pub match_title: String,
    #[serde(default)]
    pub payload: Value,
}

impl MatchEvent {
    pub fn new<S: Into<String>>(match_id: MatchId, match_title: S) -> Self {
        Self { match_id, match_title: match_title.into(), payload: Value::Object(Default::default()) }
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }
}
