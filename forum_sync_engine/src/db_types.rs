use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};

/// The value of `forum_thread.ext` for threads that belong to tournament matches.
pub const MATCH_THREAD_EXT: &str = "turnier";

//--------------------------------------       MatchId       ---------------------------------------------------------
/// The identifier of a match in the tournament system. It is stable across retries and redeliveries of the same event,
/// and is used as the external id of the forum thread as well as the key of the link state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct MatchId(pub String);

impl MatchId {
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for MatchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<S: Into<String>> From<S> for MatchId {
    fn from(value: S) -> Self {
        Self(value.into())
    }
}

//--------------------------------------    ForumSettings    ---------------------------------------------------------
/// The fixed parameters the forum store needs in order to create content on behalf of this service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForumSettings {
    /// The forum (category) that new match threads are created in.
    pub forum_id: i64,
    /// The user id of the service account that authors every match post.
    pub author_id: i64,
}

impl Default for ForumSettings {
    fn default() -> Self {
        Self { forum_id: 9, author_id: 1 }
    }
}

//--------------------------------------     ForumThread     ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct ForumThread {
    #[sqlx(rename = "threadid")]
    pub id: i64,
    pub title: String,
    #[sqlx(rename = "forumid")]
    pub forum_id: i64,
    #[sqlx(rename = "lastposttime")]
    pub created_at: DateTime<Utc>,
    pub replies: i64,
    pub hits: i64,
    pub ext: String,
    #[sqlx(rename = "ext_id")]
    pub match_id: MatchId,
}

//--------------------------------------      ForumPost      ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct ForumPost {
    #[sqlx(rename = "postid")]
    pub id: i64,
    #[sqlx(rename = "threadid")]
    pub thread_id: i64,
    #[sqlx(rename = "userid")]
    pub author_id: i64,
    #[sqlx(rename = "dateline")]
    pub created_at: DateTime<Utc>,
    #[sqlx(rename = "htmltext")]
    pub body: String,
}

//--------------------------------------    ForumLinkState   ---------------------------------------------------------
/// Records which forum thread and post were created for a match.
///
/// The ids never change once the record exists. `updated_at` is `None` until the first update after creation.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct ForumLinkState {
    pub match_id: MatchId,
    pub post_id: i64,
    pub thread_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl ForumLinkState {
    /// A link for a thread/post pair that was just created.
    pub fn new(match_id: MatchId, thread_id: i64, post_id: i64) -> Self {
        Self { match_id, post_id, thread_id, created_at: Utc::now(), updated_at: None }
    }

    /// Returns a copy of this record with `updated_at` set to now. Everything else is carried over unchanged, since
    /// link state upserts replace the whole record.
    pub fn touched(&self) -> Self {
        Self { updated_at: Some(Utc::now()), ..self.clone() }
    }
}

//--------------------------------------  ThreadAndPost      ---------------------------------------------------------
/// The ids produced by a successful find-or-create of a match thread and its service post.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreadAndPost {
    pub thread_id: i64,
    pub post_id: i64,
    /// True if the thread did not exist before this call.
    pub thread_created: bool,
    /// True if the post did not exist before this call.
    pub post_created: bool,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn touched_keeps_ids_and_created_at() {
        let link = ForumLinkState::new("M100".into(), 12, 34);
        assert!(link.updated_at.is_none());
        let touched = link.touched();
        assert_eq!(touched.match_id, link.match_id);
        assert_eq!(touched.thread_id, 12);
        assert_eq!(touched.post_id, 34);
        assert_eq!(touched.created_at, link.created_at);
        assert!(touched.updated_at.unwrap() >= link.created_at);
    }

    #[test]
    fn match_id_display() {
        let id = MatchId::from("tc-42");
        assert_eq!(id.to_string(), "tc-42");
        assert_eq!(id.as_str(), "tc-42");
    }
}
