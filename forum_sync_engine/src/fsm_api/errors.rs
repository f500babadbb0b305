use std::time::Duration;

use thiserror::Error;

use crate::{
    render::RenderError,
    traits::{ForumStoreError, LinkStateError},
};

#[derive(Debug, Clone, Error)]
pub enum SyncError {
    #[error("Could not render the forum post. {0}")]
    RenderError(#[from] RenderError),
    #[error("Forum store error. {0}")]
    ForumStoreError(#[from] ForumStoreError),
    #[error("Link state error. {0}")]
    LinkStateError(#[from] LinkStateError),
    #[error("Handling the event took longer than {0:?}")]
    Timeout(Duration),
}

impl SyncError {
    /// True for failures that may go away if the same event is delivered again later, i.e. I/O failures and timeouts.
    /// Rendering failures and missing posts will fail the same way every time.
    pub fn is_transient(&self) -> bool {
        match self {
            SyncError::RenderError(_) => false,
            SyncError::ForumStoreError(ForumStoreError::PostNotFound(_)) => false,
            SyncError::ForumStoreError(_) => true,
            SyncError::LinkStateError(LinkStateError::DecodeError(_)) => false,
            SyncError::LinkStateError(_) => true,
            SyncError::Timeout(_) => true,
        }
    }
}
