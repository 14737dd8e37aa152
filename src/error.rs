use thiserror::Error;

/// Failures of the local key/value storage behind the vote ledger.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage backend error: {0}")]
    Backend(#[from] sqlx::Error),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Failures at the network boundary to the remote poll store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Remote store answered with status {0}")]
    Status(u16),

    #[error("Poll {0} not found")]
    NotFound(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Vote accepted but the updated poll could not be fetched: {0}")]
    SnapshotUnavailable(String),
}

impl SyncError {
    /// True when the remote store cannot have accepted the write, so any
    /// optimistic local change must be rolled back.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            SyncError::Network(_) | SyncError::Status(_) | SyncError::NotFound(_)
        )
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SyncError::InvalidResponse(err.to_string())
        } else if let Some(status) = err.status() {
            SyncError::Status(status.as_u16())
        } else {
            SyncError::Network(err.to_string())
        }
    }
}

/// Errors the coordinator returns to its caller. Remote failures are not in
/// here: those are reported through the renderer and folded into outcomes.
#[derive(Error, Debug)]
pub enum CoordinatorError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("A vote for poll {0} is still in flight")]
    VoteInFlight(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: String, reason: String },
}
