use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("store error: {0}")]
    Store(String),
    #[error("{resource} {id} not found")]
    NotFound { resource: &'static str, id: i64 },
    /// The second half of a schedule/unschedule transition failed after the
    /// first half succeeded: both the new resource and the old one now exist
    /// in the store and must be reconciled manually.
    #[error(
        "partial commit: created {created} {created_id}, but the source {orphaned} {orphaned_id} \
         could not be deleted: {cause}"
    )]
    PartialCommit {
        created: &'static str,
        created_id: i64,
        orphaned: &'static str,
        orphaned_id: i64,
        cause: String,
    },
}

impl CoreError {
    /// True for failures that leave duplicated state behind in the store.
    pub fn is_partial_commit(&self) -> bool {
        matches!(self, CoreError::PartialCommit { .. })
    }
}
