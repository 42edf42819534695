/// Result type alias for catalog store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A unique index rejected an insert. Resolvers recover from this
    /// locally by re-fetching the winning row; it is never a caller-visible
    /// failure.
    #[error("Duplicate key on {constraint}")]
    DuplicateKey { constraint: String },

    #[error("Not found: {0}")]
    NotFound(String),

    /// The store cannot be reached. The only hard failure in the resolution
    /// path; aborts the calling scrape task.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StoreError {
    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, StoreError::DuplicateKey { .. })
    }
}
