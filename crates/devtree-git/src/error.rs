//! Error types for devtree-git

/// Result type for devtree-git operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in devtree-git operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("Filesystem error: {0}")]
    Fs(#[from] devtree_fs::Error),

    #[error("Revision '{revision}' not found")]
    RevisionNotFound { revision: String },

    #[error("Invalid date '{value}': expected YYYY-MM-DD or RFC 3339")]
    InvalidDate { value: String },
}
