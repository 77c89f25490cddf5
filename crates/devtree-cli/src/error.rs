//! Error types for devtree-cli

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors that can occur in CLI operations
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Error from devtree-core
    #[error(transparent)]
    Core(#[from] devtree_core::Error),

    /// Error from devtree-fs
    #[error(transparent)]
    Fs(#[from] devtree_fs::Error),

    /// Error from devtree-model
    #[error(transparent)]
    Model(#[from] devtree_model::Error),

    /// User-facing error with a message
    #[error("{message}")]
    User { message: String },
}

impl CliError {
    /// Create a new user error with the given message
    pub fn user(message: impl Into<String>) -> Self {
        Self::User {
            message: message.into(),
        }
    }
}
