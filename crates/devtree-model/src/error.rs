//! Error types for devtree-model

/// Result type for devtree-model operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in devtree-model operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Fs(#[from] devtree_fs::Error),

    #[error("XML error in {context}: {message}")]
    Xml { context: String, message: String },

    #[error("Malformed {element}: {message}")]
    Malformed { element: String, message: String },

    #[error("Invalid base64 payload in field '{field}': {message}")]
    Payload { field: String, message: String },

    #[error("Section index {index} is out of range 1..=8")]
    SectionOutOfRange { index: usize },
}

impl Error {
    pub fn xml(context: impl Into<String>, source: impl std::fmt::Display) -> Self {
        Self::Xml {
            context: context.into(),
            message: source.to_string(),
        }
    }

    pub fn malformed(element: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Malformed {
            element: element.into(),
            message: message.into(),
        }
    }
}
