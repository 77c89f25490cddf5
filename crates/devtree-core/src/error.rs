//! Error types for devtree-core

use crate::Kind;
use crate::records::RecordKind;

/// Result type for devtree-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in devtree-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Operation the kind is deliberately configured without
    #[error("{operation} is not supported for {kind}")]
    Unsupported { kind: Kind, operation: String },

    /// A field a route depends on is absent from its row
    #[error("Missing field '{field}' in {kind} component '{component}'")]
    MissingField {
        kind: Kind,
        component: String,
        field: String,
    },

    /// Structurally invalid data on disk or in a payload
    #[error("Malformed {what}: {message}")]
    Malformed { what: String, message: String },

    /// Unknown entity kind name
    #[error("Unknown kind: {name}")]
    UnknownKind { name: String },

    /// Unknown record family name
    #[error("Unknown record family: {name}")]
    UnknownFamily { name: String },

    /// A kind's pass failed; reported after every kind has finished
    #[error("{kind} failed: {source}")]
    KindFailed {
        kind: Kind,
        #[source]
        source: Box<Error>,
    },

    /// A record kind's pass failed; reported after every record kind has finished
    #[error("{kind} failed: {source}")]
    RecordFailed {
        kind: RecordKind,
        #[source]
        source: Box<Error>,
    },

    // Transparent wrappers for underlying crate errors
    /// Filesystem error from devtree-fs
    #[error(transparent)]
    Fs(#[from] devtree_fs::Error),

    /// Model or XML error from devtree-model
    #[error(transparent)]
    Model(#[from] devtree_model::Error),

    /// Codec error from devtree-codec
    #[error(transparent)]
    Codec(#[from] devtree_codec::Error),

    /// History error from devtree-git
    #[error(transparent)]
    Git(#[from] devtree_git::Error),

    /// Directory walk error
    #[error(transparent)]
    Walk(#[from] walkdir::Error),
}

impl Error {
    pub fn unsupported(kind: Kind, operation: impl Into<String>) -> Self {
        Self::Unsupported {
            kind,
            operation: operation.into(),
        }
    }

    pub fn malformed(what: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Malformed {
            what: what.into(),
            message: message.to_string(),
        }
    }

    /// True for configuration errors as opposed to data errors.
    pub fn is_configuration(&self) -> bool {
        match self {
            Self::Unsupported { .. } | Self::UnknownKind { .. } | Self::UnknownFamily { .. } => true,
            Self::KindFailed { source, .. } | Self::RecordFailed { source, .. } => {
                source.is_configuration()
            }
            _ => false,
        }
    }
}
