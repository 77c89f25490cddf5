//! Error types for devtree-codec

/// Result type for devtree-codec operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in devtree-codec operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Table number {table} is out of range 1..=24")]
    TableOutOfRange { table: u8 },

    #[error("Unknown event file: {name}")]
    UnknownEventFile { name: String },
}
