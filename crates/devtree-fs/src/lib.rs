//! Filesystem layer for devtree
//!
//! Provides forward-slash path handling, escaping of arbitrary identity
//! strings into safe file names, change-aware writes and format-agnostic
//! configuration loading.

pub mod config;
pub mod error;
pub mod escape;
pub mod io;
pub mod path;

pub use config::ConfigStore;
pub use error::{Error, Result};
pub use escape::escape;
pub use path::NormalizedPath;
