//! Change history for devtree
//!
//! The import filter asks a [`HistoryProvider`] which files changed in a set
//! of changesets, in a date range or by an author. [`GitHistoryProvider`]
//! answers from a git repository.

pub mod error;
pub mod history;
pub mod provider;

pub use error::{Error, Result};
pub use history::{COMMIT_WINDOW, GitHistoryProvider, parse_date};
pub use provider::HistoryProvider;
