//! Text codecs for devtree
//!
//! - [`event`]: split a multiplexed event payload into per-event scripts and
//!   join them back.
//! - [`legacy`]: convert structural definition text between its compact
//!   stored form and an editable form.

pub mod error;
pub mod event;
pub mod legacy;

pub use error::{Error, Result};
pub use event::{EventKind, TableAction, join, parse};
pub use legacy::{to_compact, to_editable};
