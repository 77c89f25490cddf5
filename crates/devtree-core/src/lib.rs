//! Directory projection engine for devtree
//!
//! This crate projects a package of platform records onto a development
//! directory tree and rebuilds the package from it:
//!
//! - **Field router**: one declarative [`RoutingConfig`] per entity kind
//!   moving long fields into side files
//! - **Directory synchronizer**: keeps a component folder equal to what the
//!   last export wrote into it
//! - **Projector**: export, import and delete passes fanned out per kind
//! - **Record projector**: the same passes for wizards, route templates and
//!   their groups and roles, kept as reference records
//! - **Import filter**: allow-lists of components, optionally derived from
//!   version control history
//!
//! # Architecture
//!
//! ```text
//!                   devtree-cli
//!                        |
//!                   devtree-core
//!                        |
//!     +-----------+------+------+-----------+
//!     |           |             |           |
//! devtree-fs devtree-model devtree-codec devtree-git
//! ```
//!
//! # Example
//!
//! ```no_run
//! use devtree_core::{ImportFilter, Projector, Result};
//! use devtree_fs::NormalizedPath;
//! use devtree_model::Codepage;
//!
//! fn reimport() -> Result<()> {
//!     let projector = Projector::new(NormalizedPath::new("dev"), Codepage::Russian);
//!     let (package, report) = projector.import(&ImportFilter::accept_all())?;
//!     println!("{} components, {} imported", package.len(), report.total());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod filter;
pub mod kind;
pub mod projector;
pub mod records;
pub mod routing;
pub mod source;
pub mod sync;

pub use config::TransferConfig;
pub use error::{Error, Result};
pub use filter::{HistoryQuery, ImportFilter};
pub use kind::Kind;
pub use projector::{Projector, ProjectorOptions, Stage, TransferReport};
pub use records::{RecordFamily, RecordKind, RecordProjector};
pub use routing::{RoutingConfig, routing};
pub use source::{RecordKey, RecordSource, SnapshotSource, SourceRow};
pub use sync::{WriteSet, prune};
