//! Record tree model for devtree
//!
//! A package (`ComponentSet`) groups `Component`s per entity kind. Each
//! component has a header row ("card") and up to eight indexed sections of
//! rows, and every row is a set of `Field`s. Long field payloads are kept in
//! their encoded form and exposed through a run-scoped `Codepage`.
//!
//! Wizards and route templates travel as reference records instead: a
//! `RecordSet` of `RecordRef`s, each a flat list of `Requisite`s.
//!
//! The `xml` module reads and writes the package artifact, the record files,
//! the per-component header files and the generic element tree used for
//! embedded markup.

pub mod codepage;
pub mod component;
pub mod error;
pub mod field;
pub mod record;
pub mod xml;

pub use codepage::Codepage;
pub use component::{Component, ComponentSet, PackageInfo, SECTION_COUNT, Section};
pub use error::{Error, Result};
pub use field::{Field, Row, TEXT_KIND};
pub use record::{RecordRef, RecordSet, Requisite};
