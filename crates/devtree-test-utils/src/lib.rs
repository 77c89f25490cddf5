//! Shared test utilities for the devtree workspace.
//!
//! This crate provides standardised test fixtures to eliminate duplication
//! across crate test suites. It is a dev-dependency only and never published.
//!
//! # Modules
//!
//! - [`git`]: git repositories with commits of controlled author and time
//! - [`fixtures`]: component and package builders for every entity kind
//! - [`records`]: reference records of the wizard and route packages

pub mod fixtures;
pub mod git;
pub mod records;
