//! rsforest: flatten parent-linked hierarchies into ordered lists and rebuild
//! sorted forests from flat lists.
//!
//! The core lives in [`domain`]: an arena-backed [`domain::Forest`] generic
//! over any [`domain::TreeEntity`], plus the conversions in
//! [`domain::converter`]. The remaining layers load record files, read
//! settings and drive the command line.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
