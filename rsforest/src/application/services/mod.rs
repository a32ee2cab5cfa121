//! Application services

pub mod forest;

pub use forest::{CheckReport, ForestService, ForestView};
