//! Domain layer: the forest arena and its conversions
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod converter;
pub mod entities;
pub mod error;
pub mod tree_traits;

pub use arena::{Forest, ForestNode, UnresolvedParent};
pub use converter::{
    close_over_ancestors, close_over_descendants, flatten, flatten_from_root,
    forest_from_matches, rebuild_forest, sort_forest,
};
pub use entities::{Record, TreeEntity};
pub use error::{DomainError, DomainResult};
pub use tree_traits::TreeNodeConvert;
