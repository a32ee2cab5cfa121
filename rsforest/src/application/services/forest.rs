//! Forest service
//!
//! Loads record files and runs the forest conversions on them.

use std::path::Path;
use std::sync::Arc;

use generational_arena::Index;
use tracing::{debug, instrument, warn};

use crate::application::{ApplicationError, ApplicationResult, IoResultExt, RecordFile};
use crate::config::Settings;
use crate::domain::{
    close_over_ancestors, close_over_descendants, flatten, flatten_from_root,
    forest_from_matches, rebuild_forest, DomainError, Forest, Record, UnresolvedParent,
};
use crate::infrastructure::traits::FileSystem;

/// A forest together with the node order an operation produced.
///
/// For `tree` the order holds the roots; for all other operations it is the
/// flat result list.
#[derive(Debug)]
pub struct ForestView {
    pub forest: Forest<Record>,
    pub order: Vec<Index>,
}

impl ForestView {
    pub fn records(&self) -> Vec<&Record> {
        self.forest.entities(&self.order)
    }

    pub fn ids(&self) -> Vec<&str> {
        self.records().into_iter().map(|r| r.id.as_str()).collect()
    }
}

/// Outcome of validating a record file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckReport {
    pub nodes: usize,
    pub roots: usize,
    pub unresolved: Vec<UnresolvedParent>,
}

/// Service for converting record files between flat and forest form.
pub struct ForestService {
    fs: Arc<dyn FileSystem>,
    settings: Arc<Settings>,
}

impl ForestService {
    /// Create a new forest service.
    pub fn new(fs: Arc<dyn FileSystem>, settings: Arc<Settings>) -> Self {
        Self { fs, settings }
    }

    /// Read a record file into a forest with parent links resolved.
    ///
    /// Unresolved parent ids are logged and the nodes kept as roots, unless
    /// `strict_parents` is set.
    #[instrument(level = "debug", skip(self))]
    pub fn load(&self, path: &Path) -> ApplicationResult<(Forest<Record>, Vec<UnresolvedParent>)> {
        if !self.fs.exists(path) {
            return Err(ApplicationError::FileNotFound(path.to_path_buf()));
        }
        let content = self
            .fs
            .read_to_string(path)
            .with_path_context("read records", path)?;
        let file = RecordFile::parse(&content, path)?;
        debug!("load: {} records from {}", file.nodes.len(), path.display());

        let (forest, unresolved) = Forest::from_entities(file.nodes)?;
        if self.settings.strict_parents {
            if let Some(first) = unresolved.first() {
                return Err(DomainError::UnresolvedParent {
                    id: first.id.clone(),
                    parent_id: first.parent_id.clone(),
                }
                .into());
            }
        }
        Ok((forest, unresolved))
    }

    /// Sorted forest of the matched ids and all their ancestors, or of every
    /// record when `ids` is empty.
    pub fn tree(&self, path: &Path, ids: &[String]) -> ApplicationResult<ForestView> {
        let (mut forest, _) = self.load(path)?;
        let roots = if ids.is_empty() {
            let all = forest.indices().to_vec();
            rebuild_forest(&mut forest, &all)?
        } else {
            let seeds = Self::seeds(&forest, ids)?;
            forest_from_matches(&mut forest, &seeds)?
        };
        Ok(ForestView {
            forest,
            order: roots,
        })
    }

    /// Flat, ordered list of the matched ids plus ancestors (all records when
    /// `ids` is empty) with parent ids restamped.
    pub fn flat(&self, path: &Path, ids: &[String]) -> ApplicationResult<ForestView> {
        let (mut forest, _) = self.load(path)?;
        let seeds = if ids.is_empty() {
            forest.indices().to_vec()
        } else {
            Self::seeds(&forest, ids)?
        };
        let order = flatten(&mut forest, &seeds)?;
        Ok(ForestView { forest, order })
    }

    /// Flat, ordered list of every descendant of `id`.
    pub fn subtree(&self, path: &Path, id: &str) -> ApplicationResult<ForestView> {
        let (mut forest, root) = self.tree_form(path, id)?;
        let order = flatten_from_root(&mut forest, root)?;
        Ok(ForestView { forest, order })
    }

    /// Ancestor closure of `ids` in traversal order.
    pub fn ancestors(&self, path: &Path, ids: &[String]) -> ApplicationResult<ForestView> {
        let (forest, _) = self.load(path)?;
        let seeds = Self::seeds(&forest, ids)?;
        let order = close_over_ancestors(&forest, &seeds)?;
        Ok(ForestView { forest, order })
    }

    /// Descendants of `id` in level order.
    pub fn descendants(&self, path: &Path, id: &str) -> ApplicationResult<ForestView> {
        let (forest, root) = self.tree_form(path, id)?;
        let order = close_over_descendants(&forest, root)?;
        Ok(ForestView { forest, order })
    }

    /// Validate a record file by rebuilding its complete forest.
    #[instrument(level = "debug", skip(self))]
    pub fn check(&self, path: &Path) -> ApplicationResult<CheckReport> {
        let (mut forest, unresolved) = self.load(path)?;
        for u in &unresolved {
            warn!("check: {} declares unknown parent {}", u.id, u.parent_id);
        }
        let all = forest.indices().to_vec();
        let roots = rebuild_forest(&mut forest, &all)?;
        Ok(CheckReport {
            nodes: forest.len(),
            roots: roots.len(),
            unresolved,
        })
    }

    /// Write the view's records, in order, as a record file.
    pub fn export(&self, view: &ForestView, target: &Path) -> ApplicationResult<()> {
        let file = RecordFile {
            nodes: view.records().into_iter().cloned().collect(),
        };
        let content = file.to_toml()?;
        self.fs
            .write(target, &content)
            .with_path_context("write records", target)
    }

    /// Load and rebuild everything so children lists are populated.
    fn tree_form(&self, path: &Path, id: &str) -> ApplicationResult<(Forest<Record>, Index)> {
        let (mut forest, _) = self.load(path)?;
        let root = forest
            .index_of(id)
            .ok_or_else(|| ApplicationError::UnknownId(id.to_string()))?;
        let all = forest.indices().to_vec();
        rebuild_forest(&mut forest, &all)?;
        Ok((forest, root))
    }

    fn seeds(forest: &Forest<Record>, ids: &[String]) -> ApplicationResult<Vec<Index>> {
        ids.iter()
            .map(|id| {
                forest
                    .index_of(id)
                    .ok_or_else(|| ApplicationError::UnknownId(id.clone()))
            })
            .collect()
    }
}
