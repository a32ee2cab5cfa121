//! Arena-backed forest of caller entities.
//!
//! Nodes own their children as index lists; the parent link is a plain index
//! used for traversal only, so dropping it never affects the parent.

use std::collections::HashMap;

use generational_arena::{Arena, Index};
use tracing::{instrument, warn};

use crate::domain::entities::TreeEntity;
use crate::domain::error::{DomainError, DomainResult};

/// Slot in the forest arena.
#[derive(Debug)]
pub struct ForestNode<E> {
    /// Caller entity carried by this node
    pub entity: E,
    /// Index of parent node in the arena, None for root nodes
    pub(crate) parent: Option<Index>,
    /// Indices of child nodes in the arena
    pub(crate) children: Vec<Index>,
}

impl<E> ForestNode<E> {
    pub fn parent(&self) -> Option<Index> {
        self.parent
    }

    pub fn children(&self) -> &[Index] {
        &self.children
    }
}

/// A parent declaration that did not match any node in the forest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedParent {
    pub id: String,
    pub parent_id: String,
}

/// Arena-based forest holding every node of one operation's input.
///
/// Ids are unique per forest; the id → index map gives O(1) lookup and
/// insertion order is kept so "all nodes" iterates deterministically.
#[derive(Debug)]
pub struct Forest<E> {
    arena: Arena<ForestNode<E>>,
    ids: HashMap<String, Index>,
    order: Vec<Index>,
}

impl<E: TreeEntity> Default for Forest<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: TreeEntity> Forest<E> {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            ids: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Build a forest and resolve declared parent ids into parent links.
    ///
    /// Returns the forest together with every parent id that did not match a
    /// node. Those nodes stay unlinked and therefore act as roots.
    pub fn from_entities(
        entities: impl IntoIterator<Item = E>,
    ) -> DomainResult<(Self, Vec<UnresolvedParent>)> {
        let mut forest = Self::new();
        for entity in entities {
            forest.insert(entity)?;
        }
        let unresolved = forest.resolve_parents();
        Ok((forest, unresolved))
    }

    /// Insert an entity as an unlinked node.
    ///
    /// The first node with a given id wins: a later one is refused with
    /// [`DomainError::DuplicateId`].
    #[instrument(level = "trace", skip_all, fields(id = entity.id()))]
    pub fn insert(&mut self, entity: E) -> DomainResult<Index> {
        if self.ids.contains_key(entity.id()) {
            return Err(DomainError::DuplicateId(entity.id().to_string()));
        }
        let id = entity.id().to_string();
        let idx = self.arena.insert(ForestNode {
            entity,
            parent: None,
            children: Vec::new(),
        });
        self.ids.insert(id, idx);
        self.order.push(idx);
        Ok(idx)
    }

    /// Link every node to the node named by its declared parent id.
    ///
    /// Only back references are set; children lists are left untouched.
    #[instrument(level = "debug", skip(self))]
    pub fn resolve_parents(&mut self) -> Vec<UnresolvedParent> {
        let mut unresolved = Vec::new();
        for &idx in &self.order {
            let node = &self.arena[idx];
            let Some(parent_id) = node.entity.parent_id() else {
                continue;
            };
            match self.ids.get(parent_id) {
                Some(&parent) => {
                    self.arena[idx].parent = Some(parent);
                }
                None => {
                    warn!(
                        "parent '{}' of node '{}' not found, treating as root",
                        parent_id,
                        node.entity.id()
                    );
                    unresolved.push(UnresolvedParent {
                        id: node.entity.id().to_string(),
                        parent_id: parent_id.to_string(),
                    });
                }
            }
        }
        unresolved
    }

    /// Set the parent back reference of `child` without touching any
    /// children list.
    pub fn set_parent(&mut self, child: Index, parent: Option<Index>) -> DomainResult<()> {
        if let Some(parent) = parent {
            self.node(parent)?;
        }
        self.node_mut(child)?.parent = parent;
        Ok(())
    }

    /// Append `child` under `parent`, moving it out of its previous parent's
    /// children list.
    ///
    /// Refuses links that would make a node its own ancestor.
    #[instrument(level = "trace", skip(self))]
    pub fn attach_child(&mut self, parent: Index, child: Index) -> DomainResult<()> {
        self.node(child)?;
        if self.ancestors_of(parent)?.contains(&child) {
            return Err(DomainError::CycleDetected(self.id_of(child).to_string()));
        }
        if let Some(old) = self.arena[child].parent {
            self.arena[old].children.retain(|&c| c != child);
        }
        self.arena[child].parent = Some(parent);
        self.arena[parent].children.push(child);
        Ok(())
    }

    /// True when `child`'s resolved parent carries the id of `parent`.
    pub fn is_parent_of(&self, parent: Index, child: Index) -> bool {
        match (self.get(parent), self.get(child).and_then(|c| c.parent)) {
            (Some(p), Some(actual)) => self
                .get(actual)
                .is_some_and(|a| a.entity.id() == p.entity.id()),
            _ => false,
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn get(&self, idx: Index) -> Option<&ForestNode<E>> {
        self.arena.get(idx)
    }

    pub fn entity(&self, idx: Index) -> Option<&E> {
        self.arena.get(idx).map(|n| &n.entity)
    }

    pub fn entity_mut(&mut self, idx: Index) -> Option<&mut E> {
        self.arena.get_mut(idx).map(|n| &mut n.entity)
    }

    pub fn index_of(&self, id: &str) -> Option<Index> {
        self.ids.get(id).copied()
    }

    /// All node indices in insertion order.
    pub fn indices(&self) -> &[Index] {
        &self.order
    }

    /// Entities for `indices`, skipping unknown ones.
    pub fn entities(&self, indices: &[Index]) -> Vec<&E> {
        indices.iter().filter_map(|&i| self.entity(i)).collect()
    }

    pub(crate) fn node(&self, idx: Index) -> DomainResult<&ForestNode<E>> {
        self.arena
            .get(idx)
            .ok_or_else(|| DomainError::UnknownNode(format!("{:?}", idx)))
    }

    fn node_mut(&mut self, idx: Index) -> DomainResult<&mut ForestNode<E>> {
        self.arena
            .get_mut(idx)
            .ok_or_else(|| DomainError::UnknownNode(format!("{:?}", idx)))
    }

    /// Id of a node already known to be in the arena.
    pub(crate) fn id_of(&self, idx: Index) -> &str {
        self.arena[idx].entity.id()
    }

    pub(crate) fn order_num_of(&self, idx: Index) -> i32 {
        self.arena[idx].entity.order_num()
    }

    pub(crate) fn clear_children(&mut self, idx: Index) {
        self.arena[idx].children.clear();
    }

    pub(crate) fn replace_children(&mut self, idx: Index, children: Vec<Index>) {
        self.arena[idx].children = children;
    }

    /// Stamp `child`'s declared parent id from its resolved parent link.
    pub(crate) fn stamp_parent_id(&mut self, child: Index) {
        if let Some(parent) = self.arena[child].parent {
            let parent_id = self.id_of(parent).to_string();
            self.arena[child].entity.set_parent_id(Some(parent_id));
        }
    }

    /// `idx` followed by its parent chain, bounded by the forest size.
    pub(crate) fn ancestors_of(&self, idx: Index) -> DomainResult<Vec<Index>> {
        let mut chain = vec![idx];
        let mut current = self.node(idx)?.parent;
        while let Some(p) = current {
            if chain.len() > self.len() {
                return Err(DomainError::CycleDetected(self.id_of(idx).to_string()));
            }
            chain.push(p);
            current = self.node(p)?.parent;
        }
        Ok(chain)
    }
}
