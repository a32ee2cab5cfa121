//! Forest conversion: flatten hierarchies into ordered lists and rebuild
//! sorted forests from flat lists.
//!
//! Every operation computes its result first and only mutates the forest once
//! the input is known to be valid, so a failed call leaves it untouched.

use std::collections::{HashMap, HashSet, VecDeque};

use generational_arena::Index;
use itertools::Itertools;
use tracing::{debug, instrument};

use crate::domain::arena::Forest;
use crate::domain::entities::TreeEntity;
use crate::domain::error::{DomainError, DomainResult};

/// Expand `seeds` with every ancestor reachable through parent links.
///
/// Each node appears once, in traversal order. A parent chain longer than the
/// forest itself can only be a cycle and fails with
/// [`DomainError::CycleDetected`].
#[instrument(level = "debug", skip(forest))]
pub fn close_over_ancestors<E: TreeEntity>(
    forest: &Forest<E>,
    seeds: &[Index],
) -> DomainResult<Vec<Index>> {
    let bound = forest.len();
    let mut queue: VecDeque<(Index, usize)> = seeds.iter().map(|&s| (s, 0)).collect();
    let mut seen = HashSet::new();
    let mut result = Vec::new();

    while let Some((idx, hops)) = queue.pop_front() {
        let node = forest.node(idx)?;
        if hops > bound {
            return Err(DomainError::CycleDetected(node.entity.id().to_string()));
        }
        if let Some(parent) = node.parent {
            queue.push_back((parent, hops + 1));
        }
        if seen.insert(idx) {
            result.push(idx);
        }
    }
    debug!("closed {} seeds over {} nodes", seeds.len(), result.len());
    Ok(result)
}

/// Every descendant of `root` in breadth-first order, `root` excluded.
#[instrument(level = "debug", skip(forest))]
pub fn close_over_descendants<E: TreeEntity>(
    forest: &Forest<E>,
    root: Index,
) -> DomainResult<Vec<Index>> {
    let mut visited = HashSet::from([root]);
    let mut queue = VecDeque::from([root]);
    let mut result = Vec::new();

    while let Some(idx) = queue.pop_front() {
        for &child in forest.node(idx)?.children() {
            if !visited.insert(child) {
                return Err(DomainError::CycleDetected(
                    forest.node(child)?.entity.id().to_string(),
                ));
            }
            queue.push_back(child);
            result.push(child);
        }
    }
    Ok(result)
}

/// Flatten a loosely matched node set together with all its ancestors.
///
/// The result has no nested children, is stably sorted by order number, and
/// every linked node carries its parent's id.
#[instrument(level = "debug", skip(forest))]
pub fn flatten<E: TreeEntity>(forest: &mut Forest<E>, seeds: &[Index]) -> DomainResult<Vec<Index>> {
    let closure = close_over_ancestors(forest, seeds)?;
    Ok(finish_flat(forest, closure))
}

/// Flatten the descendants of a root already in tree form. The root itself
/// is not part of the result.
#[instrument(level = "debug", skip(forest))]
pub fn flatten_from_root<E: TreeEntity>(
    forest: &mut Forest<E>,
    root: Index,
) -> DomainResult<Vec<Index>> {
    let closure = close_over_descendants(forest, root)?;
    Ok(finish_flat(forest, closure))
}

fn finish_flat<E: TreeEntity>(forest: &mut Forest<E>, nodes: Vec<Index>) -> Vec<Index> {
    for &idx in &nodes {
        forest.clear_children(idx);
    }
    let nodes = sort_by_order(forest, nodes);
    for &idx in &nodes {
        forest.stamp_parent_id(idx);
    }
    nodes
}

/// Stable sort by order number; ties keep their current order.
fn sort_by_order<E: TreeEntity>(forest: &Forest<E>, mut nodes: Vec<Index>) -> Vec<Index> {
    nodes.sort_by_key(|&idx| forest.order_num_of(idx));
    nodes
}

/// Sort a forest whose children lists are already in place and return its
/// sorted roots.
///
/// Every children list below `roots` is stably sorted by order number, and
/// each child is relinked to the node holding it with its parent id
/// restamped. A node listed under two holders fails with
/// [`DomainError::CycleDetected`] before anything is written.
#[instrument(level = "debug", skip(forest))]
pub fn sort_forest<E: TreeEntity>(
    forest: &mut Forest<E>,
    roots: &[Index],
) -> DomainResult<Vec<Index>> {
    let mut visited = HashSet::new();
    let mut queue = VecDeque::new();
    for &root in roots {
        let node = forest.node(root)?;
        if !visited.insert(root) {
            return Err(DomainError::DuplicateId(node.entity.id().to_string()));
        }
        queue.push_back(root);
    }

    let mut lists = Vec::new();
    while let Some(idx) = queue.pop_front() {
        let children = forest.node(idx)?.children().to_vec();
        for &child in &children {
            let node = forest.node(child)?;
            if !visited.insert(child) {
                return Err(DomainError::CycleDetected(node.entity.id().to_string()));
            }
            queue.push_back(child);
        }
        lists.push((idx, sort_by_order(forest, children)));
    }

    for (holder, children) in lists {
        for &child in &children {
            forest.set_parent(child, Some(holder))?;
            forest.stamp_parent_id(child);
        }
        forest.replace_children(holder, children);
    }
    debug!("sorted {} nodes under {} roots", visited.len(), roots.len());
    Ok(sort_by_order(forest, roots.to_vec()))
}

/// Wire a flat list into a sorted forest and return its roots.
///
/// Structure comes from the resolved parent links: nodes without a parent
/// become roots, all others are added to their parent's children list.
/// Children that are not part of `flat` but still link to a touched node
/// keep their place, so a partial rebuild never drops nodes. Every touched
/// list is stably sorted by order number and each input child's parent id is
/// restamped. A parent outside `flat` receives its group as well, leaving an
/// orphan subtree reachable only through it. Input nodes are dropped from the
/// lists of nodes they no longer link to.
///
/// Input nodes unreachable from any root or outside parent sit on a cycle,
/// as does an outside parent whose own ancestor chain never ends. Both fail
/// the call with [`DomainError::CycleDetected`].
#[instrument(level = "debug", skip(forest))]
pub fn rebuild_forest<E: TreeEntity>(
    forest: &mut Forest<E>,
    flat: &[Index],
) -> DomainResult<Vec<Index>> {
    let mut members = HashSet::new();
    let mut roots = Vec::new();
    let mut parents = Vec::new();
    let mut groups: HashMap<Index, Vec<Index>> = HashMap::new();

    for &idx in flat {
        let node = forest.node(idx)?;
        if !members.insert(idx) {
            return Err(DomainError::DuplicateId(node.entity.id().to_string()));
        }
        match node.parent {
            None => roots.push(idx),
            Some(parent) => {
                forest.node(parent)?;
                groups
                    .entry(parent)
                    .or_insert_with(|| {
                        parents.push(parent);
                        Vec::new()
                    })
                    .push(idx);
            }
        }
    }

    let outside: Vec<Index> = parents
        .into_iter()
        .filter(|p| !members.contains(p))
        .collect();
    for &parent in &outside {
        forest.ancestors_of(parent)?;
    }

    for group in groups.values_mut() {
        let sorted = sort_by_order(forest, std::mem::take(group));
        *group = sorted;
    }
    let roots = sort_by_order(forest, roots);

    // breadth-first from roots and outside parents; stamps in visit order
    let mut queue: VecDeque<Index> = roots.iter().chain(&outside).copied().collect();
    let mut visited: HashSet<Index> = queue.iter().copied().collect();
    let mut stamp_order = Vec::new();
    while let Some(idx) = queue.pop_front() {
        for &child in groups.get(&idx).into_iter().flatten() {
            if !visited.insert(child) {
                return Err(DomainError::CycleDetected(forest.id_of(child).to_string()));
            }
            stamp_order.push(child);
            queue.push_back(child);
        }
    }
    if let Some(&stuck) = flat.iter().find(|&&idx| !visited.contains(&idx)) {
        return Err(DomainError::CycleDetected(forest.id_of(stuck).to_string()));
    }

    let mut lists = Vec::new();
    for &holder in flat.iter().chain(&outside) {
        let kept: Vec<Index> = forest
            .node(holder)?
            .children()
            .iter()
            .copied()
            .filter(|c| !members.contains(c))
            .filter(|&c| forest.get(c).is_some_and(|n| n.parent() == Some(holder)))
            .unique()
            .chain(groups.remove(&holder).unwrap_or_default())
            .collect();
        lists.push((holder, sort_by_order(forest, kept)));
    }

    // an input node moved to a new parent leaves its old holder's list
    let touched: HashSet<Index> = flat.iter().chain(&outside).copied().collect();
    for &holder in forest.indices() {
        if touched.contains(&holder) {
            continue;
        }
        let children = forest.node(holder)?.children();
        if children.iter().any(|c| members.contains(c)) {
            let kept = children
                .iter()
                .copied()
                .filter(|c| !members.contains(c))
                .collect();
            lists.push((holder, kept));
        }
    }

    for (holder, children) in lists {
        forest.replace_children(holder, children);
    }
    for idx in stamp_order {
        forest.stamp_parent_id(idx);
    }
    debug!("rebuilt {} nodes into {} roots", flat.len(), roots.len());
    Ok(roots)
}

/// Turn a fuzzy-query match set into a sorted forest that includes every
/// ancestor of the matches.
#[instrument(level = "debug", skip(forest))]
pub fn forest_from_matches<E: TreeEntity>(
    forest: &mut Forest<E>,
    seeds: &[Index],
) -> DomainResult<Vec<Index>> {
    let flat = flatten(forest, seeds)?;
    rebuild_forest(forest, &flat)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Record;

    fn ids(forest: &Forest<Record>, indices: &[Index]) -> Vec<String> {
        forest
            .entities(indices)
            .into_iter()
            .map(|r| r.id.clone())
            .collect()
    }

    fn abc() -> Forest<Record> {
        Forest::from_entities(vec![
            Record::new("b", Some("a"), 2),
            Record::new("a", None, 1),
            Record::new("c", Some("a"), 1),
        ])
        .unwrap()
        .0
    }

    #[test]
    fn given_flat_list_when_rebuilding_then_children_sorted_by_order_num() {
        let mut forest = abc();
        let all = forest.indices().to_vec();

        let roots = rebuild_forest(&mut forest, &all).unwrap();

        assert_eq!(ids(&forest, &roots), vec!["a"]);
        let a = forest.get(roots[0]).unwrap();
        assert_eq!(ids(&forest, a.children()), vec!["c", "b"]);
    }

    #[test]
    fn given_rebuilt_tree_when_flattening_then_sorted_and_parent_ids_stamped() {
        let mut forest = abc();
        let all = forest.indices().to_vec();
        rebuild_forest(&mut forest, &all).unwrap();

        let flat = flatten(&mut forest, &all).unwrap();

        assert_eq!(ids(&forest, &flat), vec!["a", "c", "b"]);
        for &idx in &flat {
            assert!(forest.get(idx).unwrap().children().is_empty());
        }
        let c = forest.entity(forest.index_of("c").unwrap()).unwrap();
        let b = forest.entity(forest.index_of("b").unwrap()).unwrap();
        assert_eq!(c.parent_id.as_deref(), Some("a"));
        assert_eq!(b.parent_id.as_deref(), Some("a"));
    }

    #[test]
    fn given_single_seed_when_closing_over_ancestors_then_parent_included() {
        let (forest, _) = Forest::from_entities(vec![
            Record::new("y", None, 1),
            Record::new("x", Some("y"), 1),
        ])
        .unwrap();
        let x = forest.index_of("x").unwrap();

        let mut closure = ids(&forest, &close_over_ancestors(&forest, &[x]).unwrap());
        closure.sort();

        assert_eq!(closure, vec!["x", "y"]);
    }

    #[test]
    fn given_two_node_cycle_when_closing_over_ancestors_then_cycle_detected() {
        let (mut forest, _) =
            Forest::from_entities(vec![Record::new("a", None, 1), Record::new("b", None, 2)])
                .unwrap();
        let a = forest.index_of("a").unwrap();
        let b = forest.index_of("b").unwrap();
        forest.set_parent(a, Some(b)).unwrap();
        forest.set_parent(b, Some(a)).unwrap();

        assert!(matches!(
            close_over_ancestors(&forest, &[a]),
            Err(DomainError::CycleDetected(_))
        ));
        assert!(matches!(
            rebuild_forest(&mut forest, &[a, b]),
            Err(DomainError::CycleDetected(_))
        ));
    }

    #[test]
    fn given_root_when_closing_over_descendants_then_level_order_without_root() {
        let (mut forest, _) = Forest::from_entities(vec![
            Record::new("r", None, 0),
            Record::new("a", None, 0),
            Record::new("b", None, 0),
            Record::new("a1", None, 0),
            Record::new("b1", None, 0),
        ])
        .unwrap();
        let [r, a, b, a1, b1] =
            ["r", "a", "b", "a1", "b1"].map(|id| forest.index_of(id).unwrap());
        forest.attach_child(r, a).unwrap();
        forest.attach_child(r, b).unwrap();
        forest.attach_child(a, a1).unwrap();
        forest.attach_child(b, b1).unwrap();

        let closure = close_over_descendants(&forest, r).unwrap();

        assert_eq!(ids(&forest, &closure), vec!["a", "b", "a1", "b1"]);
    }

    #[test]
    fn given_empty_input_when_converting_then_empty_results() {
        let mut forest: Forest<Record> = Forest::new();
        assert!(close_over_ancestors(&forest, &[]).unwrap().is_empty());
        assert!(flatten(&mut forest, &[]).unwrap().is_empty());
        assert!(rebuild_forest(&mut forest, &[]).unwrap().is_empty());
    }

    #[test]
    fn given_cyclic_input_when_rebuild_fails_then_forest_untouched() {
        let (mut forest, _) = Forest::from_entities(vec![
            Record::new("r", None, 1),
            Record::new("k", Some("r"), 1),
            Record::new("a", None, 1),
            Record::new("b", None, 1),
        ])
        .unwrap();
        let [r, k, a, b] = ["r", "k", "a", "b"].map(|id| forest.index_of(id).unwrap());
        forest.set_parent(a, Some(b)).unwrap();
        forest.set_parent(b, Some(a)).unwrap();

        assert!(rebuild_forest(&mut forest, &[r, k, a, b]).is_err());
        assert!(forest.get(r).unwrap().children().is_empty());
        assert_eq!(forest.get(k).unwrap().parent(), Some(r));
    }
}
