//! Immutable graph state value and its operations.

use super::{GraphError, GraphResult};
use crate::model::item::{Content, Item, ItemId};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

// Generations are unique per process, so two states branched from the same
// snapshot never share one.
fn fresh_generation() -> u64 {
    NEXT_GENERATION.fetch_add(1, Ordering::Relaxed)
}

/// Public view of one parent->child connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub parent: ItemId,
    pub child: ItemId,
    pub position: i64,
}

#[derive(Debug, Clone)]
struct Slot {
    child: ItemId,
    position: i64,
    // Insertion sequence; breaks ties between equal positions.
    seq: u64,
}

/// Full collection of items and edges at one point in time.
///
/// Equality compares items and ordered edges only; the edge generation, the
/// reverse parent index and the insertion sequence counter are bookkeeping.
#[derive(Debug, Clone)]
pub struct State {
    items: BTreeMap<ItemId, Item>,
    // Keyed by parent, each list sorted by `(position, seq)`. Never empty.
    edges: BTreeMap<ItemId, Vec<Slot>>,
    // Reverse of `edges`: child -> parents.
    parent_index: BTreeMap<ItemId, BTreeSet<ItemId>>,
    generation: u64,
    next_seq: u64,
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
            && self.edges.len() == other.edges.len()
            && self
                .edges
                .iter()
                .zip(other.edges.iter())
                .all(|((left_parent, left), (right_parent, right))| {
                    left_parent == right_parent
                        && left.len() == right.len()
                        && left.iter().zip(right.iter()).all(|(a, b)| {
                            a.child == b.child && a.position == b.position
                        })
                })
    }
}

impl Eq for State {}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}

impl State {
    /// Creates a state holding only the empty root item.
    pub fn new() -> Self {
        let mut items = BTreeMap::new();
        items.insert(ItemId::root(), Item::new(ItemId::root()));
        Self {
            items,
            edges: BTreeMap::new(),
            parent_index: BTreeMap::new(),
            generation: fresh_generation(),
            next_seq: 0,
        }
    }

    /// Edge generation; every edge mutation yields a process-wide unique one.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns an equal copy under a fresh generation.
    ///
    /// Used when an older snapshot becomes current again (undo), so that
    /// projections reconciled against any other snapshot are stale.
    pub fn with_fresh_generation(&self) -> State {
        let mut next = self.clone();
        next.generation = fresh_generation();
        next
    }

    /// Allocates a fresh item with empty content.
    pub fn create(&self) -> (State, ItemId) {
        let mut id = ItemId::generate();
        while self.items.contains_key(&id) {
            id = ItemId::generate();
        }
        let mut next = self.clone();
        next.items.insert(id.clone(), Item::new(id.clone()));
        (next, id)
    }

    /// Inserts an item with a caller-provided id (import/sync paths).
    pub fn create_with_id(&self, id: ItemId) -> GraphResult<State> {
        if self.items.contains_key(&id) {
            return Err(GraphError::AlreadyExists(id));
        }
        let mut next = self.clone();
        next.items.insert(id.clone(), Item::new(id));
        Ok(next)
    }

    pub fn set_content(&self, id: &ItemId, content: Content) -> GraphResult<State> {
        if !self.exists(id) {
            return Err(GraphError::NotFound(id.clone()));
        }
        let mut next = self.clone();
        if let Some(item) = next.items.get_mut(id) {
            item.content = content;
        }
        Ok(next)
    }

    /// Adds `child` under `parent` at `position`.
    ///
    /// Equal positions sort by insertion order, later inserts last.
    pub fn add_child(&self, parent: &ItemId, child: &ItemId, position: i64) -> GraphResult<State> {
        self.ensure_edge_insertable(parent, child)?;
        let mut next = self.clone();
        let seq = next.take_seq();
        let slots = next.edges.entry(parent.clone()).or_default();
        let index = slots
            .iter()
            .position(|slot| slot.position > position)
            .unwrap_or(slots.len());
        slots.insert(
            index,
            Slot {
                child: child.clone(),
                position,
                seq,
            },
        );
        next.link_parent(child, parent);
        next.generation = fresh_generation();
        Ok(next)
    }

    /// Appends `child` after every existing child of `parent`.
    pub fn append_child(&self, parent: &ItemId, child: &ItemId) -> GraphResult<State> {
        let position = self
            .edges
            .get(parent)
            .and_then(|slots| slots.last())
            .map_or(0, |slot| slot.position + 1);
        self.add_child(parent, child, position)
    }

    /// Inserts `child` at sibling `index` (clamped) and renumbers positions densely.
    pub fn insert_child(&self, parent: &ItemId, child: &ItemId, index: usize) -> GraphResult<State> {
        self.ensure_edge_insertable(parent, child)?;
        let mut next = self.clone();
        let seq = next.take_seq();
        let slots = next.edges.entry(parent.clone()).or_default();
        let index = index.min(slots.len());
        slots.insert(
            index,
            Slot {
                child: child.clone(),
                position: 0,
                seq,
            },
        );
        renumber(slots);
        next.link_parent(child, parent);
        next.generation = fresh_generation();
        Ok(next)
    }

    /// Moves an existing child of `parent` to sibling `index` (clamped).
    pub fn reorder_child(&self, parent: &ItemId, child: &ItemId, index: usize) -> GraphResult<State> {
        let Some(current) = self.child_index(parent, child) else {
            return Err(GraphError::NotFound(child.clone()));
        };
        let mut next = self.clone();
        if let Some(slots) = next.edges.get_mut(parent) {
            let slot = slots.remove(current);
            let index = index.min(slots.len());
            slots.insert(index, slot);
            renumber(slots);
        }
        next.generation = fresh_generation();
        Ok(next)
    }

    /// Replaces the ordered child list of `parent`.
    pub fn set_children(&self, parent: &ItemId, children: &[ItemId]) -> GraphResult<State> {
        if !self.exists(parent) {
            return Err(GraphError::NotFound(parent.clone()));
        }
        let mut next = self.clone();
        if let Some(slots) = next.edges.remove(parent) {
            for slot in slots {
                next.unlink_parent(&slot.child, parent);
            }
        }
        let mut seen = BTreeSet::new();
        for child in children {
            if !seen.insert(child) {
                return Err(GraphError::DuplicateEdge {
                    parent: parent.clone(),
                    child: child.clone(),
                });
            }
            next = next.append_child(parent, child)?;
        }
        next.generation = fresh_generation();
        Ok(next)
    }

    /// Removes the `(parent, child)` edge; no-op if absent.
    pub fn remove_child(&self, parent: &ItemId, child: &ItemId) -> State {
        let Some(index) = self.child_index(parent, child) else {
            return self.clone();
        };
        let mut next = self.clone();
        if let Some(slots) = next.edges.get_mut(parent) {
            slots.remove(index);
            if slots.is_empty() {
                next.edges.remove(parent);
            }
        }
        next.unlink_parent(child, parent);
        next.generation = fresh_generation();
        next
    }

    /// Detaches `child` from one parent; the item survives.
    pub fn remove(&self, parent: &ItemId, child: &ItemId) -> State {
        self.remove_child(parent, child)
    }

    /// Removes the item and every edge touching it.
    pub fn destroy(&self, id: &ItemId) -> GraphResult<State> {
        if id.is_root() {
            return Err(GraphError::RootProtected);
        }
        if !self.exists(id) {
            return Err(GraphError::NotFound(id.clone()));
        }
        let mut next = self.clone();
        next.items.remove(id);
        if let Some(slots) = next.edges.remove(id) {
            for slot in slots {
                next.unlink_parent(&slot.child, id);
            }
        }
        for parent in next.parent_index.remove(id).unwrap_or_default() {
            if let Some(slots) = next.edges.get_mut(&parent) {
                slots.retain(|slot| &slot.child != id);
                if slots.is_empty() {
                    next.edges.remove(&parent);
                }
            }
        }
        next.generation = fresh_generation();
        Ok(next)
    }

    pub fn exists(&self, id: &ItemId) -> bool {
        self.items.contains_key(id)
    }

    pub fn content(&self, id: &ItemId) -> Option<&Content> {
        self.items.get(id).map(|item| &item.content)
    }

    pub fn all_items(&self) -> impl Iterator<Item = &ItemId> {
        self.items.keys()
    }

    /// Ordered children of `id`.
    pub fn children(&self, id: &ItemId) -> Vec<ItemId> {
        self.edges
            .get(id)
            .map(|slots| slots.iter().map(|slot| slot.child.clone()).collect())
            .unwrap_or_default()
    }

    /// Ordered edges below `id`.
    pub fn child_edges(&self, id: &ItemId) -> Vec<Edge> {
        self.edges
            .get(id)
            .map(|slots| {
                slots
                    .iter()
                    .map(|slot| Edge {
                        parent: id.clone(),
                        child: slot.child.clone(),
                        position: slot.position,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Parents of `id`, sorted by id.
    pub fn parents(&self, id: &ItemId) -> Vec<ItemId> {
        self.parent_index
            .get(id)
            .map(|parents| parents.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Every parent of `id` except `this_parent`.
    pub fn other_parents(&self, this_parent: &ItemId, id: &ItemId) -> Vec<ItemId> {
        self.parents(id)
            .into_iter()
            .filter(|parent| parent != this_parent)
            .collect()
    }

    /// Parents whose ordered child list is non-empty.
    pub fn parents_with_children(&self) -> impl Iterator<Item = &ItemId> {
        self.edges.keys()
    }

    pub fn has_children(&self, id: &ItemId) -> bool {
        self.edges.contains_key(id)
    }

    /// True when `id` has children or another item's content links to it.
    pub fn has_children_or_references(&self, id: &ItemId) -> bool {
        self.has_children(id) || !self.backreferences(id).is_empty()
    }

    /// Items linked from the content of `id`, in content order.
    pub fn references(&self, id: &ItemId) -> Vec<ItemId> {
        self.content(id)
            .map(|content| content.references().into_iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Items whose content links to `id`, sorted by id.
    pub fn backreferences(&self, id: &ItemId) -> Vec<ItemId> {
        self.items
            .values()
            .filter(|item| item.content.links_to(id))
            .map(|item| item.id.clone())
            .collect()
    }

    /// Plain-text rendering of `id`, resolving links one level deep.
    pub fn content_text(&self, id: &ItemId) -> String {
        let Some(content) = self.content(id) else {
            return String::new();
        };
        content.plain_text_with(|link| {
            self.content(link)
                .map(|linked| linked.plain_text_with(|inner| Some(inner.to_string())))
        })
    }

    /// True when `ancestor` is reachable from `id` by following parent edges.
    pub fn is_ancestor(&self, ancestor: &ItemId, id: &ItemId) -> bool {
        let mut visited: BTreeSet<&ItemId> = BTreeSet::new();
        let mut queue = VecDeque::from([id.clone()]);
        while let Some(current) = queue.pop_front() {
            let Some(parents) = self.parent_index.get(&current) else {
                continue;
            };
            for parent in parents {
                if parent == ancestor {
                    return true;
                }
                if visited.insert(parent) {
                    queue.push_back(parent.clone());
                }
            }
        }
        false
    }

    fn child_index(&self, parent: &ItemId, child: &ItemId) -> Option<usize> {
        self.edges
            .get(parent)?
            .iter()
            .position(|slot| &slot.child == child)
    }

    fn ensure_edge_insertable(&self, parent: &ItemId, child: &ItemId) -> GraphResult<()> {
        if !self.exists(parent) {
            return Err(GraphError::NotFound(parent.clone()));
        }
        if !self.exists(child) {
            return Err(GraphError::NotFound(child.clone()));
        }
        if self.child_index(parent, child).is_some() {
            return Err(GraphError::DuplicateEdge {
                parent: parent.clone(),
                child: child.clone(),
            });
        }
        if parent == child || self.is_ancestor(child, parent) {
            return Err(GraphError::CycleDetected {
                parent: parent.clone(),
                child: child.clone(),
            });
        }
        Ok(())
    }

    fn link_parent(&mut self, child: &ItemId, parent: &ItemId) {
        self.parent_index
            .entry(child.clone())
            .or_default()
            .insert(parent.clone());
    }

    fn unlink_parent(&mut self, child: &ItemId, parent: &ItemId) {
        if let Some(parents) = self.parent_index.get_mut(child) {
            parents.remove(parent);
            if parents.is_empty() {
                self.parent_index.remove(child);
            }
        }
    }

    fn take_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }
}

fn renumber(slots: &mut [Slot]) {
    for (index, slot) in slots.iter_mut().enumerate() {
        slot.position = index as i64;
    }
}

#[cfg(test)]
mod tests {
    use super::State;
    use crate::graph::GraphError;
    use crate::model::item::{Content, ItemId};

    fn with_items(count: usize) -> (State, Vec<ItemId>) {
        let mut state = State::new();
        let mut ids = Vec::new();
        for _ in 0..count {
            let (next, id) = state.create();
            state = next;
            ids.push(id);
        }
        (state, ids)
    }

    #[test]
    fn equal_positions_keep_insertion_order() {
        let (state, ids) = with_items(3);
        let root = ItemId::root();
        let state = state.add_child(&root, &ids[0], 5).unwrap();
        let state = state.add_child(&root, &ids[1], 5).unwrap();
        let state = state.add_child(&root, &ids[2], 1).unwrap();
        assert_eq!(
            state.children(&root),
            vec![ids[2].clone(), ids[0].clone(), ids[1].clone()]
        );
    }

    #[test]
    fn generation_tracks_edge_mutations_only() {
        let (state, ids) = with_items(1);
        let before = state.generation();
        let state = state.set_content(&ids[0], Content::text("x")).unwrap();
        assert_eq!(state.generation(), before);
        let state = state.append_child(&ItemId::root(), &ids[0]).unwrap();
        assert_ne!(state.generation(), before);
        let untouched = state.remove_child(&ids[0], &ItemId::root());
        assert_eq!(untouched.generation(), state.generation());
    }

    #[test]
    fn sibling_branches_get_distinct_generations() {
        let (state, ids) = with_items(2);
        let root = ItemId::root();
        let left = state.append_child(&root, &ids[0]).unwrap();
        let right = state.append_child(&root, &ids[1]).unwrap();
        assert_ne!(left.generation(), right.generation());
        assert_ne!(state.with_fresh_generation().generation(), state.generation());
    }

    #[test]
    fn parents_follow_destroy_and_set_children() {
        let (state, ids) = with_items(3);
        let root = ItemId::root();
        let state = state.append_child(&root, &ids[0]).unwrap();
        let state = state.append_child(&ids[0], &ids[1]).unwrap();
        let state = state.append_child(&root, &ids[1]).unwrap();
        assert_eq!(state.parents(&ids[1]), {
            let mut expected = vec![root.clone(), ids[0].clone()];
            expected.sort();
            expected
        });

        let state = state.set_children(&ids[0], &[ids[2].clone()]).unwrap();
        assert_eq!(state.parents(&ids[1]), vec![root.clone()]);
        assert_eq!(state.parents(&ids[2]), vec![ids[0].clone()]);

        let state = state.destroy(&ids[0]).unwrap();
        assert!(state.parents(&ids[2]).is_empty());
        assert!(state.parents(&ids[0]).is_empty());
        assert!(!state.is_ancestor(&root, &ids[2]));
        assert!(state.is_ancestor(&root, &ids[1]));
    }

    #[test]
    fn self_edge_is_a_cycle() {
        let (state, ids) = with_items(1);
        let err = state.add_child(&ids[0], &ids[0], 0).unwrap_err();
        assert!(matches!(err, GraphError::CycleDetected { .. }));
    }

    #[test]
    fn reorder_child_renumbers_densely() {
        let (state, ids) = with_items(3);
        let root = ItemId::root();
        let state = state.add_child(&root, &ids[0], 10).unwrap();
        let state = state.add_child(&root, &ids[1], 20).unwrap();
        let state = state.add_child(&root, &ids[2], 30).unwrap();
        let state = state.reorder_child(&root, &ids[2], 0).unwrap();
        let positions = state
            .child_edges(&root)
            .into_iter()
            .map(|edge| (edge.child, edge.position))
            .collect::<Vec<_>>();
        assert_eq!(
            positions,
            vec![(ids[2].clone(), 0), (ids[0].clone(), 1), (ids[1].clone(), 2)]
        );
    }
}
