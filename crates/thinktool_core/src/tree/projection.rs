//! Projection arena: view state, queries and reconciliation.

use super::{NodeRef, TreeError, TreeResult};
use crate::graph::{GraphError, State};
use crate::model::item::ItemId;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

// Shared by every projection so a handle never names a node of another tree.
static NEXT_NODE: AtomicU64 = AtomicU64::new(0);

fn fresh_node() -> NodeRef {
    NodeRef(NEXT_NODE.fetch_add(1, Ordering::Relaxed))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct TreeNode {
    pub(super) item: ItemId,
    pub(super) parent: Option<NodeRef>,
    // Populated only while `expanded`.
    pub(super) children: Vec<NodeRef>,
    pub(super) expanded: bool,
}

/// Rooted, expandable view of the graph for one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tree {
    root: NodeRef,
    nodes: BTreeMap<NodeRef, TreeNode>,
    focused: Option<NodeRef>,
    generation: u64,
}

impl Tree {
    /// Creates a projection rooted at `item` with nothing expanded or focused.
    pub fn from_root(state: &State, item: &ItemId) -> TreeResult<Tree> {
        if !state.exists(item) {
            return Err(GraphError::NotFound(item.clone()).into());
        }
        let root = fresh_node();
        let mut nodes = BTreeMap::new();
        nodes.insert(
            root,
            TreeNode {
                item: item.clone(),
                parent: None,
                children: Vec::new(),
                expanded: true,
            },
        );
        let mut tree = Tree {
            root,
            nodes,
            focused: None,
            generation: state.generation(),
        };
        tree.reconcile(state, root);
        Ok(tree)
    }

    pub fn root(&self) -> NodeRef {
        self.root
    }

    /// Item displayed at the projection root (the zoom target).
    pub fn root_item(&self) -> &ItemId {
        &self.nodes[&self.root].item
    }

    pub fn focused(&self) -> Option<NodeRef> {
        self.focused
    }

    /// Graph generation this projection was last reconciled against.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn contains(&self, node: NodeRef) -> bool {
        self.nodes.contains_key(&node)
    }

    pub fn item(&self, node: NodeRef) -> TreeResult<&ItemId> {
        Ok(&self.node(node)?.item)
    }

    pub fn parent(&self, node: NodeRef) -> TreeResult<Option<NodeRef>> {
        Ok(self.node(node)?.parent)
    }

    /// Loaded children of `node`; empty while collapsed.
    pub fn children(&self, node: NodeRef) -> TreeResult<&[NodeRef]> {
        Ok(&self.node(node)?.children)
    }

    pub fn is_expanded(&self, node: NodeRef) -> TreeResult<bool> {
        Ok(self.node(node)?.expanded)
    }

    /// Number of ancestors between `node` and the root.
    pub fn depth(&self, node: NodeRef) -> TreeResult<usize> {
        let mut depth = 0;
        let mut cursor = self.node(node)?.parent;
        while let Some(current) = cursor {
            depth += 1;
            cursor = self.node(current)?.parent;
        }
        Ok(depth)
    }

    /// Nodes below the root in depth-first, expansion-aware order.
    pub fn visible_nodes(&self) -> Vec<NodeRef> {
        let mut out = Vec::new();
        let mut stack = self.nodes[&self.root]
            .children
            .iter()
            .rev()
            .copied()
            .collect::<Vec<_>>();
        while let Some(node) = stack.pop() {
            out.push(node);
            if let Some(entry) = self.nodes.get(&node) {
                stack.extend(entry.children.iter().rev().copied());
            }
        }
        out
    }

    /// Every live node displaying `item`.
    pub fn nodes_for_item(&self, item: &ItemId) -> Vec<NodeRef> {
        self.nodes
            .iter()
            .filter(|(_, entry)| &entry.item == item)
            .map(|(node, _)| *node)
            .collect()
    }

    /// Loaded child of `parent` that displays `item`.
    pub fn child_for_item(&self, parent: NodeRef, item: &ItemId) -> Option<NodeRef> {
        self.nodes.get(&parent)?.children.iter().copied().find(|child| {
            self.nodes
                .get(child)
                .is_some_and(|entry| &entry.item == item)
        })
    }

    pub fn focus(&self, node: NodeRef) -> TreeResult<Tree> {
        self.node(node)?;
        let mut next = self.clone();
        next.focused = Some(node);
        Ok(next)
    }

    pub fn unfocus(&self) -> Tree {
        let mut next = self.clone();
        next.focused = None;
        next
    }

    /// Moves focus to the previous visible node; no-op at the first one and
    /// at the root.
    pub fn focus_up(&self) -> Tree {
        self.step_focus(|index, _| index.checked_sub(1), false)
    }

    /// Moves focus to the next visible node; no-op at the last one. From the
    /// root it enters the first visible node.
    pub fn focus_down(&self) -> Tree {
        self.step_focus(|index, len| (index + 1 < len).then_some(index + 1), true)
    }

    /// Flips expansion of `node` only. The root stays expanded.
    pub fn toggle(&self, state: &State, node: NodeRef) -> TreeResult<Tree> {
        self.ensure_fresh(state)?;
        self.node(node)?;
        if node == self.root {
            return Ok(self.clone());
        }
        let before = self.visible_nodes();
        let mut next = self.clone();
        if let Some(entry) = next.nodes.get_mut(&node) {
            entry.expanded = !entry.expanded;
        }
        next.finish(state, &before);
        Ok(next)
    }

    /// Reconciles the arena with `state`, keeping live handles and expansion.
    pub fn refresh(&self, state: &State) -> Tree {
        let before = self.visible_nodes();
        let mut next = self.clone();
        next.finish(state, &before);
        next
    }

    pub(super) fn ensure_fresh(&self, state: &State) -> TreeResult<()> {
        if self.generation != state.generation() {
            return Err(TreeError::StaleProjection {
                tree_generation: self.generation,
                state_generation: state.generation(),
            });
        }
        Ok(())
    }

    pub(super) fn node(&self, node: NodeRef) -> TreeResult<&TreeNode> {
        self.nodes.get(&node).ok_or(TreeError::StaleNode(node))
    }

    /// Position of `node` among its loaded siblings.
    pub(super) fn sibling_index(&self, node: NodeRef) -> TreeResult<Option<(NodeRef, usize)>> {
        let Some(parent) = self.node(node)?.parent else {
            return Ok(None);
        };
        let index = self
            .node(parent)?
            .children
            .iter()
            .position(|child| *child == node)
            .ok_or(TreeError::StaleNode(node))?;
        Ok(Some((parent, index)))
    }

    pub(super) fn set_expanded(&mut self, node: NodeRef, expanded: bool) {
        if let Some(entry) = self.nodes.get_mut(&node) {
            entry.expanded = expanded;
        }
    }

    pub(super) fn set_focused(&mut self, node: Option<NodeRef>) {
        self.focused = node;
    }

    /// Reconciles from the root and repairs focus against the visual order
    /// captured before the edit.
    pub(super) fn finish(&mut self, state: &State, before: &[NodeRef]) {
        let root = self.root;
        self.reconcile(state, root);
        self.generation = state.generation();
        if let Some(focused) = self.focused {
            if !self.nodes.contains_key(&focused) {
                self.focused = self.fallback_focus(before, focused);
            }
        }
    }

    fn reconcile(&mut self, state: &State, node: NodeRef) {
        let Some(entry) = self.nodes.get(&node) else {
            return;
        };
        let desired = if entry.expanded {
            state.children(&entry.item)
        } else {
            Vec::new()
        };
        let mut reusable = entry.children.clone();
        let mut children = Vec::with_capacity(desired.len());
        for item in desired {
            let existing = reusable.iter().position(|candidate| {
                self.nodes
                    .get(candidate)
                    .is_some_and(|entry| entry.item == item)
            });
            let child = match existing {
                Some(index) => reusable.remove(index),
                None => self.allocate(item, node),
            };
            children.push(child);
        }
        for dropped in reusable {
            self.drop_subtree(dropped);
        }
        if let Some(entry) = self.nodes.get_mut(&node) {
            entry.children = children.clone();
        }
        for child in children {
            self.reconcile(state, child);
        }
    }

    fn allocate(&mut self, item: ItemId, parent: NodeRef) -> NodeRef {
        let node = fresh_node();
        self.nodes.insert(
            node,
            TreeNode {
                item,
                parent: Some(parent),
                children: Vec::new(),
                expanded: false,
            },
        );
        node
    }

    fn drop_subtree(&mut self, node: NodeRef) {
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            if let Some(entry) = self.nodes.remove(&current) {
                stack.extend(entry.children);
            }
        }
    }

    fn fallback_focus(&self, before: &[NodeRef], lost: NodeRef) -> Option<NodeRef> {
        let index = before.iter().position(|node| *node == lost)?;
        before[..index]
            .iter()
            .rev()
            .chain(before[index + 1..].iter())
            .copied()
            .find(|node| self.nodes.contains_key(node))
    }

    fn step_focus<F>(&self, step: F, enter_from_root: bool) -> Tree
    where
        F: Fn(usize, usize) -> Option<usize>,
    {
        let Some(focused) = self.focused else {
            return self.clone();
        };
        let visible = self.visible_nodes();
        let target = if focused == self.root {
            enter_from_root.then(|| visible.first().copied()).flatten()
        } else {
            visible
                .iter()
                .position(|node| *node == focused)
                .and_then(|index| step(index, visible.len()))
                .map(|index| visible[index])
        };
        let mut next = self.clone();
        if let Some(target) = target {
            next.focused = Some(target);
        }
        next
    }
}
