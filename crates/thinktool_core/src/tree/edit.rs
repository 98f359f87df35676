//! Structural edits on the projection, delegated to the graph store.
//!
//! Every edit validates the projection against the input state first, applies
//! the graph change, then reconciles the arena so no stale handle survives
//! into the returned projection.

use super::{resolve_selection, NodeRef, Selection, Tree, TreeError, TreeResult};
use crate::graph::State;
use crate::model::item::ItemId;
use log::debug;

impl Tree {
    /// Inserts the selected item under `target` at sibling `index` and focuses it.
    pub fn insert_child(
        &self,
        state: &State,
        target: NodeRef,
        selection: &Selection,
        index: usize,
    ) -> TreeResult<(State, Tree)> {
        self.ensure_fresh(state)?;
        let parent_item = self.item(target)?.clone();
        let (state, item) = resolve_selection(state, selection)?;
        let state = state.insert_child(&parent_item, &item, index)?;
        let (tree, _) = self.attach(&state, target, &item)?;
        Ok((state, tree))
    }

    /// Inserts the selected item right after `target` under the same parent.
    pub fn insert_sibling_after(
        &self,
        state: &State,
        target: NodeRef,
        selection: &Selection,
    ) -> TreeResult<(State, Tree)> {
        self.ensure_fresh(state)?;
        let (parent, index) = self.require_parent(target)?;
        let (state, item) = resolve_selection(state, selection)?;
        let state = state.insert_child(self.item(parent)?, &item, index + 1)?;
        let (tree, _) = self.attach(&state, parent, &item)?;
        Ok((state, tree))
    }

    /// Inserts the selected item right before `target` under the same parent.
    pub fn insert_sibling_before(
        &self,
        state: &State,
        target: NodeRef,
        selection: &Selection,
    ) -> TreeResult<(State, Tree)> {
        self.ensure_fresh(state)?;
        let (parent, index) = self.require_parent(target)?;
        let (state, item) = resolve_selection(state, selection)?;
        let state = state.insert_child(self.item(parent)?, &item, index)?;
        let (tree, _) = self.attach(&state, parent, &item)?;
        Ok((state, tree))
    }

    /// Puts the selected item between `target` and its displayed parent.
    ///
    /// The new item takes `target`'s position under that parent; edges from
    /// other parents of `target` are left alone.
    pub fn insert_parent(
        &self,
        state: &State,
        target: NodeRef,
        selection: &Selection,
    ) -> TreeResult<(State, Tree)> {
        self.ensure_fresh(state)?;
        let (parent, index) = self.require_parent(target)?;
        let parent_item = self.item(parent)?.clone();
        let child_item = self.item(target)?.clone();
        let (state, item) = resolve_selection(state, selection)?;
        let state = state
            .remove_child(&parent_item, &child_item)
            .insert_child(&parent_item, &item, index)?
            .append_child(&item, &child_item)?;

        let (mut tree, node) = self.attach(&state, parent, &item)?;
        let before = tree.visible_nodes();
        tree.set_expanded(node, true);
        tree.finish(&state, &before);
        Ok((state, tree))
    }

    /// Creates an empty item as the first child of `target`.
    pub fn create_child(&self, state: &State, target: NodeRef) -> TreeResult<(State, Tree, NodeRef)> {
        self.ensure_fresh(state)?;
        let parent_item = self.item(target)?.clone();
        let (state, item) = state.create();
        let state = state.insert_child(&parent_item, &item, 0)?;
        let (tree, node) = self.attach(&state, target, &item)?;
        Ok((state, tree, node))
    }

    /// Creates an empty item right after `target`.
    pub fn create_sibling_after(
        &self,
        state: &State,
        target: NodeRef,
    ) -> TreeResult<(State, Tree, NodeRef)> {
        self.create_sibling(state, target, 1)
    }

    /// Creates an empty item right before `target`.
    pub fn create_sibling_before(
        &self,
        state: &State,
        target: NodeRef,
    ) -> TreeResult<(State, Tree, NodeRef)> {
        self.create_sibling(state, target, 0)
    }

    /// Makes `node` the last child of its preceding sibling.
    ///
    /// No-op when `node` has no preceding sibling.
    pub fn indent(&self, state: &State, node: NodeRef) -> TreeResult<(State, Tree)> {
        self.ensure_fresh(state)?;
        let Some((parent, index)) = self.sibling_index(node)? else {
            return Ok(self.unchanged(state, "indent", node, "root"));
        };
        if index == 0 {
            return Ok(self.unchanged(state, "indent", node, "no_previous_sibling"));
        }
        let sibling = self.children(parent)?[index - 1];
        let item = self.item(node)?.clone();
        let next_state = state
            .remove_child(self.item(parent)?, &item)
            .append_child(self.item(sibling)?, &item)?;
        let tree = self.moved(&next_state, node, sibling, &item);
        Ok((next_state, tree))
    }

    /// Makes `node` the next sibling of its parent, under the grandparent.
    ///
    /// No-op at the projection root and for the root's direct children.
    pub fn unindent(&self, state: &State, node: NodeRef) -> TreeResult<(State, Tree)> {
        self.ensure_fresh(state)?;
        let Some((parent, _)) = self.sibling_index(node)? else {
            return Ok(self.unchanged(state, "unindent", node, "root"));
        };
        let Some((grandparent, parent_index)) = self.sibling_index(parent)? else {
            return Ok(self.unchanged(state, "unindent", node, "parent_is_root"));
        };
        let item = self.item(node)?.clone();
        let next_state = state
            .remove_child(self.item(parent)?, &item)
            .insert_child(self.item(grandparent)?, &item, parent_index + 1)?;
        let tree = self.moved(&next_state, node, grandparent, &item);
        Ok((next_state, tree))
    }

    /// Swaps `node` with its previous sibling; no-op for the first sibling.
    pub fn move_up(&self, state: &State, node: NodeRef) -> TreeResult<(State, Tree)> {
        self.ensure_fresh(state)?;
        let Some((parent, index)) = self.sibling_index(node)? else {
            return Ok(self.unchanged(state, "move_up", node, "root"));
        };
        if index == 0 {
            return Ok(self.unchanged(state, "move_up", node, "first_sibling"));
        }
        let next_state = state.reorder_child(self.item(parent)?, self.item(node)?, index - 1)?;
        Ok((next_state.clone(), self.refresh(&next_state)))
    }

    /// Swaps `node` with its next sibling; no-op for the last sibling.
    pub fn move_down(&self, state: &State, node: NodeRef) -> TreeResult<(State, Tree)> {
        self.ensure_fresh(state)?;
        let Some((parent, index)) = self.sibling_index(node)? else {
            return Ok(self.unchanged(state, "move_down", node, "root"));
        };
        if index + 1 >= self.children(parent)?.len() {
            return Ok(self.unchanged(state, "move_down", node, "last_sibling"));
        }
        let next_state = state.reorder_child(self.item(parent)?, self.item(node)?, index + 1)?;
        Ok((next_state.clone(), self.refresh(&next_state)))
    }

    /// Detaches `node` from its displayed parent; the item survives elsewhere.
    pub fn remove(&self, state: &State, node: NodeRef) -> TreeResult<(State, Tree)> {
        self.ensure_fresh(state)?;
        let Some((parent, _)) = self.sibling_index(node)? else {
            return Ok(self.unchanged(state, "remove", node, "root"));
        };
        let next_state = state.remove_child(self.item(parent)?, self.item(node)?);
        let tree = self.refresh(&next_state);
        Ok((next_state, tree))
    }

    /// Destroys the item shown at `node` everywhere in the graph.
    pub fn remove_thing(&self, state: &State, node: NodeRef) -> TreeResult<(State, Tree)> {
        self.ensure_fresh(state)?;
        if node == self.root() {
            self.node(node)?;
            return Ok(self.unchanged(state, "remove_thing", node, "root"));
        }
        let next_state = state.destroy(self.item(node)?)?;
        let tree = self.refresh(&next_state);
        Ok((next_state, tree))
    }

    fn create_sibling(
        &self,
        state: &State,
        target: NodeRef,
        offset: usize,
    ) -> TreeResult<(State, Tree, NodeRef)> {
        self.ensure_fresh(state)?;
        let (parent, index) = self.require_parent(target)?;
        let (state, item) = state.create();
        let state = state.insert_child(self.item(parent)?, &item, index + offset)?;
        let (tree, node) = self.attach(&state, parent, &item)?;
        Ok((state, tree, node))
    }

    fn require_parent(&self, node: NodeRef) -> TreeResult<(NodeRef, usize)> {
        self.sibling_index(node)?.ok_or(TreeError::NoParent(node))
    }

    /// Expands `parent`, reconciles, and focuses the child showing `item`.
    fn attach(&self, state: &State, parent: NodeRef, item: &ItemId) -> TreeResult<(Tree, NodeRef)> {
        let before = self.visible_nodes();
        let mut next = self.clone();
        next.set_expanded(parent, true);
        next.finish(state, &before);
        let node = next
            .child_for_item(parent, item)
            .ok_or(TreeError::StaleNode(parent))?;
        next.set_focused(Some(node));
        Ok((next, node))
    }

    /// Reconciles after `node` moved below `new_parent`; focus follows the
    /// moved item when `node` was focused.
    fn moved(&self, state: &State, node: NodeRef, new_parent: NodeRef, item: &ItemId) -> Tree {
        let was_focused = self.focused() == Some(node);
        let before = self.visible_nodes();
        let mut next = self.clone();
        next.set_expanded(new_parent, true);
        next.finish(state, &before);
        if was_focused {
            if let Some(moved) = next.child_for_item(new_parent, item) {
                next.set_focused(Some(moved));
            }
        }
        next
    }

    fn unchanged(&self, state: &State, op: &str, node: NodeRef, reason: &str) -> (State, Tree) {
        debug!("event=tree_edit module=tree status=skipped op={op} node={node} reason={reason}");
        (state.clone(), self.clone())
    }
}
