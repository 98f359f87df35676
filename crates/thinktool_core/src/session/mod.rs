//! Application session value.
//!
//! # Responsibility
//! - Bundle graph state, projection and per-session flags into one value.
//! - Derive new sessions only through [`Session::merge`].
//!
//! # Invariants
//! - A session never mutates in place; every transition yields a new value.
//! - `server_disconnected` is sticky until [`Session::reconnected`].
//! - The projection is reconciled against `state` whenever `state` changes
//!   through the action engine or undo.

use crate::graph::State;
use crate::model::item::ItemId;
use crate::tree::{Tree, TreeResult};

pub mod tutorial;

pub use tutorial::TutorialState;

/// Per-session application state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    state: State,
    tree: Tree,
    tutorial: TutorialState,
    selected_thing: ItemId,
    changelog_shown: bool,
    server_disconnected: bool,
    // Previous graph snapshots, newest last.
    history: Vec<State>,
}

/// Partial update applied by [`Session::merge`]; `None` keeps the old value.
#[derive(Debug, Clone, Default)]
pub struct SessionPatch {
    pub state: Option<State>,
    pub tree: Option<Tree>,
    pub tutorial: Option<TutorialState>,
    pub selected_thing: Option<ItemId>,
    pub changelog_shown: Option<bool>,
    pub server_disconnected: Option<bool>,
}

impl SessionPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(mut self, state: State) -> Self {
        self.state = Some(state);
        self
    }

    pub fn tree(mut self, tree: Tree) -> Self {
        self.tree = Some(tree);
        self
    }

    pub fn tutorial(mut self, tutorial: TutorialState) -> Self {
        self.tutorial = Some(tutorial);
        self
    }

    pub fn selected_thing(mut self, thing: ItemId) -> Self {
        self.selected_thing = Some(thing);
        self
    }

    pub fn changelog_shown(mut self, shown: bool) -> Self {
        self.changelog_shown = Some(shown);
        self
    }
}

impl Session {
    /// Opens a session on `state`, projected from the root item.
    pub fn new(state: State) -> TreeResult<Self> {
        let tree = Tree::from_root(&state, &ItemId::root())?;
        Ok(Self {
            state,
            tree,
            tutorial: TutorialState::default(),
            selected_thing: ItemId::root(),
            changelog_shown: false,
            server_disconnected: false,
            history: Vec::new(),
        })
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn tutorial(&self) -> &TutorialState {
        &self.tutorial
    }

    pub fn selected_thing(&self) -> &ItemId {
        &self.selected_thing
    }

    pub fn changelog_shown(&self) -> bool {
        self.changelog_shown
    }

    pub fn is_server_disconnected(&self) -> bool {
        self.server_disconnected
    }

    /// Number of graph snapshots available to undo.
    pub fn undo_depth(&self) -> usize {
        self.history.len()
    }

    /// Returns a new session with the patched fields replaced.
    pub fn merge(&self, patch: SessionPatch) -> Session {
        Session {
            state: patch.state.unwrap_or_else(|| self.state.clone()),
            tree: patch.tree.unwrap_or_else(|| self.tree.clone()),
            tutorial: patch.tutorial.unwrap_or_else(|| self.tutorial.clone()),
            selected_thing: patch
                .selected_thing
                .unwrap_or_else(|| self.selected_thing.clone()),
            changelog_shown: patch.changelog_shown.unwrap_or(self.changelog_shown),
            server_disconnected: patch
                .server_disconnected
                .unwrap_or(self.server_disconnected),
            history: self.history.clone(),
        }
    }

    /// Marks the remote authority as unreachable.
    pub fn server_disconnected(&self) -> Session {
        self.merge(SessionPatch {
            server_disconnected: Some(true),
            ..SessionPatch::default()
        })
    }

    /// Clears the disconnected flag after a successful reconnect.
    pub fn reconnected(&self) -> Session {
        self.merge(SessionPatch {
            server_disconnected: Some(false),
            ..SessionPatch::default()
        })
    }

    /// Remembers `previous` as an undo point, keeping at most `depth` entries.
    pub fn record_undo(&self, previous: State, depth: usize) -> Session {
        let mut next = self.clone();
        if depth == 0 {
            next.history.clear();
            return next;
        }
        next.history.push(previous);
        if next.history.len() > depth {
            let excess = next.history.len() - depth;
            next.history.drain(..excess);
        }
        next
    }

    /// Restores the most recent undo point, or `None` when history is empty.
    ///
    /// The restored state gets a fresh generation and the projection is
    /// reconciled against it; if the zoom root no longer exists the
    /// projection returns home.
    pub fn undo(&self) -> TreeResult<Option<Session>> {
        let mut history = self.history.clone();
        let Some(previous) = history.pop() else {
            return Ok(None);
        };
        let state = previous.with_fresh_generation();
        let tree = if state.exists(self.tree.root_item()) {
            self.tree.refresh(&state)
        } else {
            Tree::from_root(&state, &ItemId::root())?
        };
        let mut next = self.merge(SessionPatch::new().state(state).tree(tree));
        next.history = history;
        Ok(Some(next))
    }
}
