//! Tree projection over the item graph.
//!
//! # Responsibility
//! - Derive a rooted, ordered, expandable view of the graph for one session.
//! - Translate structural commands on view nodes into graph edits.
//!
//! # Invariants
//! - A `NodeRef` is live only while its arena slot exists; slots are never
//!   reused, so a removed handle can never alias a newer node.
//! - A projection is usable only against the graph generation it was last
//!   reconciled with; operations reject stale projections.
//! - Edge-mutating operations reconcile the arena before returning.

use crate::graph::{GraphError, State};
use crate::model::item::{Content, ItemId};
use std::error::Error;
use std::fmt::{Display, Formatter};

mod edit;
mod projection;

pub use projection::Tree;

/// Result type for projection operations.
pub type TreeResult<T> = Result<T, TreeError>;

/// Arena handle for one position in the projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeRef(u64);

impl Display for NodeRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// Value delivered by the item picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Link an item that already exists.
    Existing(ItemId),
    /// Create a new item holding this text.
    Create(String),
}

/// Resolves a selection to an item id, creating the item when asked to.
pub fn resolve_selection(state: &State, selection: &Selection) -> TreeResult<(State, ItemId)> {
    match selection {
        Selection::Existing(id) => {
            if !state.exists(id) {
                return Err(GraphError::NotFound(id.clone()).into());
            }
            Ok((state.clone(), id.clone()))
        }
        Selection::Create(text) => {
            let (state, id) = state.create();
            let state = state.set_content(&id, Content::parse_markup(text))?;
            Ok((state, id))
        }
    }
}

/// Errors from projection operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// Node handle no longer refers to a live projection node.
    StaleNode(NodeRef),
    /// Projection was reconciled against an older graph generation.
    StaleProjection {
        tree_generation: u64,
        state_generation: u64,
    },
    /// Operation needs a parent edge but the node is the projection root.
    NoParent(NodeRef),
    /// Underlying graph operation failed.
    Graph(GraphError),
}

impl Display for TreeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StaleNode(node) => write!(f, "stale node reference: {node}"),
            Self::StaleProjection {
                tree_generation,
                state_generation,
            } => write!(
                f,
                "projection generation {tree_generation} does not match state generation {state_generation}"
            ),
            Self::NoParent(node) => write!(f, "node has no parent in projection: {node}"),
            Self::Graph(err) => write!(f, "{err}"),
        }
    }
}

impl Error for TreeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Graph(err) => Some(err),
            _ => None,
        }
    }
}

impl From<GraphError> for TreeError {
    fn from(value: GraphError) -> Self {
        Self::Graph(value)
    }
}
